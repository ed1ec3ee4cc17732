/// ferrite-dip server
///
/// Accepts image uploads, runs the configured transform (grayscale or the
/// deep-image-prior network) and serves the stored PNG back by name.
/// Served by a synchronous tiny_http server.
///
/// Run with:
///   cargo run --bin ferrite-dip-server --release -- --transform grayscale
///
/// Endpoints:
///   POST /processImage                       multipart field `image`
///   GET  /getProcessedImage?imageName=NAME   returns `{stem}-output.png`
///   GET  /health

mod config;
mod error;
mod handlers;
mod routes;
mod state;
mod util;

use std::error::Error;
use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use log::info;
use tiny_http::Server;

use config::ServerConfig;
use state::AppState;

fn init_logging(config: &ServerConfig) {
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(buf, "{} - {} - {}", buf.timestamp(), record.level(), record.args())
        })
        .filter(None, config.log_level)
        .parse_env("RUST_LOG")
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = ServerConfig::parse();
    init_logging(&config);

    // Creates the storage directory if missing.
    let state = Arc::new(AppState::from_config(&config)?);

    let addr = config.bind_addr();
    let server = Server::http(&addr).map_err(|e| format!("failed to bind {}: {}", addr, e))?;

    info!("ferrite-dip server listening on http://{}", addr);
    info!("  storage dir : {}", config.storage_dir().display());
    info!("  transform   : {}", state.transform.name());
    if config.transform == ferrite_dip::TransformKind::Model {
        let model = config.model_config();
        info!("  weights     : {} (cache: {})", model.weights_path.display(), model.cache_weights);
        info!("  channels    : {}", model.input_channels);
    }
    info!("  upload cap  : {} bytes", config.max_upload_bytes);

    // Each request is dispatched on its own thread so a slow forward pass
    // does not stall other uploads and lookups.
    for request in server.incoming_requests() {
        let state = state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state);
        });
    }
    Ok(())
}
