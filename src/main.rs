//! Command-line companion to the server.
//!
//!   ferrite-dip init-weights --out model/dip_weights.json
//!   ferrite-dip process cat.jpg --transform model --weights model/dip_weights.json

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;

use ferrite_dip::{output_filename, ModelConfig, NetworkSpec, TransformKind};

#[derive(Debug, Parser)]
#[command(name = "ferrite-dip", version, about = "Weights and offline processing for ferrite-dip")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a freshly initialised deep-image-prior weights file.
    InitWeights {
        #[arg(long, default_value = "model/dip_weights.json")]
        out: PathBuf,
        /// Architecture JSON (a `NetworkSpec`); overrides the shape flags below.
        #[arg(long)]
        spec: Option<PathBuf>,
        #[arg(long, default_value_t = ModelConfig::DEFAULT_INPUT_CHANNELS)]
        channels: usize,
        #[arg(long, default_value_t = 16)]
        hidden: usize,
        #[arg(long, default_value_t = 3)]
        depth: usize,
        /// Produce 3-channel (RGB) output instead of grayscale.
        #[arg(long)]
        rgb: bool,
    },
    /// Run a transform over one local image and write `{stem}-output.png`.
    Process {
        input: PathBuf,
        /// Output path; defaults to `{stem}-output.png` next to the input.
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = TransformKind::Grayscale)]
        transform: TransformKind,
        #[arg(long, default_value = "model/dip_weights.json")]
        weights: PathBuf,
        #[arg(long, default_value_t = ModelConfig::DEFAULT_INPUT_CHANNELS)]
        input_channels: usize,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::InitWeights { out, spec, channels, hidden, depth, rgb } => {
            let spec = match spec {
                Some(path) => NetworkSpec::load_json(path)?,
                None => NetworkSpec::deep_image_prior(channels, hidden, depth, if rgb { 3 } else { 1 }),
            };
            let network = spec.build()?;
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            network.save_json(&out)?;
            info!(
                "Wrote {} ({} layers, {} -> {} channels)",
                out.display(),
                network.layers.len(),
                network.input_channels().unwrap_or(0),
                network.output_channels().unwrap_or(0),
            );
        }
        Command::Process { input, out, transform, weights, input_channels } => {
            let model = ModelConfig { weights_path: weights, input_channels, cache_weights: false };
            let transform = transform.build(model);

            let bytes = std::fs::read(&input)?;
            let png = ferrite_dip::transform::process_bytes(transform.as_ref(), &bytes)?;

            let out = match out {
                Some(path) => path,
                None => {
                    let name = input.file_name().and_then(|s| s.to_str()).unwrap_or_default();
                    let file = output_filename(name).ok_or("input path has no file name")?;
                    input.with_file_name(file)
                }
            };
            std::fs::write(&out, &png)?;
            info!("{} -> {} ({})", input.display(), out.display(), transform.name());
        }
    }
    Ok(())
}
