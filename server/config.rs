use std::path::{Path, PathBuf};

use clap::Parser;
use log::LevelFilter;

use ferrite_dip::{ModelConfig, TransformKind};

/// 16 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Everything the server needs at startup. Parsed once in `main` and used to
/// build the shared `AppState`; nothing else reads the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "ferrite-dip-server", version, about = "Upload, transform and retrieve images over HTTP")]
pub struct ServerConfig {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0", env = "FERRITE_DIP_HOST")]
    pub host: String,

    #[arg(long, default_value_t = 5001, env = "FERRITE_DIP_PORT")]
    pub port: u16,

    /// Directory holding `{stem}-output.png` files. Defaults to
    /// `processed_images` next to the server executable.
    #[arg(long, env = "FERRITE_DIP_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = TransformKind::Grayscale, env = "FERRITE_DIP_TRANSFORM")]
    pub transform: TransformKind,

    /// Network weights for `--transform model`. Defaults to
    /// `model/dip_weights.json` next to the server executable.
    #[arg(long, env = "FERRITE_DIP_WEIGHTS")]
    pub weights: Option<PathBuf>,

    /// Channel count the luminance input is replicated to.
    #[arg(long, default_value_t = ModelConfig::DEFAULT_INPUT_CHANNELS)]
    pub input_channels: usize,

    /// Load the weights once and keep them for the life of the process.
    #[arg(long)]
    pub cache_weights: bool,

    /// Largest accepted upload body, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Log level; `RUST_LOG` directives are applied on top.
    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(|| base_dir().join("processed_images"))
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            weights_path: self.weights
                .clone()
                .unwrap_or_else(|| base_dir().join("model").join("dip_weights.json")),
            input_channels: self.input_channels,
            cache_weights: self.cache_weights,
        }
    }
}

/// Directory containing the running executable, falling back to the
/// working directory.
fn base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_published_contract() {
        let cfg = ServerConfig::try_parse_from(["ferrite-dip-server"]).unwrap();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:5001");
        assert_eq!(cfg.transform, TransformKind::Grayscale);
        assert_eq!(cfg.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(cfg.input_channels, 32);
        assert!(!cfg.cache_weights);
        assert!(cfg.storage_dir().ends_with("processed_images"));
        assert!(cfg.model_config().weights_path.ends_with("model/dip_weights.json"));
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = ServerConfig::try_parse_from([
            "ferrite-dip-server",
            "--port", "8080",
            "--transform", "model",
            "--storage-dir", "/tmp/out",
            "--weights", "/tmp/w.json",
            "--input-channels", "8",
            "--cache-weights",
        ])
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.transform, TransformKind::Model);
        assert_eq!(cfg.storage_dir(), PathBuf::from("/tmp/out"));
        let model = cfg.model_config();
        assert_eq!(model.weights_path, PathBuf::from("/tmp/w.json"));
        assert_eq!(model.input_channels, 8);
        assert!(model.cache_weights);
    }
}
