use std::sync::Arc;

use ferrite_dip::{DirectoryStore, ImageStore, StoreError, Transform};

use crate::config::ServerConfig;

/// Immutable per-process state handed to every handler.
pub struct AppState {
    pub store: Arc<dyn ImageStore>,
    pub transform: Arc<dyn Transform>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn ImageStore>, transform: Arc<dyn Transform>, max_upload_bytes: usize) -> Self {
        AppState { store, transform, max_upload_bytes }
    }

    /// Opens (and creates) the storage directory and builds the configured
    /// transform.
    pub fn from_config(config: &ServerConfig) -> Result<Self, StoreError> {
        let store = DirectoryStore::open(config.storage_dir())?;
        let transform = config.transform.build(config.model_config());
        Ok(AppState::new(Arc::new(store), transform, config.max_upload_bytes))
    }
}

/// Shared state type — an `Arc<AppState>` cloned into every request thread.
pub type SharedState = Arc<AppState>;

#[cfg(test)]
pub mod testing {
    use super::*;
    use ferrite_dip::GrayscaleTransform;

    /// Grayscale state over a fresh temporary directory.
    pub fn grayscale_state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::open(dir.path()).unwrap();
        let state = AppState::new(Arc::new(store), Arc::new(GrayscaleTransform), 1024 * 1024);
        (dir, state)
    }
}
