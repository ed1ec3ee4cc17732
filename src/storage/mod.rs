//! Persistence for processed images.
//!
//! Handlers only see the [`ImageStore`] trait; [`DirectoryStore`] is the flat
//! on-disk backend. Keys are produced by [`output_filename`], which maps an
//! uploaded or requested file name to `{stem}-output.png`.

pub mod directory;

use crate::error::StoreError;

pub use directory::DirectoryStore;

/// Suffix appended to the stem of every stored image.
pub const OUTPUT_SUFFIX: &str = "-output.png";

/// Key/value storage for PNG bytes.
pub trait ImageStore: Send + Sync {
    /// Stores `bytes` under `key`, replacing any previous value.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Returns the bytes stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn exists(&self, key: &str) -> Result<bool, StoreError>;
}

/// Returns the file name without directories and without its last extension.
///
/// Both `/` and `\` count as separators since browsers on Windows may send a
/// full client path. Leading dots belong to the stem, so `.hidden` and
/// `..foo` are kept whole while `..foo.png` becomes `..foo`. Returns `None`
/// when nothing usable remains (empty, `.` or `..`).
pub fn stem(file_name: &str) -> Option<&str> {
    let last = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let leading_dots = last.len() - last.trim_start_matches('.').len();
    let stem = match last[leading_dots..].rfind('.') {
        Some(dot) => &last[..leading_dots + dot],
        None => last,
    };
    Some(stem).filter(|s| !s.is_empty() && *s != "." && *s != "..")
}

/// Storage key for the processed version of `file_name`.
pub fn output_filename(file_name: &str) -> Option<String> {
    stem(file_name).map(|s| format!("{}{}", s, OUTPUT_SUFFIX))
}
