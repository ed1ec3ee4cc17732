use serde::{Deserialize, Serialize};

/// Optional annotations attached to a saved weights file.
/// All fields are Option<> so bare weight files deserialize cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
}
