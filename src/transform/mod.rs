//! Image transformations applied to uploaded images.
//!
//! Both transforms sit behind the same [`Transform`] trait so the server can
//! pick one at startup without its handlers knowing which is in use.

pub mod grayscale;
pub mod model;

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageOutputFormat};

use crate::error::TransformError;

pub use grayscale::GrayscaleTransform;
pub use model::{ModelConfig, ModelTransform};

/// Turns one decoded image into another.
pub trait Transform: Send + Sync {
    /// Short identifier used in logs and the health endpoint.
    fn name(&self) -> &'static str;

    fn apply(&self, image: DynamicImage) -> Result<DynamicImage, TransformError>;
}

/// Which transform a process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TransformKind {
    /// 8-bit luminance conversion.
    Grayscale,
    /// Deep-image-prior convolutional network.
    Model,
}

impl TransformKind {
    pub fn build(self, model: ModelConfig) -> Arc<dyn Transform> {
        match self {
            TransformKind::Grayscale => Arc::new(GrayscaleTransform),
            TransformKind::Model => Arc::new(ModelTransform::new(model)),
        }
    }
}

/// Decodes PNG/JPEG/BMP/GIF bytes.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, TransformError> {
    image::load_from_memory(bytes).map_err(TransformError::Decode)
}

/// Encodes an image as PNG.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, TransformError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageOutputFormat::Png)
        .map_err(TransformError::Encode)?;
    Ok(out.into_inner())
}

/// Full pipeline: decode `bytes`, run `transform`, return PNG bytes.
pub fn process_bytes(transform: &dyn Transform, bytes: &[u8]) -> Result<Vec<u8>, TransformError> {
    let input = decode(bytes)?;
    let output = transform.apply(input)?;
    encode_png(&output)
}
