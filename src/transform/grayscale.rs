use image::DynamicImage;

use crate::error::TransformError;
use crate::transform::Transform;

/// Converts any input to single-channel 8-bit luminance.
///
/// Width and height are unchanged; alpha is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrayscaleTransform;

impl Transform for GrayscaleTransform {
    fn name(&self) -> &'static str {
        "grayscale"
    }

    fn apply(&self, image: DynamicImage) -> Result<DynamicImage, TransformError> {
        Ok(DynamicImage::ImageLuma8(image.to_luma8()))
    }
}
