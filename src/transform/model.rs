use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage, RgbImage};
use log::debug;

use crate::error::{ModelError, TransformError};
use crate::math::tensor::Tensor;
use crate::network::Network;
use crate::transform::Transform;

/// Settings for [`ModelTransform`].
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// JSON weights file written by `Network::save_json`.
    pub weights_path: PathBuf,
    /// How many times the luminance channel is replicated before the first
    /// convolution. Must equal the first layer's `in_channels`.
    pub input_channels: usize,
    /// Keep the network in memory after the first load instead of reading
    /// the weights file on every call.
    pub cache_weights: bool,
}

impl ModelConfig {
    pub const DEFAULT_INPUT_CHANNELS: usize = 32;

    pub fn new(weights_path: impl Into<PathBuf>) -> Self {
        ModelConfig {
            weights_path: weights_path.into(),
            input_channels: Self::DEFAULT_INPUT_CHANNELS,
            cache_weights: false,
        }
    }
}

/// Runs a pretrained deep-image-prior network over the luminance of the
/// input image.
///
/// Output pixels are the network output clipped to [0, 1] and rescaled to
/// 8 bits. A 3-channel output becomes an RGB image, a 1-channel output a
/// grayscale one.
pub struct ModelTransform {
    config: ModelConfig,
    cached: Mutex<Option<Arc<Network>>>,
}

impl ModelTransform {
    pub fn new(config: ModelConfig) -> Self {
        ModelTransform { config, cached: Mutex::new(None) }
    }

    fn load_network(&self) -> Result<Arc<Network>, TransformError> {
        if self.config.cache_weights {
            let mut slot = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(net) = slot.as_ref() {
                return Ok(net.clone());
            }
            let net = Arc::new(self.read_weights()?);
            *slot = Some(net.clone());
            return Ok(net);
        }
        Ok(Arc::new(self.read_weights()?))
    }

    fn read_weights(&self) -> Result<Network, TransformError> {
        let path = &self.config.weights_path;
        debug!("Loading network weights from {}", path.display());
        let network = Network::load_json(path)
            .map_err(|source| TransformError::Weights { path: path.clone(), source })?;
        network.validate()?;
        Ok(network)
    }

    /// Builds the `[1, input_channels, h, w]` network input from an image.
    pub fn input_tensor(&self, image: &DynamicImage) -> Result<Tensor, ModelError> {
        let mut gray = image.to_luma8();
        let (width, height) = image.dimensions();
        if gray.dimensions() != (width, height) {
            gray = image::imageops::resize(&gray, width, height, FilterType::Triangle);
        }
        let data = gray.pixels().map(|p| p.0[0] as f64 / 255.0).collect();
        let single = Tensor::from_vec(&[1, 1, height as usize, width as usize], data)?;
        single.replicate_channels(self.config.input_channels)
    }
}

impl Transform for ModelTransform {
    fn name(&self) -> &'static str {
        "model"
    }

    fn apply(&self, image: DynamicImage) -> Result<DynamicImage, TransformError> {
        let input = self.input_tensor(&image)?;
        let network = self.load_network()?;
        let output = network.forward(&input)?;
        tensor_to_image(&output.clamp(0.0, 1.0))
    }
}

fn to_u8(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Converts a clipped `[1, c, h, w]` network output into an 8-bit image.
fn tensor_to_image(output: &Tensor) -> Result<DynamicImage, TransformError> {
    let (_, channels, height, width) = output.dims4()?;
    let invalid = || ModelError::InvalidTensor { shape: output.shape.clone(), len: output.len() };
    match channels {
        3 => {
            let pixels = output.to_channel_last()?.into_iter().map(to_u8).collect();
            let img = RgbImage::from_raw(width as u32, height as u32, pixels).ok_or_else(invalid)?;
            Ok(DynamicImage::ImageRgb8(img))
        }
        1 => {
            let pixels = output.data[..width * height].iter().map(|&v| to_u8(v)).collect();
            let img = GrayImage::from_raw(width as u32, height as u32, pixels).ok_or_else(invalid)?;
            Ok(DynamicImage::ImageLuma8(img))
        }
        channels => Err(TransformError::UnsupportedOutput { channels }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::layers::conv::Conv2d;
    use crate::network::NetworkSpec;
    use image::{ColorType, Luma, Rgb};

    fn write_network(dir: &std::path::Path, net: &Network) -> PathBuf {
        let path = dir.join("weights.json");
        net.save_json(&path).unwrap();
        path
    }

    /// 1x1 convolution averaging all input channels into `out` identical
    /// output channels; with replicated input this reproduces the luma.
    fn averaging_network(input_channels: usize, out: usize) -> Network {
        let w = 1.0 / input_channels as f64;
        Network::new(vec![Conv2d {
            in_channels: input_channels,
            out_channels: out,
            kernel_size: 1,
            weights: vec![w; input_channels * out],
            biases: vec![0.0; out],
            activator: ActivationFunction::Identity,
        }])
    }

    fn config(path: PathBuf, channels: usize) -> ModelConfig {
        ModelConfig { weights_path: path, input_channels: channels, cache_weights: false }
    }

    #[test]
    fn input_tensor_replicates_luma() {
        let t = ModelTransform::new(config(PathBuf::from("unused"), 4));
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, Luma([255])));
        let tensor = t.input_tensor(&img).unwrap();
        assert_eq!(tensor.shape, vec![1, 4, 2, 3]);
        assert!(tensor.data.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn single_channel_output_is_grayscale_and_same_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_network(dir.path(), &averaging_network(32, 1));
        let t = ModelTransform::new(config(path, 32));

        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(6, 5, |x, y| Luma([(x * 40 + y) as u8])));
        let out = t.apply(img.clone()).unwrap();
        assert_eq!(out.color(), ColorType::L8);
        assert_eq!((out.width(), out.height()), (6, 5));
        let (a, b) = (img.to_luma8(), out.to_luma8());
        for (p, q) in a.pixels().zip(b.pixels()) {
            assert!((p.0[0] as i16 - q.0[0] as i16).abs() <= 1);
        }
    }

    #[test]
    fn three_channel_output_becomes_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_network(dir.path(), &averaging_network(8, 3));
        let t = ModelTransform::new(config(path, 8));

        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([128, 128, 128])));
        let out = t.apply(img).unwrap();
        assert_eq!(out.color(), ColorType::Rgb8);
        assert_eq!((out.width(), out.height()), (4, 3));
        let px = out.to_rgb8().get_pixel(1, 1).0;
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }

    #[test]
    fn output_is_clipped_before_scaling() {
        let dir = tempfile::tempdir().unwrap();
        let mut net = averaging_network(2, 1);
        net.layers[0].biases = vec![5.0];
        let path = write_network(dir.path(), &net);
        let t = ModelTransform::new(config(path, 2));

        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([10])));
        let out = t.apply(img).unwrap().to_luma8();
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn random_dip_network_keeps_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let net = NetworkSpec::deep_image_prior(32, 4, 2, 3).build().unwrap();
        let path = write_network(dir.path(), &net);
        let t = ModelTransform::new(config(path, 32));

        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(7, 5, |x, y| Rgb([x as u8 * 20, y as u8 * 40, 90])));
        let out = t.apply(img).unwrap();
        assert_eq!((out.width(), out.height()), (7, 5));
    }

    #[test]
    fn channel_mismatch_is_a_model_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_network(dir.path(), &averaging_network(32, 1));
        let t = ModelTransform::new(config(path, 16));

        let img = DynamicImage::ImageLuma8(GrayImage::new(2, 2));
        let err = t.apply(img).unwrap_err();
        assert!(matches!(err, TransformError::Model(ModelError::ShapeMismatch { expected: 32, found: 16 })));
    }

    #[test]
    fn unsupported_output_channel_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_network(dir.path(), &averaging_network(1, 2));
        let t = ModelTransform::new(config(path, 1));

        let img = DynamicImage::ImageLuma8(GrayImage::new(2, 2));
        let err = t.apply(img).unwrap_err();
        assert!(matches!(err, TransformError::UnsupportedOutput { channels: 2 }));
    }

    #[test]
    fn missing_weights_file() {
        let dir = tempfile::tempdir().unwrap();
        let t = ModelTransform::new(config(dir.path().join("nope.json"), 32));
        let err = t.apply(DynamicImage::ImageLuma8(GrayImage::new(1, 1))).unwrap_err();
        assert!(matches!(err, TransformError::Weights { .. }));
    }

    #[test]
    fn weights_reload_unless_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_network(dir.path(), &averaging_network(1, 1));
        let img = DynamicImage::ImageLuma8(GrayImage::new(1, 1));

        let uncached = ModelTransform::new(config(path.clone(), 1));
        let cached = ModelTransform::new(ModelConfig { cache_weights: true, ..config(path.clone(), 1) });
        uncached.apply(img.clone()).unwrap();
        cached.apply(img.clone()).unwrap();

        std::fs::remove_file(&path).unwrap();
        assert!(uncached.apply(img.clone()).is_err());
        assert!(cached.apply(img).is_ok());
    }
}
