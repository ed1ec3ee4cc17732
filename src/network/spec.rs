use std::path::Path;

use serde::{Serialize, Deserialize};
use crate::activation::activation::ActivationFunction;
use crate::error::ModelError;
use crate::layers::conv::Conv2d;
use crate::network::{metadata::ModelMetadata, network::Network};

/// Describes one convolution in a network specification.
///
/// Fields:
/// - `in_channels`  — channels consumed (the previous layer's `out_channels`,
///                    or the replicated input channel count for the first layer)
/// - `out_channels` — channels produced
/// - `kernel_size`  — odd square kernel edge
/// - `activation`   — applied after the convolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel_size: usize,
    pub activation: ActivationFunction,
}

/// A serializable architecture description without weights.
///
/// `build` turns it into a freshly initialised `Network`, which is how a
/// weights file is produced when no pretrained artifact is available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name stored in the weights file metadata.
    pub name: String,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl NetworkSpec {
    /// A deep-image-prior style encoder stack: `depth` 3x3 LeakyReLU
    /// convolutions of width `hidden`, then a 1x1 sigmoid projection to
    /// `output_channels` (1 for grayscale, 3 for RGB output).
    pub fn deep_image_prior(input_channels: usize, hidden: usize, depth: usize, output_channels: usize) -> NetworkSpec {
        let mut layers = Vec::with_capacity(depth + 1);
        let mut in_channels = input_channels;
        for _ in 0..depth {
            layers.push(LayerSpec {
                in_channels,
                out_channels: hidden,
                kernel_size: 3,
                activation: ActivationFunction::LeakyReLU { alpha: 0.2 },
            });
            in_channels = hidden;
        }
        layers.push(LayerSpec {
            in_channels,
            out_channels: output_channels,
            kernel_size: 1,
            activation: ActivationFunction::Sigmoid,
        });
        NetworkSpec {
            name: "deep-image-prior".to_owned(),
            layers,
            metadata: Some(ModelMetadata {
                name: Some("deep-image-prior".to_owned()),
                description: Some(format!(
                    "{} input channels, {} hidden x {}, {} output channels",
                    input_channels, hidden, depth, output_channels
                )),
            }),
        }
    }

    /// Builds a He-initialised network and validates the layer chain.
    pub fn build(&self) -> Result<Network, ModelError> {
        let layers = self.layers.iter()
            .map(|l| Conv2d::new(l.in_channels, l.out_channels, l.kernel_size, l.activation.clone()))
            .collect();
        let mut network = Network::new(layers);
        network.metadata = Some(self.metadata.clone().unwrap_or_else(|| ModelMetadata {
            name: Some(self.name.clone()),
            description: None,
        }));
        network.validate()?;
        Ok(network)
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> std::io::Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
