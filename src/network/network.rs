use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::{error::ModelError, layers::conv::Conv2d, math::tensor::Tensor, network::metadata::ModelMetadata};

/// A feed-forward stack of convolutions; the on-disk weights file is this
/// struct serialized as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Conv2d>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl Network {
    pub fn new(layers: Vec<Conv2d>) -> Network {
        Network { layers, metadata: None }
    }

    /// Number of channels the first layer consumes.
    pub fn input_channels(&self) -> Option<usize> {
        self.layers.first().map(|l| l.in_channels)
    }

    /// Number of channels the last layer produces.
    pub fn output_channels(&self) -> Option<usize> {
        self.layers.last().map(|l| l.out_channels)
    }

    /// Checks every layer's parameter counts and that consecutive layers
    /// agree on channel counts.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.layers.is_empty() {
            return Err(ModelError::EmptyNetwork);
        }
        for (index, layer) in self.layers.iter().enumerate() {
            layer.validate(index)?;
            if index > 0 {
                let prev = &self.layers[index - 1];
                if prev.out_channels != layer.in_channels {
                    return Err(ModelError::InvalidLayer {
                        index,
                        reason: format!(
                            "consumes {} channels but the previous layer produces {}",
                            layer.in_channels, prev.out_channels
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Inference-only forward pass. No intermediate activations are kept.
    pub fn forward(&self, input: &Tensor) -> Result<Tensor, ModelError> {
        let mut layers = self.layers.iter();
        let first = layers.next().ok_or(ModelError::EmptyNetwork)?;
        let mut current = first.forward(input)?;
        for layer in layers {
            current = layer.forward(&current)?;
        }
        Ok(current)
    }

    /// Serializes the network weights to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> std::io::Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
