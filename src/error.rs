use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by tensors and the convolutional network.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("input has {found} channels but the network expects {expected}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("tensor of shape {shape:?} cannot hold {len} values")]
    InvalidTensor { shape: Vec<usize>, len: usize },

    #[error("network has no layers")]
    EmptyNetwork,

    #[error("layer {index}: {reason}")]
    InvalidLayer { index: usize, reason: String },
}

/// Failures anywhere in the decode -> transform -> encode pipeline.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("cannot identify image file: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to load weights from {}: {source}", path.display())]
    Weights {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("network produced {channels} output channels, expected 1 or 3")]
    UnsupportedOutput { channels: usize },

    #[error("failed to encode PNG: {0}")]
    Encode(#[source] image::ImageError),
}

/// Failures of an `ImageStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
