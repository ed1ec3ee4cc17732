pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod transform;
pub mod storage;

// Convenience re-exports
pub use math::tensor::Tensor;
pub use activation::activation::ActivationFunction;
pub use layers::conv::Conv2d;
pub use network::{ModelMetadata, Network, NetworkSpec, LayerSpec};
pub use transform::{GrayscaleTransform, ModelConfig, ModelTransform, Transform, TransformKind};
pub use storage::{DirectoryStore, ImageStore, output_filename};
pub use error::{ModelError, StoreError, TransformError};
