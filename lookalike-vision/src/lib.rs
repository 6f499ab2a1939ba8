pub mod embedding;
pub mod yunet;

#[cfg(feature = "onnx")]
pub mod face;
#[cfg(feature = "onnx")]
pub mod model;
#[cfg(feature = "onnx")]
pub mod pipeline;

// Re-export commonly used types
pub use embedding::Embedding;
pub use yunet::Detection;

#[cfg(feature = "onnx")]
pub use pipeline::{ModelPaths, Pipeline};
