pub mod api;
pub mod builder;
pub mod config;
pub mod database;
pub mod error;
pub mod extractor;
pub mod locator;
pub mod matcher;
pub mod service;
pub mod status;

// Re-export vision types for convenience
pub use lookalike_vision::Embedding;
#[cfg(feature = "onnx")]
pub use lookalike_vision::{ModelPaths, Pipeline};

pub use database::{CelebrityRecord, Database};
pub use error::{Error, Result};
pub use extractor::{Extraction, Extractor};
pub use matcher::MatchResult;
pub use service::{DatabaseStatus, Lookalike, QueryPolicy};
pub use status::ProcessingStatus;
