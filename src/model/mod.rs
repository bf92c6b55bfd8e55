//! Model Module - Artifact loading and inference
//!
//! The loader turns two files into an immutable `ModelArtifacts`; the
//! service scores validated records against it.

pub mod artifacts;
pub mod classifier;
pub mod error;
pub mod forest;
pub mod logistic;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod risk;
pub mod scaler;
pub mod service;
pub mod stats;

// Re-export common types
pub use artifacts::{ArtifactPaths, ModelArtifacts, ModelMetadata};
pub use classifier::{ArtifactInfo, ClassScore, Classifier};
pub use error::{ArtifactError, InferenceError, PredictionError};
pub use risk::RiskLevel;
pub use scaler::StandardScaler;
pub use service::{PredictionResult, PredictionService};
pub use stats::StatsSnapshot;
