//! Error types for artifact loading and inference

use std::path::PathBuf;

use thiserror::Error;

use crate::features::FieldErrors;

/// Failure while loading the classifier/scaler pair.
/// Fatal to readiness, never to the process.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt artifact {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("{artifact} expects {found} features, schema has {expected}")]
    WidthMismatch {
        artifact: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("scaler was fitted on a different feature order: {0}")]
    LayoutMismatch(String),

    #[error("unsupported artifact {}: {reason}", .path.display())]
    Unsupported { path: PathBuf, reason: String },
}

/// Unexpected failure inside the scaler or classifier call
#[derive(Debug, Clone, Error)]
#[error("inference failed: {0}")]
pub struct InferenceError(pub String);

/// Failure of a predict call
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("invalid feature record: {0}")]
    Validation(FieldErrors),

    #[error("invalid feature record at index {index}: {errors}")]
    InvalidRecord { index: usize, errors: FieldErrors },

    #[error("model unavailable")]
    ModelUnavailable,

    #[error(transparent)]
    Inference(#[from] InferenceError),
}
