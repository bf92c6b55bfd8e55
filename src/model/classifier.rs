//! Classifier abstraction
//!
//! Every backend answers the same two questions for each row of a
//! normalized matrix: which class, and how likely is class 1.

use std::path::Path;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use super::error::{ArtifactError, InferenceError};
use super::forest::RandomForest;
use super::logistic::LogisticRegression;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Decision + probability for one row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScore {
    /// 0 = no disease risk, 1 = at risk
    pub label: u8,
    /// P(class = 1)
    pub probability: f64,
}

impl ClassScore {
    /// Reject outputs no sane model produces
    pub fn checked(label: i64, probability: f64) -> Result<Self, InferenceError> {
        if label != 0 && label != 1 {
            return Err(InferenceError(format!("classifier returned class {}", label)));
        }
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(InferenceError(format!(
                "classifier returned probability {}",
                probability
            )));
        }
        Ok(Self {
            label: label as u8,
            probability,
        })
    }
}

/// Optional descriptive fields carried inside a classifier artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub trained_at: Option<String>,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Trait for inference backends (native JSON models, ONNX, ...)
pub trait Classifier: Send + Sync {
    /// Model family, e.g. "random_forest"
    fn kind(&self) -> &'static str;

    /// Input width the model was trained on, when the artifact declares it
    fn n_features(&self) -> Option<usize>;

    /// Structural check run before the model is allowed to serve
    fn check(&self) -> Result<(), String>;

    /// Score every row of a normalized `(samples, features)` matrix
    fn classify(&self, x: ArrayView2<'_, f64>) -> Result<Vec<ClassScore>, InferenceError>;
}

// ============================================================================
// JSON ARTIFACTS
// ============================================================================

/// Native classifier families that serialize to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NativeModel {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
}

/// On-disk JSON classifier document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDocument {
    #[serde(default)]
    pub info: ArtifactInfo,
    #[serde(flatten)]
    pub model: NativeModel,
}

impl ModelDocument {
    pub fn from_json(bytes: &[u8]) -> Result<Self, String> {
        let doc: Self = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        doc.model.check()?;
        Ok(doc)
    }
}

impl NativeModel {
    fn check(&self) -> Result<(), String> {
        match self {
            NativeModel::RandomForest(m) => m.check(),
            NativeModel::LogisticRegression(m) => m.check(),
        }
    }

    pub fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            NativeModel::RandomForest(m) => Box::new(m),
            NativeModel::LogisticRegression(m) => Box::new(m),
        }
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Deserialize a classifier, picking the backend from the file extension
pub fn load_classifier(
    path: &Path,
    bytes: &[u8],
) -> Result<(Box<dyn Classifier>, ArtifactInfo), ArtifactError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("onnx") => load_onnx(path, bytes),
        Some("json") => {
            let doc = ModelDocument::from_json(bytes).map_err(|reason| ArtifactError::Corrupt {
                path: path.to_path_buf(),
                reason,
            })?;
            Ok((doc.model.into_classifier(), doc.info))
        }
        _ => Err(ArtifactError::Unsupported {
            path: path.to_path_buf(),
            reason: "expected a .json or .onnx classifier".to_string(),
        }),
    }
}

#[cfg(feature = "onnx")]
fn load_onnx(
    path: &Path,
    bytes: &[u8],
) -> Result<(Box<dyn Classifier>, ArtifactInfo), ArtifactError> {
    let model = super::onnx::OnnxClassifier::from_bytes(bytes).map_err(|e| {
        ArtifactError::Corrupt {
            path: path.to_path_buf(),
            reason: e.0,
        }
    })?;
    let info = ArtifactInfo {
        name: path.file_stem().and_then(|s| s.to_str()).map(str::to_string),
        ..Default::default()
    };
    Ok((Box::new(model), info))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(
    path: &Path,
    _bytes: &[u8],
) -> Result<(Box<dyn Classifier>, ArtifactInfo), ArtifactError> {
    Err(ArtifactError::Unsupported {
        path: path.to_path_buf(),
        reason: "built without the `onnx` feature".to_string(),
    })
}
