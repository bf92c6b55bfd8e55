//! Artifact Loader
//!
//! Reads the classifier/scaler pair from disk and checks both against the
//! feature layout before anything is allowed to serve.

use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::features::{feature_names, layout_hash, FEATURE_COUNT};

use super::classifier::{load_classifier, ArtifactInfo, ClassScore, Classifier};
use super::error::{ArtifactError, InferenceError};
use super::scaler::StandardScaler;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Filesystem locations of the two artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
}

impl ArtifactPaths {
    pub fn new(model: impl Into<PathBuf>, scaler: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            scaler: scaler.into(),
        }
    }
}

/// Model metadata captured at load time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_name: String,
    pub model_kind: String,
    pub version: Option<String>,
    pub trained_at: Option<String>,
    pub accuracy: Option<f64>,
    pub model_path: String,
    pub scaler_path: String,
    pub model_sha256: String,
    pub scaler_sha256: String,
    pub n_features: usize,
    pub layout_hash: u32,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

/// Immutable classifier + scaler pair
pub struct ModelArtifacts {
    classifier: Box<dyn Classifier>,
    scaler: StandardScaler,
    metadata: ModelMetadata,
}

impl std::fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("classifier", &self.classifier.kind())
            .field("metadata", &self.metadata)
            .finish()
    }
}

// ============================================================================
// LOADING
// ============================================================================

impl ModelArtifacts {
    /// Load both artifacts. Either everything succeeds or nothing is kept.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        for path in [&paths.model, &paths.scaler] {
            if !path.exists() {
                return Err(ArtifactError::NotFound(path.clone()));
            }
        }

        let scaler_bytes = read_artifact(&paths.scaler)?;
        let scaler = StandardScaler::from_json(&scaler_bytes).map_err(|reason| {
            ArtifactError::Corrupt {
                path: paths.scaler.clone(),
                reason,
            }
        })?;

        let model_bytes = read_artifact(&paths.model)?;
        let (classifier, info) = load_classifier(&paths.model, &model_bytes)?;

        let metadata = ModelMetadata {
            model_name: info
                .name
                .clone()
                .unwrap_or_else(|| default_model_name(classifier.kind()).to_string()),
            model_kind: classifier.kind().to_string(),
            version: info.version.clone(),
            trained_at: info.trained_at.clone(),
            accuracy: info.accuracy,
            model_path: paths.model.display().to_string(),
            scaler_path: paths.scaler.display().to_string(),
            model_sha256: sha256_hex(&model_bytes),
            scaler_sha256: sha256_hex(&scaler_bytes),
            n_features: FEATURE_COUNT,
            layout_hash: layout_hash(),
            loaded_at: chrono::Utc::now(),
        };

        Self::from_parts(classifier, scaler, metadata)
    }

    /// Assemble from in-memory parts (tests, embedding)
    pub fn new(
        classifier: Box<dyn Classifier>,
        scaler: StandardScaler,
        info: ArtifactInfo,
    ) -> Result<Self, ArtifactError> {
        scaler.check().map_err(|reason| ArtifactError::Corrupt {
            path: PathBuf::from("<memory>"),
            reason,
        })?;

        let kind = classifier.kind();
        let metadata = ModelMetadata {
            model_name: info.name.unwrap_or_else(|| default_model_name(kind).to_string()),
            model_kind: kind.to_string(),
            version: info.version,
            trained_at: info.trained_at,
            accuracy: info.accuracy,
            model_path: "<memory>".to_string(),
            scaler_path: "<memory>".to_string(),
            model_sha256: String::new(),
            scaler_sha256: String::new(),
            n_features: FEATURE_COUNT,
            layout_hash: layout_hash(),
            loaded_at: chrono::Utc::now(),
        };

        Self::from_parts(classifier, scaler, metadata)
    }

    fn from_parts(
        classifier: Box<dyn Classifier>,
        scaler: StandardScaler,
        metadata: ModelMetadata,
    ) -> Result<Self, ArtifactError> {
        classifier.check().map_err(|reason| ArtifactError::Corrupt {
            path: PathBuf::from(&metadata.model_path),
            reason,
        })?;
        check_layout(classifier.as_ref(), &scaler)?;
        Ok(Self {
            classifier,
            scaler,
            metadata,
        })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Normalize then classify a `(samples, FEATURE_COUNT)` matrix
    pub fn score(&self, x: ArrayView2<'_, f64>) -> Result<Vec<ClassScore>, InferenceError> {
        let normalized: Array2<f64> = self.scaler.transform(x)?;
        let scores = self.classifier.classify(normalized.view())?;

        if scores.len() != x.nrows() {
            return Err(InferenceError(format!(
                "classifier returned {} scores for {} rows",
                scores.len(),
                x.nrows()
            )));
        }

        Ok(scores)
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Both artifacts must have been fitted on exactly the schema's columns
fn check_layout(classifier: &dyn Classifier, scaler: &StandardScaler) -> Result<(), ArtifactError> {
    if scaler.n_features() != FEATURE_COUNT {
        return Err(ArtifactError::WidthMismatch {
            artifact: "scaler",
            expected: FEATURE_COUNT,
            found: scaler.n_features(),
        });
    }

    if let Some(found) = classifier.n_features() {
        if found != FEATURE_COUNT {
            return Err(ArtifactError::WidthMismatch {
                artifact: "classifier",
                expected: FEATURE_COUNT,
                found,
            });
        }
    }

    if let Some(names) = &scaler.feature_names {
        let expected = feature_names();
        if names.len() != FEATURE_COUNT {
            return Err(ArtifactError::LayoutMismatch(format!(
                "{} feature names recorded",
                names.len()
            )));
        }
        if let Some(i) = (0..FEATURE_COUNT).find(|&i| names[i] != expected[i]) {
            return Err(ArtifactError::LayoutMismatch(format!(
                "column {} is `{}`, expected `{}`",
                i, names[i], expected[i]
            )));
        }
    }

    if let Some(hash) = scaler.layout_hash {
        if hash != layout_hash() {
            return Err(ArtifactError::LayoutMismatch(format!(
                "layout hash {:08x}, expected {:08x}",
                hash,
                layout_hash()
            )));
        }
    }

    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

fn read_artifact(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn default_model_name(kind: &str) -> &'static str {
    match kind {
        "random_forest" => "RandomForestClassifier",
        "logistic_regression" => "LogisticRegression",
        "onnx" => "OnnxClassifier",
        _ => "Classifier",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::logistic::LogisticRegression;
    use crate::model::forest::{DecisionTree, RandomForest};
    use std::fs;

    const LOGISTIC_JSON: &str = r#"{
        "kind": "logistic_regression",
        "info": {"name": "HeartLogit", "version": "2.0.0"},
        "coefficients": [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0, 1.1, 1.2, 1.3],
        "intercept": -0.5
    }"#;

    fn scaler_json() -> String {
        serde_json::json!({
            "mean": vec![1.0; FEATURE_COUNT],
            "scale": vec![2.0; FEATURE_COUNT],
            "feature_names": feature_names(),
            "layout_hash": layout_hash(),
        })
        .to_string()
    }

    fn write_pair(dir: &Path, model: &str, scaler: &str) -> ArtifactPaths {
        let paths = ArtifactPaths::new(dir.join("model.json"), dir.join("scaler.json"));
        fs::write(&paths.model, model).unwrap();
        fs::write(&paths.scaler, scaler).unwrap();
        paths
    }

    #[test]
    fn test_load_pair() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_pair(dir.path(), LOGISTIC_JSON, &scaler_json());

        let artifacts = ModelArtifacts::load(&paths).unwrap();
        let meta = artifacts.metadata();
        assert_eq!(meta.model_name, "HeartLogit");
        assert_eq!(meta.model_kind, "logistic_regression");
        assert_eq!(meta.version.as_deref(), Some("2.0.0"));
        assert_eq!(meta.n_features, 13);
        assert_eq!(meta.model_sha256.len(), 64);
        assert_eq!(meta.scaler_sha256, sha256_hex(scaler_json().as_bytes()));
    }

    #[test]
    fn test_missing_scaler() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_pair(dir.path(), LOGISTIC_JSON, &scaler_json());
        fs::remove_file(&paths.scaler).unwrap();

        let err = ModelArtifacts::load(&paths).unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound(p) if p == paths.scaler));
    }

    #[test]
    fn test_corrupt_model() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_pair(dir.path(), "{not json", &scaler_json());

        let err = ModelArtifacts::load(&paths).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt { .. }));
    }

    #[test]
    fn test_scaler_width_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let scaler = r#"{"mean":[0.0,0.0],"scale":[1.0,1.0]}"#;
        let paths = write_pair(dir.path(), LOGISTIC_JSON, scaler);

        let err = ModelArtifacts::load(&paths).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::WidthMismatch { artifact: "scaler", expected: 13, found: 2 }
        ));
    }

    #[test]
    fn test_classifier_width_mismatch() {
        let model = LogisticRegression {
            coefficients: vec![1.0; 12],
            intercept: 0.0,
        };
        let scaler = StandardScaler::new(vec![0.0; 13], vec![1.0; 13]);

        let err = ModelArtifacts::new(Box::new(model), scaler, ArtifactInfo::default()).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::WidthMismatch { artifact: "classifier", found: 12, .. }
        ));
    }

    #[test]
    fn test_permuted_scaler_columns() {
        let mut names = feature_names().map(String::from).to_vec();
        names.swap(3, 4);
        let mut scaler = StandardScaler::new(vec![0.0; 13], vec![1.0; 13]);
        scaler.feature_names = Some(names);
        let model = LogisticRegression {
            coefficients: vec![1.0; 13],
            intercept: 0.0,
        };

        let err = ModelArtifacts::new(Box::new(model), scaler, ArtifactInfo::default()).unwrap_err();
        assert!(err.to_string().contains("column 3 is `chol`"));
    }

    #[test]
    fn test_stale_layout_hash() {
        let mut scaler = StandardScaler::new(vec![0.0; 13], vec![1.0; 13]);
        scaler.layout_hash = Some(layout_hash().wrapping_add(1));
        let model = LogisticRegression {
            coefficients: vec![1.0; 13],
            intercept: 0.0,
        };

        let err = ModelArtifacts::new(Box::new(model), scaler, ArtifactInfo::default()).unwrap_err();
        assert!(matches!(err, ArtifactError::LayoutMismatch(_)));
    }

    fn one_split_forest(children_left: Vec<i64>, children_right: Vec<i64>) -> RandomForest {
        RandomForest {
            n_features: 13,
            trees: vec![DecisionTree {
                children_left,
                children_right,
                feature: vec![0, -2],
                threshold: vec![100.0, -2.0],
                value: vec![[1.0, 1.0], [1.0, 1.0]],
            }],
        }
    }

    #[test]
    fn test_in_memory_forest_with_dangling_child_is_rejected() {
        let scaler = StandardScaler::new(vec![0.0; 13], vec![1.0; 13]);
        let forest = one_split_forest(vec![5, -1], vec![1, -1]);

        let err = ModelArtifacts::new(Box::new(forest), scaler, ArtifactInfo::default()).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt { .. }));
        assert!(err.to_string().contains("invalid child 5"));
    }

    #[test]
    fn test_in_memory_forest_with_cycle_is_rejected() {
        let scaler = StandardScaler::new(vec![0.0; 13], vec![1.0; 13]);
        let forest = one_split_forest(vec![0, -1], vec![1, -1]);

        let err = ModelArtifacts::new(Box::new(forest), scaler, ArtifactInfo::default()).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt { .. }));
    }

    #[test]
    fn test_in_memory_non_finite_logistic_is_rejected() {
        let scaler = StandardScaler::new(vec![0.0; 13], vec![1.0; 13]);
        let model = LogisticRegression {
            coefficients: vec![f64::INFINITY; 13],
            intercept: 0.0,
        };

        let err = ModelArtifacts::new(Box::new(model), scaler, ArtifactInfo::default()).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt { .. }));
    }

    #[test]
    fn test_score_normalizes_before_classifying() {
        // Only the first coefficient is non-zero: z = (age - 50) / 10
        let mut coefficients = vec![0.0; 13];
        coefficients[0] = 1.0;
        let model = LogisticRegression {
            coefficients,
            intercept: 0.0,
        };
        let mut mean = vec![0.0; 13];
        mean[0] = 50.0;
        let mut scale = vec![1.0; 13];
        scale[0] = 10.0;
        let artifacts = ModelArtifacts::new(
            Box::new(model),
            StandardScaler::new(mean, scale),
            ArtifactInfo::default(),
        )
        .unwrap();

        let mut row = [0.0; 13];
        row[0] = 50.0;
        let x = Array2::from_shape_vec((1, 13), row.to_vec()).unwrap();
        let scores = artifacts.score(x.view()).unwrap();
        assert_eq!(scores[0].probability, 0.5);
        assert_eq!(artifacts.metadata().model_name, "LogisticRegression");
    }
}
