//! Standard scaler - per-feature `(x - mean) / scale`
//!
//! Statistics come from the training run; the artifact is a small JSON
//! document so it can be exported from any training stack.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::error::InferenceError;

/// Fitted normalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,

    /// Column names the scaler was fitted with, in fit order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,

    /// Layout hash recorded at export time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_hash: Option<u32>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self {
            mean,
            scale,
            feature_names: None,
            layout_hash: None,
        }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, String> {
        let scaler: Self = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        scaler.check()?;
        Ok(scaler)
    }

    /// Number of input columns
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Structural checks on the stored statistics
    pub fn check(&self) -> Result<(), String> {
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if let Some(i) = self.mean.iter().position(|m| !m.is_finite()) {
            return Err(format!("mean[{}] is not finite", i));
        }
        if let Some(i) = self.scale.iter().position(|s| !s.is_finite() || *s < 0.0) {
            return Err(format!("scale[{}] must be a finite non-negative number", i));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.mean.len() {
                return Err(format!(
                    "{} feature names for {} statistics",
                    names.len(),
                    self.mean.len()
                ));
            }
        }
        Ok(())
    }

    /// Normalize a `(samples, features)` matrix.
    /// A zero scale means the column was constant in training: centre only.
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, InferenceError> {
        if x.ncols() != self.n_features() {
            return Err(InferenceError(format!(
                "scaler expects {} columns, got {}",
                self.n_features(),
                x.ncols()
            )));
        }

        let mean = ArrayView1::from(&self.mean[..]);
        let scale: Array1<f64> = self
            .scale
            .iter()
            .map(|&s| if s == 0.0 { 1.0 } else { s })
            .collect();

        Ok((&x - &mean) / &scale)
    }
}
