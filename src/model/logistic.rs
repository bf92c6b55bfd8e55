//! Binary logistic regression

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::classifier::{ClassScore, Classifier};
use super::error::InferenceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticRegression {
    /// Signed distance to the separating hyperplane
    pub fn decision_function(&self, row: ArrayView1<'_, f64>) -> f64 {
        row.dot(&ArrayView1::from(&self.coefficients[..])) + self.intercept
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn check(&self) -> Result<(), String> {
        if self.coefficients.is_empty() {
            return Err("no coefficients".to_string());
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("coefficients must be finite".to_string());
        }
        Ok(())
    }

    fn classify(&self, x: ArrayView2<'_, f64>) -> Result<Vec<ClassScore>, InferenceError> {
        if x.ncols() != self.coefficients.len() {
            return Err(InferenceError(format!(
                "logistic regression expects {} features, got {}",
                self.coefficients.len(),
                x.ncols()
            )));
        }

        x.rows()
            .into_iter()
            .map(|row| {
                let z = self.decision_function(row);
                let label = if z > 0.0 { 1 } else { 0 };
                ClassScore::checked(label, sigmoid(z))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_zero_decision_is_half() {
        let model = LogisticRegression {
            coefficients: vec![1.0, -1.0],
            intercept: 0.0,
        };
        let scores = model.classify(array![[2.0, 2.0]].view()).unwrap();
        assert_eq!(scores[0].probability, 0.5);
        assert_eq!(scores[0].label, 0);
    }

    #[test]
    fn test_sign_of_decision_sets_label() {
        let model = LogisticRegression {
            coefficients: vec![2.0],
            intercept: -1.0,
        };
        let scores = model.classify(array![[1.0], [0.0]].view()).unwrap();
        assert_eq!(scores[0].label, 1);
        assert!(scores[0].probability > 0.5);
        assert_eq!(scores[1].label, 0);
        assert!(scores[1].probability < 0.5);
    }

    #[test]
    fn test_extreme_inputs_stay_in_range() {
        let model = LogisticRegression {
            coefficients: vec![1000.0],
            intercept: 0.0,
        };
        let scores = model.classify(array![[5.0], [-5.0]].view()).unwrap();
        assert_eq!(scores[0].probability, 1.0);
        assert_eq!(scores[1].probability, 0.0);
    }

    #[test]
    fn test_rejects_non_finite() {
        let model = LogisticRegression {
            coefficients: vec![f64::NAN],
            intercept: 0.0,
        };
        assert!(model.check().is_err());
    }
}
