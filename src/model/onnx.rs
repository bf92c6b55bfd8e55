//! ONNX Runtime classifier
//!
//! Expects a classifier exported with two outputs: the predicted label
//! (int64, `[N]`) and dense class probabilities (float, `[N, 2]`).

use ndarray::{Array2, ArrayView2};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use super::classifier::{ClassScore, Classifier};
use super::error::InferenceError;

pub struct OnnxClassifier {
    // Running a session needs exclusive access
    session: Mutex<Session>,
    label_output: String,
    probability_output: String,
}

impl OnnxClassifier {
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self, InferenceError> {
        tracing::info!("Loading ONNX model from memory ({} bytes)", model_bytes.len());

        let session = Session::builder()
            .map_err(|e| InferenceError(format!("Session builder error: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError(format!("Optimization error: {}", e)))?
            .commit_from_memory(model_bytes)
            .map_err(|e| InferenceError(format!("Load from memory error: {}", e)))?;

        let names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let [label_output, probability_output] = match names.as_slice() {
            [label, probability, ..] => [label.clone(), probability.clone()],
            _ => {
                return Err(InferenceError(format!(
                    "expected label and probability outputs, model has {}",
                    names.len()
                )))
            }
        };

        Ok(Self {
            session: Mutex::new(session),
            label_output,
            probability_output,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn kind(&self) -> &'static str {
        "onnx"
    }

    fn n_features(&self) -> Option<usize> {
        None
    }

    // The runtime validates the graph when the session is built
    fn check(&self) -> Result<(), String> {
        Ok(())
    }

    fn classify(&self, x: ArrayView2<'_, f64>) -> Result<Vec<ClassScore>, InferenceError> {
        let rows = x.nrows();
        let input: Array2<f32> = x.mapv(|v| v as f32);
        let input_tensor = Value::from_array(input)
            .map_err(|e| InferenceError(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError(format!("Inference failed: {}", e)))?;

        let labels = outputs
            .get(&self.label_output)
            .ok_or_else(|| InferenceError("No label output".to_string()))?
            .try_extract_tensor::<i64>()
            .map_err(|e| InferenceError(format!("Extract error: {}", e)))?
            .1
            .to_vec();

        let probabilities = outputs
            .get(&self.probability_output)
            .ok_or_else(|| InferenceError("No probability output".to_string()))?
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError(format!("Extract error: {}", e)))?
            .1
            .to_vec();

        if labels.len() != rows || probabilities.len() != rows * 2 {
            return Err(InferenceError(format!(
                "unexpected output sizes: {} labels, {} probabilities for {} rows",
                labels.len(),
                probabilities.len(),
                rows
            )));
        }

        labels
            .iter()
            .zip(probabilities.chunks_exact(2))
            .map(|(&label, pair)| ClassScore::checked(label, pair[1] as f64))
            .collect()
    }
}
