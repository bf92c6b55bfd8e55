//! Prediction Service
//!
//! Owns the loaded artifacts for the lifetime of the server. Loading takes
//! `&mut self` and happens before the service is shared, so every predict
//! call afterwards works on immutable data without locks.

use std::time::Instant;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::features::{feature_names, FeatureRecord, FieldErrors, FEATURE_COUNT};

use super::artifacts::{ArtifactPaths, ModelArtifacts, ModelMetadata};
use super::error::{InferenceError, PredictionError};
use super::risk::{round_probability, RiskLevel};
use super::stats::{InferenceStats, StatsSnapshot};

/// Prediction output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 0 = no disease risk, 1 = at risk
    pub prediction: u8,
    /// P(at risk), rounded to 2 decimals
    pub probability: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug)]
pub struct PredictionService {
    paths: ArtifactPaths,
    artifacts: Option<ModelArtifacts>,
    load_error: Option<String>,
    stats: InferenceStats,
}

impl PredictionService {
    /// Not ready until `load` succeeds
    pub fn new(paths: ArtifactPaths) -> Self {
        Self {
            paths,
            artifacts: None,
            load_error: None,
            stats: InferenceStats::default(),
        }
    }

    /// Ready service wrapping already-built artifacts
    pub fn with_artifacts(artifacts: ModelArtifacts) -> Self {
        let paths = ArtifactPaths::new(
            &artifacts.metadata().model_path,
            &artifacts.metadata().scaler_path,
        );
        Self {
            paths,
            artifacts: Some(artifacts),
            load_error: None,
            stats: InferenceStats::default(),
        }
    }

    /// Load the model/scaler pair. Never panics; failure leaves the service
    /// not ready and is logged. There is no retry: a restart is required.
    pub fn load(&mut self) -> bool {
        tracing::info!(
            model = %self.paths.model.display(),
            scaler = %self.paths.scaler.display(),
            "Loading ML models..."
        );

        match ModelArtifacts::load(&self.paths) {
            Ok(artifacts) => {
                let meta = artifacts.metadata();
                tracing::info!(
                    model_name = %meta.model_name,
                    model_kind = %meta.model_kind,
                    model_sha256 = %meta.model_sha256,
                    scaler_sha256 = %meta.scaler_sha256,
                    "ML models loaded successfully"
                );
                self.artifacts = Some(artifacts);
                self.load_error = None;
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Error loading models");
                self.artifacts = None;
                self.load_error = Some(e.to_string());
                false
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.artifacts.is_some()
    }

    /// Why the last load failed, if it did
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.artifacts.as_ref().map(|a| a.metadata())
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Ordered names of the recognized features
    pub fn describe_features() -> [&'static str; FEATURE_COUNT] {
        feature_names()
    }

    // ========================================================================
    // PREDICTION
    // ========================================================================

    pub fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult, PredictionError> {
        let artifacts = self.artifacts.as_ref().ok_or(PredictionError::ModelUnavailable)?;
        record.check().map_err(PredictionError::Validation)?;

        let mut results = self.run(artifacts, std::slice::from_ref(record))?;
        results
            .pop()
            .ok_or_else(|| PredictionError::Inference(InferenceError("empty result".to_string())))
    }

    /// All-or-nothing: the first invalid record fails the whole batch
    pub fn predict_batch(
        &self,
        records: &[FeatureRecord],
    ) -> Result<Vec<PredictionResult>, PredictionError> {
        let artifacts = self.artifacts.as_ref().ok_or(PredictionError::ModelUnavailable)?;

        for (index, record) in records.iter().enumerate() {
            record
                .check()
                .map_err(|errors| PredictionError::InvalidRecord { index, errors })?;
        }

        self.run(artifacts, records)
    }

    /// One slot per input: invalid records get their own error while the
    /// rest are still scored.
    pub fn predict_each(
        &self,
        records: &[Result<FeatureRecord, FieldErrors>],
    ) -> Result<Vec<Result<PredictionResult, FieldErrors>>, PredictionError> {
        let artifacts = self.artifacts.as_ref().ok_or(PredictionError::ModelUnavailable)?;

        let checked: Vec<Result<FeatureRecord, FieldErrors>> = records
            .iter()
            .map(|slot| match slot {
                Ok(record) => record.check().map(|_| *record),
                Err(errors) => Err(errors.clone()),
            })
            .collect();

        let valid: Vec<FeatureRecord> = checked.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
        let mut scored = self.run(artifacts, &valid)?.into_iter();

        checked
            .into_iter()
            .map(|slot| match slot {
                Ok(_) => scored.next().map(Ok).ok_or_else(|| {
                    PredictionError::Inference(InferenceError("missing batch result".to_string()))
                }),
                Err(errors) => Ok(Err(errors)),
            })
            .collect()
    }

    /// Project, normalize, classify and bucket validated records
    fn run(
        &self,
        artifacts: &ModelArtifacts,
        records: &[FeatureRecord],
    ) -> Result<Vec<PredictionResult>, PredictionError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let start_time = Instant::now();

        let mut data = Vec::with_capacity(records.len() * FEATURE_COUNT);
        for record in records {
            data.extend_from_slice(&record.to_vector());
        }
        let x = Array2::from_shape_vec((records.len(), FEATURE_COUNT), data)
            .map_err(|e| InferenceError(format!("Array error: {}", e)))?;

        let scores = match artifacts.score(x.view()) {
            Ok(scores) => scores,
            Err(e) => {
                self.stats.record_failure();
                tracing::error!(error = %e, rows = records.len(), "Prediction error");
                return Err(e.into());
            }
        };

        let results: Vec<PredictionResult> = scores
            .into_iter()
            .map(|score| {
                let probability = round_probability(score.probability);
                PredictionResult {
                    prediction: score.label,
                    probability,
                    risk_level: RiskLevel::from_probability(probability),
                }
            })
            .collect();

        let elapsed = start_time.elapsed().as_micros() as u64;
        self.stats.record_success(results.iter().map(|r| r.risk_level), elapsed);

        Ok(results)
    }
}
