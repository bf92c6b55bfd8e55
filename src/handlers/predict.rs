//! Prediction handlers

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::features::{FeatureRecord, FieldError, FieldErrors};
use crate::model::PredictionResult;
use crate::{AppError, AppResult, AppState};

/// Prediction plus the time it was served
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    #[serde(flatten)]
    pub result: PredictionResult,
    pub timestamp: String,
}

impl From<PredictionResult> for PredictionResponse {
    fn from(result: PredictionResult) -> Self {
        Self {
            result,
            timestamp: super::timestamp(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchResponse<T> {
    pub predictions: Vec<T>,
    pub count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct BatchQuery {
    /// Score valid records even when others are invalid
    #[serde(default)]
    pub partial: bool,
}

/// One entry of a partial batch
#[derive(Debug, Serialize)]
pub struct BatchSlot {
    pub index: usize,
    /// "ok" or "error"
    pub status: &'static str,
    #[serde(flatten)]
    pub prediction: Option<PredictionResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// Predict heart disease risk for a single patient
pub async fn predict(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<PredictionResponse>> {
    if !state.service.is_ready() {
        return Err(AppError::ModelUnavailable);
    }

    let record = FeatureRecord::from_value(&body)?;
    let result = state.service.predict(&record)?;

    tracing::debug!(
        prediction = result.prediction,
        probability = result.probability,
        risk_level = %result.risk_level,
        "Prediction served"
    );

    Ok(Json(result.into()))
}

/// Predict heart disease risk for multiple patients
pub async fn predict_batch(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
    Json(body): Json<Value>,
) -> AppResult<Response> {
    if !state.service.is_ready() {
        return Err(AppError::ModelUnavailable);
    }

    let patients = patients_of(&body)?;

    if query.partial {
        let slots: Vec<Result<FeatureRecord, FieldErrors>> =
            patients.iter().map(FeatureRecord::from_value).collect();
        let outcomes = state.service.predict_each(&slots)?;

        let predictions: Vec<BatchSlot> = outcomes
            .into_iter()
            .enumerate()
            .map(|(index, outcome)| match outcome {
                Ok(result) => BatchSlot {
                    index,
                    status: "ok",
                    prediction: Some(result.into()),
                    detail: None,
                    fields: Vec::new(),
                },
                Err(errors) => BatchSlot {
                    index,
                    status: "error",
                    prediction: None,
                    detail: Some(errors.to_string()),
                    fields: errors.0,
                },
            })
            .collect();

        let count = predictions.len();
        return Ok(Json(BatchResponse { predictions, count }).into_response());
    }

    let mut records = Vec::with_capacity(patients.len());
    for (index, patient) in patients.iter().enumerate() {
        let record = FeatureRecord::from_value(patient)
            .map_err(|errors| AppError::Validation { index: Some(index), errors })?;
        records.push(record);
    }

    let predictions: Vec<PredictionResponse> = state
        .service
        .predict_batch(&records)?
        .into_iter()
        .map(PredictionResponse::from)
        .collect();

    let count = predictions.len();
    Ok(Json(BatchResponse { predictions, count }).into_response())
}

fn patients_of(body: &Value) -> Result<&Vec<Value>, AppError> {
    match body.get("patients") {
        Some(Value::Array(patients)) => Ok(patients),
        Some(_) => Err(FieldErrors(vec![FieldError::new(
            "patients",
            "type",
            "must be a list of patient objects",
        )])
        .into()),
        None => Err(FieldErrors(vec![FieldError::new("patients", "missing", "field required")]).into()),
    }
}
