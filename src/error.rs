//! Error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::features::FieldErrors;
use crate::model::PredictionError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Request errors
    Validation {
        index: Option<usize>,
        errors: FieldErrors,
    },

    // Service state
    ModelUnavailable,

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let (status, body) = match self {
            AppError::Validation { index, errors } => {
                let status = StatusCode::UNPROCESSABLE_ENTITY;
                let detail = match index {
                    Some(i) => format!("Patient at index {} is invalid: {}", i, errors),
                    None => errors.to_string(),
                };
                let mut body = json!({
                    "error": "Validation error",
                    "detail": detail,
                    "fields": errors.fields(),
                    "status": status.as_u16(),
                    "timestamp": timestamp,
                });
                if let Some(i) = index {
                    body["index"] = json!(i);
                }
                (status, body)
            }
            AppError::ModelUnavailable => {
                let status = StatusCode::SERVICE_UNAVAILABLE;
                (
                    status,
                    json!({
                        "error": "Model unavailable",
                        "detail": "The prediction model is not loaded. Please try again later.",
                        "status": status.as_u16(),
                        "timestamp": timestamp,
                    }),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (
                    status,
                    json!({
                        "error": "Internal Server Error",
                        "detail": "An unexpected error occurred. Please try again later.",
                        "status": status.as_u16(),
                        "timestamp": timestamp,
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<PredictionError> for AppError {
    fn from(err: PredictionError) -> Self {
        match err {
            PredictionError::Validation(errors) => AppError::Validation { index: None, errors },
            PredictionError::InvalidRecord { index, errors } => AppError::Validation {
                index: Some(index),
                errors,
            },
            PredictionError::ModelUnavailable => AppError::ModelUnavailable,
            PredictionError::Inference(e) => AppError::InternalError(e.to_string()),
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation { index: None, errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InferenceError;

    #[test]
    fn test_status_codes() {
        let unavailable = AppError::from(PredictionError::ModelUnavailable).into_response();
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);

        let invalid = AppError::from(FieldErrors::body("nope")).into_response();
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let internal = AppError::from(PredictionError::Inference(InferenceError(
            "scaler expects 13 columns, got 12".to_string(),
        )))
        .into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
