//! Health check and root handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    timestamp: String,
    version: String,
    environment: String,
}

/// Liveness plus model readiness. Always 200.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.service.is_ready(),
        timestamp: super::timestamp(),
        version: state.config.app_version.clone(),
        environment: state.config.environment.clone(),
    })
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    message: String,
    name: String,
    version: String,
    status: &'static str,
    health: &'static str,
}

pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("Heart Disease Prediction API - {}", state.config.app_version),
        name: state.config.app_name.clone(),
        version: state.config.app_version.clone(),
        status: "running",
        health: "/health",
    })
}
