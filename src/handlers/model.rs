//! Model introspection handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::features::{LayoutInfo, FEATURE_COUNT, FEATURE_SCHEMA};
use crate::model::{ModelMetadata, PredictionService, StatsSnapshot};
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    #[serde(flatten)]
    pub metadata: ModelMetadata,
    pub features: [&'static str; FEATURE_COUNT],
    pub feature_count: usize,
    pub statistics: StatsSnapshot,
}

/// Get model information
pub async fn info(State(state): State<AppState>) -> AppResult<Json<ModelInfoResponse>> {
    let metadata = state
        .service
        .metadata()
        .cloned()
        .ok_or(AppError::ModelUnavailable)?;

    Ok(Json(ModelInfoResponse {
        metadata,
        features: PredictionService::describe_features(),
        feature_count: FEATURE_COUNT,
        statistics: state.service.stats(),
    }))
}

#[derive(Debug, Serialize)]
pub struct FeatureDomain {
    name: &'static str,
    description: &'static str,
    accepts: String,
}

#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    features: Vec<String>,
    feature_count: usize,
    layout_version: u8,
    layout_hash: u32,
    schema: Vec<FeatureDomain>,
}

/// Describe the accepted input fields. Served whether or not a model is loaded.
pub async fn features() -> Json<FeaturesResponse> {
    let layout = LayoutInfo::current();

    let schema = FEATURE_SCHEMA
        .iter()
        .map(|spec| FeatureDomain {
            name: spec.name,
            description: spec.description,
            accepts: spec.domain.describe(),
        })
        .collect();

    Json(FeaturesResponse {
        features: layout.feature_names,
        feature_count: layout.feature_count,
        layout_version: layout.version,
        layout_hash: layout.hash,
        schema,
    })
}
