//! Heart Disease Risk Prediction Service
//!
//! Serves a pre-trained classifier over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      CARDIORISK                          │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌───────────────┐   ┌───────────────┐  │
//! │  │  API       │──▶│  Feature      │──▶│  Prediction   │  │
//! │  │  (Axum)    │   │  Validation   │   │  Service      │  │
//! │  └────────────┘   └───────────────┘   └───────┬───────┘  │
//! │                                               ▼          │
//! │                      ┌──────────────────────────────┐    │
//! │                      │  Scaler → Classifier → Risk  │    │
//! │                      └──────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod features;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod model;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::Config;
pub use error::{AppError, AppResult};
pub use middleware::metrics::HttpMetrics;
pub use model::PredictionService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub config: Arc<Config>,
    pub http: Arc<HttpMetrics>,
}

impl AppState {
    pub fn new(service: PredictionService, config: Config) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
            http: Arc::new(HttpMetrics::default()),
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let api_routes = Router::new()
        .route("/api/v1/predict", post(handlers::predict::predict))
        .route("/api/v1/predict/batch", post(handlers::predict::predict_batch))
        .route("/api/v1/model/info", get(handlers::model::info))
        .route("/api/v1/features", get(handlers::model::features));

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::check))
        .route("/metrics", get(handlers::metrics::metrics))
        .merge(api_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::metrics::track_requests,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}
