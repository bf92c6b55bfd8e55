//! Prometheus text exposition

use std::fmt::Write;

use axum::{extract::State, http::header, response::IntoResponse};

use crate::model::{RiskLevel, StatsSnapshot};
use crate::AppState;

const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Label used while no model is loaded
const NO_MODEL: &str = "none";

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let model_type = state
        .service
        .metadata()
        .map(|m| m.model_kind.as_str())
        .unwrap_or(NO_MODEL);

    let mut body = render(&state.service.stats(), model_type, state.service.is_ready());
    state.http.render(&mut body);

    ([(header::CONTENT_TYPE, CONTENT_TYPE)], body)
}

fn render(stats: &StatsSnapshot, model_type: &str, model_loaded: bool) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "# HELP predictions_total Predictions served, by model and risk level");
    let _ = writeln!(out, "# TYPE predictions_total counter");
    for level in RiskLevel::ALL {
        let _ = writeln!(
            out,
            "predictions_total{{model_type=\"{}\",risk_level=\"{}\"}} {}",
            model_type,
            level.as_str(),
            stats.count_for(level)
        );
    }

    let _ = writeln!(out, "# HELP prediction_failures_total Predict calls that failed inside the model");
    let _ = writeln!(out, "# TYPE prediction_failures_total counter");
    let _ = writeln!(out, "prediction_failures_total {}", stats.failures);

    let _ = writeln!(out, "# HELP prediction_latency_avg_ms Mean scoring latency per call");
    let _ = writeln!(out, "# TYPE prediction_latency_avg_ms gauge");
    let _ = writeln!(out, "prediction_latency_avg_ms {:.3}", stats.avg_latency_ms);

    let _ = writeln!(out, "# HELP model_loaded Whether the model artifacts are loaded");
    let _ = writeln!(out, "# TYPE model_loaded gauge");
    let _ = writeln!(out, "model_loaded {}", u8::from(model_loaded));

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_every_bucket() {
        let stats = StatsSnapshot {
            predictions: 3,
            failures: 1,
            avg_latency_ms: 0.25,
            low: 1,
            moderate: 0,
            high: 0,
            very_high: 2,
        };
        let text = render(&stats, "random_forest", true);

        assert!(text.contains("predictions_total{model_type=\"random_forest\",risk_level=\"Low\"} 1"));
        assert!(text.contains("predictions_total{model_type=\"random_forest\",risk_level=\"Very High\"} 2"));
        assert!(text.contains("prediction_failures_total 1"));
        assert!(text.contains("prediction_latency_avg_ms 0.250"));
        assert!(text.contains("model_loaded 1"));
    }
}
