//! HTTP handlers

pub mod health;
pub mod metrics;
pub mod model;
pub mod predict;

/// UTC timestamp attached to responses
pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
