//! Request metrics middleware
//!
//! Counts every response by method, route and status, and records request
//! duration in a fixed-bucket histogram. Routes are labelled by their
//! matched pattern when there is one.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use parking_lot::Mutex;

use crate::AppState;

/// Upper bounds (seconds) of the duration histogram buckets
pub const DURATION_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

#[derive(Debug, Clone, Default)]
struct Histogram {
    /// Cumulative: `buckets[i]` counts observations `<= DURATION_BUCKETS[i]`
    buckets: [u64; DURATION_BUCKETS.len()],
    count: u64,
    sum: f64,
}

impl Histogram {
    fn observe(&mut self, seconds: f64) {
        for (bucket, bound) in self.buckets.iter_mut().zip(DURATION_BUCKETS) {
            if seconds <= bound {
                *bucket += 1;
            }
        }
        self.count += 1;
        self.sum += seconds;
    }
}

#[derive(Debug, Default)]
struct Series {
    requests: BTreeMap<(String, String, u16), u64>,
    durations: BTreeMap<(String, String), Histogram>,
}

/// Per-route request counters and latency histograms
#[derive(Debug, Default)]
pub struct HttpMetrics {
    series: Mutex<Series>,
}

impl HttpMetrics {
    pub fn record(&self, method: &str, endpoint: &str, status: u16, seconds: f64) {
        let mut series = self.series.lock();
        *series
            .requests
            .entry((method.to_string(), endpoint.to_string(), status))
            .or_insert(0) += 1;
        series
            .durations
            .entry((method.to_string(), endpoint.to_string()))
            .or_default()
            .observe(seconds);
    }

    /// Requests seen for one method/route/status triple
    pub fn request_count(&self, method: &str, endpoint: &str, status: u16) -> u64 {
        let series = self.series.lock();
        series
            .requests
            .get(&(method.to_string(), endpoint.to_string(), status))
            .copied()
            .unwrap_or(0)
    }

    /// Append the Prometheus text exposition of both series
    pub fn render(&self, out: &mut String) {
        let series = self.series.lock();

        // Writing into a String cannot fail
        let _ = writeln!(out, "# HELP http_requests_total Total HTTP requests");
        let _ = writeln!(out, "# TYPE http_requests_total counter");
        for ((method, endpoint, status), count) in &series.requests {
            let _ = writeln!(
                out,
                "http_requests_total{{method=\"{}\",endpoint=\"{}\",status=\"{}\"}} {}",
                method, endpoint, status, count
            );
        }

        let _ = writeln!(out, "# HELP http_request_duration_seconds HTTP request duration");
        let _ = writeln!(out, "# TYPE http_request_duration_seconds histogram");
        for ((method, endpoint), histogram) in &series.durations {
            let labels = format!("method=\"{}\",endpoint=\"{}\"", method, endpoint);
            for (bound, count) in DURATION_BUCKETS.iter().zip(histogram.buckets) {
                let _ = writeln!(
                    out,
                    "http_request_duration_seconds_bucket{{{},le=\"{}\"}} {}",
                    labels, bound, count
                );
            }
            let _ = writeln!(
                out,
                "http_request_duration_seconds_bucket{{{},le=\"+Inf\"}} {}",
                labels, histogram.count
            );
            let _ = writeln!(out, "http_request_duration_seconds_sum{{{}}} {}", labels, histogram.sum);
            let _ = writeln!(out, "http_request_duration_seconds_count{{{}}} {}", labels, histogram.count);
        }
    }
}

/// Record count and duration of every request
pub async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = match req.extensions().get::<MatchedPath>() {
        Some(path) => path.as_str().to_string(),
        None => req.uri().path().to_string(),
    };

    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed();

    let status = response.status().as_u16();
    state.http.record(&method, &endpoint, status, elapsed.as_secs_f64());

    tracing::debug!(
        method = %method,
        endpoint = %endpoint,
        status,
        duration_ms = elapsed.as_secs_f64() * 1000.0,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_buckets_are_cumulative() {
        let mut histogram = Histogram::default();
        histogram.observe(0.003);
        histogram.observe(0.2);
        histogram.observe(30.0);

        assert_eq!(histogram.buckets[0], 1);
        assert_eq!(histogram.buckets[6], 2);
        assert_eq!(histogram.buckets[13], 2);
        assert_eq!(histogram.count, 3);
    }

    #[test]
    fn test_render() {
        let metrics = HttpMetrics::default();
        metrics.record("GET", "/health", 200, 0.001);
        metrics.record("GET", "/health", 200, 0.002);
        metrics.record("POST", "/api/v1/predict", 422, 0.3);

        assert_eq!(metrics.request_count("GET", "/health", 200), 2);
        assert_eq!(metrics.request_count("GET", "/health", 500), 0);

        let mut text = String::new();
        metrics.render(&mut text);
        assert!(text.contains("http_requests_total{method=\"GET\",endpoint=\"/health\",status=\"200\"} 2"));
        assert!(text.contains(
            "http_request_duration_seconds_bucket{method=\"POST\",endpoint=\"/api/v1/predict\",le=\"0.25\"} 0"
        ));
        assert!(text.contains(
            "http_request_duration_seconds_bucket{method=\"POST\",endpoint=\"/api/v1/predict\",le=\"0.5\"} 1"
        ));
        assert!(text.contains("http_request_duration_seconds_count{method=\"GET\",endpoint=\"/health\"} 2"));
    }
}
