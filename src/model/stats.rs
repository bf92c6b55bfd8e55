//! Inference statistics
//!
//! Lock-free counters updated on every predict call.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use super::risk::RiskLevel;

#[derive(Debug, Default)]
pub struct InferenceStats {
    predictions: AtomicU64,
    failures: AtomicU64,
    latency_us_total: AtomicU64,
    by_risk: [AtomicU64; 4],
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub predictions: u64,
    pub failures: u64,
    pub avg_latency_ms: f64,
    pub low: u64,
    pub moderate: u64,
    pub high: u64,
    pub very_high: u64,
}

impl StatsSnapshot {
    pub fn count_for(&self, level: RiskLevel) -> u64 {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Moderate => self.moderate,
            RiskLevel::High => self.high,
            RiskLevel::VeryHigh => self.very_high,
        }
    }
}

impl InferenceStats {
    /// Record one inference call that scored `levels`
    pub fn record_success(&self, levels: impl IntoIterator<Item = RiskLevel>, elapsed_us: u64) {
        let mut n = 0u64;
        for level in levels {
            self.by_risk[level.index()].fetch_add(1, Ordering::Relaxed);
            n += 1;
        }
        self.predictions.fetch_add(n, Ordering::Relaxed);
        self.latency_us_total.fetch_add(elapsed_us, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let predictions = self.predictions.load(Ordering::Relaxed);
        let sum = self.latency_us_total.load(Ordering::Relaxed);
        let avg_latency_ms = if predictions > 0 {
            (sum as f64 / predictions as f64) / 1000.0
        } else {
            0.0
        };
        let count = |level: RiskLevel| self.by_risk[level.index()].load(Ordering::Relaxed);

        StatsSnapshot {
            predictions,
            failures: self.failures.load(Ordering::Relaxed),
            avg_latency_ms,
            low: count(RiskLevel::Low),
            moderate: count(RiskLevel::Moderate),
            high: count(RiskLevel::High),
            very_high: count(RiskLevel::VeryHigh),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_level() {
        let stats = InferenceStats::default();
        stats.record_success([RiskLevel::Low, RiskLevel::VeryHigh, RiskLevel::Low], 3000);
        stats.record_failure();

        let snap = stats.snapshot();
        assert_eq!(snap.predictions, 3);
        assert_eq!(snap.failures, 1);
        assert_eq!(snap.count_for(RiskLevel::Low), 2);
        assert_eq!(snap.count_for(RiskLevel::VeryHigh), 1);
        assert_eq!(snap.count_for(RiskLevel::High), 0);
        assert!((snap.avg_latency_ms - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = InferenceStats::default().snapshot();
        assert_eq!(snap.predictions, 0);
        assert_eq!(snap.avg_latency_ms, 0.0);
    }
}
