//! Resolution telemetry.
//!
//! A bounded ring of samples so long-running hosts keep memory flat; the
//! oldest sample is dropped once the capacity is reached.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use textanchor_core_types::AnchorStrategy;

use crate::types::{duration_ms, ResolutionOutcome};

pub const DEFAULT_METRICS_CAPACITY: usize = 1000;

/// One resolution call.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionSample {
    /// Strategy that produced the accepted span; `None` on failure.
    pub strategy: Option<AnchorStrategy>,
    pub elapsed_ms: f64,
    pub success: bool,
    pub outcome: ResolutionOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub total: u64,
    pub successes: u64,
    pub timeouts: u64,
    pub success_rate: f64,
    pub avg_ms: f64,
    /// Successful resolutions keyed by strategy wire name.
    pub by_strategy: BTreeMap<String, u64>,
}

#[derive(Debug)]
pub struct ResolutionMetrics {
    capacity: usize,
    samples: Mutex<VecDeque<ResolutionSample>>,
}

impl Default for ResolutionMetrics {
    fn default() -> Self {
        Self::new(DEFAULT_METRICS_CAPACITY)
    }
}

impl ResolutionMetrics {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_METRICS_CAPACITY))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(
        &self,
        strategy: Option<AnchorStrategy>,
        outcome: ResolutionOutcome,
        elapsed: Duration,
    ) {
        let sample = ResolutionSample {
            strategy,
            elapsed_ms: duration_ms(elapsed),
            success: outcome.is_success(),
            outcome,
        };
        let mut samples = self.samples.lock();
        while samples.len() >= self.capacity {
            samples.pop_front();
        }
        samples.push_back(sample);
    }

    /// Oldest first.
    pub fn samples(&self) -> Vec<ResolutionSample> {
        self.samples.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }

    pub fn summary(&self) -> MetricsSummary {
        let samples = self.samples.lock();
        let total = samples.len() as u64;
        let mut successes = 0u64;
        let mut timeouts = 0u64;
        let mut total_ms = 0.0;
        let mut by_strategy = BTreeMap::new();

        for sample in samples.iter() {
            total_ms += sample.elapsed_ms;
            if sample.outcome == ResolutionOutcome::TimedOut {
                timeouts += 1;
            }
            if sample.success {
                successes += 1;
                if let Some(strategy) = sample.strategy {
                    *by_strategy
                        .entry(strategy.wire_name().to_string())
                        .or_insert(0) += 1;
                }
            }
        }

        let (success_rate, avg_ms) = if total == 0 {
            (0.0, 0.0)
        } else {
            (successes as f64 / total as f64, total_ms / total as f64)
        };

        MetricsSummary {
            total,
            successes,
            timeouts,
            success_rate,
            avg_ms,
            by_strategy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_drops_oldest_samples() {
        let metrics = ResolutionMetrics::new(3);
        for ms in 1..=5 {
            metrics.record(None, ResolutionOutcome::NotFound, Duration::from_millis(ms));
        }
        assert_eq!(metrics.len(), 3);
        let kept: Vec<f64> = metrics.samples().iter().map(|s| s.elapsed_ms.round()).collect();
        assert_eq!(kept, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn summary_aggregates_outcomes() {
        let metrics = ResolutionMetrics::default();
        metrics.record(
            Some(AnchorStrategy::PathBased),
            ResolutionOutcome::Resolved,
            Duration::from_millis(2),
        );
        metrics.record(
            Some(AnchorStrategy::FuzzyMatch),
            ResolutionOutcome::Resolved,
            Duration::from_millis(4),
        );
        metrics.record(None, ResolutionOutcome::TimedOut, Duration::from_millis(6));
        metrics.record(None, ResolutionOutcome::Invalid, Duration::ZERO);

        let summary = metrics.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.successes, 2);
        assert_eq!(summary.timeouts, 1);
        assert!((summary.success_rate - 0.5).abs() < 1e-9);
        assert!((summary.avg_ms - 3.0).abs() < 1e-6);
        assert_eq!(summary.by_strategy.get("PathBased"), Some(&1));
        assert_eq!(summary.by_strategy.get("OffsetBased"), None);

        metrics.clear();
        assert!(metrics.is_empty());
        assert_eq!(metrics.summary().success_rate, 0.0);
    }
}
