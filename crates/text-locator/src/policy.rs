use std::time::Duration;

use serde::{Deserialize, Serialize};
use textanchor_core_types::AnchorStrategy;

/// Tunables for the anchoring engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Wall-clock budget for one resolution, checked between strategy attempts.
    pub time_budget_ms: u64,
    /// Minimum similarity a non-exact candidate needs to be accepted.
    pub min_confidence: f64,
    pub fuzzy_threshold: f64,
    pub metrics_capacity: usize,
    pub strategy_order: Vec<AnchorStrategy>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: 50,
            min_confidence: 0.7,
            fuzzy_threshold: 0.7,
            metrics_capacity: 1000,
            strategy_order: AnchorStrategy::fallback_chain(),
        }
    }
}

impl EngineConfig {
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    pub fn with_time_budget_ms(mut self, budget_ms: u64) -> Self {
        self.time_budget_ms = budget_ms;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_metrics_capacity(mut self, capacity: usize) -> Self {
        self.metrics_capacity = capacity;
        self
    }

    /// Recognized strategies from `strategy_order`, deduplicated in order.
    pub fn effective_order(&self) -> Vec<AnchorStrategy> {
        let mut order = Vec::new();
        for strategy in &self.strategy_order {
            if strategy.is_recognized() && !order.contains(strategy) {
                order.push(*strategy);
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_contract() {
        let config = EngineConfig::default();
        assert_eq!(config.time_budget(), Duration::from_millis(50));
        assert_eq!(config.min_confidence, 0.7);
        assert_eq!(config.metrics_capacity, 1000);
        assert_eq!(
            config.effective_order(),
            vec![
                AnchorStrategy::PathBased,
                AnchorStrategy::OffsetBased,
                AnchorStrategy::FuzzyMatch
            ]
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"time_budget_ms": 5, "strategy_order": ["FuzzyMatch", "Bogus", "FuzzyMatch"]}"#)
                .unwrap();
        assert_eq!(config.time_budget_ms, 5);
        assert_eq!(config.fuzzy_threshold, 0.7);
        assert_eq!(config.effective_order(), vec![AnchorStrategy::FuzzyMatch]);
    }
}
