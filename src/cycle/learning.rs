//! Aggregation over a window of cycle records.
//!
//! Every function here is pure: nothing is cached or persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::record::CycleRecord;

pub const REINFORCE_SUGGESTION: &str = "Current strategy is working. Reinforce its parameters.";
pub const CHANGE_SUGGESTION: &str = "Strategy is weak. Try a different approach.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Unknown,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub avg_profit: f64,
    pub trend: Trend,
}

impl Default for Performance {
    fn default() -> Self {
        Self {
            avg_profit: 0.0,
            trend: Trend::Unknown,
        }
    }
}

/// Per-record outcome label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    Positive,
    Negative,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Positive => write!(f, "positive"),
            Pattern::Negative => write!(f, "negative"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelUpdate {
    pub status: String,
    pub performance: Performance,
    pub patterns: Vec<Pattern>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LearningEngine;

impl LearningEngine {
    pub fn new() -> Self {
        Self
    }

    /// Mean profit over the records that carry one
    pub fn evaluate_performance(&self, cycles: &[CycleRecord]) -> Performance {
        let profits: Vec<f64> = cycles.iter().filter_map(|c| c.results.profit).collect();
        if profits.is_empty() {
            return Performance::default();
        }

        let avg_profit = profits.iter().sum::<f64>() / profits.len() as f64;
        let trend = if avg_profit > 0.0 { Trend::Up } else { Trend::Down };

        Performance { avg_profit, trend }
    }

    /// One label per record. A record without profit is labelled negative.
    pub fn detect_patterns(&self, cycles: &[CycleRecord]) -> Vec<Pattern> {
        cycles
            .iter()
            .map(|c| {
                if c.results.is_profitable() {
                    Pattern::Positive
                } else {
                    Pattern::Negative
                }
            })
            .collect()
    }

    pub fn suggest_improvements(&self, performance: &Performance) -> &'static str {
        if performance.avg_profit > 0.0 {
            REINFORCE_SUGGESTION
        } else {
            CHANGE_SUGGESTION
        }
    }

    pub fn update_model(&self, performance: Performance, patterns: Vec<Pattern>) -> ModelUpdate {
        ModelUpdate {
            status: "updated".to_string(),
            performance,
            patterns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::SimulationResult;
    use chrono::Utc;

    fn cycle(profit: Option<f64>) -> CycleRecord {
        CycleRecord {
            timestamp: Utc::now(),
            signals: "s".into(),
            strategy: "x".into(),
            results: SimulationResult {
                timestamp: Utc::now(),
                profit,
                status: "simulated".into(),
                strategy_used: "x".into(),
            },
        }
    }

    #[test]
    fn test_empty_window_is_unknown() {
        let perf = LearningEngine::new().evaluate_performance(&[]);
        assert_eq!(perf.avg_profit, 0.0);
        assert_eq!(perf.trend, Trend::Unknown);
    }

    #[test]
    fn test_mean_and_trend() {
        let engine = LearningEngine::new();

        let up = engine.evaluate_performance(&[cycle(Some(10.0)), cycle(Some(-4.0)), cycle(Some(2.0))]);
        assert!((up.avg_profit - 8.0 / 3.0).abs() < 1e-9);
        assert_eq!(up.trend, Trend::Up);

        let down = engine.evaluate_performance(&[cycle(Some(-1.0)), cycle(Some(-2.0))]);
        assert_eq!(down.avg_profit, -1.5);
        assert_eq!(down.trend, Trend::Down);

        let flat = engine.evaluate_performance(&[cycle(Some(0.0))]);
        assert_eq!(flat.trend, Trend::Down);
    }

    #[test]
    fn test_records_without_profit_are_skipped() {
        let engine = LearningEngine::new();

        let perf = engine.evaluate_performance(&[cycle(None), cycle(Some(4.0))]);
        assert_eq!(perf.avg_profit, 4.0);

        let none = engine.evaluate_performance(&[cycle(None)]);
        assert_eq!(none, Performance::default());
    }

    #[test]
    fn test_patterns_one_per_record() {
        let patterns = LearningEngine::new().detect_patterns(&[
            cycle(Some(3.0)),
            cycle(Some(0.0)),
            cycle(None),
            cycle(Some(-1.0)),
        ]);
        assert_eq!(
            patterns,
            vec![Pattern::Positive, Pattern::Negative, Pattern::Negative, Pattern::Negative]
        );
    }

    #[test]
    fn test_suggestion_and_model_update() {
        let engine = LearningEngine::new();
        let good = Performance { avg_profit: 1.0, trend: Trend::Up };
        assert_eq!(engine.suggest_improvements(&good), REINFORCE_SUGGESTION);
        assert_eq!(engine.suggest_improvements(&Performance::default()), CHANGE_SUGGESTION);

        let update = engine.update_model(good.clone(), vec![Pattern::Positive]);
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["status"], "updated");
        assert_eq!(value["performance"]["trend"], "up");
        assert_eq!(value["patterns"][0], "positive");
    }
}
