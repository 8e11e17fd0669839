use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persist::deserialize_timestamp;

/// Outcome of one simulation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Absent in records written by older tools; see `LearningEngine`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit: Option<f64>,
    pub status: String,
    pub strategy_used: String,
}

impl SimulationResult {
    pub fn is_profitable(&self) -> bool {
        self.profit.map_or(false, |p| p > 0.0)
    }
}

/// One completed analyze → strategize → simulate pass, immutable once stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub signals: String,
    pub strategy: String,
    pub results: SimulationResult,
}

/// On-disk layout of the cycle log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct CycleLog {
    #[serde(default)]
    pub cycles: Vec<CycleRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_profit_deserializes_as_none() {
        let value = json!({
            "timestamp": "2024-05-01T12:00:00Z",
            "status": "simulated",
            "strategy_used": "hold"
        });
        let result: SimulationResult = serde_json::from_value(value).unwrap();
        assert_eq!(result.profit, None);
        assert!(!result.is_profitable());
    }

    #[test]
    fn test_reads_records_with_naive_timestamps() {
        let value = json!({
            "timestamp": "2025-01-01T10:00:00.123456",
            "signals": "BULLISH",
            "strategy": "s1",
            "results": {
                "timestamp": "2025-01-01T10:00:00.120001",
                "profit": 0.0,
                "status": "simulated",
                "strategy_used": "s1"
            }
        });
        let record: CycleRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.strategy, "s1");
        assert!(record.results.timestamp <= record.timestamp);
    }

    #[test]
    fn test_record_field_names() {
        let record = CycleRecord {
            timestamp: Utc::now(),
            signals: "BULLISH".into(),
            strategy: "buy-low".into(),
            results: SimulationResult {
                timestamp: Utc::now(),
                profit: Some(1.5),
                status: "simulated".into(),
                strategy_used: "buy-low".into(),
            },
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["signals"], "BULLISH");
        assert_eq!(value["results"]["profit"], 1.5);
        assert_eq!(value["results"]["strategy_used"], "buy-low");
    }
}
