use chrono::Utc;

use super::record::SimulationResult;

pub const SIMULATED_STATUS: &str = "simulated";

/// Deterministic placeholder for the simulation step: no market computation,
/// always zero profit.
pub fn simulate_strategy(strategy: &str) -> SimulationResult {
    SimulationResult {
        timestamp: Utc::now(),
        profit: Some(0.0),
        status: SIMULATED_STATUS.to_string(),
        strategy_used: strategy.to_string(),
    }
}
