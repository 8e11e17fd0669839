//! Agent-2: builds strategies from signals and reviews simulation results.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::state::AgentState;
use super::traits::{Agent, AgentEnv, StrategyDesign};
use crate::cycle::SimulationResult;
use crate::error::Result;
use crate::llm::{is_error_sentinel, prompts, ChatModel};

pub struct StrategistAgent {
    state: AgentState,
    model: Arc<dyn ChatModel>,
}

impl StrategistAgent {
    pub const NAME: &'static str = "Strategist";

    pub fn new(env: &AgentEnv) -> Self {
        Self {
            state: AgentState::open(Self::NAME, &env.storage),
            model: env.model.clone(),
        }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }
}

#[async_trait]
impl Agent for StrategistAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Builds careful, low-risk strategies from market signals"
    }

    /// The task is treated as market signals
    async fn run(&self, task: &str) -> Result<String> {
        self.generate_strategy(task).await
    }

    fn strategy_design(self: Arc<Self>) -> Option<Arc<dyn StrategyDesign>> {
        Some(self)
    }
}

#[async_trait]
impl StrategyDesign for StrategistAgent {
    async fn generate_strategy(&self, signals: &str) -> Result<String> {
        info!(agent = Self::NAME, "Generating strategy");
        self.state.log("Generating strategy from signals");

        let request = prompts::strategy_request(signals);
        let strategy = self.model.ask(prompts::STRATEGIST_PROMPT, &request).await;
        if is_error_sentinel(&strategy) {
            warn!(agent = Self::NAME, "Model unavailable during strategy generation");
        }

        self.state.record_run(signals, &strategy).await;
        Ok(strategy)
    }

    async fn adapt_strategy(&self, results: &SimulationResult) -> Result<String> {
        info!(agent = Self::NAME, status = %results.status, "Adapting strategy");

        let rendered = serde_json::to_string_pretty(results)?;
        let request = prompts::adaptation_request(&rendered);
        let feedback = self.model.ask(prompts::ADAPTATION_PROMPT, &request).await;

        self.state
            .add_history_entry(
                "adapt_strategy",
                json!({ "results": results, "feedback": feedback }),
            )
            .await;
        self.state.log("Recorded adaptation feedback");
        Ok(feedback)
    }
}
