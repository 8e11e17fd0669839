//! Agent-1: cautious market analyst that produces free-text signals.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::state::AgentState;
use super::traits::{Agent, AgentEnv, MarketAnalysis};
use crate::error::Result;
use crate::llm::{is_error_sentinel, prompts, ChatModel};

pub struct MarketAnalystAgent {
    state: AgentState,
    model: Arc<dyn ChatModel>,
}

impl MarketAnalystAgent {
    pub const NAME: &'static str = "MarketAnalyst";

    pub fn new(env: &AgentEnv) -> Self {
        Self {
            state: AgentState::open(Self::NAME, &env.storage),
            model: env.model.clone(),
        }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    async fn analyze(&self, task: &str) -> String {
        self.state.log(&format!("Analyzing: {}", task));

        let signals = self.model.ask(prompts::MARKET_ANALYST_PROMPT, task).await;
        if is_error_sentinel(&signals) {
            warn!(agent = Self::NAME, "Model unavailable during market analysis");
        }

        self.state.record_run(task, &signals).await;
        self.state
            .log(&format!("Produced {} chars of signals", signals.len()));
        signals
    }
}

#[async_trait]
impl Agent for MarketAnalystAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Analyzes the market and reports key signals, trends and scenarios"
    }

    async fn run(&self, task: &str) -> Result<String> {
        let task = task.trim();
        if task.is_empty() {
            return self.analyze_market().await;
        }
        Ok(self.analyze(task).await)
    }

    fn market_analysis(self: Arc<Self>) -> Option<Arc<dyn MarketAnalysis>> {
        Some(self)
    }
}

#[async_trait]
impl MarketAnalysis for MarketAnalystAgent {
    async fn analyze_market(&self) -> Result<String> {
        info!(agent = Self::NAME, "Running market analysis");
        Ok(self.analyze(prompts::MARKET_ANALYSIS_TASK).await)
    }
}
