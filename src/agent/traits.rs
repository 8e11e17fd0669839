//! Agent capability contract.
//!
//! Every registrable agent implements [`Agent`]. Agents that take part in the
//! evaluation cycle additionally expose [`MarketAnalysis`] or
//! [`StrategyDesign`] through the accessor methods, so the orchestrator can
//! borrow those capabilities from registry handles without downcasting.

use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::config::StorageConfig;
use crate::cycle::SimulationResult;
use crate::error::Result;
use crate::llm::ChatModel;

/// Capabilities an agent descriptor can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `run(task) -> result`; required for registration
    Run,
    MarketAnalysis,
    StrategyDesign,
    Reflection,
    Diagnostics,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Run => write!(f, "run"),
            Capability::MarketAnalysis => write!(f, "market_analysis"),
            Capability::StrategyDesign => write!(f, "strategy_design"),
            Capability::Reflection => write!(f, "reflection"),
            Capability::Diagnostics => write!(f, "diagnostics"),
        }
    }
}

/// A named unit that executes free-text tasks
#[async_trait]
pub trait Agent: Send + Sync {
    /// Canonical registry name
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Execute one task and return its textual result
    async fn run(&self, task: &str) -> Result<String>;

    fn market_analysis(self: Arc<Self>) -> Option<Arc<dyn MarketAnalysis>> {
        None
    }

    fn strategy_design(self: Arc<Self>) -> Option<Arc<dyn StrategyDesign>> {
        None
    }
}

/// Agent-1 capability: produce free-text market signals
#[async_trait]
pub trait MarketAnalysis: Send + Sync {
    async fn analyze_market(&self) -> Result<String>;
}

/// Agent-2 capability: turn signals into a strategy and review results
#[async_trait]
pub trait StrategyDesign: Send + Sync {
    async fn generate_strategy(&self, signals: &str) -> Result<String>;

    /// Qualitative feedback on a simulation outcome
    async fn adapt_strategy(&self, results: &SimulationResult) -> Result<String>;
}

/// Names currently registered, shared with agents that report on the runtime
#[derive(Debug, Clone, Default)]
pub struct AgentRoster(Arc<RwLock<Vec<String>>>);

impl AgentRoster {
    pub fn names(&self) -> Vec<String> {
        self.0
            .read()
            .map(|names| names.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub(crate) fn replace(&self, names: Vec<String>) {
        match self.0.write() {
            Ok(mut guard) => *guard = names,
            Err(poisoned) => *poisoned.into_inner() = names,
        }
    }
}

/// Everything an agent factory may need to construct an agent
#[derive(Clone)]
pub struct AgentEnv {
    pub model: Arc<dyn ChatModel>,
    pub storage: StorageConfig,
    pub roster: AgentRoster,
}

impl AgentEnv {
    pub fn new(model: Arc<dyn ChatModel>, storage: StorageConfig) -> Self {
        Self {
            model,
            storage,
            roster: AgentRoster::default(),
        }
    }
}
