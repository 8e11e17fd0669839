pub mod agent;
pub mod cli;
pub mod config;
pub mod cycle;
pub mod error;
pub mod llm;
pub mod logging;
pub mod persist;
pub mod runtime;

pub use agent::{
    Agent, AgentDescriptor, AgentEnv, AgentManifest, AgentRegistry, Capability, MarketAnalysis,
    StrategyDesign,
};
pub use config::AppConfig;
pub use cycle::{
    CycleDriver, CycleRecord, CycleReport, CycleStore, LearningEngine, Orchestrator,
    SimulationResult,
};
pub use error::{Result, SparkError};
pub use llm::{ChatModel, LlmPipeline, LlmTransport, LLM_ERROR_SENTINEL};
pub use runtime::{CycleMode, Dispatcher, Runtime};
