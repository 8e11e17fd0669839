//! Agents and their durable state
//!
//! This module provides:
//! - The agent capability contract and the static agent manifest
//! - Per-agent memory documents and log journals
//! - The built-in agents: market analyst, strategist, reflective and diagnostics

pub mod diagnostics;
pub mod journal;
pub mod market_analyst;
pub mod memory;
pub mod reflective;
pub mod registry;
pub mod state;
pub mod strategist;
pub mod traits;

pub use diagnostics::DiagnosticsAgent;
pub use journal::AgentJournal;
pub use market_analyst::MarketAnalystAgent;
pub use memory::{AgentMemory, HistoryEntry, Knowledge, MemoryContext, MemoryStore};
pub use reflective::{ReflectionMode, ReflectiveAgent};
pub use registry::{AgentDescriptor, AgentFactory, AgentManifest, AgentRegistry, LoadReport};
pub use state::AgentState;
pub use strategist::StrategistAgent;
pub use traits::{Agent, AgentEnv, AgentRoster, Capability, MarketAnalysis, StrategyDesign};
