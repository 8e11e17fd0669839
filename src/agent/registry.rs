//! Agent registry built from a static manifest.
//!
//! The manifest maps stable names to constructors. `load()` builds one
//! instance per descriptor; a descriptor that cannot be built (error, panic,
//! missing `run` capability, duplicate name) is logged and skipped while the
//! rest of the table is still built.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{info, warn};

use super::diagnostics::DiagnosticsAgent;
use super::market_analyst::MarketAnalystAgent;
use super::reflective::ReflectiveAgent;
use super::strategist::StrategistAgent;
use super::traits::{Agent, AgentEnv, Capability};
use crate::error::{Result, SparkError};

pub type AgentFactory = Arc<dyn Fn(&AgentEnv) -> Result<Arc<dyn Agent>> + Send + Sync>;

/// One manifest entry
#[derive(Clone)]
pub struct AgentDescriptor {
    pub name: String,
    pub capabilities: Vec<Capability>,
    factory: AgentFactory,
}

impl AgentDescriptor {
    pub fn new<F>(name: impl Into<String>, capabilities: &[Capability], factory: F) -> Self
    where
        F: Fn(&AgentEnv) -> Result<Arc<dyn Agent>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            capabilities: capabilities.to_vec(),
            factory: Arc::new(factory),
        }
    }

    /// Case-insensitive registry key
    pub fn key(&self) -> String {
        canonical_key(&self.name)
    }

    pub fn is_runnable(&self) -> bool {
        self.capabilities.contains(&Capability::Run)
    }

    fn build(&self, env: &AgentEnv) -> Result<Arc<dyn Agent>> {
        if !self.is_runnable() {
            return Err(SparkError::MissingCapability {
                agent: self.name.clone(),
                capability: Capability::Run.to_string(),
            });
        }

        match catch_unwind(AssertUnwindSafe(|| (self.factory)(env))) {
            Ok(result) => result,
            Err(_) => Err(SparkError::Internal("constructor panicked".to_string())),
        }
    }
}

impl fmt::Debug for AgentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentDescriptor")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

pub fn canonical_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Ordered list of agent descriptors known to the process
#[derive(Debug, Clone, Default)]
pub struct AgentManifest {
    descriptors: Vec<AgentDescriptor>,
}

impl AgentManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, descriptor: AgentDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn descriptors(&self) -> &[AgentDescriptor] {
        &self.descriptors
    }

    /// The agents shipped with the runtime
    pub fn builtin() -> Self {
        use Capability::*;

        Self::new()
            .with(AgentDescriptor::new(
                MarketAnalystAgent::NAME,
                &[Run, MarketAnalysis],
                |env| Ok(Arc::new(MarketAnalystAgent::new(env)) as Arc<dyn Agent>),
            ))
            .with(AgentDescriptor::new(
                StrategistAgent::NAME,
                &[Run, StrategyDesign],
                |env| Ok(Arc::new(StrategistAgent::new(env)) as Arc<dyn Agent>),
            ))
            .with(AgentDescriptor::new(
                ReflectiveAgent::NAME,
                &[Run, Reflection],
                |env| Ok(Arc::new(ReflectiveAgent::new(env)) as Arc<dyn Agent>),
            ))
            .with(AgentDescriptor::new(
                DiagnosticsAgent::NAME,
                &[Run, Diagnostics],
                |env| Ok(Arc::new(DiagnosticsAgent::new(env)) as Arc<dyn Agent>),
            ))
    }
}

/// Outcome of one `load()` pass
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    /// (descriptor name, reason)
    pub skipped: Vec<(String, String)>,
}

struct RegisteredAgent {
    name: String,
    capabilities: Vec<Capability>,
    handle: Arc<dyn Agent>,
}

/// Table of constructed agents keyed by case-insensitive name
pub struct AgentRegistry {
    manifest: AgentManifest,
    env: AgentEnv,
    agents: Vec<RegisteredAgent>,
    index: HashMap<String, usize>,
}

impl AgentRegistry {
    pub fn new(manifest: AgentManifest, env: AgentEnv) -> Self {
        Self {
            manifest,
            env,
            agents: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Rebuild the table from the manifest. Duplicate names are rejected:
    /// the first descriptor with a given key wins.
    pub fn load(&mut self) -> LoadReport {
        self.agents.clear();
        self.index.clear();

        let mut report = LoadReport::default();

        for descriptor in self.manifest.descriptors() {
            let key = descriptor.key();

            if self.index.contains_key(&key) {
                let err = SparkError::Discovery {
                    agent: descriptor.name.clone(),
                    reason: "duplicate agent name".to_string(),
                };
                warn!(agent = %descriptor.name, error = %err, "Skipping agent");
                report.skipped.push((descriptor.name.clone(), err.to_string()));
                continue;
            }

            match descriptor.build(&self.env) {
                Ok(handle) => {
                    info!(agent = %descriptor.name, "Registered agent");
                    self.index.insert(key, self.agents.len());
                    self.agents.push(RegisteredAgent {
                        name: descriptor.name.clone(),
                        capabilities: descriptor.capabilities.clone(),
                        handle,
                    });
                    report.loaded.push(descriptor.name.clone());
                }
                Err(e) => {
                    let err = SparkError::Discovery {
                        agent: descriptor.name.clone(),
                        reason: e.to_string(),
                    };
                    warn!(agent = %descriptor.name, error = %err, "Skipping agent");
                    report.skipped.push((descriptor.name.clone(), err.to_string()));
                }
            }
        }

        self.env.roster.replace(self.list());
        info!(
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            "Agent registry loaded"
        );
        report
    }

    /// Case-insensitive lookup
    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.index
            .get(&canonical_key(name))
            .map(|&i| self.agents[i].handle.clone())
    }

    /// Registered names in manifest order
    pub fn list(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name.clone()).collect()
    }

    pub fn capabilities(&self, name: &str) -> Option<&[Capability]> {
        self.index
            .get(&canonical_key(name))
            .map(|&i| self.agents[i].capabilities.as_slice())
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn env(&self) -> &AgentEnv {
        &self.env
    }
}
