//! Process-level context and the dispatch surface used by front-ends.
//!
//! A [`Runtime`] is built once by the entry point and owns the registry,
//! the cycle store and the model collaborator. Several runtimes can coexist
//! in one process (tests do this with separate temp directories).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::agent::{AgentEnv, AgentManifest, AgentRegistry, LoadReport, ReflectiveAgent};
use crate::config::AppConfig;
use crate::cycle::{CycleDriver, CycleStore, LearningEngine, LearningSummary, Orchestrator};
use crate::error::{Result, SparkError};
use crate::llm::{ChatModel, LlmPipeline};

pub struct Runtime {
    config: AppConfig,
    registry: Arc<AgentRegistry>,
    store: Arc<CycleStore>,
    model: Arc<dyn ChatModel>,
    load_report: LoadReport,
}

impl Runtime {
    /// Wire a runtime backed by the HTTP model pipeline
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let pipeline = LlmPipeline::from_config(&config.llm)?;
        Ok(Self::build(config, Arc::new(pipeline), AgentManifest::builtin()).await)
    }

    /// Wire a runtime around an arbitrary model and manifest
    pub async fn build(
        config: AppConfig,
        model: Arc<dyn ChatModel>,
        manifest: AgentManifest,
    ) -> Self {
        let env = AgentEnv::new(model.clone(), config.storage.clone());
        let mut registry = AgentRegistry::new(manifest, env);
        let load_report = registry.load();

        let store = Arc::new(CycleStore::open(config.storage.cycle_log.clone()).await);

        info!(
            agents = registry.len(),
            cycle_log = ?store.path(),
            "Runtime ready"
        );

        Self {
            config,
            registry: Arc::new(registry),
            store,
            model,
            load_report,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<CycleStore> {
        &self.store
    }

    pub fn model(&self) -> &Arc<dyn ChatModel> {
        &self.model
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.registry.clone())
    }

    /// Orchestrator over the configured analyst and strategist agents
    pub fn orchestrator(&self) -> Result<Orchestrator> {
        Orchestrator::from_registry(&self.registry, &self.config.orchestrator, self.store.clone())
    }

    pub fn driver(&self) -> Result<CycleDriver> {
        let orchestrator = Arc::new(self.orchestrator()?);
        Ok(CycleDriver::from_config(orchestrator, &self.config.orchestrator))
    }

    /// Learning aggregates over the last `window` stored cycles
    pub async fn learning_summary(&self, window: usize) -> LearningSummary {
        let cycles = self.store.get_last_cycles(window).await;
        LearningSummary::from_cycles(&LearningEngine::new(), &cycles)
    }
}

/// Named cycle protocols delegated to the reflective agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleMode {
    Short,
    Medium,
    Long,
    Auto,
}

impl CycleMode {
    pub const ALL: [CycleMode; 4] = [
        CycleMode::Short,
        CycleMode::Medium,
        CycleMode::Long,
        CycleMode::Auto,
    ];

    pub fn default_task(&self) -> String {
        format!("run the {} cycle in your internal mode", self)
    }
}

impl fmt::Display for CycleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleMode::Short => write!(f, "short"),
            CycleMode::Medium => write!(f, "medium"),
            CycleMode::Long => write!(f, "long"),
            CycleMode::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for CycleMode {
    type Err = SparkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(CycleMode::Short),
            "medium" => Ok(CycleMode::Medium),
            "long" => Ok(CycleMode::Long),
            "auto" => Ok(CycleMode::Auto),
            other => Err(SparkError::Validation(format!(
                "unknown cycle mode '{}', expected short, medium, long or auto",
                other
            ))),
        }
    }
}

/// Dispatch surface. Every method resolves to a value: lookup failures,
/// agent errors and agent panics all come back as text.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<AgentRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }

    pub fn list_agents(&self) -> Vec<String> {
        self.registry.list()
    }

    pub async fn run_agent(&self, name: &str, task: &str) -> String {
        let Some(agent) = self.registry.get(name) else {
            warn!(agent = %name, "Agent not found");
            return format!(
                "[ERROR] {}. Available agents: {}",
                SparkError::AgentNotFound(name.to_string()),
                self.list_agents().join(", ")
            );
        };

        let agent_name = agent.name().to_string();
        let task = task.to_string();
        // Spawned so a panicking agent surfaces as a JoinError
        let handle = tokio::spawn(async move { agent.run(&task).await });

        match handle.await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                error!(agent = %agent_name, error = %e, "Agent run failed");
                format!("[ERROR] agent '{}' failed: {}", agent_name, e)
            }
            Err(e) => {
                error!(agent = %agent_name, error = %e, "Agent run aborted");
                format!("[ERROR] agent '{}' crashed: {}", agent_name, e)
            }
        }
    }

    /// Run a named cycle protocol on the reflective agent
    pub async fn run_mode(&self, mode: &str, task: Option<&str>) -> String {
        let mode = match mode.parse::<CycleMode>() {
            Ok(mode) => mode,
            Err(e) => return format!("[ERROR] {}", e),
        };

        if self.registry.get(ReflectiveAgent::NAME).is_none() {
            return format!(
                "[ERROR] {}: cycle modes need the reflective agent",
                SparkError::AgentNotFound(ReflectiveAgent::NAME.to_string())
            );
        }

        let task = match task.map(str::trim).filter(|t| !t.is_empty()) {
            Some(task) => task.to_string(),
            None => mode.default_task(),
        };

        info!(%mode, "Running cycle mode");
        self.run_agent(ReflectiveAgent::NAME, &format!("[MODE={}] {}", mode, task))
            .await
    }
}
