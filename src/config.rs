use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the model server (e.g., "http://localhost:11434")
    pub base_url: String,
    /// Path of the multi-turn chat endpoint
    pub chat_path: String,
    /// Path of the flat-prompt generate endpoint (fallback)
    pub generate_path: String,
    /// Model name sent with every request
    pub model: String,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Extra attempts per endpoint after the first one
    pub retries: u32,
    /// Fixed delay between attempts in milliseconds
    pub retry_delay_ms: u64,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            chat_path: "/api/chat".to_string(),
            generate_path: "/api/generate".to_string(),
            model: "llama3".to_string(),
            api_key: None,
            timeout_secs: 60,
            retries: 2,
            retry_delay_ms: 500,
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 1024,
        }
    }
}

impl LlmConfig {
    pub fn chat_url(&self) -> String {
        join_url(&self.base_url, &self.chat_path)
    }

    pub fn generate_url(&self) -> String {
        join_url(&self.base_url, &self.generate_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one `<Agent>.json` memory document per agent
    pub memory_dir: PathBuf,
    /// Directory holding one `<Agent>.log` journal per agent
    pub agent_log_dir: PathBuf,
    /// Cycle log document
    pub cycle_log: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            memory_dir: PathBuf::from("agent_memory"),
            agent_log_dir: PathBuf::from("agent_logs"),
            cycle_log: PathBuf::from("data/memory.json"),
        }
    }
}

impl StorageConfig {
    /// Re-root every storage path under `dir` (used by tests and `--data-dir`)
    pub fn rooted_at<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            memory_dir: dir.join("agent_memory"),
            agent_log_dir: dir.join("agent_logs"),
            cycle_log: dir.join("data").join("memory.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Number of recent cycles fed to the learning engine
    pub learning_window: usize,
    /// Wait between cycles of the repeating driver
    pub interval_secs: u64,
    /// Cancellation polling granularity during the wait
    pub poll_interval_ms: u64,
    /// Registry name of the market analysis agent
    pub analyst_agent: String,
    /// Registry name of the strategy agent
    pub strategist_agent: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            learning_window: 20,
            interval_secs: 60,
            poll_interval_ms: 250,
            analyst_agent: "MarketAnalyst".to_string(),
            strategist_agent: "Strategist".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Directory for the rolling log file
    pub dir: PathBuf,
    /// Enable JSON formatted logs
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: PathBuf::from("logs"),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("llm.retries", 2)?
            .set_default("orchestrator.learning_window", 20)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("SPARK_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (SPARK_LLM__BASE_URL, etc.)
            .add_source(
                Environment::with_prefix("SPARK")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.llm.model.trim().is_empty() {
            errors.push("llm.model must not be empty".to_string());
        }

        if self.llm.retries > 10 {
            errors.push(format!(
                "llm.retries must be at most 10, got {}",
                self.llm.retries
            ));
        }

        if self.orchestrator.poll_interval_ms == 0 || self.orchestrator.poll_interval_ms >= 1000 {
            errors.push("orchestrator.poll_interval_ms must be between 1 and 999".to_string());
        }

        if self.orchestrator.learning_window == 0 {
            errors.push("orchestrator.learning_window must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
