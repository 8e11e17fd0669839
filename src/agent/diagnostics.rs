use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use sysinfo::{Disks, System};
use tracing::{debug, info};

use super::state::AgentState;
use super::traits::{Agent, AgentEnv, AgentRoster};
use crate::config::StorageConfig;
use crate::error::Result;
use crate::llm::{prompts, ChatModel};

/// Collects a runtime snapshot and asks the model for a structured report
pub struct DiagnosticsAgent {
    state: AgentState,
    model: Arc<dyn ChatModel>,
    roster: AgentRoster,
    storage: StorageConfig,
}

const RECENT_ERROR_LIMIT: usize = 10;

impl DiagnosticsAgent {
    pub const NAME: &'static str = "Diagnostics";

    pub fn new(env: &AgentEnv) -> Self {
        Self {
            state: AgentState::open(Self::NAME, &env.storage),
            model: env.model.clone(),
            roster: env.roster.clone(),
            storage: env.storage.clone(),
        }
    }

    /// Raw runtime snapshot fed to the model
    pub async fn snapshot(&self) -> Value {
        let agents = self.roster.names();
        let cwd = std::env::current_dir().unwrap_or_default();

        json!({
            "time": Utc::now().to_rfc3339(),
            "cwd": cwd.display().to_string(),
            "system": system_resources(&cwd).await,
            "agents": {
                "count": agents.len(),
                "names": agents,
            },
            "llm": {
                "endpoints": self.model.endpoints(),
                "recent_errors": recent_errors(&self.storage.agent_log_dir, RECENT_ERROR_LIMIT).await,
            },
            "storage": {
                "memory_dir": self.storage.memory_dir.display().to_string(),
                "agent_log_dir": self.storage.agent_log_dir.display().to_string(),
                "cycle_log": self.storage.cycle_log.display().to_string(),
            },
        })
    }
}

/// CPU load, memory and the disk holding `cwd`
async fn system_resources(cwd: &Path) -> Value {
    let mut sys = System::new();
    // CPU usage is a delta between two refreshes
    sys.refresh_cpu();
    tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
    sys.refresh_cpu();
    sys.refresh_memory();

    let total = sys.total_memory();
    let used = sys.used_memory();

    json!({
        "cpu_percent": sys.global_cpu_info().cpu_usage(),
        "memory": {
            "total": total,
            "available": sys.available_memory(),
            "used": used,
            "percent": percent(used, total),
        },
        "disk": disk_usage(cwd),
    })
}

fn disk_usage(cwd: &Path) -> Value {
    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .filter(|d| cwd.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len());

    match disk {
        Some(disk) => {
            let total = disk.total_space();
            let free = disk.available_space();
            let used = total.saturating_sub(free);
            json!({
                "mount_point": disk.mount_point().display().to_string(),
                "total": total,
                "used": used,
                "free": free,
                "percent": percent(used, total),
            })
        }
        None => Value::Null,
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 1000.0).round() / 10.0
}

/// Last `limit` error lines across the agent journals in `log_dir`
async fn recent_errors(log_dir: &Path, limit: usize) -> Vec<String> {
    let mut journals = Vec::new();
    if let Ok(mut entries) = tokio::fs::read_dir(log_dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "log") {
                journals.push(path);
            }
        }
    }
    journals.sort();

    let mut errors = Vec::new();
    for path in journals {
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => errors.extend(
                content
                    .lines()
                    .filter(|line| line.contains("ERROR"))
                    .map(str::to_string),
            ),
            Err(e) => debug!(path = %path.display(), error = %e, "Skipping unreadable journal"),
        }
    }

    let start = errors.len().saturating_sub(limit);
    errors.split_off(start)
}

#[async_trait]
impl Agent for DiagnosticsAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Internal diagnostics of the runtime, its agents and model endpoints"
    }

    /// `task` is a short trigger such as "full", "quick" or "agents"
    async fn run(&self, task: &str) -> Result<String> {
        let snapshot = self.snapshot().await;
        info!(agent = Self::NAME, mode = task, "Collected diagnostics snapshot");

        let prompt = format!(
            "Here is the data:\n{}\n\nTask mode: {}",
            serde_json::to_string_pretty(&snapshot)?,
            task
        );
        let report = self.model.ask(prompts::DIAGNOSTICS_PROMPT, &prompt).await;

        self.state.record_run(task, &report).await;
        Ok(report)
    }
}
