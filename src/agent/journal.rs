use chrono::Local;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only per-agent log file. Writes are best-effort: every I/O
/// failure is dropped.
#[derive(Debug, Clone)]
pub struct AgentJournal {
    agent_name: String,
    path: PathBuf,
}

impl AgentJournal {
    pub fn new<P: AsRef<Path>>(log_dir: P, agent_name: &str) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            path: log_dir.as_ref().join(format!("{}.log", agent_name)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `[AgentName | HH:MM:SS] message`
    pub fn log(&self, message: &str) {
        let line = format!(
            "[{} | {}] {}",
            self.agent_name,
            Local::now().format("%H:%M:%S"),
            message
        );
        debug!(agent = %self.agent_name, "{}", message);
        self.raw(&line);
    }

    /// Write an unformatted line
    pub fn raw(&self, text: &str) {
        let _ = self.append(text);
    }

    fn append(&self, text: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", text)
    }
}
