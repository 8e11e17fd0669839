//! Durable per-agent memory document.
//!
//! One JSON document per agent name. Every mutation rewrites the whole
//! document through a temp file + rename, so readers never observe a
//! partially written file. Timestamps are read leniently so documents with
//! `YYYY-MM-DD HH:MM:SS` stamps load instead of being reinitialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, SparkError};
use crate::persist::{corrupt_path, deserialize_timestamp};

/// One completed task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub task: String,
    pub result: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Knowledge {
    pub patterns: Vec<Value>,
    pub custom: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryContext {
    pub last_input: String,
    pub last_output: String,
    pub session_data: Map<String, Value>,
}

/// The memory document owned by one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentMemory {
    pub agent_name: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created: DateTime<Utc>,
    pub tasks_completed: u64,
    pub knowledge: Knowledge,
    pub context: MemoryContext,
    pub history: Vec<HistoryEntry>,
    pub last_task: String,
    pub custom_data: Map<String, Value>,
    /// Top-level keys written by `merge` that have no typed field
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AgentMemory {
    fn default() -> Self {
        Self {
            agent_name: String::new(),
            created: Utc::now(),
            tasks_completed: 0,
            knowledge: Knowledge::default(),
            context: MemoryContext::default(),
            history: Vec::new(),
            last_task: String::new(),
            custom_data: Map::new(),
            extra: Map::new(),
        }
    }
}

impl AgentMemory {
    /// Fresh default schema for `agent_name`
    pub fn new(agent_name: &str) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            ..Self::default()
        }
    }

    /// Append one history record; counter and record move together
    pub fn push_history(&mut self, task: &str, result: Value) {
        self.history.push(HistoryEntry {
            timestamp: Utc::now(),
            task: task.to_string(),
            result,
        });
        self.last_task = task.to_string();
        self.tasks_completed = self.history.len() as u64;
    }

    /// Remember one task/output exchange in `context` and append it to
    /// history as a single mutation
    pub fn record_exchange(&mut self, task: &str, output: &str) {
        self.context.last_input = task.to_string();
        self.context.last_output = output.to_string();
        self.push_history(task, Value::String(output.to_string()));
    }

    /// Shallow-merge top-level fields into the document.
    ///
    /// The document is unchanged if a field has the wrong type for its slot.
    /// `tasks_completed` always follows `history` afterwards.
    pub fn merge(&mut self, fields: Map<String, Value>) -> Result<()> {
        let mut doc = match serde_json::to_value(&*self)? {
            Value::Object(doc) => doc,
            _ => return Err(SparkError::Internal("memory is not a JSON object".to_string())),
        };

        for (key, value) in fields {
            doc.insert(key, value);
        }

        let mut merged: AgentMemory = serde_json::from_value(Value::Object(doc))
            .map_err(|e| SparkError::Validation(format!("memory update rejected: {}", e)))?;
        merged.tasks_completed = merged.history.len() as u64;

        *self = merged;
        Ok(())
    }

    pub fn is_consistent(&self) -> bool {
        self.tasks_completed == self.history.len() as u64
    }
}

/// File location of one agent's memory document
#[derive(Debug, Clone)]
pub struct MemoryStore {
    path: PathBuf,
}

impl MemoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn for_agent<P: AsRef<Path>>(memory_dir: P, agent_name: &str) -> Self {
        Self::new(memory_dir.as_ref().join(format!("{}.json", agent_name)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the document.
    ///
    /// Blocking: only called while an agent is constructed, from the
    /// synchronous registry factories.
    pub fn load(&self) -> Result<AgentMemory> {
        let content = std::fs::read_to_string(&self.path)?;
        let memory: AgentMemory = serde_json::from_str(&content)?;
        Ok(memory)
    }

    /// Move an unreadable document to a `.corrupt-<timestamp>` sibling.
    /// Blocking, like [`load`](Self::load).
    pub fn move_aside(&self) -> Result<PathBuf> {
        let aside = corrupt_path(&self.path);
        std::fs::rename(&self.path, &aside)?;
        Ok(aside)
    }

    /// Rewrite the whole document
    pub async fn save(&self, memory: &AgentMemory) -> Result<()> {
        let content = serde_json::to_string_pretty(memory)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!(path = %self.path.display(), tasks = memory.tasks_completed, "Saved agent memory");
        Ok(())
    }

    /// Blocking variant of [`save`](Self::save) for agent construction
    pub fn save_blocking(&self, memory: &AgentMemory) -> Result<()> {
        let content = serde_json::to_string_pretty(memory)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), "Initialized agent memory document");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}
