//! Agent state lifecycle: one memory document and one journal per agent.

use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::journal::AgentJournal;
use super::memory::{AgentMemory, MemoryStore};
use crate::config::StorageConfig;
use crate::error::Result;

/// Durable state owned by a single agent instance.
///
/// The in-memory document is the source of truth; a failed rewrite is
/// journaled and retried implicitly by the next mutation. Each mutation
/// holds the lock through its rewrite, so rewrites land in mutation order.
pub struct AgentState {
    name: String,
    store: MemoryStore,
    journal: AgentJournal,
    memory: Mutex<AgentMemory>,
}

impl AgentState {
    /// Load the agent's document, or reinitialize and persist a fresh one
    /// when it is missing or unreadable. An unreadable document is moved to
    /// a `.corrupt-<timestamp>` sibling first. Never fails.
    pub fn open(name: &str, storage: &StorageConfig) -> Self {
        let store = MemoryStore::for_agent(&storage.memory_dir, name);
        let journal = AgentJournal::new(&storage.agent_log_dir, name);

        let memory = match store.load() {
            Ok(mut memory) => {
                if memory.agent_name.is_empty() {
                    memory.agent_name = name.to_string();
                }
                memory
            }
            Err(e) => {
                if store.path().exists() {
                    match store.move_aside() {
                        Ok(aside) => warn!(
                            agent = %name,
                            error = %e,
                            moved_to = %aside.display(),
                            "Agent memory unreadable, reinitializing"
                        ),
                        Err(move_err) => warn!(
                            agent = %name,
                            error = %e,
                            move_error = %move_err,
                            "Agent memory unreadable and could not be moved, reinitializing"
                        ),
                    }
                }

                let memory = AgentMemory::new(name);
                if let Err(e) = store.save_blocking(&memory) {
                    warn!(agent = %name, error = %e, "Failed to save agent memory");
                    journal.raw(&format!("[MEMORY ERROR] Failed to save memory: {}", e));
                }
                info!(agent = %name, path = %store.path().display(), "Initialized agent memory");
                memory
            }
        };

        Self {
            name: name.to_string(),
            store,
            journal,
            memory: Mutex::new(memory),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the current document
    pub async fn memory(&self) -> AgentMemory {
        self.memory.lock().await.clone()
    }

    /// Merge top-level fields into the document and rewrite it
    pub async fn update_memory(&self, fields: Map<String, Value>) -> Result<()> {
        let mut memory = self.memory.lock().await;
        memory.merge(fields)?;
        self.persist(&memory).await;
        Ok(())
    }

    /// Append a history record, bump the counter, and rewrite
    pub async fn add_history_entry(&self, task: &str, result: Value) {
        let mut memory = self.memory.lock().await;
        memory.push_history(task, result);
        self.persist(&memory).await;
    }

    /// Remember the latest exchange in `context` and history with one rewrite
    pub async fn record_run(&self, task: &str, output: &str) {
        let mut memory = self.memory.lock().await;
        memory.record_exchange(task, output);
        self.persist(&memory).await;
    }

    /// Best-effort journal line
    pub fn log(&self, message: &str) {
        self.journal.log(message);
    }

    async fn persist(&self, memory: &AgentMemory) {
        if let Err(e) = self.store.save(memory).await {
            warn!(agent = %self.name, error = %e, "Failed to save agent memory");
            self.journal
                .raw(&format!("[MEMORY ERROR] Failed to save memory: {}", e));
        }
    }
}
