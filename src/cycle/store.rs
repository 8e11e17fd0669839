//! Append-only cycle log
//!
//! One JSON document `{"cycles": [...]}` at a fixed path, mirrored in memory.
//! The in-memory copy is authoritative for the process lifetime; a failed
//! rewrite is logged and the next successful one catches the file up.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::record::{CycleLog, CycleRecord, SimulationResult};
use crate::error::{Result, SparkError};
use crate::persist::corrupt_path;

pub struct CycleStore {
    path: PathBuf,
    cycles: RwLock<Vec<CycleRecord>>,
    /// False when an unreadable log could not be moved out of the way
    writable: bool,
}

impl CycleStore {
    /// Open the log at `path`, creating an empty one when absent.
    ///
    /// An unreadable document is renamed to a `.corrupt-<timestamp>` sibling
    /// and the store starts empty. If that rename fails the file is left
    /// untouched and the store keeps its records in memory only.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut writable = true;
        let cycles = match Self::read_log(&path).await {
            Ok(Some(log)) => {
                info!("Loaded {} cycles from {:?}", log.cycles.len(), path);
                log.cycles
            }
            Ok(None) => {
                debug!("No cycle log at {:?}, starting fresh", path);
                if let Err(e) = write_log(&path, &[]).await {
                    error!(error = %e, "Failed to initialize cycle log at {:?}", path);
                }
                Vec::new()
            }
            Err(e) => {
                let aside = corrupt_path(&path);
                match tokio::fs::rename(&path, &aside).await {
                    Ok(()) => warn!(
                        error = %e,
                        "Cycle log at {:?} is unreadable, moved to {:?}", path, aside
                    ),
                    Err(rename_err) => {
                        error!(
                            error = %e,
                            rename_error = %rename_err,
                            "Cycle log at {:?} is unreadable and could not be moved, not writing to it",
                            path
                        );
                        writable = false;
                    }
                }
                Vec::new()
            }
        };

        Self {
            path,
            cycles: RwLock::new(cycles),
            writable,
        }
    }

    async fn read_log(path: &Path) -> Result<Option<CycleLog>> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(path).await?;
        let log: CycleLog = serde_json::from_str(&content)?;
        Ok(Some(log))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record stamped with the current time and rewrite the log.
    /// Returns the stored record.
    pub async fn save_cycle(
        &self,
        signals: &str,
        strategy: &str,
        results: SimulationResult,
    ) -> CycleRecord {
        let record = CycleRecord {
            timestamp: Utc::now(),
            signals: signals.to_string(),
            strategy: strategy.to_string(),
            results,
        };

        let mut cycles = self.cycles.write().await;
        cycles.push(record.clone());

        if !self.writable {
            warn!("Cycle log {:?} is not writable, keeping in memory", self.path);
        } else {
            match write_log(&self.path, &cycles).await {
                Ok(()) => debug!("Saved {} cycles to {:?}", cycles.len(), self.path),
                Err(e) => error!(error = %e, "Failed to persist cycle log, keeping in memory"),
            }
        }

        info!(
            cycle = cycles.len(),
            status = %record.results.status,
            "Cycle recorded"
        );
        record
    }

    /// The last `n` records in chronological order (all of them if fewer)
    pub async fn get_last_cycles(&self, n: usize) -> Vec<CycleRecord> {
        let cycles = self.cycles.read().await;
        let start = cycles.len().saturating_sub(n);
        cycles[start..].to_vec()
    }

    pub async fn len(&self) -> usize {
        self.cycles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cycles.read().await.is_empty()
    }
}

/// Rewrite the whole document through a sibling temp file
async fn write_log(path: &Path, cycles: &[CycleRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let content = serde_json::to_string_pretty(&serde_json::json!({ "cycles": cycles }))?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| SparkError::Persistence(format!("rename {:?}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::simulate_strategy;

    #[tokio::test]
    async fn test_open_initializes_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("memory.json");

        let store = CycleStore::open(&path).await;
        assert!(store.is_empty().await);

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["cycles"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_get_last_cycles_window() {
        let dir = tempfile::tempdir().unwrap();
        let store = CycleStore::open(dir.path().join("memory.json")).await;

        assert!(store.get_last_cycles(5).await.is_empty());

        for i in 0..5 {
            let strategy = format!("s{}", i);
            store
                .save_cycle(&format!("sig{}", i), &strategy, simulate_strategy(&strategy))
                .await;
        }

        let all = store.get_last_cycles(10).await;
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].strategy, "s0");

        let last = store.get_last_cycles(2).await;
        let names: Vec<_> = last.iter().map(|c| c.strategy.as_str()).collect();
        assert_eq!(names, vec!["s3", "s4"]);

        assert!(store.get_last_cycles(0).await.is_empty());
    }

    #[tokio::test]
    async fn test_cycles_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");

        {
            let store = CycleStore::open(&path).await;
            store.save_cycle("BULLISH", "buy-low", simulate_strategy("buy-low")).await;
            store.save_cycle("BEARISH", "sell-high", simulate_strategy("sell-high")).await;
        }

        let reopened = CycleStore::open(&path).await;
        let cycles = reopened.get_last_cycles(10).await;
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[1].signals, "BEARISH");
        assert_eq!(cycles[1].results.strategy_used, "sell-high");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_prior_records_with_naive_timestamps_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        let legacy = serde_json::json!({
            "cycles": [
                {
                    "timestamp": "2025-01-01T10:00:00.123456",
                    "signals": "A",
                    "strategy": "s1",
                    "results": {
                        "timestamp": "2025-01-01T10:00:00.120000",
                        "profit": 0.0,
                        "status": "simulated",
                        "strategy_used": "s1"
                    }
                },
                {
                    "timestamp": "2025-01-01T11:00:00.654321",
                    "signals": "B",
                    "strategy": "s2",
                    "results": {
                        "timestamp": "2025-01-01T11:00:00.650000",
                        "profit": 0.0,
                        "status": "simulated",
                        "strategy_used": "s2"
                    }
                }
            ]
        });
        std::fs::write(&path, legacy.to_string()).unwrap();

        let store = CycleStore::open(&path).await;
        assert_eq!(store.len().await, 2);
        store.save_cycle("C", "s3", simulate_strategy("s3")).await;

        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let signals: Vec<_> = on_disk["cycles"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["signals"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(signals, vec!["A", "B", "C"]);

        let reopened = CycleStore::open(&path).await;
        assert_eq!(reopened.len().await, 3);
    }

    #[tokio::test]
    async fn test_corrupt_log_is_moved_aside_before_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = CycleStore::open(&path).await;
        assert!(store.is_empty().await);

        store.save_cycle("x", "y", simulate_strategy("y")).await;
        let reopened = CycleStore::open(&path).await;
        assert_eq!(reopened.len().await, 1);

        let preserved: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .unwrap()
                    .to_string_lossy()
                    .starts_with("memory.json.corrupt-")
            })
            .collect();
        assert_eq!(preserved.len(), 1);
        assert_eq!(std::fs::read_to_string(&preserved[0]).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn test_write_failure_keeps_memory_copy() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be makes every
        // rewrite fail
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "").unwrap();
        let path = blocker.join("memory.json");

        let store = CycleStore::open(&path).await;
        let record = store.save_cycle("a", "b", simulate_strategy("b")).await;

        assert_eq!(store.get_last_cycles(1).await, vec![record]);
    }
}
