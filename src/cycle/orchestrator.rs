//! One evaluation cycle:
//! ANALYZE → STRATEGIZE → SIMULATE → ADAPT → PERSIST → LEARN
//!
//! Stages run strictly in order on a single task. A stage that fails aborts
//! the cycle before PERSIST, so a partial cycle is never recorded.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::learning::{LearningEngine, ModelUpdate, Pattern, Performance};
use super::record::CycleRecord;
use super::simulation::simulate_strategy;
use super::store::CycleStore;
use crate::agent::{AgentRegistry, Capability, MarketAnalysis, StrategyDesign};
use crate::config::OrchestratorConfig;
use crate::error::{Result, SparkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Analyze,
    Strategize,
    Simulate,
    Adapt,
    Persist,
    Learn,
}

impl CycleStage {
    pub const ALL: [CycleStage; 6] = [
        CycleStage::Analyze,
        CycleStage::Strategize,
        CycleStage::Simulate,
        CycleStage::Adapt,
        CycleStage::Persist,
        CycleStage::Learn,
    ];
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleStage::Analyze => write!(f, "ANALYZE"),
            CycleStage::Strategize => write!(f, "STRATEGIZE"),
            CycleStage::Simulate => write!(f, "SIMULATE"),
            CycleStage::Adapt => write!(f, "ADAPT"),
            CycleStage::Persist => write!(f, "PERSIST"),
            CycleStage::Learn => write!(f, "LEARN"),
        }
    }
}

/// Aggregates recomputed at the end of a cycle, for display only
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningSummary {
    pub window: usize,
    pub performance: Performance,
    pub patterns: Vec<Pattern>,
    pub suggestion: String,
    pub model_update: ModelUpdate,
}

impl LearningSummary {
    pub fn from_cycles(engine: &LearningEngine, cycles: &[CycleRecord]) -> Self {
        let performance = engine.evaluate_performance(cycles);
        let patterns = engine.detect_patterns(cycles);
        let suggestion = engine.suggest_improvements(&performance).to_string();
        let model_update = engine.update_model(performance.clone(), patterns.clone());

        Self {
            window: cycles.len(),
            performance,
            patterns,
            suggestion,
            model_update,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub record: CycleRecord,
    /// Adaptation text from the strategist; not fed into later cycles
    pub feedback: String,
    pub learning: LearningSummary,
    pub elapsed_ms: u64,
}

pub struct Orchestrator {
    analyst: Arc<dyn MarketAnalysis>,
    strategist: Arc<dyn StrategyDesign>,
    store: Arc<CycleStore>,
    engine: LearningEngine,
    learning_window: usize,
}

impl Orchestrator {
    pub fn new(
        analyst: Arc<dyn MarketAnalysis>,
        strategist: Arc<dyn StrategyDesign>,
        store: Arc<CycleStore>,
        learning_window: usize,
    ) -> Self {
        Self {
            analyst,
            strategist,
            store,
            engine: LearningEngine::new(),
            learning_window,
        }
    }

    /// Borrow the analyst and strategist capabilities from registered agents
    pub fn from_registry(
        registry: &AgentRegistry,
        config: &OrchestratorConfig,
        store: Arc<CycleStore>,
    ) -> Result<Self> {
        let analyst = registry
            .get(&config.analyst_agent)
            .ok_or_else(|| SparkError::AgentNotFound(config.analyst_agent.clone()))?
            .market_analysis()
            .ok_or_else(|| SparkError::MissingCapability {
                agent: config.analyst_agent.clone(),
                capability: Capability::MarketAnalysis.to_string(),
            })?;

        let strategist = registry
            .get(&config.strategist_agent)
            .ok_or_else(|| SparkError::AgentNotFound(config.strategist_agent.clone()))?
            .strategy_design()
            .ok_or_else(|| SparkError::MissingCapability {
                agent: config.strategist_agent.clone(),
                capability: Capability::StrategyDesign.to_string(),
            })?;

        Ok(Self::new(analyst, strategist, store, config.learning_window))
    }

    pub fn store(&self) -> &Arc<CycleStore> {
        &self.store
    }

    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let cycle_id = Uuid::new_v4();
        let started = Instant::now();
        info!(%cycle_id, "Starting cycle");

        let signals = self
            .stage(cycle_id, CycleStage::Analyze, self.analyst.analyze_market())
            .await?;

        let strategy = self
            .stage(
                cycle_id,
                CycleStage::Strategize,
                self.strategist.generate_strategy(&signals),
            )
            .await?;

        debug!(%cycle_id, stage = %CycleStage::Simulate, "Entering stage");
        let results = simulate_strategy(&strategy);

        let feedback = self
            .stage(
                cycle_id,
                CycleStage::Adapt,
                self.strategist.adapt_strategy(&results),
            )
            .await?;

        debug!(%cycle_id, stage = %CycleStage::Persist, "Entering stage");
        let record = self.store.save_cycle(&signals, &strategy, results).await;

        debug!(%cycle_id, stage = %CycleStage::Learn, "Entering stage");
        let learning = self.learn().await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            %cycle_id,
            avg_profit = learning.performance.avg_profit,
            trend = %learning.performance.trend,
            elapsed_ms,
            "Cycle complete"
        );

        Ok(CycleReport {
            cycle_id,
            record,
            feedback,
            learning,
            elapsed_ms,
        })
    }

    /// Recompute aggregates over the most recent window
    pub async fn learn(&self) -> LearningSummary {
        let cycles = self.store.get_last_cycles(self.learning_window).await;
        LearningSummary::from_cycles(&self.engine, &cycles)
    }

    async fn stage<F>(&self, cycle_id: Uuid, stage: CycleStage, fut: F) -> Result<String>
    where
        F: std::future::Future<Output = Result<String>>,
    {
        debug!(%cycle_id, %stage, "Entering stage");
        fut.await.map_err(|e| {
            warn!(%cycle_id, %stage, error = %e, "Stage failed, cycle aborted");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::SimulationResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedAnalyst(&'static str);

    #[async_trait]
    impl MarketAnalysis for FixedAnalyst {
        async fn analyze_market(&self) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingAnalyst;

    #[async_trait]
    impl MarketAnalysis for FailingAnalyst {
        async fn analyze_market(&self) -> Result<String> {
            Err(SparkError::Internal("feed offline".into()))
        }
    }

    #[derive(Default)]
    struct RecordingStrategist {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl StrategyDesign for RecordingStrategist {
        async fn generate_strategy(&self, signals: &str) -> Result<String> {
            self.calls.lock().unwrap().push(format!("generate:{}", signals));
            Ok("buy-low".to_string())
        }

        async fn adapt_strategy(&self, results: &SimulationResult) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("adapt:{}", results.strategy_used));
            Ok("hold steady".to_string())
        }
    }

    #[tokio::test]
    async fn test_cycle_runs_stages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CycleStore::open(dir.path().join("memory.json")).await);
        let strategist = Arc::new(RecordingStrategist::default());
        let orchestrator = Orchestrator::new(
            Arc::new(FixedAnalyst("BULLISH")),
            strategist.clone(),
            store.clone(),
            20,
        );

        let report = orchestrator.run_cycle().await.unwrap();

        assert_eq!(
            *strategist.calls.lock().unwrap(),
            vec!["generate:BULLISH", "adapt:buy-low"]
        );
        assert_eq!(report.feedback, "hold steady");
        assert_eq!(report.record.results.profit, Some(0.0));
        assert_eq!(report.learning.window, 1);
        assert_eq!(report.learning.patterns, vec![Pattern::Negative]);
        assert_eq!(report.learning.model_update.status, "updated");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_failed_stage_persists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CycleStore::open(dir.path().join("memory.json")).await);
        let strategist = Arc::new(RecordingStrategist::default());
        let orchestrator =
            Orchestrator::new(Arc::new(FailingAnalyst), strategist.clone(), store.clone(), 20);

        assert!(orchestrator.run_cycle().await.is_err());
        assert!(strategist.calls.lock().unwrap().is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_learning_window_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CycleStore::open(dir.path().join("memory.json")).await);
        let orchestrator = Orchestrator::new(
            Arc::new(FixedAnalyst("x")),
            Arc::new(RecordingStrategist::default()),
            store,
            2,
        );

        for _ in 0..3 {
            orchestrator.run_cycle().await.unwrap();
        }
        assert_eq!(orchestrator.learn().await.window, 2);
    }

    #[test]
    fn test_stage_order() {
        let names: Vec<String> = CycleStage::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec!["ANALYZE", "STRATEGIZE", "SIMULATE", "ADAPT", "PERSIST", "LEARN"]
        );
    }
}
