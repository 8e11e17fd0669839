//! Evaluation cycles: the cycle log, the learning engine and the drivers
//! that run analyze → strategize → simulate → adapt → persist → learn.

pub mod driver;
pub mod learning;
pub mod orchestrator;
pub mod record;
pub mod simulation;
pub mod store;

pub use driver::CycleDriver;
pub use learning::{LearningEngine, ModelUpdate, Pattern, Performance, Trend};
pub use orchestrator::{CycleReport, CycleStage, LearningSummary, Orchestrator};
pub use record::{CycleRecord, SimulationResult};
pub use simulation::simulate_strategy;
pub use store::CycleStore;
