pub mod engine;
pub mod runner;
pub mod signals;
pub mod sqlite_store;
pub mod strategy_store;

pub use engine::{EngineSettings, EvaluationReport, PredictionEngine};
pub use runner::{Runner, RunnerStats};
pub use signals::{
    OutcomeEvaluator, PerformanceAnalyzer, PerformanceSummary, PredictionGenerator,
    PredictionStore, StrategyAdjuster,
};
pub use sqlite_store::{AccuracyStats, SqliteStore};
pub use strategy_store::StrategyStore;
