//! Omen - self-adjusting short-horizon price direction predictor

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

pub use config::Config;
pub use error::{PredictorError, Result};
pub use services::{EngineSettings, EvaluationReport, PredictionEngine, Runner, SqliteStore};
