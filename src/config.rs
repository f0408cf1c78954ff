use crate::error::{PredictorError, Result};
use std::env;

/// Strategy adjustment triggers and analysis windows.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjusterSettings {
    /// Records used for the "recent accuracy" comparison.
    pub recent_window: usize,
    /// Records fed to the adjustment rule.
    pub analysis_window: usize,
    /// Minimum evaluated records before any adjustment.
    pub min_records: usize,
    /// All-time minus recent accuracy that triggers an adjustment.
    pub accuracy_drop_threshold: f64,
    /// Consecutive incorrect records that trigger an adjustment.
    pub losing_streak: usize,
    /// Confidence at or above which a prediction counts as high confidence.
    pub high_confidence: f64,
    /// Confidence at or below which a prediction counts as low confidence.
    pub low_confidence: f64,
    /// Accuracy a confidence bucket must reach to be considered reliable.
    pub confidence_accuracy_floor: f64,
}

impl Default for AdjusterSettings {
    fn default() -> Self {
        Self {
            recent_window: 20,
            analysis_window: 50,
            min_records: 10,
            accuracy_drop_threshold: 0.05,
            losing_streak: 5,
            high_confidence: 0.7,
            low_confidence: 0.3,
            confidence_accuracy_floor: 0.6,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file shared by both loops.
    pub database_path: String,
    /// Trading pair to predict.
    pub symbol: String,
    /// Binance REST base URL.
    pub binance_api_url: String,
    /// Kline interval requested from Binance.
    pub kline_interval: String,
    /// Number of klines fetched per generation cycle.
    pub kline_limit: u32,
    /// Seconds between prediction generations.
    pub generation_interval_secs: u64,
    /// Seconds between evaluation passes.
    pub evaluation_interval_secs: u64,
    /// Forecast horizon in minutes.
    pub evaluation_window_minutes: i64,
    /// Extra delay after the window before evaluating.
    pub evaluation_buffer_minutes: i64,
    /// Adjustment triggers.
    pub adjuster: AdjusterSettings,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = AdjusterSettings::default();
        let adjuster = AdjusterSettings {
            accuracy_drop_threshold: parse_env("ADJUST_ACCURACY_DROP")
                .unwrap_or(defaults.accuracy_drop_threshold),
            losing_streak: parse_env("ADJUST_LOSING_STREAK").unwrap_or(defaults.losing_streak),
            ..defaults
        };

        Self {
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "omen.db".to_string()),
            symbol: env::var("SYMBOL").unwrap_or_else(|_| "BTCUSDT".to_string()),
            binance_api_url: env::var("BINANCE_API_URL")
                .unwrap_or_else(|_| "https://api.binance.com/api/v3".to_string()),
            kline_interval: env::var("KLINE_INTERVAL").unwrap_or_else(|_| "1m".to_string()),
            kline_limit: parse_env("KLINE_LIMIT").unwrap_or(50),
            generation_interval_secs: parse_env("GENERATION_INTERVAL_SECS").unwrap_or(60),
            evaluation_interval_secs: parse_env("EVALUATION_INTERVAL_SECS").unwrap_or(900),
            evaluation_window_minutes: parse_env("EVALUATION_WINDOW_MINUTES").unwrap_or(15),
            evaluation_buffer_minutes: parse_env("EVALUATION_BUFFER_MINUTES").unwrap_or(5),
            adjuster,
        }
    }
}

impl Config {
    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(PredictorError::Config("SYMBOL must not be empty".into()));
        }
        if self.kline_limit == 0 || self.kline_limit > 1000 {
            return Err(PredictorError::Config(format!(
                "KLINE_LIMIT must be between 1 and 1000, got {}",
                self.kline_limit
            )));
        }
        if self.evaluation_window_minutes <= 0 {
            return Err(PredictorError::Config(format!(
                "EVALUATION_WINDOW_MINUTES must be positive, got {}",
                self.evaluation_window_minutes
            )));
        }
        if self.evaluation_buffer_minutes < 0 {
            return Err(PredictorError::Config(format!(
                "EVALUATION_BUFFER_MINUTES must not be negative, got {}",
                self.evaluation_buffer_minutes
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
