//! Versioned strategy configuration shared by the generator and the adjuster.

use crate::error::{PredictorError, Result};
use crate::services::signals::predictions::with_retry;
use crate::services::SqliteStore;
use crate::types::{StrategyConfig, StrategyVersion};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

/// Current strategy plus its durable history.
///
/// Readers take an `Arc` snapshot; a writer replaces the whole config, so a
/// reader never sees a partially updated one.
pub struct StrategyStore {
    sqlite: Arc<SqliteStore>,
    current: RwLock<Arc<StrategyConfig>>,
    writer: Mutex<()>,
}

impl StrategyStore {
    /// Load the latest version, seeding the defaults on first run.
    pub fn load(sqlite: Arc<SqliteStore>) -> Result<Arc<Self>> {
        let config = with_retry("seed strategy", || {
            sqlite.seed_strategy(&StrategyConfig::default())
        })?;
        info!(
            "Loaded strategy config version {} (threshold {:.2})",
            config.version, config.confidence_threshold
        );

        Ok(Arc::new(Self {
            sqlite,
            current: RwLock::new(Arc::new(config)),
            writer: Mutex::new(()),
        }))
    }

    /// Current configuration.
    pub fn snapshot(&self) -> Arc<StrategyConfig> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Pick up versions written by another process.
    pub fn refresh(&self) -> Result<Arc<StrategyConfig>> {
        let latest = with_retry("refresh strategy", || self.sqlite.latest_strategy())?;
        match latest {
            Some(config) if config.version > self.snapshot().version => {
                debug!("Strategy config refreshed to version {}", config.version);
                Ok(self.swap(config))
            }
            _ => Ok(self.snapshot()),
        }
    }

    /// Write a new version derived from the latest persisted one.
    ///
    /// The result is clamped and versioned by the store before it becomes
    /// visible to readers.
    pub fn update<F>(&self, trigger: &str, update: F) -> Result<Arc<StrategyConfig>>
    where
        F: Fn(&StrategyConfig) -> StrategyConfig,
    {
        let _writer = self
            .writer
            .lock()
            .map_err(|_| PredictorError::Persistence("strategy writer lock poisoned".into()))?;

        let next = with_retry("update strategy", || {
            self.sqlite.update_strategy(trigger, &update)
        })?;
        info!(
            "Strategy config updated to version {} ({})",
            next.version, trigger
        );
        Ok(self.swap(next))
    }

    /// Persisted versions, newest first.
    pub fn history(&self, limit: usize) -> Result<Vec<StrategyVersion>> {
        with_retry("load strategy history", || self.sqlite.strategy_history(limit))
    }

    fn swap(&self, config: StrategyConfig) -> Arc<StrategyConfig> {
        let config = Arc::new(config);
        match self.current.write() {
            Ok(mut guard) => *guard = config.clone(),
            Err(poisoned) => *poisoned.into_inner() = config.clone(),
        }
        config
    }
}
