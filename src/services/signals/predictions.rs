//! Prediction lifecycle tracking backed by SQLite.

use super::performance::is_call_correct;
use crate::error::Result;
use crate::services::sqlite_store::{AccuracyStats, OutcomeWrite, SqliteStore};
use crate::types::{EvaluatedPrediction, Outcome, Prediction, PredictionRecord};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Store for recording predictions and attaching their outcomes.
pub struct PredictionStore {
    sqlite: Arc<SqliteStore>,
}

impl PredictionStore {
    /// Create a prediction store over a SQLite store.
    pub fn new(sqlite: Arc<SqliteStore>) -> Arc<Self> {
        Arc::new(Self { sqlite })
    }

    pub fn sqlite(&self) -> &Arc<SqliteStore> {
        &self.sqlite
    }

    /// Insert a prediction. Duplicate ids are ignored and return false.
    pub fn insert(&self, prediction: &Prediction) -> Result<bool> {
        let inserted = with_retry("insert prediction", || {
            self.sqlite.insert_prediction(prediction)
        })?;

        if inserted {
            info!(
                "Stored prediction {} {} (confidence {:.2})",
                prediction.id,
                prediction.direction.as_str(),
                prediction.confidence
            );
        } else {
            debug!("Ignoring duplicate prediction {}", prediction.id);
        }
        Ok(inserted)
    }

    /// Get a prediction with its outcome, if any.
    pub fn get(&self, id: &str) -> Result<Option<PredictionRecord>> {
        with_retry("get prediction", || self.sqlite.get_prediction(id))
    }

    /// Pending predictions ready for evaluation at `now`, oldest first.
    pub fn get_ready_for_evaluation(
        &self,
        now: DateTime<Utc>,
        buffer_minutes: i64,
    ) -> Result<Vec<Prediction>> {
        with_retry("scan ready predictions", || {
            self.sqlite.ready_for_evaluation(now, buffer_minutes)
        })
    }

    /// Attach an outcome. Returns false when the id is unknown, already
    /// evaluated, or the outcome precedes the end of the window.
    pub fn record_outcome(&self, outcome: &Outcome) -> Result<bool> {
        let write = with_retry("record outcome", || {
            self.sqlite
                .record_outcome(outcome, |prediction, outcome| {
                    is_call_correct(prediction.direction, outcome)
                })
        })?;

        match write {
            OutcomeWrite::Recorded => {
                info!(
                    "Recorded outcome for {}: {} ({:+.3}%)",
                    outcome.prediction_id,
                    outcome.actual_direction.as_str(),
                    outcome.price_change * 100.0
                );
                Ok(true)
            }
            OutcomeWrite::UnknownPrediction => {
                warn!("Outcome for unknown prediction {}", outcome.prediction_id);
                Ok(false)
            }
            OutcomeWrite::AlreadyEvaluated => {
                debug!("Prediction {} already evaluated", outcome.prediction_id);
                Ok(false)
            }
            OutcomeWrite::BeforeWindowEnd => {
                warn!(
                    "Outcome for {} precedes the end of its window",
                    outcome.prediction_id
                );
                Ok(false)
            }
        }
    }

    /// Number of predictions awaiting an outcome.
    pub fn pending_count(&self) -> Result<usize> {
        with_retry("count pending", || self.sqlite.pending_count())
    }

    /// Evaluated predictions, newest first.
    pub fn evaluated_records(
        &self,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<EvaluatedPrediction>> {
        with_retry("load evaluated", || self.sqlite.evaluated(limit, since))
    }

    /// The `n` most recently generated evaluated predictions, oldest first.
    pub fn recent_evaluated(&self, n: usize) -> Result<Vec<EvaluatedPrediction>> {
        let mut records = self.evaluated_records(n, None)?;
        records.reverse();
        Ok(records)
    }

    /// All-time accuracy over evaluated predictions.
    pub fn accuracy_stats(&self) -> Result<AccuracyStats> {
        with_retry("load accuracy", || self.sqlite.accuracy_stats())
    }
}

/// Run a persistence operation, retrying once on failure.
pub(crate) fn with_retry<T, F>(operation: &str, f: F) -> Result<T>
where
    F: Fn() -> Result<T>,
{
    match f() {
        Ok(value) => Ok(value),
        Err(first) => {
            warn!("Failed to {}, retrying: {}", operation, first);
            f().map_err(|e| {
                error!("Failed to {} after retry, dropping: {}", operation, e);
                e
            })
        }
    }
}
