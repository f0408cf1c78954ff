//! Labels the realized move for a prediction and records it.

use super::PredictionStore;
use crate::error::Result;
use crate::types::{Direction, Outcome, Prediction};
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Moves smaller than this fraction are labeled HOLD.
pub const CLASSIFICATION_THRESHOLD: f64 = 0.005;

/// What happened to a prediction during an evaluation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationStatus {
    Recorded(Outcome),
    /// Another pass got there first, or the store refused the outcome.
    AlreadyEvaluated,
    /// Price unusable; the prediction stays pending.
    Deferred,
    /// The window plus buffer has not elapsed yet.
    NotReady,
}

/// Realized direction for a fractional price change.
pub fn classify_move(price_change: f64) -> Direction {
    if price_change.abs() < CLASSIFICATION_THRESHOLD {
        Direction::Hold
    } else {
        Direction::from_sign(price_change)
    }
}

/// Build the outcome for `prediction` observed at `current_price`.
///
/// Returns None when either price is unusable.
pub fn classify(
    prediction: &Prediction,
    current_price: f64,
    evaluated_at: DateTime<Utc>,
) -> Option<Outcome> {
    let reference = prediction.reference_price;
    if !current_price.is_finite() || current_price <= 0.0 {
        return None;
    }
    if !reference.is_finite() || reference <= 0.0 {
        return None;
    }

    let price_change = (current_price - reference) / reference;
    Some(Outcome {
        prediction_id: prediction.id.clone(),
        actual_direction: classify_move(price_change),
        price_change,
        observed_price: current_price,
        evaluated_at: evaluated_at.trunc_subsecs(6),
    })
}

/// Evaluates ready predictions against an observed price.
pub struct OutcomeEvaluator {
    store: Arc<PredictionStore>,
    buffer_minutes: i64,
}

impl OutcomeEvaluator {
    pub fn new(store: Arc<PredictionStore>, buffer_minutes: i64) -> Self {
        Self {
            store,
            buffer_minutes,
        }
    }

    pub fn buffer_minutes(&self) -> i64 {
        self.buffer_minutes
    }

    /// Classify and record the outcome for one prediction.
    pub fn evaluate(
        &self,
        prediction: &Prediction,
        current_price: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<EvaluationStatus> {
        if !prediction.is_ready(now, self.buffer_minutes) {
            debug!("Prediction {} not ready for evaluation", prediction.id);
            return Ok(EvaluationStatus::NotReady);
        }

        let outcome = match current_price.and_then(|price| classify(prediction, price, now)) {
            Some(outcome) => outcome,
            None => {
                warn!(
                    "No usable price for prediction {}, deferring evaluation",
                    prediction.id
                );
                return Ok(EvaluationStatus::Deferred);
            }
        };

        if self.store.record_outcome(&outcome)? {
            Ok(EvaluationStatus::Recorded(outcome))
        } else {
            Ok(EvaluationStatus::AlreadyEvaluated)
        }
    }
}
