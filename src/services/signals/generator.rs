//! Composite scoring and directional prediction generation.

use super::IndicatorScorer;
use crate::types::{
    AuxiliarySnapshot, Direction, IndicatorKind, IndicatorSnapshot, Prediction, StrategyConfig,
    TechnicalCall,
};
use chrono::{DateTime, SubsecRound, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Combines weighted indicator contributions into a prediction.
pub struct PredictionGenerator {
    scorer: IndicatorScorer,
    window_minutes: i64,
}

impl PredictionGenerator {
    pub fn new(window_minutes: i64) -> Self {
        Self {
            scorer: IndicatorScorer::new(),
            window_minutes,
        }
    }

    pub fn scorer(&self) -> &IndicatorScorer {
        &self.scorer
    }

    pub fn window_minutes(&self) -> i64 {
        self.window_minutes
    }

    /// Build a prediction from indicator readings and an optional auxiliary signal.
    ///
    /// `indicators == None` means no market data at all: the result is a
    /// zero-confidence HOLD flagged `no_data`.
    pub fn generate(
        &self,
        indicators: Option<&IndicatorSnapshot>,
        auxiliary: Option<f64>,
        config: &StrategyConfig,
        reference_price: f64,
        generated_at: DateTime<Utc>,
    ) -> Prediction {
        // Stored timestamps keep microseconds
        let generated_at = generated_at.trunc_subsecs(6);
        let id = prediction_id(generated_at);

        let Some(snapshot) = indicators else {
            return Prediction {
                id,
                generated_at,
                direction: Direction::Hold,
                confidence: 0.0,
                score: 0.0,
                technical: TechnicalCall::default(),
                reference_price,
                indicators: IndicatorSnapshot::new(),
                auxiliary: None,
                window_minutes: self.window_minutes,
                strategy_version: config.version,
                no_data: true,
                reason: "No market data available".to_string(),
            };
        };

        let contributions = self.scorer.contributions(snapshot);
        let technical_score = finite_or_zero(
            contributions
                .iter()
                .map(|(kind, c)| config.weight(*kind) * c)
                .sum(),
        );

        let auxiliary = auxiliary.filter(|s| s.is_finite()).map(|s| AuxiliarySnapshot {
            signal: s.clamp(-1.0, 1.0),
            weight: config.auxiliary_weight,
        });
        let score = finite_or_zero(
            technical_score + auxiliary.map(|a| a.signal * a.weight).unwrap_or(0.0),
        );

        let technical = call(technical_score, config.confidence_threshold);
        let TechnicalCall {
            direction,
            confidence,
        } = call(score, config.confidence_threshold);

        let reason = describe(
            direction,
            confidence,
            config.confidence_threshold,
            &contributions,
            auxiliary,
        );

        Prediction {
            id,
            generated_at,
            direction,
            confidence,
            score,
            technical,
            reference_price,
            indicators: snapshot.clone(),
            auxiliary,
            window_minutes: self.window_minutes,
            strategy_version: config.version,
            no_data: false,
            reason,
        }
    }
}

/// Confidence and thresholded direction for a score.
fn call(score: f64, threshold: f64) -> TechnicalCall {
    let confidence = score.abs().min(1.0);
    let direction = if confidence < threshold {
        Direction::Hold
    } else {
        Direction::from_sign(score)
    };
    TechnicalCall {
        direction,
        confidence,
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Sortable id: generation time to the microsecond plus a random suffix.
fn prediction_id(generated_at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}",
        generated_at.format("%Y%m%dT%H%M%S%.6fZ"),
        &suffix[..8]
    )
}

fn describe(
    direction: Direction,
    confidence: f64,
    threshold: f64,
    contributions: &BTreeMap<IndicatorKind, f64>,
    auxiliary: Option<AuxiliarySnapshot>,
) -> String {
    let strongest = contributions
        .iter()
        .filter(|(_, c)| **c != 0.0)
        .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
        .map(|(kind, c)| format!("{} {:+.2}", kind.as_str(), c))
        .unwrap_or_else(|| "no indicator signal".to_string());

    let aux = auxiliary
        .map(|a| format!(", auxiliary {:+.2}", a.signal))
        .unwrap_or_default();

    match direction {
        Direction::Hold => format!(
            "HOLD: confidence {:.2} below threshold {:.2} (strongest {}{})",
            confidence, threshold, strongest, aux
        ),
        _ => format!(
            "{} with confidence {:.2} (strongest {}{})",
            direction.as_str(),
            confidence,
            strongest,
            aux
        ),
    }
}
