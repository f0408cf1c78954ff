use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Predicted or realized price direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    #[default]
    Hold,
}

impl Direction {
    /// Direction of a signed value, HOLD at exactly zero.
    pub fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            Self::Up
        } else if value < 0.0 {
            Self::Down
        } else {
            Self::Hold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Hold => "HOLD",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "UP" => Some(Self::Up),
            "DOWN" => Some(Self::Down),
            "HOLD" => Some(Self::Hold),
            _ => None,
        }
    }

    /// Whether this is a directional call (UP or DOWN).
    pub fn is_directional(&self) -> bool {
        !matches!(self, Self::Hold)
    }
}

/// Technical indicators that feed the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Rsi,
    Macd,
    MaTrend,
    Volume,
    Bollinger,
    Momentum,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 6] = [
        Self::Rsi,
        Self::Macd,
        Self::MaTrend,
        Self::Volume,
        Self::Bollinger,
        Self::Momentum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rsi => "rsi",
            Self::Macd => "macd",
            Self::MaTrend => "ma_trend",
            Self::Volume => "volume",
            Self::Bollinger => "bollinger",
            Self::Momentum => "momentum",
        }
    }
}

/// Raw indicator readings captured at generation time.
pub type IndicatorSnapshot = BTreeMap<IndicatorKind, f64>;

/// Direction and confidence from the technical indicators alone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct TechnicalCall {
    pub direction: Direction,
    pub confidence: f64,
}

/// Auxiliary signal value and the weight it was blended with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuxiliarySnapshot {
    pub signal: f64,
    pub weight: f64,
}

/// A directional prediction. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Timestamp-derived id, lexicographically sortable.
    pub id: String,
    pub generated_at: DateTime<Utc>,
    pub direction: Direction,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Composite score before the confidence clamp.
    pub score: f64,
    pub technical: TechnicalCall,
    pub reference_price: f64,
    pub indicators: IndicatorSnapshot,
    pub auxiliary: Option<AuxiliarySnapshot>,
    pub window_minutes: i64,
    pub strategy_version: i64,
    /// Set when no indicator data was available.
    pub no_data: bool,
    pub reason: String,
}

impl Prediction {
    /// End of the forecast horizon.
    pub fn window_end(&self) -> DateTime<Utc> {
        self.generated_at + Duration::minutes(self.window_minutes)
    }

    /// Earliest time the prediction may be evaluated.
    pub fn ready_at(&self, buffer_minutes: i64) -> DateTime<Utc> {
        self.window_end() + Duration::minutes(buffer_minutes)
    }

    pub fn is_ready(&self, now: DateTime<Utc>, buffer_minutes: i64) -> bool {
        now >= self.ready_at(buffer_minutes)
    }
}

/// Realized market move for a prediction. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub prediction_id: String,
    pub actual_direction: Direction,
    /// (observed - reference) / reference.
    pub price_change: f64,
    pub observed_price: f64,
    pub evaluated_at: DateTime<Utc>,
}

/// A stored prediction and its outcome, if evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub prediction: Prediction,
    pub outcome: Option<Outcome>,
}

impl PredictionRecord {
    pub fn is_evaluated(&self) -> bool {
        self.outcome.is_some()
    }
}

/// An evaluated prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedPrediction {
    pub prediction: Prediction,
    pub outcome: Outcome,
}

/// Classification of an evaluated prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorClass {
    Correct,
    /// Predicted HOLD, market moved.
    MissedOpportunity,
    /// Predicted a move, market held.
    FalseSignal,
    /// Predicted the opposite move.
    Inverted,
    Other,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "CORRECT",
            Self::MissedOpportunity => "MISSED_OPPORTUNITY",
            Self::FalseSignal => "FALSE_SIGNAL",
            Self::Inverted => "INVERTED",
            Self::Other => "OTHER",
        }
    }
}

/// Derived view of an evaluated prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedRecord {
    pub prediction: Prediction,
    pub outcome: Outcome,
    pub is_correct: bool,
    /// Whether the technical-only call would have been correct.
    pub technical_correct: bool,
    pub error_class: ErrorClass,
    pub alignment: BTreeMap<IndicatorKind, bool>,
    /// Present only when an auxiliary signal was blended in.
    pub auxiliary_aligned: Option<bool>,
}
