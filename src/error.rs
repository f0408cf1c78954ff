use thiserror::Error;

/// Predictor error types.
///
/// Duplicate inserts and short indicator history are not errors; they are
/// reported through `Ok(false)` returns and neutral values instead.
#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Persistence error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error("Data unavailable: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl PredictorError {
    /// Whether a source failed and the cycle should be retried next tick.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable(_) | Self::Reqwest(_))
    }

    /// Whether the durable store failed.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Sqlite(_) | Self::SerdeJson(_))
    }
}

pub type Result<T> = std::result::Result<T, PredictorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(PredictorError::DataUnavailable("down".into()).is_data_unavailable());
        assert!(!PredictorError::DataUnavailable("down".into()).is_persistence());
        assert!(PredictorError::Persistence("locked".into()).is_persistence());
        assert!(PredictorError::Sqlite(rusqlite::Error::InvalidQuery).is_persistence());
    }

    #[test]
    fn test_error_display() {
        let err = PredictorError::DataUnavailable("binance timeout".into());
        assert_eq!(err.to_string(), "Data unavailable: binance timeout");
    }
}
