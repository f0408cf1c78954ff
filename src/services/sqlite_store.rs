//! SQLite persistence layer for predictions, outcomes and strategy versions.
//!
//! One database file is shared by the generation and evaluation loops, which
//! may run as separate processes. The database runs in WAL mode with a busy
//! timeout, and every write is a single `BEGIN IMMEDIATE` transaction so a
//! crash leaves a record either complete or absent.

use crate::error::{PredictorError, Result};
use crate::types::{
    AuxiliarySnapshot, Direction, EvaluatedPrediction, IndicatorSnapshot, Outcome, Prediction,
    PredictionRecord, StrategyConfig, StrategyVersion, TechnicalCall,
};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

/// How long a writer waits on a lock held by another connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const PREDICTION_COLUMNS: &str = "p.id, p.generated_at, p.direction, p.confidence, p.score,
     p.technical_direction, p.technical_confidence, p.reference_price,
     p.indicators_json, p.auxiliary_json, p.window_minutes, p.strategy_version,
     p.no_data, p.reason";

const OUTCOME_COLUMNS: &str =
    "o.prediction_id, o.actual_direction, o.price_change, o.observed_price, o.evaluated_at";

/// Result of an outcome write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeWrite {
    Recorded,
    UnknownPrediction,
    AlreadyEvaluated,
    /// The outcome is timestamped before the prediction's window ends.
    BeforeWindowEnd,
}

/// SQLite store for durable lifecycle state.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SQLite store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let journal_mode: String =
            conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        debug!("SQLite journal mode: {}", journal_mode);

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("SQLite store initialized");
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("In-memory SQLite store initialized");
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PredictorError::Persistence("SQLite connection lock poisoned".into()))
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS predictions (
                id TEXT PRIMARY KEY,
                generated_at INTEGER NOT NULL,
                direction TEXT NOT NULL,
                confidence REAL NOT NULL,
                score REAL NOT NULL,
                technical_direction TEXT NOT NULL,
                technical_confidence REAL NOT NULL,
                reference_price REAL NOT NULL,
                indicators_json TEXT NOT NULL DEFAULT '{}',
                auxiliary_json TEXT,
                window_minutes INTEGER NOT NULL,
                strategy_version INTEGER NOT NULL,
                no_data INTEGER NOT NULL DEFAULT 0,
                reason TEXT NOT NULL DEFAULT ''
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_predictions_generated_at
             ON predictions(generated_at)",
            [],
        )?;

        // One outcome per prediction
        conn.execute(
            "CREATE TABLE IF NOT EXISTS outcomes (
                prediction_id TEXT PRIMARY KEY REFERENCES predictions(id),
                actual_direction TEXT NOT NULL,
                price_change REAL NOT NULL,
                observed_price REAL NOT NULL,
                evaluated_at INTEGER NOT NULL,
                is_correct INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS strategy_config (
                version INTEGER PRIMARY KEY,
                config_json TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                trigger_reason TEXT NOT NULL
            )",
            [],
        )?;

        info!("SQLite schema initialized");
        Ok(())
    }

    // ========== Prediction Methods ==========

    /// Insert a prediction. Returns false if the id already exists.
    pub fn insert_prediction(&self, prediction: &Prediction) -> Result<bool> {
        let indicators_json = serde_json::to_string(&prediction.indicators)?;
        let auxiliary_json = prediction
            .auxiliary
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
            "INSERT INTO predictions
             (id, generated_at, direction, confidence, score, technical_direction,
              technical_confidence, reference_price, indicators_json, auxiliary_json,
              window_minutes, strategy_version, no_data, reason)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(id) DO NOTHING",
            params![
                prediction.id,
                to_micros(prediction.generated_at),
                prediction.direction.as_str(),
                prediction.confidence,
                prediction.score,
                prediction.technical.direction.as_str(),
                prediction.technical.confidence,
                prediction.reference_price,
                indicators_json,
                auxiliary_json,
                prediction.window_minutes,
                prediction.strategy_version,
                prediction.no_data,
                prediction.reason,
            ],
        )?;
        tx.commit()?;

        Ok(inserted == 1)
    }

    /// Get a prediction with its outcome, if any.
    pub fn get_prediction(&self, id: &str) -> Result<Option<PredictionRecord>> {
        let conn = self.lock()?;
        let query = format!(
            "SELECT {}, {} FROM predictions p
             LEFT JOIN outcomes o ON o.prediction_id = p.id
             WHERE p.id = ?1",
            PREDICTION_COLUMNS, OUTCOME_COLUMNS
        );

        let record = conn
            .query_row(&query, params![id], |row| {
                Ok(PredictionRecord {
                    prediction: prediction_from_row(row)?,
                    outcome: optional_outcome_from_row(row, 14)?,
                })
            })
            .optional()?;

        Ok(record)
    }

    /// Unevaluated predictions whose window plus buffer has elapsed, oldest first.
    pub fn ready_for_evaluation(
        &self,
        now: DateTime<Utc>,
        buffer_minutes: i64,
    ) -> Result<Vec<Prediction>> {
        let conn = self.lock()?;
        let query = format!(
            "SELECT {} FROM predictions p
             LEFT JOIN outcomes o ON o.prediction_id = p.id
             WHERE o.prediction_id IS NULL
               AND p.generated_at + (p.window_minutes + ?2) * 60000000 <= ?1
             ORDER BY p.generated_at ASC, p.id ASC",
            PREDICTION_COLUMNS
        );

        let mut stmt = conn.prepare(&query)?;
        let predictions = stmt
            .query_map(params![to_micros(now), buffer_minutes], prediction_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(predictions)
    }

    /// Number of predictions without an outcome.
    pub fn pending_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM predictions p
             LEFT JOIN outcomes o ON o.prediction_id = p.id
             WHERE o.prediction_id IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // ========== Outcome Methods ==========

    /// Attach an outcome to its prediction.
    ///
    /// The prediction lookup, the duplicate check and the insert share one
    /// immediate transaction. `correctness` computes the cached flag.
    pub fn record_outcome<F>(&self, outcome: &Outcome, correctness: F) -> Result<OutcomeWrite>
    where
        F: FnOnce(&Prediction, &Outcome) -> bool,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let query = format!(
            "SELECT {}, o.prediction_id FROM predictions p
             LEFT JOIN outcomes o ON o.prediction_id = p.id
             WHERE p.id = ?1",
            PREDICTION_COLUMNS
        );
        let existing = tx
            .query_row(&query, params![outcome.prediction_id], |row| {
                let evaluated: Option<String> = row.get(14)?;
                Ok((prediction_from_row(row)?, evaluated.is_some()))
            })
            .optional()?;

        let (prediction, evaluated) = match existing {
            Some(found) => found,
            None => return Ok(OutcomeWrite::UnknownPrediction),
        };
        if evaluated {
            return Ok(OutcomeWrite::AlreadyEvaluated);
        }
        if outcome.evaluated_at < prediction.window_end() {
            return Ok(OutcomeWrite::BeforeWindowEnd);
        }

        let is_correct = correctness(&prediction, outcome);
        tx.execute(
            "INSERT INTO outcomes
             (prediction_id, actual_direction, price_change, observed_price, evaluated_at, is_correct)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(prediction_id) DO NOTHING",
            params![
                outcome.prediction_id,
                outcome.actual_direction.as_str(),
                outcome.price_change,
                outcome.observed_price,
                to_micros(outcome.evaluated_at),
                is_correct,
            ],
        )?;
        tx.commit()?;

        Ok(OutcomeWrite::Recorded)
    }

    /// Evaluated predictions, newest first.
    pub fn evaluated(
        &self,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<EvaluatedPrediction>> {
        let conn = self.lock()?;
        let query = format!(
            "SELECT {}, {} FROM predictions p
             INNER JOIN outcomes o ON o.prediction_id = p.id
             WHERE p.generated_at >= ?1
             ORDER BY p.generated_at DESC, p.id DESC
             LIMIT ?2",
            PREDICTION_COLUMNS, OUTCOME_COLUMNS
        );

        let since = since.map(to_micros).unwrap_or(i64::MIN);
        let mut stmt = conn.prepare(&query)?;
        let records = stmt
            .query_map(params![since, limit as i64], |row| {
                Ok(EvaluatedPrediction {
                    prediction: prediction_from_row(row)?,
                    outcome: outcome_from_row(row, 14)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// All-time correct/total counts over evaluated predictions.
    pub fn accuracy_stats(&self) -> Result<AccuracyStats> {
        let conn = self.lock()?;
        let stats = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(is_correct), 0) FROM outcomes",
            [],
            |row| {
                Ok(AccuracyStats {
                    total: row.get(0)?,
                    correct: row.get(1)?,
                })
            },
        )?;
        Ok(stats)
    }

    // ========== Strategy Methods ==========

    /// Latest persisted strategy version.
    pub fn latest_strategy(&self) -> Result<Option<StrategyConfig>> {
        let conn = self.lock()?;
        latest_strategy_in(&conn)
    }

    /// Persist `config` as the first version if the table is empty.
    /// Returns the latest version afterwards.
    pub fn seed_strategy(&self, config: &StrategyConfig) -> Result<StrategyConfig> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(latest) = latest_strategy_in(&tx)? {
            return Ok(latest);
        }

        insert_strategy_in(&tx, config, "default")?;
        tx.commit()?;
        info!("Seeded strategy config version {}", config.version);
        Ok(config.clone())
    }

    /// Replace the strategy with a new version derived from the latest one.
    ///
    /// Reading the latest version and writing its successor happen in one
    /// immediate transaction, so concurrent writers never reuse a version.
    pub fn update_strategy<F>(&self, trigger: &str, update: F) -> Result<StrategyConfig>
    where
        F: FnOnce(&StrategyConfig) -> StrategyConfig,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = latest_strategy_in(&tx)?.unwrap_or_default();
        let mut next = update(&current).clamped();
        next.version = current.version + 1;
        next.updated_at = Utc::now();

        insert_strategy_in(&tx, &next, trigger)?;
        tx.commit()?;

        Ok(next)
    }

    /// Strategy versions, newest first.
    pub fn strategy_history(&self, limit: usize) -> Result<Vec<StrategyVersion>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT config_json, trigger_reason FROM strategy_config
             ORDER BY version DESC
             LIMIT ?1",
        )?;
        let history = stmt
            .query_map(params![limit as i64], |row| {
                let json: String = row.get(0)?;
                Ok(StrategyVersion {
                    config: from_json(&json, 0)?,
                    trigger: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(history)
    }
}

/// Accuracy statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct AccuracyStats {
    pub total: i64,
    pub correct: i64,
}

impl AccuracyStats {
    /// Fraction of evaluated predictions that were correct, 0 when empty.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }
}

fn latest_strategy_in(conn: &Connection) -> Result<Option<StrategyConfig>> {
    let json: Option<String> = conn
        .query_row(
            "SELECT config_json FROM strategy_config ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    match json {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

fn insert_strategy_in(conn: &Connection, config: &StrategyConfig, trigger: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO strategy_config (version, config_json, created_at, trigger_reason)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            config.version,
            serde_json::to_string(config)?,
            to_micros(config.updated_at),
            trigger,
        ],
    )?;
    Ok(())
}

fn prediction_from_row(row: &Row<'_>) -> rusqlite::Result<Prediction> {
    let indicators_json: String = row.get(8)?;
    let auxiliary_json: Option<String> = row.get(9)?;

    let indicators: IndicatorSnapshot = from_json(&indicators_json, 8)?;
    let auxiliary: Option<AuxiliarySnapshot> = auxiliary_json
        .map(|json| from_json(&json, 9))
        .transpose()?;

    Ok(Prediction {
        id: row.get(0)?,
        generated_at: from_micros(row.get(1)?, 1)?,
        direction: parse_direction(&row.get::<_, String>(2)?),
        confidence: row.get(3)?,
        score: row.get(4)?,
        technical: TechnicalCall {
            direction: parse_direction(&row.get::<_, String>(5)?),
            confidence: row.get(6)?,
        },
        reference_price: row.get(7)?,
        indicators,
        auxiliary,
        window_minutes: row.get(10)?,
        strategy_version: row.get(11)?,
        no_data: row.get(12)?,
        reason: row.get(13)?,
    })
}

fn outcome_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Outcome> {
    Ok(Outcome {
        prediction_id: row.get(offset)?,
        actual_direction: parse_direction(&row.get::<_, String>(offset + 1)?),
        price_change: row.get(offset + 2)?,
        observed_price: row.get(offset + 3)?,
        evaluated_at: from_micros(row.get(offset + 4)?, offset + 4)?,
    })
}

fn optional_outcome_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Option<Outcome>> {
    let id: Option<String> = row.get(offset)?;
    match id {
        Some(_) => outcome_from_row(row, offset).map(Some),
        None => Ok(None),
    }
}

fn from_json<T: serde::de::DeserializeOwned>(json: &str, column: usize) -> rusqlite::Result<T> {
    serde_json::from_str(json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

fn to_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

fn from_micros(micros: i64, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    Utc.timestamp_opt(secs, nanos)
        .single()
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(column, micros))
}

/// Parse direction string to Direction.
fn parse_direction(s: &str) -> Direction {
    Direction::from_str(s).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndicatorKind;
    use chrono::Duration;

    fn create_test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    fn create_test_prediction(id: &str, generated_at: DateTime<Utc>) -> Prediction {
        Prediction {
            id: id.to_string(),
            generated_at,
            direction: Direction::Up,
            confidence: 0.72,
            score: 0.72,
            technical: TechnicalCall {
                direction: Direction::Up,
                confidence: 0.65,
            },
            reference_price: 50_000.0,
            indicators: IndicatorSnapshot::from([
                (IndicatorKind::Rsi, 28.0),
                (IndicatorKind::Macd, 0.4),
            ]),
            auxiliary: Some(AuxiliarySnapshot {
                signal: 0.25,
                weight: 0.3,
            }),
            window_minutes: 15,
            strategy_version: 1,
            no_data: false,
            reason: "UP with confidence 0.72".to_string(),
        }
    }

    fn create_test_outcome(prediction: &Prediction, minutes_after: i64) -> Outcome {
        Outcome {
            prediction_id: prediction.id.clone(),
            actual_direction: Direction::Up,
            price_change: 0.01,
            observed_price: 50_500.0,
            evaluated_at: prediction.generated_at + Duration::minutes(minutes_after),
        }
    }

    #[test]
    fn test_prediction_roundtrip() {
        let store = SqliteStore::new_in_memory().unwrap();
        let prediction = create_test_prediction("p1", create_test_time());

        assert!(store.insert_prediction(&prediction).unwrap());

        let record = store.get_prediction("p1").unwrap().unwrap();
        assert_eq!(record.prediction, prediction);
        assert!(record.outcome.is_none());
        assert!(store.get_prediction("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_insert_ignored() {
        let store = SqliteStore::new_in_memory().unwrap();
        let prediction = create_test_prediction("p1", create_test_time());

        assert!(store.insert_prediction(&prediction).unwrap());

        let mut altered = prediction.clone();
        altered.confidence = 0.1;
        assert!(!store.insert_prediction(&altered).unwrap());

        let record = store.get_prediction("p1").unwrap().unwrap();
        assert_eq!(record.prediction.confidence, 0.72);
    }

    #[test]
    fn test_ready_for_evaluation_boundary() {
        let store = SqliteStore::new_in_memory().unwrap();
        let t = create_test_time();
        store
            .insert_prediction(&create_test_prediction("p1", t))
            .unwrap();

        assert!(store
            .ready_for_evaluation(t + Duration::minutes(19), 5)
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .ready_for_evaluation(t + Duration::minutes(20), 5)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_record_outcome_rules() {
        let store = SqliteStore::new_in_memory().unwrap();
        let prediction = create_test_prediction("p1", create_test_time());
        store.insert_prediction(&prediction).unwrap();

        let early = create_test_outcome(&prediction, 10);
        assert_eq!(
            store.record_outcome(&early, |_, _| true).unwrap(),
            OutcomeWrite::BeforeWindowEnd
        );

        let unknown = Outcome {
            prediction_id: "nope".to_string(),
            ..create_test_outcome(&prediction, 20)
        };
        assert_eq!(
            store.record_outcome(&unknown, |_, _| true).unwrap(),
            OutcomeWrite::UnknownPrediction
        );

        let outcome = create_test_outcome(&prediction, 20);
        assert_eq!(
            store.record_outcome(&outcome, |_, _| true).unwrap(),
            OutcomeWrite::Recorded
        );
        assert_eq!(
            store.record_outcome(&outcome, |_, _| false).unwrap(),
            OutcomeWrite::AlreadyEvaluated
        );

        let record = store.get_prediction("p1").unwrap().unwrap();
        assert_eq!(record.outcome, Some(outcome));
        assert_eq!(store.pending_count().unwrap(), 0);

        let stats = store.accuracy_stats().unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.correct, 1);
    }

    #[test]
    fn test_evaluated_ordering_and_since() {
        let store = SqliteStore::new_in_memory().unwrap();
        let t = create_test_time();

        for i in 0..5 {
            let prediction = create_test_prediction(&format!("p{}", i), t + Duration::hours(i));
            store.insert_prediction(&prediction).unwrap();
            store
                .record_outcome(&create_test_outcome(&prediction, 20), |_, _| i % 2 == 0)
                .unwrap();
        }

        let all = store.evaluated(10, None).unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].prediction.id, "p4");

        let recent = store.evaluated(10, Some(t + Duration::hours(3))).unwrap();
        assert_eq!(recent.len(), 2);

        let stats = store.accuracy_stats().unwrap();
        assert_eq!(stats.correct, 3);
        assert!((stats.accuracy() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_concurrent_outcome_writers_record_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("race.db");
        let first = std::sync::Arc::new(SqliteStore::new(&path).unwrap());
        let second = std::sync::Arc::new(SqliteStore::new(&path).unwrap());

        let t = create_test_time();
        let predictions: Vec<Prediction> = (0..50)
            .map(|i| create_test_prediction(&format!("p{:02}", i), t + Duration::minutes(i)))
            .collect();
        for prediction in &predictions {
            assert!(first.insert_prediction(prediction).unwrap());
            // The other handle sees the committed row and leaves it alone
            assert!(!second.insert_prediction(prediction).unwrap());
        }

        let outcomes: Vec<Outcome> = predictions
            .iter()
            .map(|p| create_test_outcome(p, 20))
            .collect();

        let writers: Vec<_> = [first.clone(), second.clone()]
            .into_iter()
            .map(|store| {
                let outcomes = outcomes.clone();
                std::thread::spawn(move || {
                    outcomes
                        .iter()
                        .map(|o| store.record_outcome(o, |_, _| true).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let results: Vec<Vec<OutcomeWrite>> =
            writers.into_iter().map(|h| h.join().unwrap()).collect();

        for i in 0..outcomes.len() {
            let recorded = results
                .iter()
                .filter(|r| r[i] == OutcomeWrite::Recorded)
                .count();
            assert_eq!(recorded, 1, "outcome {} recorded {} times", i, recorded);
            assert!(results
                .iter()
                .all(|r| matches!(r[i], OutcomeWrite::Recorded | OutcomeWrite::AlreadyEvaluated)));
        }

        assert_eq!(second.pending_count().unwrap(), 0);
        assert_eq!(first.accuracy_stats().unwrap().total, 50);
    }

    #[test]
    fn test_strategy_versions() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert!(store.latest_strategy().unwrap().is_none());

        let seeded = store.seed_strategy(&StrategyConfig::default()).unwrap();
        assert_eq!(seeded.version, 1);

        // Seeding again keeps the existing version
        let mut other = StrategyConfig::default();
        other.confidence_threshold = 0.7;
        assert_eq!(store.seed_strategy(&other).unwrap().confidence_threshold, 0.6);

        let updated = store
            .update_strategy("losing_streak", |current| {
                let mut next = current.clone();
                next.confidence_threshold = 0.95;
                next
            })
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.confidence_threshold, 0.8);

        let history = store.strategy_history(10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].trigger, "losing_streak");
        assert_eq!(history[1].trigger, "default");
        assert_eq!(store.latest_strategy().unwrap(), Some(updated));
    }
}
