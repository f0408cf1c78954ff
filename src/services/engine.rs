//! Wires the lifecycle components to the external sources.

use crate::config::{AdjusterSettings, Config};
use crate::error::{PredictorError, Result};
use crate::services::signals::{
    EvaluationStatus, OutcomeEvaluator, PerformanceAnalyzer, PerformanceSummary,
    PredictionGenerator, PredictionStore, StrategyAdjuster,
};
use crate::services::{SqliteStore, StrategyStore};
use crate::sources::{AuxiliarySignalSource, MarketDataSource};
use crate::types::{
    AnalyzedRecord, EvaluatedPrediction, MarketSample, Prediction, StrategyConfig,
    StrategyVersion,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Evaluated records loaded for summaries.
const SUMMARY_RECORD_LIMIT: usize = 1_000;

/// Counts from one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub ready: usize,
    pub evaluated: usize,
    pub deferred: usize,
    pub skipped: usize,
    /// Strategy versions written during the pass.
    pub adjustments: Vec<i64>,
}

/// Engine timing parameters.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub window_minutes: i64,
    pub buffer_minutes: i64,
    pub adjuster: AdjusterSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            window_minutes: 15,
            buffer_minutes: 5,
            adjuster: AdjusterSettings::default(),
        }
    }
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            window_minutes: config.evaluation_window_minutes,
            buffer_minutes: config.evaluation_buffer_minutes,
            adjuster: config.adjuster.clone(),
        }
    }
}

/// Prediction lifecycle engine.
pub struct PredictionEngine {
    store: Arc<PredictionStore>,
    strategy: Arc<StrategyStore>,
    generator: PredictionGenerator,
    evaluator: OutcomeEvaluator,
    analyzer: Arc<PerformanceAnalyzer>,
    adjuster: StrategyAdjuster,
    market: Arc<dyn MarketDataSource>,
    auxiliary: Option<Arc<dyn AuxiliarySignalSource>>,
}

impl PredictionEngine {
    /// Build an engine over an opened SQLite store.
    pub fn new(
        sqlite: Arc<SqliteStore>,
        settings: EngineSettings,
        market: Arc<dyn MarketDataSource>,
        auxiliary: Option<Arc<dyn AuxiliarySignalSource>>,
    ) -> Result<Self> {
        let store = PredictionStore::new(sqlite.clone());
        let strategy = StrategyStore::load(sqlite)?;

        Ok(Self {
            generator: PredictionGenerator::new(settings.window_minutes),
            evaluator: OutcomeEvaluator::new(store.clone(), settings.buffer_minutes),
            analyzer: PerformanceAnalyzer::new(),
            adjuster: StrategyAdjuster::new(settings.adjuster, strategy.clone()),
            store,
            strategy,
            market,
            auxiliary,
        })
    }

    pub fn store(&self) -> &Arc<PredictionStore> {
        &self.store
    }

    pub fn strategy(&self) -> &Arc<StrategyStore> {
        &self.strategy
    }

    /// Generate and store a prediction from current market data.
    pub async fn generate_prediction(&self) -> Result<Prediction> {
        self.generate_prediction_at(Utc::now()).await
    }

    /// Generate and store a prediction stamped `now`.
    ///
    /// A failed market fetch returns `DataUnavailable` and nothing is stored.
    /// No-data predictions are returned but not persisted.
    pub async fn generate_prediction_at(&self, now: DateTime<Utc>) -> Result<Prediction> {
        let samples = self.market.fetch_recent_samples().await.map_err(|e| {
            warn!("{} samples unavailable: {}", self.market.name(), e);
            unavailable(e)
        })?;

        let reference_price = match self.market.fetch_current_price().await {
            Ok(price) if price.is_finite() && price > 0.0 => price,
            Ok(price) => {
                debug!("Ignoring unusable current price {}", price);
                last_close(&samples)?
            }
            Err(e) => {
                debug!("Current price unavailable ({}), using last close", e);
                last_close(&samples)?
            }
        };

        let auxiliary = self.fetch_auxiliary().await;
        let config = self.strategy.refresh()?;
        let snapshot = self.generator.scorer().snapshot(&samples);

        let prediction = self.generator.generate(
            snapshot.as_ref(),
            auxiliary,
            &config,
            reference_price,
            now,
        );

        if prediction.no_data {
            warn!("No indicator data, prediction {} not stored", prediction.id);
            return Ok(prediction);
        }

        self.store.insert(&prediction)?;
        info!("Prediction {}: {}", prediction.id, prediction.reason);
        Ok(prediction)
    }

    async fn fetch_auxiliary(&self) -> Option<f64> {
        let source = self.auxiliary.as_ref()?;
        match source.fetch_auxiliary_signal().await {
            Ok(signal) if signal.is_finite() => Some(signal),
            Ok(signal) => {
                warn!("Ignoring non-finite auxiliary signal {} from {}", signal, source.name());
                None
            }
            Err(e) => {
                warn!("Auxiliary signal from {} unavailable: {}", source.name(), e);
                None
            }
        }
    }

    /// Evaluate every ready prediction against the current price.
    pub async fn run_evaluation_pass(&self) -> Result<EvaluationReport> {
        self.run_evaluation_pass_at(Utc::now()).await
    }

    /// Evaluate every prediction ready at `now`.
    ///
    /// Without a current price every ready prediction is deferred to the
    /// next pass.
    pub async fn run_evaluation_pass_at(&self, now: DateTime<Utc>) -> Result<EvaluationReport> {
        let ready = self
            .store
            .get_ready_for_evaluation(now, self.evaluator.buffer_minutes())?;
        let mut report = EvaluationReport {
            ready: ready.len(),
            ..Default::default()
        };

        if ready.is_empty() {
            debug!("No predictions ready for evaluation");
            return Ok(report);
        }

        let price = match self.market.fetch_current_price().await {
            Ok(price) => Some(price),
            Err(e) => {
                warn!(
                    "Current price unavailable, deferring {} evaluations: {}",
                    ready.len(),
                    e
                );
                None
            }
        };

        for prediction in &ready {
            match self.evaluator.evaluate(prediction, price, now)? {
                EvaluationStatus::Recorded(outcome) => {
                    report.evaluated += 1;
                    let record = EvaluatedPrediction {
                        prediction: prediction.clone(),
                        outcome,
                    };
                    if let Some(config) = self.on_new_record(&record)? {
                        report.adjustments.push(config.version);
                    }
                }
                EvaluationStatus::Deferred => report.deferred += 1,
                EvaluationStatus::AlreadyEvaluated | EvaluationStatus::NotReady => {
                    report.skipped += 1
                }
            }
        }

        info!(
            "Evaluation pass: {} ready, {} evaluated, {} deferred",
            report.ready, report.evaluated, report.deferred
        );
        Ok(report)
    }

    /// Analyze a new record and give the adjuster a chance to react.
    fn on_new_record(&self, record: &EvaluatedPrediction) -> Result<Option<Arc<StrategyConfig>>> {
        let analyzed = self.analyzer.analyze(record);
        debug!(
            "Prediction {} analyzed: {}",
            analyzed.prediction.id,
            analyzed.error_class.as_str()
        );

        let settings = self.adjuster.settings();
        let window_size = settings.analysis_window.max(settings.recent_window);
        let window = self.store.recent_evaluated(window_size)?;
        let window = self.analyzer.analyze_all(&window);
        let all_time = self.store.accuracy_stats()?;

        self.adjuster.on_new_record(&window, all_time)
    }

    /// Number of predictions awaiting evaluation.
    pub fn get_pending_count(&self) -> Result<usize> {
        self.store.pending_count()
    }

    /// Analyzed evaluations, newest first, optionally limited to the last hours.
    pub fn get_evaluated_records(
        &self,
        limit: usize,
        since_hours: Option<i64>,
    ) -> Result<Vec<AnalyzedRecord>> {
        let since = since_hours.map(|h| Utc::now() - Duration::hours(h));
        let records = self.store.evaluated_records(limit, since)?;
        Ok(self.analyzer.analyze_all(&records))
    }

    pub fn get_current_strategy_config(&self) -> Arc<StrategyConfig> {
        self.strategy.snapshot()
    }

    /// Persisted strategy versions, newest first.
    pub fn get_strategy_history(&self, limit: usize) -> Result<Vec<StrategyVersion>> {
        self.strategy.history(limit)
    }

    /// Accuracy summary over stored evaluations.
    pub fn get_performance_summary(&self) -> Result<PerformanceSummary> {
        let mut records = self.store.evaluated_records(SUMMARY_RECORD_LIMIT, None)?;
        records.reverse();
        let analyzed = self.analyzer.analyze_all(&records);
        let all_time = self.store.accuracy_stats()?;
        debug!(
            "Summarizing {} records ({} analyses cached)",
            analyzed.len(),
            self.analyzer.cached_count()
        );

        Ok(self
            .analyzer
            .summarize(&analyzed, all_time, self.adjuster.settings().recent_window))
    }
}

fn last_close(samples: &[MarketSample]) -> Result<f64> {
    samples
        .iter()
        .rev()
        .map(|s| s.close)
        .find(|c| c.is_finite() && *c > 0.0)
        .ok_or_else(|| PredictorError::DataUnavailable("no usable reference price".into()))
}

fn unavailable(e: PredictorError) -> PredictorError {
    if e.is_data_unavailable() {
        e
    } else {
        PredictorError::DataUnavailable(e.to_string())
    }
}
