//! Prediction Runner Service
//!
//! Drives the generation and evaluation cycles on their own timers until a
//! shutdown signal arrives.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::services::PredictionEngine;

/// Cycle counters for the running loops.
#[derive(Debug, Default)]
pub struct RunnerStats {
    pub generation_cycles: AtomicU64,
    pub generation_failures: AtomicU64,
    pub evaluation_cycles: AtomicU64,
    pub evaluation_failures: AtomicU64,
}

/// Runs the generation and evaluation loops.
pub struct Runner {
    engine: Arc<PredictionEngine>,
    generation_interval: Duration,
    evaluation_interval: Duration,
    stats: RunnerStats,
    shutdown_tx: broadcast::Sender<()>,
    running: AtomicBool,
}

impl Runner {
    pub fn new(
        engine: Arc<PredictionEngine>,
        generation_interval_secs: u64,
        evaluation_interval_secs: u64,
    ) -> Arc<Self> {
        let (shutdown_tx, _) = broadcast::channel(1);

        Arc::new(Self {
            engine,
            generation_interval: Duration::from_secs(generation_interval_secs.max(1)),
            evaluation_interval: Duration::from_secs(evaluation_interval_secs.max(1)),
            stats: RunnerStats::default(),
            shutdown_tx,
            running: AtomicBool::new(false),
        })
    }

    pub fn stats(&self) -> &RunnerStats {
        &self.stats
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run both loops until `stop` is called.
    ///
    /// Each loop runs on its own task. A cycle never overlaps the previous
    /// cycle of the same loop; ticks missed while a cycle runs are skipped.
    pub async fn start(self: Arc<Self>) {
        // Receivers exist before `running` is set, so a `stop` that observes
        // a running runner always reaches both loops.
        let generation_rx = self.shutdown_tx.subscribe();
        let evaluation_rx = self.shutdown_tx.subscribe();

        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Prediction runner already started");
            return;
        }

        info!(
            "Starting prediction runner (generation every {}s, evaluation every {}s)",
            self.generation_interval.as_secs(),
            self.evaluation_interval.as_secs()
        );

        let generation = tokio::spawn(self.clone().generation_loop(generation_rx));
        let evaluation = tokio::spawn(self.clone().evaluation_loop(evaluation_rx));

        if let Err(e) = generation.await {
            error!("Generation loop task failed: {}", e);
        }
        if let Err(e) = evaluation.await {
            error!("Evaluation loop task failed: {}", e);
        }

        self.running.store(false, Ordering::SeqCst);
        info!("Prediction runner stopped");
    }

    /// Signal both loops to exit after their current cycle.
    pub fn stop(&self) {
        if !self.is_running() {
            return;
        }
        let _ = self.shutdown_tx.send(());
    }

    async fn generation_loop(self: Arc<Self>, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut ticker = interval(self.generation_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.stats.generation_cycles.fetch_add(1, Ordering::Relaxed);
                    match self.engine.generate_prediction().await {
                        Ok(prediction) => debug!(
                            "Generation cycle produced {} ({})",
                            prediction.id,
                            prediction.direction.as_str()
                        ),
                        Err(e) if e.is_data_unavailable() => {
                            self.stats.generation_failures.fetch_add(1, Ordering::Relaxed);
                            warn!("Skipping generation cycle: {}", e);
                        }
                        Err(e) => {
                            self.stats.generation_failures.fetch_add(1, Ordering::Relaxed);
                            error!("Generation cycle error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Generation loop received shutdown signal");
                    break;
                }
            }
        }
    }

    async fn evaluation_loop(self: Arc<Self>, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut ticker = interval(self.evaluation_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.stats.evaluation_cycles.fetch_add(1, Ordering::Relaxed);
                    if let Err(e) = self.engine.run_evaluation_pass().await {
                        self.stats.evaluation_failures.fetch_add(1, Ordering::Relaxed);
                        error!("Evaluation cycle error: {}", e);
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Evaluation loop received shutdown signal");
                    break;
                }
            }
        }
    }
}
