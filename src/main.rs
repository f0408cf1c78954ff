use omen::config::Config;
use omen::services::{EngineSettings, PredictionEngine, Runner, SqliteStore};
use omen::sources::BinanceSource;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "omen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    config.validate()?;
    info!(
        "Starting Omen for {} ({} minute window, database {})",
        config.symbol, config.evaluation_window_minutes, config.database_path
    );

    let sqlite = Arc::new(SqliteStore::new(&config.database_path)?);

    let market = Arc::new(BinanceSource::new(
        &config.binance_api_url,
        &config.symbol,
        &config.kline_interval,
        config.kline_limit,
    ));

    let engine = Arc::new(PredictionEngine::new(
        sqlite,
        EngineSettings::from(&config),
        market,
        None,
    )?);

    let strategy = engine.get_current_strategy_config();
    info!(
        "Strategy v{} active, {} predictions pending",
        strategy.version,
        engine.get_pending_count()?
    );

    let runner = Runner::new(
        engine.clone(),
        config.generation_interval_secs,
        config.evaluation_interval_secs,
    );
    let handle = tokio::spawn(runner.clone().start());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    runner.stop();

    if let Err(e) = handle.await {
        error!("Runner task failed: {}", e);
    }

    match engine.get_performance_summary() {
        Ok(summary) => info!(
            "Final accuracy {:.1}% over {} evaluated predictions",
            summary.accuracy * 100.0,
            summary.total
        ),
        Err(e) => error!("Could not load performance summary: {}", e),
    }

    Ok(())
}
