//! Market data and auxiliary signal sources.

pub mod binance;

pub use binance::BinanceSource;

use crate::error::Result;
use crate::types::MarketSample;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by source methods.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Provides recent market samples and the current price.
///
/// Failures should be reported as `PredictorError::DataUnavailable`; callers
/// skip the cycle and retry on the next tick.
pub trait MarketDataSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Recent samples, oldest first.
    fn fetch_recent_samples(&self) -> SourceFuture<'_, Vec<MarketSample>>;

    /// Latest traded price.
    fn fetch_current_price(&self) -> SourceFuture<'_, f64>;
}

/// Provides an external directional signal in [-1, 1].
pub trait AuxiliarySignalSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    fn fetch_auxiliary_signal(&self) -> SourceFuture<'_, f64>;
}
