//! Shared fakes for the lifecycle tests.

#![allow(dead_code)]

use omen::error::{PredictorError, Result};
use omen::sources::{AuxiliarySignalSource, MarketDataSource, SourceFuture};
use omen::types::MarketSample;
use std::sync::Mutex;

/// Market source with scripted samples and price.
pub struct FakeMarket {
    samples: Mutex<Option<Vec<MarketSample>>>,
    price: Mutex<Option<f64>>,
}

impl FakeMarket {
    pub fn new(samples: Vec<MarketSample>, price: f64) -> Self {
        Self {
            samples: Mutex::new(Some(samples)),
            price: Mutex::new(Some(price)),
        }
    }

    pub fn set_price(&self, price: Option<f64>) {
        *self.price.lock().unwrap() = price;
    }

    pub fn set_samples(&self, samples: Option<Vec<MarketSample>>) {
        *self.samples.lock().unwrap() = samples;
    }
}

impl MarketDataSource for FakeMarket {
    fn name(&self) -> &str {
        "fake"
    }

    fn fetch_recent_samples(&self) -> SourceFuture<'_, Vec<MarketSample>> {
        let samples = self.samples.lock().unwrap().clone();
        Box::pin(async move {
            samples.ok_or_else(|| PredictorError::DataUnavailable("market offline".into()))
        })
    }

    fn fetch_current_price(&self) -> SourceFuture<'_, f64> {
        let price = *self.price.lock().unwrap();
        Box::pin(async move {
            price.ok_or_else(|| PredictorError::DataUnavailable("price offline".into()))
        })
    }
}

/// Auxiliary source returning a fixed signal, or failing when `None`.
pub struct FakeAuxiliary(pub Option<f64>);

impl AuxiliarySignalSource for FakeAuxiliary {
    fn name(&self) -> &str {
        "fake-aux"
    }

    fn fetch_auxiliary_signal(&self) -> SourceFuture<'_, f64> {
        let signal = self.0;
        Box::pin(async move {
            signal.ok_or_else(|| PredictorError::DataUnavailable("sentiment offline".into()))
        })
    }
}

/// Constant closes and volume: every indicator reads neutral.
pub fn create_flat_samples(count: usize, price: f64) -> Vec<MarketSample> {
    (0..count)
        .map(|i| MarketSample::from_close(1_700_000_000_000 + i as i64 * 60_000, price, 1_000.0))
        .collect()
}

/// Steadily rising closes with rising volume.
pub fn create_uptrend_samples(count: usize) -> Vec<MarketSample> {
    (0..count)
        .map(|i| {
            MarketSample::from_close(
                1_700_000_000_000 + i as i64 * 60_000,
                100.0 + i as f64 * 0.5,
                1_000.0 + i as f64 * 10.0,
            )
        })
        .collect()
}
