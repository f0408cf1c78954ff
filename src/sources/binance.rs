use super::{MarketDataSource, SourceFuture};
use crate::error::{PredictorError, Result};
use crate::types::MarketSample;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Characters of an error body kept in logs.
const ERROR_BODY_CHARS: usize = 200;

/// Binance ticker/price response.
#[derive(Debug, Deserialize)]
struct BinancePrice {
    #[allow(dead_code)]
    symbol: String,
    price: String,
}

/// Binance REST client for one trading pair.
#[derive(Clone)]
pub struct BinanceSource {
    client: Client,
    base_url: String,
    symbol: String,
    interval: String,
    limit: u32,
}

impl BinanceSource {
    /// Create a new Binance source.
    pub fn new(base_url: &str, symbol: &str, interval: &str, limit: u32) -> Self {
        let client = Client::builder()
            .user_agent("Omen/1.0")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            symbol: symbol.to_uppercase(),
            interval: interval.to_string(),
            limit,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!("Binance API returned {}: {}", status, error_snippet(&text));
            return Err(PredictorError::DataUnavailable(format!(
                "Binance API error: {}",
                status
            )));
        }

        Ok(response.json().await?)
    }

    async fn klines(&self) -> Result<Vec<MarketSample>> {
        let raw = self
            .get_json(
                "/klines",
                &[
                    ("symbol", self.symbol.clone()),
                    ("interval", self.interval.clone()),
                    ("limit", self.limit.to_string()),
                ],
            )
            .await?;

        let samples = parse_klines(&raw);
        debug!("Fetched {} klines for {}", samples.len(), self.symbol);

        if samples.is_empty() {
            return Err(PredictorError::DataUnavailable(format!(
                "No klines returned for {}",
                self.symbol
            )));
        }
        Ok(samples)
    }

    async fn price(&self) -> Result<f64> {
        let raw = self
            .get_json("/ticker/price", &[("symbol", self.symbol.clone())])
            .await?;
        let ticker: BinancePrice = serde_json::from_value(raw)
            .map_err(|e| PredictorError::DataUnavailable(format!("Bad ticker payload: {}", e)))?;

        ticker
            .price
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| {
                PredictorError::DataUnavailable(format!("Invalid price '{}'", ticker.price))
            })
    }
}

/// Leading characters of a response body, cut on a char boundary.
fn error_snippet(text: &str) -> String {
    text.chars().take(ERROR_BODY_CHARS).collect()
}

/// Parse the kline array format: `[open_time, open, high, low, close, volume, ...]`.
fn parse_klines(raw: &serde_json::Value) -> Vec<MarketSample> {
    let Some(rows) = raw.as_array() else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| {
            let row = row.as_array()?;
            if row.len() < 6 {
                return None;
            }
            let field = |i: usize| -> Option<f64> { row[i].as_str()?.parse().ok() };

            Some(MarketSample {
                timestamp: row[0].as_i64()?,
                open: field(1)?,
                high: field(2)?,
                low: field(3)?,
                close: field(4)?,
                volume: field(5)?,
            })
        })
        .collect()
}

impl MarketDataSource for BinanceSource {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch_recent_samples(&self) -> SourceFuture<'_, Vec<MarketSample>> {
        Box::pin(self.klines())
    }

    fn fetch_current_price(&self) -> SourceFuture<'_, f64> {
        Box::pin(self.price())
    }
}
