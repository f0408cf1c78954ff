//! Relative Strength Index (RSI) indicator.

use crate::services::signals::{clamp_contribution, Indicator};
use crate::types::{IndicatorKind, MarketSample};

/// Contribution magnitude in the oversold/overbought zones.
const ZONE_CONTRIBUTION: f64 = 0.8;

/// RSI (Relative Strength Index) indicator.
///
/// Measures momentum by comparing the magnitude of recent gains to recent losses.
/// Values range from 0-100:
/// - Below 30: Oversold (bullish contribution)
/// - Above 70: Overbought (bearish contribution)
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    /// Calculate Wilder-smoothed RSI from close-to-close changes.
    fn calculate_rsi(samples: &[MarketSample], period: usize) -> Option<f64> {
        if period == 0 || samples.len() < period + 1 {
            return None;
        }

        let (gains, losses): (Vec<f64>, Vec<f64>) = samples
            .windows(2)
            .map(|w| {
                let change = w[1].close - w[0].close;
                if change > 0.0 {
                    (change, 0.0)
                } else {
                    (0.0, -change)
                }
            })
            .unzip();

        let mut avg_gain = gains.iter().take(period).sum::<f64>() / period as f64;
        let mut avg_loss = losses.iter().take(period).sum::<f64>() / period as f64;

        for i in period..gains.len() {
            avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        }

        if avg_loss == 0.0 {
            return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
        }

        let rs = avg_gain / avg_loss;
        Some(100.0 - (100.0 / (1.0 + rs)))
    }
}

impl Indicator for Rsi {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Rsi
    }

    fn name(&self) -> &str {
        "RSI (14)"
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, samples: &[MarketSample]) -> Option<f64> {
        Self::calculate_rsi(samples, self.period)
    }

    fn neutral(&self) -> f64 {
        50.0
    }

    fn contribution(&self, rsi: f64) -> f64 {
        // RSI 30 or below = +0.8 (oversold)
        // RSI 50 = 0
        // RSI 70 or above = -0.8 (overbought)
        let c = if rsi < 30.0 {
            ZONE_CONTRIBUTION
        } else if rsi > 70.0 {
            -ZONE_CONTRIBUTION
        } else {
            (50.0 - rsi) / 20.0 * ZONE_CONTRIBUTION
        };
        clamp_contribution(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::indicators::test_support::*;

    #[test]
    fn test_rsi_min_periods() {
        assert_eq!(Rsi::default().min_periods(), 15);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let rsi = Rsi::default();
        assert!(rsi.calculate(&create_uptrend_samples(10)).is_none());
        assert_eq!(rsi.neutral(), 50.0);
    }

    #[test]
    fn test_rsi_uptrend_high_value() {
        let value = Rsi::default()
            .calculate(&create_uptrend_samples(50))
            .unwrap();
        assert!(value > 70.0, "RSI in uptrend should be > 70, got {}", value);
    }

    #[test]
    fn test_rsi_downtrend_low_value() {
        let value = Rsi::default()
            .calculate(&create_downtrend_samples(50))
            .unwrap();
        assert!(value < 30.0, "RSI in downtrend should be < 30, got {}", value);
    }

    #[test]
    fn test_rsi_flat_is_neutral() {
        let value = Rsi::default().calculate(&create_flat_samples(30)).unwrap();
        assert_eq!(value, 50.0);
    }

    #[test]
    fn test_rsi_contribution_zones() {
        let rsi = Rsi::default();
        assert_eq!(rsi.contribution(25.0), 0.8);
        assert_eq!(rsi.contribution(75.0), -0.8);
        assert_eq!(rsi.contribution(50.0), 0.0);
        assert!((rsi.contribution(40.0) - 0.4).abs() < 1e-12);
        assert!((rsi.contribution(30.0) - 0.8).abs() < 1e-12);
    }
}
