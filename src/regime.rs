//! Market regime classification
//!
//! Buckets a series by annualised volatility (high > 60%, medium > 30%) and by
//! a 0..1 trend-strength score, so callers can pick
//! [`DetectorConfig::for_regime`](crate::DetectorConfig::for_regime) presets.
//!
//! Trend strength blends two readings:
//! - 70%: mean ADX(14) over the last 20 bars, normalised by 60
//! - 30%: absolute least-squares slope of the last 50 closes relative to their
//!   mean, times 100, capped at 1

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{config::MarketRegime, indicators::adx, validate_bars, Result, SignalError, OHLCV};

/// Bars needed before a regime is reported.
pub const MIN_REGIME_BARS: usize = 30;

const LOOKBACK: usize = 200;
const ADX_PERIOD: usize = 14;
const ADX_AVERAGE_BARS: usize = 20;
const SLOPE_BARS: usize = 50;
const PERIODS_PER_YEAR: f64 = 365.0;
const MAX_VOLATILITY: f64 = 200.0;
const TRENDING_THRESHOLD: f64 = 0.6;

/// Raw readings behind a regime decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketProfile {
    /// Annualised close-to-close volatility in percent, capped at 200
    pub volatility: f64,
    /// 0.0..=1.0
    pub trend_strength: f64,
    pub regime: MarketRegime,
}

impl MarketRegime {
    /// Classify the last (up to 200) bars of a series.
    pub fn classify<T: OHLCV>(bars: &[T]) -> Result<MarketRegime> {
        MarketProfile::analyze(bars).map(|p| p.regime)
    }

    fn from_readings(volatility: f64, trend_strength: f64) -> MarketRegime {
        let trending = trend_strength > TRENDING_THRESHOLD;
        match (volatility, trending) {
            (v, true) if v > 60.0 => MarketRegime::HighVolTrending,
            (v, false) if v > 60.0 => MarketRegime::HighVolRanging,
            (v, true) if v > 30.0 => MarketRegime::MedVolTrending,
            (v, false) if v > 30.0 => MarketRegime::MedVolRanging,
            (_, true) => MarketRegime::LowVolTrending,
            (_, false) => MarketRegime::LowVolRanging,
        }
    }
}

impl MarketProfile {
    pub fn analyze<T: OHLCV>(bars: &[T]) -> Result<Self> {
        if bars.len() < MIN_REGIME_BARS {
            return Err(SignalError::InsufficientData {
                need: MIN_REGIME_BARS,
                got: bars.len(),
            });
        }
        let offset = bars.len().saturating_sub(LOOKBACK);
        let recent = &bars[offset..];
        validate_bars(recent, offset)?;

        let closes: Vec<f64> = recent.iter().map(|b| b.close()).collect();
        let volatility = annualised_volatility(&closes);
        let trend_strength = trend_strength(recent, &closes);
        let regime = MarketRegime::from_readings(volatility, trend_strength);

        debug!(volatility, trend_strength, ?regime, "market regime");
        Ok(Self {
            volatility,
            trend_strength,
            regime,
        })
    }
}

fn annualised_volatility(closes: &[f64]) -> f64 {
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    // sample standard deviation
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (variance.sqrt() * PERIODS_PER_YEAR.sqrt() * 100.0).min(MAX_VOLATILITY)
}

fn trend_strength<T: OHLCV>(bars: &[T], closes: &[f64]) -> f64 {
    let adx_values: Vec<f64> = (0..ADX_AVERAGE_BARS)
        .filter_map(|back| {
            let end = bars.len().checked_sub(back)?;
            adx(&bars[..end], ADX_PERIOD).map(|di| di.adx)
        })
        .collect();
    let normalized_adx = if adx_values.is_empty() {
        0.5
    } else {
        let avg = adx_values.iter().sum::<f64>() / adx_values.len() as f64;
        (avg / 60.0).min(1.0)
    };

    let tail = &closes[closes.len().saturating_sub(SLOPE_BARS)..];
    let mean = tail.iter().sum::<f64>() / tail.len() as f64;
    let direction = if mean > 0.0 {
        (linear_slope(tail).abs() / mean * 100.0).min(1.0)
    } else {
        0.0
    };

    normalized_adx * 0.7 + direction * 0.3
}

/// Least-squares slope of `values` against their index.
fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 {
        return 0.0;
    }
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;
    let (mut num, mut den) = (0.0, 0.0);
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    num / den
}
