//! Bollinger Bands: SMA(close, period) +/- multiplier * stddev(close, period).
//!
//! Uses population stddev (divide by N).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    /// Band width relative to the middle band.
    pub fn width_pct(&self) -> f64 {
        if self.middle == 0.0 {
            return 0.0;
        }
        (self.upper - self.lower) / self.middle
    }
}

/// Bands over the last `period` closes.
pub fn bollinger(closes: &[f64], period: usize, multiplier: f64) -> Option<BollingerBands> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let tail = &closes[closes.len() - period..];
    let n = period as f64;
    let middle = tail.iter().sum::<f64>() / n;
    let variance = tail.iter().map(|c| (c - middle).powi(2)).sum::<f64>() / n;
    let dev = multiplier * variance.sqrt();

    Some(BollingerBands {
        upper: middle + dev,
        middle,
        lower: middle - dev,
    })
}
