//! Support/resistance from swing points
//!
//! A swing high is a bar whose high is strictly above every other high within
//! `swing` bars on both sides; swing lows mirror that. Their prices become
//! resistance and support levels.

use serde::{Deserialize, Serialize};

use crate::OHLCV;

/// Sorted, de-duplicated level prices
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyLevels {
    pub supports: Vec<f64>,
    pub resistances: Vec<f64>,
}

impl KeyLevels {
    pub fn is_empty(&self) -> bool {
        self.supports.is_empty() && self.resistances.is_empty()
    }

    /// Support at or below `close` within `proximity` (relative to the
    /// level) of it. Returns the closest qualifying level.
    pub fn support_near(&self, close: f64, proximity: f64) -> Option<f64> {
        self.supports
            .iter()
            .copied()
            .filter(|&level| level > 0.0 && level <= close)
            .filter(|&level| (close - level) / level <= proximity)
            .min_by(|a, b| (close - a).total_cmp(&(close - b)))
    }

    /// Mirror of [`KeyLevels::support_near`] for resistance at or above the close.
    pub fn resistance_near(&self, close: f64, proximity: f64) -> Option<f64> {
        self.resistances
            .iter()
            .copied()
            .filter(|&level| level > 0.0 && level >= close)
            .filter(|&level| (level - close) / level <= proximity)
            .min_by(|a, b| (a - close).total_cmp(&(b - close)))
    }

    /// Level of either kind nearest to `price`.
    pub fn nearest(&self, price: f64) -> Option<f64> {
        self.supports
            .iter()
            .chain(&self.resistances)
            .copied()
            .min_by(|a, b| (a - price).abs().total_cmp(&(b - price).abs()))
    }
}

/// Find swing-point levels in `bars`.
pub fn find_levels<T: OHLCV>(bars: &[T], swing: usize) -> KeyLevels {
    let mut levels = KeyLevels::default();
    let too_short = swing.checked_mul(2).map_or(true, |span| bars.len() <= span);
    if swing == 0 || too_short {
        return levels;
    }

    for i in swing..bars.len() - swing {
        let neighbours = (i - swing..=i + swing).filter(|&j| j != i);
        let high = bars[i].high();
        let low = bars[i].low();

        if neighbours.clone().all(|j| bars[j].high() < high) {
            levels.resistances.push(high);
        }
        if neighbours.into_iter().all(|j| bars[j].low() > low) {
            levels.supports.push(low);
        }
    }

    levels.supports.sort_by(f64::total_cmp);
    levels.supports.dedup();
    levels.resistances.sort_by(f64::total_cmp);
    levels.resistances.dedup();
    levels
}
