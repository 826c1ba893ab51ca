//! ADX - Average Directional Index (Wilder).
//!
//! Steps:
//! 1. Compute +DM, -DM and true range from consecutive bars
//! 2. Smooth each with Wilder smoothing (seed = mean of first `period`)
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR), -DI likewise
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. ADX = Wilder-smoothed DX
//!
//! Needs `2 * period` bars: `period` moves for the DI seed, then `period` DX
//! values for the ADX seed.

use serde::{Deserialize, Serialize};

use crate::OHLCV;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalIndex {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

/// Wilder smoothing. Output index `k` corresponds to input index
/// `k + period - 1`.
fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    out.push(current);

    let alpha = 1.0 / period as f64;
    for &v in &values[period..] {
        current = alpha * v + (1.0 - alpha) * current;
        out.push(current);
    }
    out
}

/// ADX, +DI and -DI at the last bar.
pub fn adx<T: OHLCV>(bars: &[T], period: usize) -> Option<DirectionalIndex> {
    if period == 0 || bars.len() / 2 < period {
        return None;
    }

    let moves = bars.len() - 1;
    let mut tr = Vec::with_capacity(moves);
    let mut plus_dm = Vec::with_capacity(moves);
    let mut minus_dm = Vec::with_capacity(moves);

    for w in bars.windows(2) {
        let (prev, cur) = (&w[0], &w[1]);
        let high_diff = cur.high() - prev.high();
        let low_diff = prev.low() - cur.low();

        plus_dm.push(if high_diff > low_diff && high_diff > 0.0 {
            high_diff
        } else {
            0.0
        });
        minus_dm.push(if low_diff > high_diff && low_diff > 0.0 {
            low_diff
        } else {
            0.0
        });

        let pc = prev.close();
        tr.push(
            (cur.high() - cur.low())
                .max((cur.high() - pc).abs())
                .max((cur.low() - pc).abs()),
        );
    }

    let smooth_tr = wilder_smooth(&tr, period);
    let smooth_plus = wilder_smooth(&plus_dm, period);
    let smooth_minus = wilder_smooth(&minus_dm, period);

    let mut dx = Vec::with_capacity(smooth_tr.len());
    let mut last_di = (0.0, 0.0);
    for i in 0..smooth_tr.len() {
        let (plus_di, minus_di) = if smooth_tr[i] > 0.0 {
            (
                100.0 * smooth_plus[i] / smooth_tr[i],
                100.0 * smooth_minus[i] / smooth_tr[i],
            )
        } else {
            (0.0, 0.0)
        };
        let di_sum = plus_di + minus_di;
        dx.push(if di_sum == 0.0 {
            0.0
        } else {
            100.0 * (plus_di - minus_di).abs() / di_sum
        });
        last_di = (plus_di, minus_di);
    }

    let adx = *wilder_smooth(&dx, period).last()?;
    Some(DirectionalIndex {
        adx,
        plus_di: last_di.0,
        minus_di: last_di.1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_util::bars_from_closes;

    #[test]
    fn wilder_seed_and_step() {
        let out = wilder_smooth(&[1.0, 2.0, 3.0, 6.0], 3);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], 2.0);
        assert!((out[1] - (6.0 / 3.0 + 2.0 * 2.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn adx_huge_period() {
        let bars = bars_from_closes(&[100.0, 101.0, 102.0, 103.0]);
        assert!(adx(&bars, usize::MAX).is_none());
        assert!(adx(&bars, usize::MAX / 2 + 1).is_none());
        assert!(adx(&bars, 3).is_none());
        assert!(adx(&bars, 2).is_some());
    }

    #[test]
    fn adx_bounds() {
        let closes = [
            102.0, 106.0, 99.0, 101.0, 105.0, 108.0, 110.0, 105.0, 107.0, 112.0,
        ];
        let bars = bars_from_closes(&closes);
        let di = adx(&bars, 3).unwrap();
        assert!((0.0..=100.0).contains(&di.adx));
        assert!(di.plus_di >= 0.0 && di.minus_di >= 0.0);
    }

    #[test]
    fn adx_strong_uptrend() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 5.0).collect();
        let bars = bars_from_closes(&closes);
        let di = adx(&bars, 5).unwrap();
        assert!(di.adx > 50.0, "ADX should be elevated in a clean trend, got {}", di.adx);
        assert!(di.plus_di > di.minus_di);
    }

    #[test]
    fn adx_flat_market_is_zero() {
        let bars = bars_from_closes(&[100.0; 20]);
        let di = adx(&bars, 5).unwrap();
        assert_eq!(di.adx, 0.0);
    }

    #[test]
    fn adx_needs_two_periods() {
        let bars = bars_from_closes(&[100.0; 9]);
        assert!(adx(&bars, 5).is_none());
        let bars = bars_from_closes(&[100.0; 10]);
        assert!(adx(&bars, 5).is_some());
    }
}
