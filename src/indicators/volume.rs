//! Volume confirmation ratio.

use crate::OHLCV;

/// Volume of the last bar over the mean volume of the `period` bars before it.
///
/// Needs `period + 1` bars. A zero average yields `Some(0.0)` so a dead market
/// never reads as a volume surge.
pub fn volume_ratio<T: OHLCV>(bars: &[T], period: usize) -> Option<f64> {
    if period == 0 || bars.len() <= period {
        return None;
    }
    let (last, prior) = bars.split_last()?;
    let history = &prior[prior.len() - period..];
    let avg = history.iter().map(|b| b.volume()).sum::<f64>() / period as f64;
    if avg <= 0.0 {
        return Some(0.0);
    }
    Some(last.volume() / avg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Candle;

    fn bars(volumes: &[f64]) -> Vec<Candle> {
        volumes
            .iter()
            .enumerate()
            .map(|(i, &v)| Candle::new(i as i64, 10.0, 11.0, 9.0, 10.5, v))
            .collect()
    }

    #[test]
    fn ratio_against_prior_bars() {
        let b = bars(&[5000.0, 100.0, 200.0, 300.0, 400.0]);
        assert_eq!(volume_ratio(&b, 3), Some(2.0));
    }

    #[test]
    fn huge_period() {
        let b = bars(&[100.0, 200.0, 300.0]);
        assert_eq!(volume_ratio(&b, usize::MAX), None);
    }

    #[test]
    fn zero_average() {
        let b = bars(&[0.0, 0.0, 50.0]);
        assert_eq!(volume_ratio(&b, 2), Some(0.0));
    }

    #[test]
    fn too_short() {
        let b = bars(&[1.0, 2.0]);
        assert_eq!(volume_ratio(&b, 2), None);
    }
}
