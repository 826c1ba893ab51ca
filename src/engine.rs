//! Signal engine
//!
//! [`PinbarSignalEngine`] evaluates the most recent bar of a window: geometry
//! first, then five indicator confirmations plus a pattern-quality point. A
//! candle that is not a pinbar short-circuits to a zero-score signal before any
//! indicator is computed.

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    config::DetectorConfig,
    geometry::{classify, PinbarCandidate, PinbarKind},
    indicators::{adx, bollinger, find_levels, rsi, sma, volume_ratio, BollingerBands},
    validate_bars, Result, SignalError, Trend, MAX_SCORE, OHLCV,
};

// ============================================================
// SIGNAL TYPES
// ============================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum SignalDirection {
    Long,
    Short,
    #[default]
    None,
}

/// Coarse bucket of the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SignalStrength {
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl SignalStrength {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=2 => SignalStrength::Weak,
            3..=4 => SignalStrength::Moderate,
            5 => SignalStrength::Strong,
            _ => SignalStrength::VeryStrong,
        }
    }
}

/// Which confirmations fired. Each flag is worth one point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FactorBreakdown {
    /// Graded shape quality in 0.0..=1.0 (informational, not scored)
    pub pattern_quality: f64,
    /// Shape well beyond the classification gate (long shadow and tiny body)
    pub quality_point: bool,
    pub trend_alignment: bool,
    pub rsi_confirmation: bool,
    pub bollinger_confirmation: bool,
    pub volume_confirmation: bool,
    pub level_confirmation: bool,
}

impl FactorBreakdown {
    pub fn points(&self) -> u8 {
        [
            self.quality_point,
            self.trend_alignment,
            self.rsi_confirmation,
            self.bollinger_confirmation,
            self.volume_confirmation,
            self.level_confirmation,
        ]
        .into_iter()
        .filter(|&fired| fired)
        .count() as u8
    }
}

/// Indicator values at the evaluated bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub fast_ma: f64,
    pub slow_ma: f64,
    pub trend: Trend,
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
    pub bands: BollingerBands,
    pub volume_ratio: f64,
    /// Closest swing level to the close, either side
    pub nearest_level: Option<f64>,
    /// Level that earned the support/resistance point
    pub confirming_level: Option<f64>,
}

/// Entry, protective stop and three targets at fixed risk multiples
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeLevels {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profits: [f64; 3],
    pub risk: f64,
    /// Reward/risk of the first target
    pub risk_reward: f64,
}

impl TradeLevels {
    fn compute(candidate: &PinbarCandidate, config: &DetectorConfig) -> Option<Self> {
        let entry = candidate.candle.close;
        let (stop_loss, sign) = match candidate.kind {
            PinbarKind::Hammer => (candidate.candle.low * (1.0 - config.stop_loss_buffer), 1.0),
            PinbarKind::ShootingStar => {
                (candidate.candle.high * (1.0 + config.stop_loss_buffer), -1.0)
            },
            PinbarKind::None => return None,
        };
        let risk = (entry - stop_loss) * sign;
        if risk.is_nan() || risk <= 0.0 {
            return None;
        }
        let take_profits = config.take_profit_multiples.map(|m| entry + sign * m * risk);
        Some(Self {
            entry,
            stop_loss,
            take_profits,
            risk,
            risk_reward: config.take_profit_multiples[0],
        })
    }
}

/// Verdict for one bar.
///
/// Fields are read-only so `is_executable() == (score() >= min_signal_score)`
/// holds for every value that leaves the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    direction: SignalDirection,
    score: u8,
    factors: FactorBreakdown,
    executable: bool,
    strength: SignalStrength,
    candidate: PinbarCandidate,
    indicators: Option<IndicatorSnapshot>,
    trade_levels: Option<TradeLevels>,
    timestamp: Option<i64>,
}

impl Signal {
    fn new(
        candidate: PinbarCandidate,
        factors: FactorBreakdown,
        indicators: Option<IndicatorSnapshot>,
        timestamp: Option<i64>,
        config: &DetectorConfig,
    ) -> Self {
        let score = factors.points().min(MAX_SCORE);
        Self {
            direction: candidate.kind.direction(),
            score,
            factors,
            executable: score >= config.min_signal_score,
            strength: SignalStrength::from_score(score),
            candidate,
            indicators,
            trade_levels: TradeLevels::compute(&candidate, config),
            timestamp,
        }
    }

    /// Zero-score verdict for a candle that is not a pinbar.
    fn rejected(candidate: PinbarCandidate, timestamp: Option<i64>, config: &DetectorConfig) -> Self {
        Self::new(candidate, FactorBreakdown::default(), None, timestamp, config)
    }

    #[inline]
    pub fn direction(&self) -> SignalDirection {
        self.direction
    }

    #[inline]
    pub fn pattern(&self) -> PinbarKind {
        self.candidate.kind
    }

    #[inline]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[inline]
    pub fn factors(&self) -> &FactorBreakdown {
        &self.factors
    }

    #[inline]
    pub fn is_executable(&self) -> bool {
        self.executable
    }

    #[inline]
    pub fn strength(&self) -> SignalStrength {
        self.strength
    }

    /// Score as a fraction of [`MAX_SCORE`].
    #[inline]
    pub fn confidence(&self) -> f64 {
        f64::from(self.score) / f64::from(MAX_SCORE)
    }

    #[inline]
    pub fn candidate(&self) -> &PinbarCandidate {
        &self.candidate
    }

    /// `None` when geometry rejected the bar.
    #[inline]
    pub fn indicators(&self) -> Option<&IndicatorSnapshot> {
        self.indicators.as_ref()
    }

    #[inline]
    pub fn trade_levels(&self) -> Option<&TradeLevels> {
        self.trade_levels.as_ref()
    }

    #[inline]
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
}

// ============================================================
// ENGINE
// ============================================================

/// Stateless evaluator holding a validated [`DetectorConfig`].
#[derive(Debug, Clone, Copy)]
pub struct PinbarSignalEngine {
    config: DetectorConfig,
}

impl PinbarSignalEngine {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Evaluate the last bar of `window`.
    ///
    /// Reads only the trailing [`DetectorConfig::required_bars`] bars. Every
    /// one of them is sanity-checked; a bad bar fails with
    /// [`SignalError::InvalidCandle`] carrying its position in `window`.
    pub fn evaluate<T: OHLCV>(&self, window: &[T]) -> Result<Signal> {
        let config = &self.config;
        let need = config.required_bars();
        if window.len() < need {
            return Err(SignalError::InsufficientData {
                need,
                got: window.len(),
            });
        }
        let offset = window.len() - need;
        let bars = &window[offset..];
        validate_bars(bars, offset)?;

        let Some(last) = bars.last() else {
            return Err(SignalError::InsufficientData { need, got: 0 });
        };
        let candidate = classify(last, config);
        let timestamp = last.timestamp();
        if !candidate.kind.is_pinbar() {
            return Ok(Signal::rejected(candidate, timestamp, config));
        }

        let snapshot = compute_snapshot(bars, &candidate, config)?;
        let factors = score_factors(&candidate, &snapshot, config);
        let signal = Signal::new(candidate, factors, Some(snapshot), timestamp, config);

        debug!(
            pattern = ?signal.pattern(),
            direction = ?signal.direction(),
            score = signal.score(),
            executable = signal.is_executable(),
            factors = ?signal.factors(),
            "pinbar signal"
        );
        Ok(signal)
    }

    /// Walk `bars` evaluating every index that has a full lookback behind it.
    pub fn iter<'a, T: OHLCV>(&'a self, bars: &'a [T]) -> SignalIterator<'a, T> {
        SignalIterator::new(self, bars)
    }

    /// Every directional signal in `bars`. Bars that fail evaluation are
    /// logged and skipped.
    pub fn scan<T: OHLCV>(&self, bars: &[T]) -> Vec<BarSignal> {
        self.iter(bars)
            .filter_map(|(index, result)| match result {
                Ok(signal) if signal.direction() != SignalDirection::None => {
                    Some(BarSignal { index, signal })
                },
                Ok(_) => None,
                Err(error) => {
                    warn!(index, %error, "skipping bar");
                    None
                },
            })
            .collect()
    }
}

/// Validate `config` and evaluate the last bar of `window` in one call.
pub fn evaluate<T: OHLCV>(window: &[T], config: &DetectorConfig) -> Result<Signal> {
    PinbarSignalEngine::new(*config)?.evaluate(window)
}

fn require<V>(value: Option<V>, need: usize, got: usize) -> Result<V> {
    value.ok_or(SignalError::InsufficientData { need, got })
}

fn compute_snapshot<T: OHLCV>(
    bars: &[T],
    candidate: &PinbarCandidate,
    config: &DetectorConfig,
) -> Result<IndicatorSnapshot> {
    let len = bars.len();
    let closes: Vec<f64> = bars.iter().map(|b| b.close()).collect();

    let rsi = require(
        rsi(&closes, config.rsi_period),
        config.rsi_period.saturating_add(1),
        len,
    )?;
    let fast_ma = require(sma(&closes, config.fast_ma_period), config.fast_ma_period, len)?;
    let slow_ma = require(sma(&closes, config.trend_period), config.trend_period, len)?;
    let di = require(
        adx(bars, config.adx_period),
        config.adx_period.saturating_mul(2),
        len,
    )?;
    let bands = require(
        bollinger(&closes, config.bb_period, config.bb_std_dev),
        config.bb_period,
        len,
    )?;
    let volume_ratio = require(
        volume_ratio(bars, config.volume_period),
        config.volume_period.saturating_add(1),
        len,
    )?;

    if config.sr_lookback > len {
        return Err(SignalError::InsufficientData {
            need: config.sr_lookback,
            got: len,
        });
    }
    // levels come from the bars before the one being evaluated
    let prior = &bars[len - config.sr_lookback..len - 1];
    let levels = find_levels(prior, config.swing_strength);

    let candle = &candidate.candle;
    let confirming_level = match candidate.kind {
        PinbarKind::Hammer => levels.support_near(candle.close, config.level_proximity),
        PinbarKind::ShootingStar => levels.resistance_near(candle.close, config.level_proximity),
        PinbarKind::None => None,
    };

    Ok(IndicatorSnapshot {
        rsi,
        fast_ma,
        slow_ma,
        trend: trend_of(fast_ma, slow_ma, di.adx, config.adx_threshold),
        adx: di.adx,
        plus_di: di.plus_di,
        minus_di: di.minus_di,
        bands,
        volume_ratio,
        nearest_level: levels.nearest(candle.close),
        confirming_level,
    })
}

/// Direction from the moving-average pair, strength from ADX.
fn trend_of(fast_ma: f64, slow_ma: f64, adx: f64, adx_threshold: f64) -> Trend {
    let strong = adx >= adx_threshold;
    if fast_ma > slow_ma {
        if strong {
            Trend::StrongUp
        } else {
            Trend::WeakUp
        }
    } else if fast_ma < slow_ma {
        if strong {
            Trend::StrongDown
        } else {
            Trend::WeakDown
        }
    } else {
        Trend::Sideways
    }
}

fn score_factors(
    candidate: &PinbarCandidate,
    snapshot: &IndicatorSnapshot,
    config: &DetectorConfig,
) -> FactorBreakdown {
    let candle = &candidate.candle;
    let trend = snapshot.trend;

    let (trend_alignment, rsi_confirmation, bollinger_confirmation) = match candidate.kind {
        PinbarKind::Hammer => (
            trend.is_up() || (candle.close < snapshot.slow_ma && trend != Trend::StrongDown),
            snapshot.rsi < config.rsi_oversold,
            candle.low < snapshot.bands.lower,
        ),
        PinbarKind::ShootingStar => (
            trend.is_down() || (candle.close > snapshot.slow_ma && trend != Trend::StrongUp),
            snapshot.rsi > config.rsi_overbought,
            candle.high > snapshot.bands.upper,
        ),
        PinbarKind::None => (false, false, false),
    };

    FactorBreakdown {
        pattern_quality: candidate.quality(),
        quality_point: candidate.kind.is_pinbar()
            && candidate.dominant_shadow_ratio() >= config.quality_shadow_ratio
            && candidate.body_ratio <= config.quality_body_ratio,
        trend_alignment,
        rsi_confirmation,
        bollinger_confirmation,
        volume_confirmation: snapshot.volume_ratio >= config.volume_threshold,
        level_confirmation: snapshot.confirming_level.is_some(),
    }
}

// ============================================================
// SERIES ITERATION
// ============================================================

/// Directional signal found while scanning a series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSignal {
    pub index: usize,
    pub signal: Signal,
}

/// Iterator over `(index, result)` for every bar with enough history
pub struct SignalIterator<'a, T: OHLCV> {
    engine: &'a PinbarSignalEngine,
    bars: &'a [T],
    current: usize,
}

impl<'a, T: OHLCV> SignalIterator<'a, T> {
    fn new(engine: &'a PinbarSignalEngine, bars: &'a [T]) -> Self {
        let first = engine.config.required_bars().saturating_sub(1);
        Self {
            engine,
            bars,
            current: first.min(bars.len()),
        }
    }
}

impl<'a, T: OHLCV> Iterator for SignalIterator<'a, T> {
    type Item = (usize, Result<Signal>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.bars.len() {
            return None;
        }

        let index = self.current;
        let result = self.engine.evaluate(&self.bars[..=index]);
        self.current += 1;

        Some((index, result))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bars.len().saturating_sub(self.current);
        (remaining, Some(remaining))
    }
}

impl<'a, T: OHLCV> ExactSizeIterator for SignalIterator<'a, T> {}

// ============================================================
// TESTS
// ============================================================
