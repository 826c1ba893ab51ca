//! # pinbar - Pinbar signal engine
//!
//! Detects pinbar candles (hammers and shooting stars) on the latest bar of a
//! price window and scores them against trend, RSI, Bollinger Band, volume and
//! support/resistance confirmations.
//!
//! ## Quick Start
//!
//! ```rust
//! use pinbar::prelude::*;
//!
//! let config = DetectorConfig::default();
//! let engine = PinbarSignalEngine::new(config).unwrap();
//!
//! // Any type implementing OHLCV works; `Candle` is provided.
//! let mut bars: Vec<Candle> = (0..60)
//!     .map(|i| {
//!         let p = 100.0 + (i % 5) as f64;
//!         Candle::new(i, p, p + 1.0, p - 1.0, p + 0.5, 1_000.0)
//!     })
//!     .collect();
//! bars.push(Candle::new(60, 100.0, 101.0, 90.0, 100.5, 2_500.0));
//!
//! let signal = engine.evaluate(&bars).unwrap();
//! assert_eq!(signal.pattern(), PinbarKind::Hammer);
//! assert_eq!(signal.is_executable(), signal.score() >= config.min_signal_score);
//! ```

pub mod config;
pub mod engine;
pub mod geometry;
pub mod indicators;
pub mod params;
pub mod regime;

pub use config::{DetectorConfig, MarketRegime};
pub use engine::{
    evaluate, BarSignal, FactorBreakdown, IndicatorSnapshot, PinbarSignalEngine, Signal,
    SignalDirection, SignalIterator, SignalStrength, TradeLevels,
};
pub use geometry::{classify, PinbarCandidate, PinbarKind};
pub use regime::MarketProfile;

pub mod prelude {
    pub use crate::{
        // Config
        config::{DetectorConfig, MarketRegime},
        // Engine
        engine::{
            evaluate, BarSignal, FactorBreakdown, IndicatorSnapshot, PinbarSignalEngine,
            Signal, SignalDirection, SignalIterator, SignalStrength, TradeLevels,
        },
        // Parallel
        evaluate_parallel,
        // Geometry
        geometry::{classify, PinbarCandidate, PinbarKind},
        // Parameters
        params::{param_grid, ParamMeta, ParamType, Parameterized},
        // Regime
        regime::MarketProfile,
        scan_parallel,
        // Types
        Candle,
        OHLCVExt,
        Result,
        SeriesScan,
        // Errors
        SignalError,
        SymbolError,
        SymbolSignal,
        Trend,
        MAX_SCORE,
        OHLCV,
    };
}

/// Highest composite score a signal can reach (one point per factor).
pub const MAX_SCORE: u8 = 6;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, SignalError>;

/// Errors returned by configuration loading and signal evaluation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignalError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Insufficient data: need {need} bars, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: &'static str },

    #[error("Invalid preset: {0}")]
    Preset(String),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    fn timestamp(&self) -> Option<i64> {
        None
    }
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Body as ratio of range. Returns None if range is zero
    #[inline]
    fn body_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > 0.0).then(|| self.body() / range)
    }

    /// Sanity-check a single bar. The reported index is always 0; callers
    /// remap it to the bar's position.
    fn validate(&self) -> Result<()> {
        let values = [self.open(), self.high(), self.low(), self.close(), self.volume()];
        if values.iter().any(|v| v.is_nan()) {
            return Err(SignalError::InvalidCandle {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if values.iter().any(|v| v.is_infinite()) {
            return Err(SignalError::InvalidCandle {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if self.high() < self.low() {
            return Err(SignalError::InvalidCandle {
                index: 0,
                reason: "high < low",
            });
        }
        let (lo, hi) = (self.low(), self.high());
        if !(lo..=hi).contains(&self.open()) || !(lo..=hi).contains(&self.close()) {
            return Err(SignalError::InvalidCandle {
                index: 0,
                reason: "open/close outside high-low range",
            });
        }
        if self.volume() < 0.0 {
            return Err(SignalError::InvalidCandle {
                index: 0,
                reason: "negative volume",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

/// Validate a run of bars, reporting positions offset by `offset`.
pub(crate) fn validate_bars<T: OHLCV>(bars: &[T], offset: usize) -> Result<()> {
    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            SignalError::InvalidCandle { reason, .. } => SignalError::InvalidCandle {
                index: offset + i,
                reason,
            },
            other => other,
        })?;
    }
    Ok(())
}

// ============================================================
// CANDLE
// ============================================================

/// One OHLCV bar. Timestamp unit is up to the data source (usually epoch ms).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Copy any OHLCV bar into a `Candle`. Missing timestamps become 0.
    pub fn from_ohlcv<T: OHLCV + ?Sized>(bar: &T) -> Self {
        Self {
            timestamp: bar.timestamp().unwrap_or_default(),
            open: bar.open(),
            high: bar.high(),
            low: bar.low(),
            close: bar.close(),
            volume: bar.volume(),
        }
    }
}

impl OHLCV for Candle {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn timestamp(&self) -> Option<i64> {
        Some(self.timestamp)
    }
}

// ============================================================
// MARKET CONTEXT
// ============================================================

/// Market trend classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Trend {
    StrongUp,
    WeakUp,
    #[default]
    Sideways,
    WeakDown,
    StrongDown,
}

impl Trend {
    #[inline]
    pub fn is_down(self) -> bool {
        matches!(self, Trend::WeakDown | Trend::StrongDown)
    }

    #[inline]
    pub fn is_up(self) -> bool {
        matches!(self, Trend::WeakUp | Trend::StrongUp)
    }

    #[inline]
    pub fn is_strong(self) -> bool {
        matches!(self, Trend::StrongUp | Trend::StrongDown)
    }
}

// ============================================================
// PARALLEL EVALUATION
// ============================================================

use rayon::prelude::*;

/// Latest-bar signal for one instrument
#[derive(Debug)]
pub struct SymbolSignal {
    pub symbol: String,
    pub signal: Signal,
}

/// Series scan for one instrument
#[derive(Debug)]
pub struct SeriesScan {
    pub symbol: String,
    pub signals: Vec<BarSignal>,
}

/// Error from evaluating a single instrument
#[derive(Debug)]
pub struct SymbolError {
    pub symbol: String,
    pub error: SignalError,
}

/// Evaluate the most recent bar of many instruments in parallel.
pub fn evaluate_parallel<'a, T, I>(
    engine: &PinbarSignalEngine,
    instruments: I,
) -> (Vec<SymbolSignal>, Vec<SymbolError>)
where
    T: OHLCV + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            engine
                .evaluate(bars)
                .map(|signal| SymbolSignal {
                    symbol: symbol.to_string(),
                    signal,
                })
                .map_err(|error| SymbolError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    split_results(results)
}

/// Scan the full series of many instruments in parallel.
///
/// A symbol fails as a whole only when its series is shorter than
/// [`DetectorConfig::required_bars`]; bad individual bars are skipped.
pub fn scan_parallel<'a, T, I>(
    engine: &PinbarSignalEngine,
    instruments: I,
) -> (Vec<SeriesScan>, Vec<SymbolError>)
where
    T: OHLCV + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let need = engine.config().required_bars();
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            if bars.len() < need {
                return Err(SymbolError {
                    symbol: symbol.to_string(),
                    error: SignalError::InsufficientData {
                        need,
                        got: bars.len(),
                    },
                });
            }
            Ok(SeriesScan {
                symbol: symbol.to_string(),
                signals: engine.scan(bars),
            })
        })
        .collect();

    split_results(results)
}

fn split_results<S, E>(results: Vec<std::result::Result<S, E>>) -> (Vec<S>, Vec<E>) {
    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
