//! Detector configuration
//!
//! [`DetectorConfig`] is the single value object holding every threshold the
//! engine reads. It is validated once (engine construction or preset loading)
//! and then passed around by value or reference.
//!
//! # Presets
//!
//! Preset documents are flat JSON objects. The eleven core keys are required;
//! the tuning keys fall back to the defaults of [`DetectorConfig::default`]:
//!
//! ```rust
//! use pinbar::config::DetectorConfig;
//!
//! let preset = r#"{
//!     "min_shadow_body_ratio": 2.0,
//!     "max_body_ratio": 0.3,
//!     "min_candle_size": 0.005,
//!     "rsi_period": 14,
//!     "rsi_oversold": 35,
//!     "rsi_overbought": 65,
//!     "bb_period": 20,
//!     "volume_threshold": 1.2,
//!     "min_signal_score": 3,
//!     "sr_lookback": 40,
//!     "level_proximity": 0.008
//! }"#;
//!
//! let config = DetectorConfig::from_json(preset).unwrap();
//! assert_eq!(config.sr_lookback, 40);
//! ```

use serde::{Deserialize, Serialize};

use crate::{Result, SignalError, MAX_SCORE};

// ============================================================
// DETECTOR CONFIG
// ============================================================

/// All thresholds used by [`crate::PinbarSignalEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectorConfig {
    // --- pinbar geometry ---
    /// Dominant shadow must be at least this many bodies long
    pub min_shadow_body_ratio: f64,
    /// Body must be at most this fraction of the high-low range
    pub max_body_ratio: f64,
    /// Range must be at least this fraction of the close
    pub min_candle_size: f64,
    /// Opposite shadow may be at most this fraction of the dominant shadow
    #[serde(default = "defaults::max_opposite_shadow_ratio")]
    pub max_opposite_shadow_ratio: f64,
    /// Body substitute (as a fraction of range) when the body is zero
    #[serde(default = "defaults::doji_epsilon")]
    pub doji_epsilon: f64,
    /// Shadow/body ratio that earns the pattern-quality point
    #[serde(default = "defaults::quality_shadow_ratio")]
    pub quality_shadow_ratio: f64,
    /// Body/range ratio that earns the pattern-quality point
    #[serde(default = "defaults::quality_body_ratio")]
    pub quality_body_ratio: f64,

    // --- trend ---
    /// Slow moving average period
    #[serde(default = "defaults::trend_period")]
    pub trend_period: usize,
    #[serde(default = "defaults::fast_ma_period")]
    pub fast_ma_period: usize,
    #[serde(default = "defaults::adx_period")]
    pub adx_period: usize,
    /// ADX at or above this marks a strong trend
    #[serde(default = "defaults::adx_threshold")]
    pub adx_threshold: f64,

    // --- oscillators / bands ---
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub bb_period: usize,
    #[serde(default = "defaults::bb_std_dev")]
    pub bb_std_dev: f64,

    // --- volume ---
    #[serde(default = "defaults::volume_period")]
    pub volume_period: usize,
    /// Current volume / average volume needed for the volume point
    pub volume_threshold: f64,

    // --- support / resistance ---
    pub sr_lookback: usize,
    /// Bars on each side a swing point must dominate
    #[serde(default = "defaults::swing_strength")]
    pub swing_strength: usize,
    /// Relative distance from the close at which a level confirms
    pub level_proximity: f64,

    // --- scoring / trade levels ---
    pub min_signal_score: u8,
    #[serde(default = "defaults::stop_loss_buffer")]
    pub stop_loss_buffer: f64,
    #[serde(default = "defaults::take_profit_multiples")]
    pub take_profit_multiples: [f64; 3],
}

mod defaults {
    pub fn max_opposite_shadow_ratio() -> f64 {
        0.5
    }

    pub fn doji_epsilon() -> f64 {
        0.001
    }

    pub fn quality_shadow_ratio() -> f64 {
        3.0
    }

    pub fn quality_body_ratio() -> f64 {
        0.2
    }

    pub fn trend_period() -> usize {
        20
    }

    pub fn fast_ma_period() -> usize {
        10
    }

    pub fn adx_period() -> usize {
        14
    }

    pub fn adx_threshold() -> f64 {
        20.0
    }

    pub fn bb_std_dev() -> f64 {
        2.0
    }

    pub fn volume_period() -> usize {
        20
    }

    pub fn swing_strength() -> usize {
        2
    }

    pub fn stop_loss_buffer() -> f64 {
        0.001
    }

    pub fn take_profit_multiples() -> [f64; 3] {
        [1.5, 2.5, 3.5]
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_shadow_body_ratio: 1.8,
            max_body_ratio: 0.4,
            min_candle_size: 0.002,
            max_opposite_shadow_ratio: defaults::max_opposite_shadow_ratio(),
            doji_epsilon: defaults::doji_epsilon(),
            quality_shadow_ratio: defaults::quality_shadow_ratio(),
            quality_body_ratio: defaults::quality_body_ratio(),
            trend_period: defaults::trend_period(),
            fast_ma_period: defaults::fast_ma_period(),
            adx_period: defaults::adx_period(),
            adx_threshold: defaults::adx_threshold(),
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            bb_period: 20,
            bb_std_dev: defaults::bb_std_dev(),
            volume_period: defaults::volume_period(),
            volume_threshold: 1.2,
            sr_lookback: 50,
            swing_strength: defaults::swing_strength(),
            level_proximity: 0.002,
            min_signal_score: 4,
            stop_loss_buffer: defaults::stop_loss_buffer(),
            take_profit_multiples: defaults::take_profit_multiples(),
        }
    }
}

fn invalid(msg: impl Into<String>) -> SignalError {
    SignalError::InvalidConfig(msg.into())
}

fn positive(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(format!("{field} must be positive and finite, got {value}")));
    }
    Ok(())
}

fn nonzero(field: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(invalid(format!("{field} must be > 0")));
    }
    Ok(())
}

impl DetectorConfig {
    /// Parse a JSON preset and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SignalError::Preset(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a pretty-printed JSON preset.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SignalError::Preset(e.to_string()))
    }

    /// Check every threshold for sign, finiteness and mutual consistency.
    pub fn validate(&self) -> Result<()> {
        positive("min_shadow_body_ratio", self.min_shadow_body_ratio)?;
        positive("max_body_ratio", self.max_body_ratio)?;
        if self.max_body_ratio > 1.0 {
            return Err(invalid(format!(
                "max_body_ratio must be <= 1.0, got {}",
                self.max_body_ratio
            )));
        }
        positive("min_candle_size", self.min_candle_size)?;
        positive("max_opposite_shadow_ratio", self.max_opposite_shadow_ratio)?;
        positive("doji_epsilon", self.doji_epsilon)?;
        positive("quality_shadow_ratio", self.quality_shadow_ratio)?;
        positive("quality_body_ratio", self.quality_body_ratio)?;

        nonzero("trend_period", self.trend_period)?;
        nonzero("fast_ma_period", self.fast_ma_period)?;
        if self.fast_ma_period >= self.trend_period {
            return Err(invalid(format!(
                "fast_ma_period ({}) must be shorter than trend_period ({})",
                self.fast_ma_period, self.trend_period
            )));
        }
        nonzero("adx_period", self.adx_period)?;
        positive("adx_threshold", self.adx_threshold)?;

        nonzero("rsi_period", self.rsi_period)?;
        positive("rsi_oversold", self.rsi_oversold)?;
        positive("rsi_overbought", self.rsi_overbought)?;
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(invalid(format!(
                "rsi_oversold ({}) must be below rsi_overbought ({})",
                self.rsi_oversold, self.rsi_overbought
            )));
        }
        if self.rsi_overbought >= 100.0 {
            return Err(invalid(format!(
                "rsi_overbought must be < 100, got {}",
                self.rsi_overbought
            )));
        }
        nonzero("bb_period", self.bb_period)?;
        positive("bb_std_dev", self.bb_std_dev)?;

        nonzero("volume_period", self.volume_period)?;
        positive("volume_threshold", self.volume_threshold)?;

        nonzero("sr_lookback", self.sr_lookback)?;
        nonzero("swing_strength", self.swing_strength)?;
        positive("level_proximity", self.level_proximity)?;

        if self.min_signal_score == 0 || self.min_signal_score > MAX_SCORE {
            return Err(invalid(format!(
                "min_signal_score must be in 1..={MAX_SCORE}, got {}",
                self.min_signal_score
            )));
        }
        if !self.stop_loss_buffer.is_finite() || self.stop_loss_buffer < 0.0 {
            return Err(invalid(format!(
                "stop_loss_buffer must be >= 0, got {}",
                self.stop_loss_buffer
            )));
        }
        if self.checked_required_bars().is_none() {
            return Err(invalid("lookback periods overflow the addressable window size"));
        }
        let [tp1, tp2, tp3] = self.take_profit_multiples;
        positive("take_profit_multiples", tp1)?;
        if !(tp1 < tp2 && tp2 < tp3 && tp3.is_finite()) {
            return Err(invalid(format!(
                "take_profit_multiples must be strictly increasing, got {:?}",
                self.take_profit_multiples
            )));
        }
        Ok(())
    }

    /// Number of trailing bars one evaluation reads.
    ///
    /// Never less than the largest of `rsi_period`, `bb_period`,
    /// `sr_lookback` and `trend_period`.
    /// Saturates at `usize::MAX` for periods that `validate` rejects.
    pub fn required_bars(&self) -> usize {
        self.checked_required_bars().unwrap_or(usize::MAX)
    }

    fn checked_required_bars(&self) -> Option<usize> {
        let lookbacks = [
            self.rsi_period.checked_add(1)?,
            self.bb_period,
            self.trend_period,
            self.sr_lookback,
            self.volume_period.checked_add(1)?,
            self.adx_period.checked_mul(2)?,
        ];
        lookbacks.into_iter().max()
    }

    /// Template thresholds for a market regime.
    pub fn for_regime(regime: MarketRegime) -> Self {
        let base = Self::default();
        let (shadow, body, score, volume, adx, oversold, overbought) = match regime {
            MarketRegime::HighVolTrending => (1.5, 0.35, 2, 0.8, 15.0, 35.0, 65.0),
            MarketRegime::HighVolRanging => (2.5, 0.25, 4, 1.5, 25.0, 25.0, 75.0),
            MarketRegime::MedVolTrending => (2.0, 0.30, 3, 1.0, 20.0, 30.0, 70.0),
            MarketRegime::MedVolRanging => (2.3, 0.28, 3, 1.2, 22.0, 28.0, 72.0),
            MarketRegime::LowVolTrending => (1.8, 0.32, 2, 0.9, 18.0, 32.0, 68.0),
            MarketRegime::LowVolRanging => (2.8, 0.22, 4, 1.3, 28.0, 20.0, 80.0),
        };
        Self {
            min_shadow_body_ratio: shadow,
            max_body_ratio: body,
            min_signal_score: score,
            volume_threshold: volume,
            adx_threshold: adx,
            rsi_oversold: oversold,
            rsi_overbought: overbought,
            ..base
        }
    }
}

// ============================================================
// MARKET REGIME
// ============================================================

/// Volatility x trend-strength bucket used to pick a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketRegime {
    HighVolTrending,
    HighVolRanging,
    MedVolTrending,
    MedVolRanging,
    LowVolTrending,
    LowVolRanging,
}

impl MarketRegime {
    pub const ALL: [MarketRegime; 6] = [
        MarketRegime::HighVolTrending,
        MarketRegime::HighVolRanging,
        MarketRegime::MedVolTrending,
        MarketRegime::MedVolRanging,
        MarketRegime::LowVolTrending,
        MarketRegime::LowVolRanging,
    ];

    #[inline]
    pub fn is_trending(self) -> bool {
        matches!(
            self,
            MarketRegime::HighVolTrending
                | MarketRegime::MedVolTrending
                | MarketRegime::LowVolTrending
        )
    }
}

// ============================================================
// TESTS
// ============================================================
