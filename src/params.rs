//! Parameter metadata for the detector configuration
//!
//! This module describes the tunable fields of [`DetectorConfig`], enabling:
//! - Grid search optimization
//! - Parameter documentation
//! - Overriding single fields by name
//!
//! # Example
//!
//! ```rust
//! use pinbar::params::{param_grid, Parameterized};
//! use pinbar::DetectorConfig;
//!
//! for param in DetectorConfig::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! let grid = param_grid(&DetectorConfig::default(), &["rsi_oversold", "min_signal_score"]).unwrap();
//! assert_eq!(grid.len(), 4 * 3);
//! ```

use std::collections::HashMap;

use tracing::debug;

use crate::{config::DetectorConfig, Result, SignalError};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Dimensionless ratio (may exceed 1.0, e.g. shadow/body)
  Ratio,
  /// Lookback length in bars (positive integer)
  Period,
  /// Indicator level such as an RSI bound
  Threshold,
  /// Composite score (integer)
  Score,
}

impl ParamType {
  fn is_integer(self) -> bool {
    matches!(self, ParamType::Period | ParamType::Score)
  }
}

/// Metadata for a single configuration parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Field name in [`DetectorConfig`] and in JSON presets
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  /// Range for optimization: (min, max, step)
  pub range: (f64, f64, f64),
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn ratio(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Ratio, default, range, description }
  }

  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  pub const fn threshold(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Threshold, default, range, description }
  }

  pub const fn score(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Score, default, range, description }
  }

  /// Generate all values for grid search.
  ///
  /// Values are `min + k * step`, so long grids do not accumulate drift.
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    if step <= 0.0 || max < min {
      return vec![min];
    }
    let steps = ((max - min) / step + 1e-9).floor() as usize;
    (0..=steps).map(|k| min + k as f64 * step).collect()
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if !(min..=max).contains(&value) {
      return Err(SignalError::OutOfRange { field: self.name, value, min, max });
    }
    if self.param_type.is_integer() && value.fract() != 0.0 {
      return Err(SignalError::InvalidConfig(format!(
        "{} must be an integer, got {value}",
        self.name
      )));
    }
    Ok(())
  }
}

const DETECTOR_PARAMS: &[ParamMeta] = &[
  ParamMeta::ratio(
    "min_shadow_body_ratio",
    1.8,
    (1.5, 3.0, 0.2),
    "Dominant shadow length in bodies",
  ),
  ParamMeta::ratio("max_body_ratio", 0.4, (0.2, 0.5, 0.05), "Body as a fraction of range"),
  ParamMeta::ratio(
    "min_candle_size",
    0.002,
    (0.001, 0.01, 0.001),
    "Range as a fraction of close",
  ),
  ParamMeta::period("rsi_period", 14.0, (7.0, 21.0, 7.0), "RSI lookback"),
  ParamMeta::threshold("rsi_oversold", 30.0, (20.0, 35.0, 5.0), "RSI level confirming a hammer"),
  ParamMeta::threshold(
    "rsi_overbought",
    70.0,
    (65.0, 80.0, 5.0),
    "RSI level confirming a shooting star",
  ),
  ParamMeta::period("bb_period", 20.0, (10.0, 30.0, 5.0), "Bollinger Band lookback"),
  ParamMeta::ratio(
    "volume_threshold",
    1.2,
    (1.0, 2.0, 0.2),
    "Volume over average needed for confirmation",
  ),
  ParamMeta::score("min_signal_score", 4.0, (3.0, 5.0, 1.0), "Score needed to trade"),
  ParamMeta::period("sr_lookback", 50.0, (20.0, 100.0, 10.0), "Bars searched for swing levels"),
  ParamMeta::ratio(
    "level_proximity",
    0.002,
    (0.001, 0.01, 0.001),
    "Relative distance from the close at which a level confirms",
  ),
];

// ============================================================
// PARAMETERIZED TRAIT
// ============================================================

/// Configuration types whose fields can be listed and overridden by name
pub trait Parameterized: Sized {
  /// Returns metadata for all configurable parameters
  fn param_meta() -> &'static [ParamMeta];

  /// Override one field. The value must lie in the parameter's range.
  fn set_param(&mut self, name: &str, value: f64) -> Result<()>;

  /// Copy `base`, apply every override, then validate the result.
  fn with_params(base: &Self, params: &HashMap<&str, f64>) -> Result<Self>;
}

fn find_meta(name: &str) -> Result<&'static ParamMeta> {
  DETECTOR_PARAMS
    .iter()
    .find(|m| m.name == name)
    .ok_or_else(|| SignalError::UnknownParameter(name.to_string()))
}

impl Parameterized for DetectorConfig {
  fn param_meta() -> &'static [ParamMeta] {
    DETECTOR_PARAMS
  }

  fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
    let meta = find_meta(name)?;
    meta.validate(value)?;
    match meta.name {
      "min_shadow_body_ratio" => self.min_shadow_body_ratio = value,
      "max_body_ratio" => self.max_body_ratio = value,
      "min_candle_size" => self.min_candle_size = value,
      "rsi_period" => self.rsi_period = value as usize,
      "rsi_oversold" => self.rsi_oversold = value,
      "rsi_overbought" => self.rsi_overbought = value,
      "bb_period" => self.bb_period = value as usize,
      "volume_threshold" => self.volume_threshold = value,
      "min_signal_score" => self.min_signal_score = value as u8,
      "sr_lookback" => self.sr_lookback = value as usize,
      "level_proximity" => self.level_proximity = value,
      other => return Err(SignalError::UnknownParameter(other.to_string())),
    }
    Ok(())
  }

  fn with_params(base: &Self, params: &HashMap<&str, f64>) -> Result<Self> {
    let mut config = *base;
    for (&name, &value) in params {
      config.set_param(name, value)?;
    }
    config.validate()?;
    Ok(config)
  }
}

// ============================================================
// GRID SEARCH
// ============================================================

/// Cartesian product of the grids of `names`, applied on top of `base`.
///
/// Combinations that fail [`DetectorConfig::validate`] (for example
/// `rsi_oversold >= rsi_overbought`) are dropped. Unknown names are an error.
pub fn param_grid(base: &DetectorConfig, names: &[&str]) -> Result<Vec<DetectorConfig>> {
  let metas = names.iter().map(|n| find_meta(n)).collect::<Result<Vec<_>>>()?;

  let mut configs = vec![*base];
  for meta in metas {
    let values = meta.generate_grid();
    let mut next = Vec::with_capacity(configs.len() * values.len());
    for config in &configs {
      for &value in &values {
        let mut c = *config;
        c.set_param(meta.name, value)?;
        next.push(c);
      }
    }
    configs = next;
  }

  let total = configs.len();
  configs.retain(|c| c.validate().is_ok());
  debug!(total, kept = configs.len(), "parameter grid generated");
  Ok(configs)
}

// ============================================================
// TESTS
// ============================================================
