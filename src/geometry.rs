//! Pinbar geometry classification
//!
//! A pinbar is a candle with a small body and one dominant shadow. The long
//! lower shadow variant is a [`PinbarKind::Hammer`], the long upper shadow
//! variant a [`PinbarKind::ShootingStar`].

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{config::DetectorConfig, engine::SignalDirection, Candle, OHLCVExt, OHLCV};

/// Geometric classification of a single candle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinbarKind {
    Hammer,
    ShootingStar,
    #[default]
    None,
}

impl PinbarKind {
    /// Trade direction implied by the pattern.
    #[inline]
    pub fn direction(self) -> SignalDirection {
        match self {
            PinbarKind::Hammer => SignalDirection::Long,
            PinbarKind::ShootingStar => SignalDirection::Short,
            PinbarKind::None => SignalDirection::None,
        }
    }

    #[inline]
    pub fn is_pinbar(self) -> bool {
        !matches!(self, PinbarKind::None)
    }
}

/// Measurements of the candle under test plus its classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinbarCandidate {
    pub kind: PinbarKind,
    pub candle: Candle,
    pub body: f64,
    pub range: f64,
    pub upper_shadow: f64,
    pub lower_shadow: f64,
    /// body / range, 0 when the range is zero
    pub body_ratio: f64,
    /// lower shadow / body (epsilon-substituted for dojis)
    pub lower_shadow_ratio: f64,
    /// upper shadow / body (epsilon-substituted for dojis)
    pub upper_shadow_ratio: f64,
}

impl PinbarCandidate {
    /// Shadow/body ratio of the shadow that defines the pattern.
    pub fn dominant_shadow_ratio(&self) -> f64 {
        match self.kind {
            PinbarKind::Hammer => self.lower_shadow_ratio,
            PinbarKind::ShootingStar => self.upper_shadow_ratio,
            PinbarKind::None => self.lower_shadow_ratio.max(self.upper_shadow_ratio),
        }
    }

    /// Graded shape quality in 0.0..=1.0; 0 for non-pinbars.
    ///
    /// Half the weight comes from shadow length (tiers at 1.5, 2, 3 bodies),
    /// half from body smallness (tiers at 40%, 30%, 20% of range).
    pub fn quality(&self) -> f64 {
        if !self.kind.is_pinbar() {
            return 0.0;
        }
        let shadow = match self.dominant_shadow_ratio() {
            r if r >= 3.0 => 1.0,
            r if r >= 2.0 => 0.7,
            r if r >= 1.5 => 0.4,
            _ => 0.2,
        };
        let body = match self.body_ratio {
            r if r <= 0.2 => 1.0,
            r if r <= 0.3 => 0.7,
            r if r <= 0.4 => 0.4,
            _ => 0.2,
        };
        0.5 * shadow + 0.5 * body
    }
}

/// Classify a single candle against the geometric thresholds of `config`.
///
/// Never divides by zero: a zero range yields [`PinbarKind::None`], a zero
/// body is replaced by `doji_epsilon * range`.
pub fn classify<T: OHLCV>(bar: &T, config: &DetectorConfig) -> PinbarCandidate {
    let body = bar.body();
    let range = bar.range();
    let upper = bar.upper_shadow();
    let lower = bar.lower_shadow();

    let mut candidate = PinbarCandidate {
        kind: PinbarKind::None,
        candle: Candle::from_ohlcv(bar),
        body,
        range,
        upper_shadow: upper,
        lower_shadow: lower,
        body_ratio: 0.0,
        lower_shadow_ratio: 0.0,
        upper_shadow_ratio: 0.0,
    };

    if range <= 0.0 {
        trace!("zero-range candle rejected");
        return candidate;
    }

    let denom = if body > 0.0 {
        body
    } else {
        config.doji_epsilon * range
    };
    candidate.body_ratio = body / range;
    candidate.lower_shadow_ratio = lower / denom;
    candidate.upper_shadow_ratio = upper / denom;

    if range < config.min_candle_size * bar.close() {
        trace!(range, "candle below minimum size");
        return candidate;
    }
    if candidate.body_ratio > config.max_body_ratio {
        trace!(body_ratio = candidate.body_ratio, "body too large");
        return candidate;
    }

    let hammer = candidate.lower_shadow_ratio >= config.min_shadow_body_ratio
        && upper <= config.max_opposite_shadow_ratio * lower;
    let star = candidate.upper_shadow_ratio >= config.min_shadow_body_ratio
        && lower <= config.max_opposite_shadow_ratio * upper;

    candidate.kind = match (hammer, star) {
        (true, false) => PinbarKind::Hammer,
        (false, true) => PinbarKind::ShootingStar,
        (true, true) => {
            // both shapes only pass with a loose opposite-shadow limit
            if candidate.lower_shadow_ratio > candidate.upper_shadow_ratio {
                PinbarKind::Hammer
            } else if candidate.upper_shadow_ratio > candidate.lower_shadow_ratio {
                PinbarKind::ShootingStar
            } else {
                PinbarKind::None
            }
        },
        (false, false) => PinbarKind::None,
    };

    candidate
}
