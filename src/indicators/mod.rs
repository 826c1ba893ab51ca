//! Technical indicators used to confirm a pinbar
//!
//! Every function computes the value at the LAST element of its input and
//! returns `None` when the input is too short for the requested period, so the
//! engine can turn missing history into [`crate::SignalError::InsufficientData`]
//! instead of silently shortening a period.
//!
//! - [`sma`]: simple moving average
//! - [`rsi`]: Wilder RSI
//! - [`bollinger`]: Bollinger Bands (population standard deviation)
//! - [`adx`]: Wilder ADX with +DI/-DI
//! - [`volume_ratio`]: current volume over trailing average volume
//! - [`levels`]: swing-point support/resistance

pub mod adx;
pub mod bollinger;
pub mod levels;
pub mod moving_average;
pub mod rsi;
pub mod volume;

pub use adx::{adx, DirectionalIndex};
pub use bollinger::{bollinger, BollingerBands};
pub use levels::{find_levels, KeyLevels};
pub use moving_average::sma;
pub use rsi::rsi;
pub use volume::volume_ratio;
