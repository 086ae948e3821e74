//! Amount module - exact conversion between display and minimal units
//!
//! This module provides:
//! - Arbitrary-precision fixed-point display amounts
//! - Truncating conversion to/from integer minimal-denomination amounts
//! - Coin normalization against the configured currency registry

mod coin;
mod decimal;

pub use coin::{Coin, Currency, CurrencyRegistry, DEFAULT_COIN_PRECISION};
pub use decimal::{DecimalAmount, DEFAULT_DISPLAY_PRECISION};
