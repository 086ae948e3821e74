//! Exact fixed-point conversion between display amounts and minimal units
//!
//! On-chain amounts are integers in the currency's minimal denomination;
//! 18-decimal tokens overflow an f64 mantissa, so every conversion here goes
//! through arbitrary-precision arithmetic. Nothing on this path touches
//! floating point.

use crate::error::{CoreError, CoreResult};

use bigdecimal::BigDecimal;
use num::bigint::{Sign, ToBigInt};
use num::{BigInt, BigUint, One};
use std::fmt;
use std::str::FromStr;

/// Default number of fractional digits retained for display.
pub const DEFAULT_DISPLAY_PRECISION: u32 = 4;

/// An arbitrary-precision signed fixed-point amount with an explicit display
/// scale.
///
/// The underlying value is exact; the scale only controls how many
/// fractional digits `Display` renders (by truncation). Converting minimal
/// units to display and back is lossless; rendering is lossy by design
/// whenever the display precision is coarser than the currency's decimals.
#[derive(Clone, Debug)]
pub struct DecimalAmount {
    value: BigDecimal,
    precision: u32,
}

impl DecimalAmount {
    /// Parse a human-entered decimal string with the default display scale.
    pub fn parse(input: &str) -> CoreResult<Self> {
        let value = BigDecimal::from_str(input.trim())
            .map_err(|e| CoreError::InvalidAmount(format!("{}: {}", input, e)))?;

        Ok(Self {
            value,
            precision: DEFAULT_DISPLAY_PRECISION,
        })
    }

    /// Change the number of fractional digits `Display` renders.
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Convert to an integer amount in minimal units by multiplying with
    /// `10^decimals` exactly, then truncating any residual fraction toward
    /// zero (matching on-chain integer semantics).
    ///
    /// Fails with `InvalidAmount` for negative values.
    pub fn to_minimal(&self, decimals: u32) -> CoreResult<BigUint> {
        if self.value.sign() == Sign::Minus {
            return Err(CoreError::InvalidAmount(format!(
                "negative amount: {}",
                self.value
            )));
        }

        let scaled = &self.value * pow10(decimals);
        let int = scaled
            .to_bigint()
            .ok_or_else(|| CoreError::InvalidAmount(format!("not a finite value: {}", self.value)))?;

        // Sign already checked, the magnitude is the whole value.
        Ok(int.magnitude().clone())
    }

    /// Convert an integer amount in minimal units back to a display amount
    /// by dividing with `10^decimals` exactly.
    pub fn from_minimal(minimal: &BigUint, decimals: u32, precision: u32) -> Self {
        let value = BigDecimal::new(BigInt::from(minimal.clone()), i64::from(decimals));
        Self { value, precision }
    }

    /// Render the value as a percentage: multiply by 100 with the same exact
    /// arithmetic, truncate to `precision` fractional digits, append `%`.
    pub fn percent(&self, precision: u32) -> String {
        let hundred = BigDecimal::from(100);
        format!("{}%", render_truncated(&(&self.value * hundred), precision))
    }

    /// The exact underlying value.
    pub fn value(&self) -> &BigDecimal {
        &self.value
    }
}

impl fmt::Display for DecimalAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_truncated(&self.value, self.precision))
    }
}

impl PartialEq for DecimalAmount {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// `10^exp` as an exact decimal.
fn pow10(exp: u32) -> BigDecimal {
    BigDecimal::new(BigInt::one(), -i64::from(exp))
}

/// Render a decimal with exactly `precision` fractional digits, truncating
/// (never rounding) extra digits.
fn render_truncated(value: &BigDecimal, precision: u32) -> String {
    let scaled = (value * pow10(precision))
        .to_bigint()
        .expect("finite decimal scales to an integer");

    let negative = scaled.sign() == Sign::Minus;
    let digits = scaled.magnitude().to_string();

    let (int_part, frac_part) = if precision == 0 {
        (digits, String::new())
    } else {
        let precision = precision as usize;
        let padded = if digits.len() <= precision {
            format!("{}{}", "0".repeat(precision + 1 - digits.len()), digits)
        } else {
            digits
        };
        let split = padded.len() - precision;
        (padded[..split].to_string(), padded[split..].to_string())
    };

    let sign = if negative && (int_part != "0" || frac_part.chars().any(|c| c != '0')) {
        "-"
    } else {
        ""
    };

    if frac_part.is_empty() {
        format!("{}{}", sign, int_part)
    } else {
        format!("{}{}.{}", sign, int_part, frac_part)
    }
}
