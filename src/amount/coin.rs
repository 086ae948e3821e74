//! Coin normalization against the configured currency registry

use super::decimal::DecimalAmount;
use crate::error::{CoreError, CoreResult};

use num::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default number of fractional digits for display-form coins.
pub const DEFAULT_COIN_PRECISION: u32 = 6;

/// A currency known to the dashboard: the human-facing denom, the on-chain
/// minimal denom, and the power-of-ten scale between them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Currency {
    pub denom: String,
    pub minimal_denom: String,
    pub decimals: u32,
}

/// An amount paired with its denom. The amount is kept as a string so that
/// 18-decimal balances never pass through a float.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }

    /// Parse a Cosmos-style coin literal like `1500000000000000000lion`
    /// (integer amount immediately followed by the denom).
    pub fn parse(input: &str) -> CoreResult<Self> {
        let split = input
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| CoreError::InvalidAmount(format!("missing denom: {}", input)))?;
        let (amount, denom) = input.split_at(split);

        if amount.is_empty() {
            return Err(CoreError::InvalidAmount(format!(
                "missing amount: {}",
                input
            )));
        }
        // Denoms start with a letter; anything else (e.g. the `.5` of a
        // fractional amount) is a malformed literal, not a denom.
        if !denom.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(CoreError::InvalidAmount(format!(
                "invalid denom: {}",
                input
            )));
        }

        Ok(Self::new(denom, amount))
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.denom)
    }
}

/// Immutable lookup table of known currencies, built once at startup.
#[derive(Debug, Clone)]
pub struct CurrencyRegistry {
    currencies: Vec<Currency>,
}

impl CurrencyRegistry {
    pub fn new(currencies: Vec<Currency>) -> Self {
        Self { currencies }
    }

    /// Look up a currency by exact match on either its display denom or its
    /// minimal denom.
    pub fn find(&self, denom: &str) -> CoreResult<&Currency> {
        self.currencies
            .iter()
            .find(|c| c.denom == denom || c.minimal_denom == denom)
            .ok_or_else(|| CoreError::UnsupportedCurrency {
                denom: denom.to_string(),
            })
    }

    /// Convert a coin to its canonical minimal-denomination form.
    ///
    /// Idempotent: a coin already carrying the minimal denom is validated
    /// and returned unchanged.
    pub fn to_minimal(&self, coin: &Coin) -> CoreResult<Coin> {
        let currency = self.find(&coin.denom)?;

        if coin.denom == currency.minimal_denom {
            // Still reject non-integer amounts claiming to be minimal.
            BigUint::from_str(&coin.amount)
                .map_err(|e| CoreError::InvalidAmount(format!("{}: {}", coin.amount, e)))?;
            return Ok(coin.clone());
        }

        let minimal = DecimalAmount::parse(&coin.amount)?.to_minimal(currency.decimals)?;
        Ok(Coin::new(currency.minimal_denom.clone(), minimal.to_string()))
    }

    /// Convert a coin to its display form, truncated to `precision`
    /// fractional digits. A coin already in display form is validated and
    /// re-rendered at the same fixed precision.
    pub fn to_display(&self, coin: &Coin, precision: u32) -> CoreResult<Coin> {
        let currency = self.find(&coin.denom)?;

        if coin.denom == currency.denom && currency.denom != currency.minimal_denom {
            let display = DecimalAmount::parse(&coin.amount)?.with_precision(precision);
            return Ok(Coin::new(currency.denom.clone(), display.to_string()));
        }

        let minimal = BigUint::from_str(&coin.amount)
            .map_err(|e| CoreError::InvalidAmount(format!("{}: {}", coin.amount, e)))?;
        let display = DecimalAmount::from_minimal(&minimal, currency.decimals, precision);
        Ok(Coin::new(currency.denom.clone(), display.to_string()))
    }

    /// Convert a coin to display form at the default precision.
    pub fn to_display_default(&self, coin: &Coin) -> CoreResult<Coin> {
        self.to_display(coin, DEFAULT_COIN_PRECISION)
    }

    /// All registered currencies, in registration order.
    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }
}

impl Default for CurrencyRegistry {
    /// The protocol's native currencies, for embedders that skip the TOML
    /// config (and for tests).
    fn default() -> Self {
        Self::new(vec![
            Currency {
                denom: "alion".to_string(),
                minimal_denom: "lion".to_string(),
                decimals: 18,
            },
            Currency {
                denom: "mer".to_string(),
                minimal_denom: "umer".to_string(),
                decimals: 6,
            },
            Currency {
                denom: "usd".to_string(),
                minimal_denom: "uusd".to_string(),
                decimals: 6,
            },
        ])
    }
}
