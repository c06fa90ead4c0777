//! Exact fixed-point conversion between decimal amounts and on-chain
//! minor units.
//!
//! Conversion to minor units truncates extra fractional digits instead of
//! rounding, so a customer is never charged more than the quoted price.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors produced while parsing or combining amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("amount is empty")]
    Empty,

    #[error("amount '{0}' is not a non-negative decimal number")]
    Malformed(String),

    #[error("amount '{0}' does not fit in 256 bits")]
    Overflow(String),

    #[error("cannot combine amounts with {left} and {right} decimals")]
    PrecisionMismatch { left: u8, right: u8 },
}

/// `10^decimals`, or `None` when it exceeds 256 bits.
fn scale(decimals: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(decimals))
}

/// Convert a decimal amount (`"12.5"`, `5`, `0.25`) into minor units.
///
/// Fractional digits beyond `decimals` are dropped, never rounded.
pub fn to_minor_units(amount: impl fmt::Display, decimals: u8) -> Result<U256, UnitError> {
    let raw = amount.to_string();
    let text = raw.trim();
    if text.is_empty() {
        return Err(UnitError::Empty);
    }

    let (int_part, frac_part) = text.split_once('.').unwrap_or((text, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty())
        || !all_digits(int_part)
        || !all_digits(frac_part)
    {
        return Err(UnitError::Malformed(text.to_string()));
    }
    let int_part = if int_part.is_empty() { "0" } else { int_part };

    let width = decimals as usize;
    let mut frac: String = frac_part.chars().take(width).collect();
    while frac.len() < width {
        frac.push('0');
    }

    let overflow = || UnitError::Overflow(text.to_string());
    let whole = U256::from_str_radix(int_part, 10).map_err(|_| overflow())?;
    let frac = if frac.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(&frac, 10).map_err(|_| overflow())?
    };

    scale(decimals)
        .and_then(|s| whole.checked_mul(s))
        .and_then(|v| v.checked_add(frac))
        .ok_or_else(overflow)
}

/// Render minor units as a decimal string with exactly `decimals`
/// fractional digits.
pub fn from_minor_units(amount: U256, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    // 10^decimals overflows only above 77 digits, where every U256 is
    // entirely fractional.
    let (whole, frac) = match scale(decimals) {
        Some(s) => (amount / s, amount % s),
        None => (U256::ZERO, amount),
    };
    format!(
        "{}.{:0>width$}",
        whole,
        frac.to_string(),
        width = decimals as usize
    )
}

/// An amount tagged with its precision.
///
/// Amounts of different precision never mix without an explicit
/// [`MinorUnits::rescale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MinorUnits {
    value: U256,
    decimals: u8,
}

impl MinorUnits {
    pub fn new(value: U256, decimals: u8) -> Self {
        Self { value, decimals }
    }

    pub fn zero(decimals: u8) -> Self {
        Self::new(U256::ZERO, decimals)
    }

    /// Parse a decimal amount at the given precision.
    pub fn parse(amount: impl fmt::Display, decimals: u8) -> Result<Self, UnitError> {
        Ok(Self::new(to_minor_units(amount, decimals)?, decimals))
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn checked_add(self, other: Self) -> Result<Self, UnitError> {
        if self.decimals != other.decimals {
            return Err(UnitError::PrecisionMismatch {
                left: self.decimals,
                right: other.decimals,
            });
        }
        self.value
            .checked_add(other.value)
            .map(|value| Self::new(value, self.decimals))
            .ok_or_else(|| UnitError::Overflow(format!("{} + {}", self, other)))
    }

    /// Convert to another precision. Reducing precision truncates.
    pub fn rescale(self, decimals: u8) -> Result<Self, UnitError> {
        let overflow = || UnitError::Overflow(self.to_string());
        let value = if decimals >= self.decimals {
            let factor = scale(decimals - self.decimals).ok_or_else(overflow)?;
            self.value.checked_mul(factor).ok_or_else(overflow)?
        } else {
            match scale(self.decimals - decimals) {
                Some(factor) => self.value / factor,
                None => U256::ZERO,
            }
        };
        Ok(Self::new(value, decimals))
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&from_minor_units(self.value, self.decimals))
    }
}
