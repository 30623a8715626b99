//! Fixed-point token amounts.
//!
//! Contracts report balances as integers scaled by `10^decimals`, where
//! `decimals` is declared per token (18 for most ERC-20s, 6 for USDC, 8 for
//! WBTC). Every conversion goes through [`to_decimal`] with the decimals of the
//! token that produced the number; mixing precisions is how totals drift.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// A raw on-chain amount paired with the precision it was reported in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAmount {
    raw: U256,
    decimals: u8,
}

impl TokenAmount {
    pub const fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    pub const fn zero(decimals: u8) -> Self {
        Self {
            raw: U256::ZERO,
            decimals,
        }
    }

    /// Build an amount from a decimal value.
    pub fn from_decimal(value: f64, decimals: u8) -> Result<Self, TypesError> {
        Ok(Self::new(to_raw(value, decimals)?, decimals))
    }

    pub fn raw(&self) -> U256 {
        self.raw
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    pub fn to_decimal(&self) -> f64 {
        to_decimal(self.raw, self.decimals)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&decimal_string(self.raw, self.decimals))
    }
}

/// Convert a raw integer amount to a decimal using the token's precision.
///
/// The value is rendered as an exact decimal string before parsing, so the
/// only loss is the final rounding to the nearest `f64`.
pub fn to_decimal(raw: U256, decimals: u8) -> f64 {
    decimal_string(raw, decimals).parse().unwrap_or(f64::NAN)
}

/// Convert a decimal value to its raw integer representation, rounding to the
/// nearest unit of the given precision.
pub fn to_raw(value: f64, decimals: u8) -> Result<U256, TypesError> {
    if !value.is_finite() || value < 0.0 {
        return Err(TypesError::InvalidAmount(format!(
            "{value} is not a non-negative finite number"
        )));
    }
    let text = format!("{:.*}", decimals as usize, value);
    let digits: String = text.chars().filter(|c| *c != '.').collect();
    digits
        .parse::<U256>()
        .map_err(|e| TypesError::InvalidAmount(format!("{value}: {e}")))
}

fn decimal_string(raw: U256, decimals: u8) -> String {
    let digits = raw.to_string();
    let scale = decimals as usize;
    if scale == 0 {
        return digits;
    }
    if digits.len() > scale {
        let (int, frac) = digits.split_at(digits.len() - scale);
        format!("{int}.{frac}")
    } else {
        format!("0.{}{}", "0".repeat(scale - digits.len()), digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_with_declared_precision() {
        let one_usdc = U256::from(1_000_000u64);
        assert_eq!(to_decimal(one_usdc, 6), 1.0);
        assert_eq!(to_decimal(one_usdc, 18), 1e-12);
    }

    #[test]
    fn small_values_are_zero_padded() {
        let amount = TokenAmount::new(U256::from(5u64), 4);
        assert_eq!(amount.to_string(), "0.0005");
        assert_eq!(amount.to_decimal(), 0.0005);
    }

    #[test]
    fn zero_decimals_is_identity() {
        assert_eq!(to_decimal(U256::from(42u64), 0), 42.0);
        assert_eq!(to_raw(42.0, 0).unwrap(), U256::from(42u64));
    }

    #[test]
    fn to_raw_rejects_negative_and_nan() {
        assert!(to_raw(-1.0, 18).is_err());
        assert!(to_raw(f64::NAN, 18).is_err());
        assert!(to_raw(f64::INFINITY, 6).is_err());
    }

    #[test]
    fn eighteen_decimal_round_trip() {
        let raw = to_raw(1234.5, 18).unwrap();
        assert_eq!(raw.to_string(), "1234500000000000000000");
        assert_eq!(to_decimal(raw, 18), 1234.5);
    }
}
