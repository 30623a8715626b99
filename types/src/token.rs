//! Token descriptors.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::amount::to_decimal;
use crate::U256;

/// Static metadata for an asset the dashboard reports on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Contract address; the zero address stands for the chain's native coin.
    pub address: Address,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub image: String,
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coingecko_id: Option<String>,
}

impl Token {
    /// Whether this descriptor stands for the chain's native coin.
    pub fn is_native(&self) -> bool {
        self.address == Address::ZERO
    }

    /// Convert a raw balance of this token to a decimal.
    pub fn to_decimal(&self, raw: U256) -> f64 {
        to_decimal(raw, self.decimals)
    }
}
