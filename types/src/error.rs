//! Top-level error type for value parsing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("unsupported network: {0}")]
    InvalidNetwork(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

impl TypesError {
    /// Short machine-readable error kind for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidNetwork(_) => "invalid_network",
            Self::InvalidAddress(_) => "invalid_address",
            Self::InvalidAmount(_) => "invalid_amount",
        }
    }
}
