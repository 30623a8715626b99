//! Chain read errors.

use inverse_types::NetworkId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("provider returned HTTP {0}")]
    Http(u16),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("block {0} not found")]
    BlockNotFound(u64),

    #[error("network {0} is not configured")]
    UnsupportedNetwork(NetworkId),

    #[error("{source_label}: {error}")]
    Source {
        source_label: String,
        #[source]
        error: Box<ChainError>,
    },
}

impl ChainError {
    /// Short machine-readable error kind for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "chain_transport",
            Self::Timeout(_) => "chain_timeout",
            Self::Http(_) => "chain_http",
            Self::Rpc { .. } => "chain_rpc",
            Self::Decode(_) => "chain_decode",
            Self::BlockNotFound(_) => "chain_block_not_found",
            Self::UnsupportedNetwork(_) => "chain_unsupported_network",
            Self::Source { error, .. } => error.kind(),
        }
    }

    /// Attach the label of the source that produced this error.
    pub fn at(self, source_label: impl Into<String>) -> Self {
        Self::Source {
            source_label: source_label.into(),
            error: Box::new(self),
        }
    }
}

impl From<reqwest::Error> for ChainError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ChainError::Timeout(e.to_string())
        } else if e.is_decode() {
            ChainError::Decode(e.to_string())
        } else {
            ChainError::Transport(e.to_string())
        }
    }
}

impl From<alloy_sol_types::Error> for ChainError {
    fn from(e: alloy_sol_types::Error) -> Self {
        ChainError::Decode(e.to_string())
    }
}
