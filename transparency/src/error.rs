use inverse_chain::ChainError;
use inverse_types::{Address, NetworkId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransparencyError {
    #[error("network {network} has no {section} configuration")]
    NotConfigured {
        network: NetworkId,
        section: &'static str,
    },

    #[error("network {network}: token {address} is not in the registry")]
    UnknownToken { network: NetworkId, address: Address },

    #[error("chain read failed: {0}")]
    Chain(#[from] ChainError),
}

impl TransparencyError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConfigured { .. } => "transparency_not_configured",
            Self::UnknownToken { .. } => "transparency_unknown_token",
            Self::Chain(e) => e.kind(),
        }
    }
}
