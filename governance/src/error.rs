use inverse_chain::ChainError;
use inverse_store::StoreError;
use inverse_types::NetworkId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("governance is not configured on network {0}")]
    NotConfigured(NetworkId),

    #[error("chain read failed: {0}")]
    Chain(#[from] ChainError),

    #[error("every era failed to fetch")]
    AllErasFailed,

    #[error("legacy proposal count unknown; cannot number current-era proposals")]
    UnknownLegacyCount,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GovernanceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConfigured(_) => "governance_not_configured",
            Self::Chain(e) => e.kind(),
            Self::AllErasFailed => "governance_all_eras_failed",
            Self::UnknownLegacyCount => "governance_unknown_legacy_count",
            Self::Store(e) => e.kind(),
            Self::Serialization(_) => "governance_serialization",
        }
    }
}

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("signer is not allowed to edit drafts")]
    Unauthorized,

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The id as requested; it may not even be numeric.
    #[error("draft {0} not found")]
    NotFound(String),

    #[error("invalid draft proposal: {0}")]
    Invalid(&'static str),

    #[error("draft store error: {0}")]
    Store(#[from] StoreError),

    #[error("stored drafts are corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl DraftError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "draft_unauthorized",
            Self::InvalidSignature(_) => "draft_invalid_signature",
            Self::NotFound(_) => "draft_not_found",
            Self::Invalid(_) => "draft_invalid",
            Self::Store(e) => e.kind(),
            Self::Corrupt(_) => "draft_corrupt",
        }
    }
}
