//! The typed read surface over a chain.

use alloy_primitives::Bytes;
use async_trait::async_trait;
use inverse_types::{Address, NetworkId, U256};

use crate::ChainError;

/// How a Fed contract reports its outstanding supply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FedKind {
    /// `supply()` on the home chain.
    SameChain,
    /// `dstSupply()`: supply minted on the destination chain.
    CrossChain,
}

impl FedKind {
    pub fn from_xchain(is_xchain: bool) -> Self {
        if is_xchain {
            Self::CrossChain
        } else {
            Self::SameChain
        }
    }
}

/// Return value of a governor's `proposals(id)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalState {
    pub id: u64,
    pub proposer: Address,
    /// Execution time in seconds; zero until queued.
    pub eta: u64,
    pub start_block: u64,
    pub end_block: u64,
    pub for_votes: U256,
    pub against_votes: U256,
    pub canceled: bool,
    pub executed: bool,
}

/// A decoded `ProposalCreated` event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalCreatedLog {
    pub id: u64,
    pub proposer: Address,
    pub targets: Vec<Address>,
    pub signatures: Vec<String>,
    pub calldatas: Vec<Bytes>,
    pub start_block: u64,
    pub end_block: u64,
    pub description: String,
}

/// A decoded `VoteCast` event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteCastLog {
    pub voter: Address,
    pub proposal_id: u64,
    pub support: bool,
    pub votes: U256,
}

/// Read-only access to one network.
///
/// Every contract read the pipelines issue goes through this trait, so tests
/// can substitute a scripted chain without encoding ABI payloads.
#[async_trait]
pub trait ChainReader: Send + Sync {
    fn network(&self) -> NetworkId;

    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Block timestamp in seconds.
    async fn block_timestamp(&self, block: u64) -> Result<u64, ChainError>;

    async fn native_balance(&self, holder: Address) -> Result<U256, ChainError>;

    async fn total_supply(&self, token: Address) -> Result<U256, ChainError>;

    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, ChainError>;

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError>;

    async fn total_reserves(&self, market: Address) -> Result<U256, ChainError>;

    async fn multisig_owners(&self, wallet: Address) -> Result<Vec<Address>, ChainError>;

    async fn multisig_threshold(&self, wallet: Address) -> Result<u64, ChainError>;

    async fn fed_supply(&self, fed: Address, kind: FedKind) -> Result<U256, ChainError>;

    async fn stabilizer_supply(&self, stabilizer: Address) -> Result<U256, ChainError>;

    async fn proposal_count(&self, governor: Address) -> Result<u64, ChainError>;

    async fn quorum_votes(&self, governor: Address) -> Result<U256, ChainError>;

    async fn proposal(&self, governor: Address, id: u64) -> Result<ProposalState, ChainError>;

    /// All `ProposalCreated` events emitted by `governor` from `from_block`.
    async fn proposal_created_logs(
        &self,
        governor: Address,
        from_block: u64,
    ) -> Result<Vec<ProposalCreatedLog>, ChainError>;

    /// All `VoteCast` events emitted by `governor` from `from_block`.
    async fn vote_cast_logs(
        &self,
        governor: Address,
        from_block: u64,
    ) -> Result<Vec<VoteCastLog>, ChainError>;
}
