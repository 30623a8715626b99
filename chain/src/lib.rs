//! Chain access for the aggregation pipelines.
//!
//! - [`config`]: closed, validated per-network configuration records.
//! - [`reader`]: the [`ChainReader`] trait, the typed read surface every
//!   pipeline depends on.
//! - [`rpc`]: the Ethereum JSON-RPC implementation of that trait.
//! - [`registry`]: one reader per configured network.
//! - [`fetch`]: concurrent fan-out with per-source failure policy.

pub mod bindings;
pub mod config;
pub mod error;
pub mod fetch;
pub mod reader;
pub mod registry;
pub mod rpc;
pub mod source;

pub use config::{
    AnchorMarket, ConfigError, CoreTokens, FedConfig, GovernanceContracts, MultisigConfig,
    NetworkConfig, NetworkSet, StabilizerContracts, TransparencyContracts,
};
pub use error::ChainError;
pub use fetch::{fetch_batch, require_all, settle_all, Settled};
pub use reader::{ChainReader, FedKind, ProposalCreatedLog, ProposalState, VoteCastLog};
pub use registry::ChainRegistry;
pub use rpc::{RpcChainReader, RpcTimeouts};
pub use source::{ChainSource, Generation, Interface, Requirement};
