//! Transparency snapshots.
//!
//! Each snapshot is an aggregation pipeline: concurrent chain reads,
//! normalisation to decimals, and a timestamped cache entry that is served
//! while fresh and as a fallback when a refresh fails.

pub mod dao;
pub mod error;
pub mod serve;
pub mod stabilizer;

pub use dao::{
    DaoPipeline, DaoSnapshot, FedSupply, MirrorSupply, MultisigFund, MultisigSnapshot,
    TokenBalance, DAO_MAX_AGE,
};
pub use error::TransparencyError;
pub use serve::{serve_cached, Served};
pub use stabilizer::{StabilizerBalance, StabilizerBalances, StabilizerPipeline, STABILIZER_MAX_AGE};
