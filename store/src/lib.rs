//! Storage abstraction for the dashboard API.
//!
//! Every backend (Redis in production, in-memory for development and tests)
//! implements [`KvStore`]. The rest of the codebase depends only on the trait,
//! and reads snapshots through the [`CacheGateway`] policy layer.

pub mod cache;
pub mod error;
pub mod keys;
pub mod kv;
pub mod memory;

pub use cache::{CacheEntry, CacheGateway, Freshness};
pub use error::StoreError;
pub use kv::KvStore;
pub use memory::MemoryStore;
