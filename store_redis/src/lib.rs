//! Redis storage backend.
//!
//! Implements [`inverse_store::KvStore`] on a multiplexed Redis connection.
//! The connection handle is owned by a [`RedisStore`] value that callers
//! inject where needed; there is no process-wide client.

pub mod error;
pub mod store;

pub use error::RedisStoreError;
pub use store::{ReconnectPolicy, RedisStore};
