//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the pipelines (clock, key-value store,
//! chain provider) sits behind a trait. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically, including injected failures
//! - Count the calls made to them
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod chain;
pub mod clock;
pub mod store;

pub use chain::NullChain;
pub use clock::NullClock;
pub use store::NullKvStore;
