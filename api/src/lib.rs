//! HTTP server for the Inverse dashboard.
//!
//! Provides endpoints for:
//! - Governance proposals and the scheduled proposal sync
//! - Draft proposal CRUD, gated by a signer allow-list
//! - DAO transparency and stabilizer balance snapshots
//! - Health and Prometheus metrics

pub mod auth;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use metrics::ApiMetrics;
pub use server::{router, ApiServer};
pub use state::{ApiContext, AppState};
