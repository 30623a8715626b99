//! Fundamental types for the dashboard API.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! network identifiers, timestamps and clocks, token descriptors, and the fixed-point
//! amount conversion every pipeline uses to turn raw contract integers into decimals.

pub mod amount;
pub mod error;
pub mod network;
pub mod time;
pub mod token;

pub use alloy_primitives::{Address, U256};
pub use amount::{to_decimal, to_raw, TokenAmount};
pub use error::TypesError;
pub use network::NetworkId;
pub use time::{Clock, SystemClock, Timestamp};
pub use token::Token;
