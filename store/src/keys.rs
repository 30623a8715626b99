//! Cache key naming.
//!
//! Keys carry a version suffix. Changing a payload schema means bumping the
//! suffix: old entries become unaddressable and are never migrated in place.

use inverse_types::NetworkId;

/// DAO transparency snapshot.
pub const DAO_SNAPSHOT: &str = "dao-cache-v1.1.1";

/// Stabilizer balance snapshot.
pub const STABILIZER_BALANCES: &str = "stabilizer-balances-v1";

/// Draft proposals, stored as a bare JSON array.
pub const DRAFTS: &str = "drafts";

/// Full merged proposal snapshot for a network.
pub fn proposals(network: NetworkId) -> String {
    format!("{}-proposals", network.as_str())
}

/// Terminal proposals for a network; never refetched from chain.
pub fn proposals_archived(network: NetworkId) -> String {
    format!("{}-proposals-archived", network.as_str())
}
