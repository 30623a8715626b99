//! Governance proposals as stored and served.

use alloy_primitives::Bytes;
use inverse_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ProposalStatus;

/// Governance contract generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GovEra {
    /// The legacy governor. Its ids come first in the combined numbering.
    Alpha,
    /// The current governor.
    Mills,
}

impl GovEra {
    pub const ALL: [GovEra; 2] = [Self::Mills, Self::Alpha];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Mills => "mills",
        }
    }
}

impl fmt::Display for GovEra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call a proposal executes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalFunction {
    pub target: Address,
    pub signature: String,
    pub call_data: Bytes,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProposalVote {
    /// Era-scoped id of the proposal voted on.
    pub id: u64,
    pub voter: Address,
    pub support: bool,
    pub votes: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    /// Id within the proposal's era.
    pub id: u64,
    /// Number across both eras.
    pub proposal_num: u64,
    pub title: String,
    pub description: String,
    pub proposer: Address,
    /// Milliseconds; zero until queued.
    pub eta_timestamp: u64,
    pub start_timestamp: u64,
    pub end_timestamp: u64,
    pub start_block: u64,
    pub end_block: u64,
    pub for_votes: f64,
    pub against_votes: f64,
    pub canceled: bool,
    pub executed: bool,
    pub status: ProposalStatus,
    pub functions: Vec<ProposalFunction>,
    pub voters: Vec<ProposalVote>,
    pub era: GovEra,
}

impl Proposal {
    /// Identity across eras.
    pub fn key(&self) -> (u64, GovEra) {
        (self.id, self.era)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Proposal counts per era as of the last sync.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraCounts {
    pub mills: u64,
    pub alpha: u64,
}

/// Stored result of a sync run: every known proposal, newest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSnapshot {
    pub block_number: u64,
    pub timestamp: Timestamp,
    /// Absent in snapshots written before counts were recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era_counts: Option<EraCounts>,
    pub proposals: Vec<Proposal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn era_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&GovEra::Mills).unwrap(), "\"mills\"");
        let era: GovEra = serde_json::from_str("\"alpha\"").unwrap();
        assert_eq!(era, GovEra::Alpha);
    }

    #[test]
    fn snapshot_without_counts_still_parses() {
        let snapshot: ProposalSnapshot =
            serde_json::from_str(r#"{"blockNumber":5,"timestamp":1,"proposals":[]}"#).unwrap();
        assert_eq!(snapshot.block_number, 5);
        assert!(snapshot.era_counts.is_none());
    }

    #[test]
    fn function_uses_camel_case_hex_call_data() {
        let f = ProposalFunction {
            target: Address::repeat_byte(0x11),
            signature: "transfer(address,uint256)".into(),
            call_data: Bytes::from(vec![0xde, 0xad]),
        };
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["callData"], "0xdead");
    }
}
