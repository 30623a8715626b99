//! Terminal-proposal archive.
//!
//! Terminal proposals are frozen: once archived, a later sync takes them
//! from the archive and never reads them from chain again.

use inverse_types::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{GovEra, Proposal};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalArchive {
    pub block_number: u64,
    pub timestamp: Timestamp,
    pub proposals: Vec<Proposal>,
}

impl ProposalArchive {
    /// Archived records of one era.
    pub fn era(&self, era: GovEra) -> impl Iterator<Item = &Proposal> {
        self.proposals.iter().filter(move |p| p.era == era)
    }
}

/// Ids in `1..=count` that are not archived for `era`.
pub fn ids_to_fetch(count: u64, archive: &ProposalArchive, era: GovEra) -> Vec<u64> {
    let archived: HashSet<u64> = archive.era(era).map(|p| p.id).collect();
    (1..=count).filter(|id| !archived.contains(id)).collect()
}

/// The terminal subset of a merged proposal set.
pub fn split_terminal(proposals: &[Proposal]) -> Vec<Proposal> {
    proposals.iter().filter(|p| p.is_terminal()).cloned().collect()
}
