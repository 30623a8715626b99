//! Combining both eras into one feed.
//!
//! Legacy ("alpha") proposals keep their id as number; current ("mills")
//! proposals are numbered after every legacy proposal. Numbers are therefore
//! unique across eras and grow with creation order, while each record keeps
//! its era-scoped id.

use std::collections::HashSet;

use crate::{GovEra, Proposal};

/// Number of a proposal across both eras.
pub fn proposal_num(era: GovEra, id: u64, alpha_count: u64) -> u64 {
    match era {
        GovEra::Alpha => id,
        GovEra::Mills => id + alpha_count,
    }
}

/// Merge freshly fetched proposals with archived ones.
///
/// Records are identified by `(id, era)`; an archived record replaces a
/// fresh one with the same identity. The result is sorted newest first.
pub fn merge_eras(fresh: Vec<Proposal>, archived: Vec<Proposal>) -> Vec<Proposal> {
    let archived_keys: HashSet<_> = archived.iter().map(Proposal::key).collect();
    let mut seen = HashSet::new();
    let mut merged: Vec<Proposal> = archived
        .into_iter()
        .chain(fresh.into_iter().filter(|p| !archived_keys.contains(&p.key())))
        .filter(|p| seen.insert(p.key()))
        .collect();
    merged.sort_by(|a, b| b.proposal_num.cmp(&a.proposal_num));
    merged
}
