use proptest::prelude::*;
use std::collections::HashSet;

use inverse_governance::{merge_eras, proposal_num, GovEra, Proposal, ProposalStatus};
use inverse_types::Address;

fn proposal(id: u64, era: GovEra, alpha_count: u64, terminal: bool) -> Proposal {
    Proposal {
        id,
        proposal_num: proposal_num(era, id, alpha_count),
        title: format!("{era} {id}"),
        description: String::new(),
        proposer: Address::ZERO,
        eta_timestamp: 0,
        start_timestamp: 0,
        end_timestamp: 0,
        start_block: 0,
        end_block: 0,
        for_votes: 0.0,
        against_votes: 0.0,
        canceled: terminal,
        executed: false,
        status: if terminal {
            ProposalStatus::Canceled
        } else {
            ProposalStatus::Active
        },
        functions: vec![],
        voters: vec![],
        era,
    }
}

proptest! {
    /// Numbers are unique, strictly decreasing in feed order, place every
    /// current-era proposal after every legacy one, and leave ids untouched.
    #[test]
    fn era_numbering_is_unique_and_monotonic(
        alpha_count in 0u64..40,
        mills_count in 0u64..40,
        archived_mask in proptest::collection::vec(any::<bool>(), 80),
    ) {
        let mut fresh = Vec::new();
        let mut archived = Vec::new();
        let all = (1..=alpha_count)
            .map(|id| (id, GovEra::Alpha))
            .chain((1..=mills_count).map(|id| (id, GovEra::Mills)));
        for (i, (id, era)) in all.enumerate() {
            let p = proposal(id, era, alpha_count, archived_mask[i]);
            if archived_mask[i] {
                archived.push(p.clone());
            }
            fresh.push(p);
        }

        let merged = merge_eras(fresh, archived);
        prop_assert_eq!(merged.len() as u64, alpha_count + mills_count);

        let nums: HashSet<u64> = merged.iter().map(|p| p.proposal_num).collect();
        prop_assert_eq!(nums.len(), merged.len());
        prop_assert!(merged.windows(2).all(|w| w[0].proposal_num > w[1].proposal_num));

        for p in &merged {
            match p.era {
                GovEra::Alpha => {
                    prop_assert_eq!(p.proposal_num, p.id);
                    prop_assert!(p.id <= alpha_count);
                }
                GovEra::Mills => {
                    prop_assert!(p.proposal_num > alpha_count);
                    prop_assert_eq!(p.proposal_num - alpha_count, p.id);
                }
            }
        }
    }
}
