//! Proposal lifecycle status.

use inverse_types::{Timestamp, U256};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Time a queued proposal stays executable after its eta.
pub const GRACE_PERIOD: Duration = Duration::from_secs(14 * 24 * 60 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    Pending,
    Active,
    Canceled,
    Defeated,
    Succeeded,
    Queued,
    Expired,
    Executed,
}

impl ProposalStatus {
    /// Terminal proposals never change again and are archived.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Canceled | Self::Executed | Self::Defeated | Self::Expired
        )
    }
}

/// On-chain facts a status is derived from.
#[derive(Clone, Copy, Debug)]
pub struct StatusInputs {
    pub canceled: bool,
    pub executed: bool,
    /// Execution time in seconds; zero until queued.
    pub eta_secs: u64,
    pub start_block: u64,
    pub end_block: u64,
    pub current_block: u64,
    pub for_votes: U256,
    pub against_votes: U256,
    pub quorum: U256,
    pub now: Timestamp,
}

/// Derive a proposal's status.
///
/// Explicit flags win, then the voting window, then expiry of a queued
/// proposal, then the vote outcome.
pub fn derive_status(p: &StatusInputs) -> ProposalStatus {
    if p.canceled {
        return ProposalStatus::Canceled;
    }
    if p.executed {
        return ProposalStatus::Executed;
    }
    if p.current_block <= p.start_block {
        return ProposalStatus::Pending;
    }
    if p.current_block <= p.end_block {
        return ProposalStatus::Active;
    }
    if p.eta_secs != 0 {
        let expires_at = Timestamp::from_secs(p.eta_secs).saturating_add(GRACE_PERIOD);
        if p.now >= expires_at {
            return ProposalStatus::Expired;
        }
    }
    if p.for_votes <= p.against_votes || p.for_votes < p.quorum {
        return ProposalStatus::Defeated;
    }
    if p.eta_secs == 0 {
        return ProposalStatus::Succeeded;
    }
    ProposalStatus::Queued
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> StatusInputs {
        StatusInputs {
            canceled: false,
            executed: false,
            eta_secs: 0,
            start_block: 100,
            end_block: 200,
            current_block: 300,
            for_votes: U256::from(5_000u64),
            against_votes: U256::from(1_000u64),
            quorum: U256::from(4_000u64),
            now: Timestamp::from_secs(1_000_000),
        }
    }

    #[test]
    fn cancel_wins_over_everything() {
        for current_block in [50, 150, 300] {
            let p = StatusInputs {
                canceled: true,
                executed: true,
                current_block,
                for_votes: U256::ZERO,
                ..inputs()
            };
            assert_eq!(derive_status(&p), ProposalStatus::Canceled);
        }
    }

    #[test]
    fn executed_after_cancel() {
        let p = StatusInputs { executed: true, ..inputs() };
        assert_eq!(derive_status(&p), ProposalStatus::Executed);
    }

    #[test]
    fn voting_window() {
        let pending = StatusInputs { current_block: 100, ..inputs() };
        assert_eq!(derive_status(&pending), ProposalStatus::Pending);
        let active = StatusInputs { current_block: 200, ..inputs() };
        assert_eq!(derive_status(&active), ProposalStatus::Active);
    }

    #[test]
    fn vote_outcome() {
        assert_eq!(derive_status(&inputs()), ProposalStatus::Succeeded);

        let tie = StatusInputs { against_votes: U256::from(5_000u64), ..inputs() };
        assert_eq!(derive_status(&tie), ProposalStatus::Defeated);

        let below_quorum = StatusInputs {
            for_votes: U256::from(3_999u64),
            against_votes: U256::ZERO,
            ..inputs()
        };
        assert_eq!(derive_status(&below_quorum), ProposalStatus::Defeated);
    }

    #[test]
    fn queued_until_grace_period_ends() {
        let eta = 1_000_000;
        let queued = StatusInputs {
            eta_secs: eta,
            now: Timestamp::from_secs(eta + GRACE_PERIOD.as_secs() - 1),
            ..inputs()
        };
        assert_eq!(derive_status(&queued), ProposalStatus::Queued);

        let expired = StatusInputs {
            now: Timestamp::from_secs(eta + GRACE_PERIOD.as_secs()),
            ..queued
        };
        assert_eq!(derive_status(&expired), ProposalStatus::Expired);
        assert!(ProposalStatus::Expired.is_terminal());
        assert!(!ProposalStatus::Queued.is_terminal());
    }
}
