//! On-chain governance as served by the dashboard.
//!
//! Proposals come from two contract generations ("eras") with independent
//! id sequences. The sync job reads both, derives each proposal's status,
//! merges the eras into one feed numbered across eras, and splits terminal
//! proposals into an archive that later runs never refetch. Draft proposals
//! are stored off-chain and edited by an allow-list of signers.

pub mod archive;
pub mod drafts;
pub mod error;
pub mod merge;
pub mod proposal;
pub mod status;
pub mod sync;

pub use archive::{ids_to_fetch, split_terminal, ProposalArchive};
pub use drafts::{AllowList, Draft, DraftFunctionInput, DraftInput, DraftService, DRAFT_SIGN_MSG};
pub use error::{DraftError, GovernanceError};
pub use merge::{merge_eras, proposal_num};
pub use proposal::{EraCounts, GovEra, Proposal, ProposalFunction, ProposalSnapshot, ProposalVote};
pub use status::{derive_status, ProposalStatus, StatusInputs, GRACE_PERIOD};
pub use sync::{parse_description, ProposalSync, SyncReport, PROPOSAL_DURATION};
