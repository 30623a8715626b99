//! Proposal sync job.
//!
//! One run reads both governance eras of a network, rebuilds the merged
//! proposal snapshot, and extends the terminal archive:
//!
//! 1. read the previous archive and snapshot, then the current block;
//!    a store failure here aborts the run
//! 2. per era, concurrently: proposal count, quorum, `ProposalCreated` and
//!    `VoteCast` logs, then `proposals(id)` with block timestamps for every
//!    id not archived
//! 3. number, merge with the archive (archive wins), split terminal records
//! 4. write the snapshot, then the archive
//!
//! If one era fails, the other is still persisted and the failed era's
//! records are carried over from the previous snapshot. If both fail, or the
//! legacy count needed for numbering is unknown, nothing is written.

use futures_util::future::join;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use inverse_chain::{
    require_all, ChainError, ChainReader, ChainRegistry, ChainSource, Interface, NetworkSet,
    ProposalCreatedLog, VoteCastLog,
};
use inverse_store::{keys, KvStore, StoreError};
use inverse_types::{to_decimal, Address, Clock, NetworkId, Timestamp, U256};

use crate::archive::{ids_to_fetch, split_terminal, ProposalArchive};
use crate::merge::{merge_eras, proposal_num};
use crate::status::{derive_status, StatusInputs};
use crate::{EraCounts, GovEra, GovernanceError, Proposal, ProposalFunction, ProposalSnapshot, ProposalVote};

/// Assumed voting period for proposals whose end block is still ahead.
pub const PROPOSAL_DURATION: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// Outcome of one sync run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncReport {
    pub network: NetworkId,
    pub block_number: u64,
    /// Proposals read from chain in this run.
    pub fetched: usize,
    pub total: usize,
    pub archived: usize,
    pub failed_eras: Vec<GovEra>,
}

impl SyncReport {
    pub fn is_partial(&self) -> bool {
        !self.failed_eras.is_empty()
    }
}

/// Split a proposal description into title and body.
///
/// The title is the first line without its markdown heading marker.
pub fn parse_description(text: &str) -> (String, String) {
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
    let title = first.trim_start_matches('#').trim().to_string();
    (title, rest.to_string())
}

pub struct ProposalSync {
    chains: ChainRegistry,
    networks: Arc<NetworkSet>,
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

struct EraFetch {
    count: u64,
    proposals: Vec<Proposal>,
}

/// Per-run values shared by both era fetches.
struct EraContext<'a> {
    reader: &'a dyn ChainReader,
    network: NetworkId,
    block_number: u64,
    now: Timestamp,
    decimals: u8,
    from_block: u64,
    archive: &'a ProposalArchive,
}

impl ProposalSync {
    pub fn new(
        chains: ChainRegistry,
        networks: Arc<NetworkSet>,
        store: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            chains,
            networks,
            store,
            clock,
        }
    }

    /// Whether `network` has both governance eras configured.
    pub fn supports(&self, network: NetworkId) -> bool {
        self.networks
            .get(network)
            .is_some_and(|n| n.governance.is_some())
    }

    /// The stored snapshot, if any. Store failures read as absent.
    pub async fn latest(&self, network: NetworkId) -> Option<ProposalSnapshot> {
        let key = keys::proposals(network);
        self.load(&key).await.unwrap_or_else(|e| {
            warn!(key = %key, kind = e.kind(), error = %e, "store read failed; treating as absent");
            None
        })
    }

    pub async fn run(&self, network: NetworkId) -> Result<SyncReport, GovernanceError> {
        let config = self
            .networks
            .get(network)
            .ok_or(GovernanceError::NotConfigured(network))?;
        let gov = config
            .governance
            .as_ref()
            .ok_or(GovernanceError::NotConfigured(network))?;
        let decimals = config.token(&gov.vote_token).map_or(18, |t| t.decimals);
        let reader = self.chains.get_for_sync(network)?;

        // Terminal proposals live only in the archive; a failed read stops the run.
        let archive: ProposalArchive = self
            .load(&keys::proposals_archived(network))
            .await?
            .unwrap_or_default();
        let previous: Option<ProposalSnapshot> = self.load(&keys::proposals(network)).await?;

        let now = self.clock.now();
        let block_number = reader.block_number().await?;

        let ctx = EraContext {
            reader: reader.as_ref(),
            network,
            block_number,
            now,
            decimals,
            from_block: gov.from_block,
            archive: &archive,
        };
        let (mills, alpha) = join(
            ctx.fetch(GovEra::Mills, gov.governor),
            ctx.fetch(GovEra::Alpha, gov.governor_alpha),
        )
        .await;

        let mut failed_eras = Vec::new();
        let mut settle = |era: GovEra, result: Result<EraFetch, ChainError>| match result {
            Ok(fetch) => Some(fetch),
            Err(e) => {
                warn!(
                    network = %network,
                    era = %era,
                    kind = e.kind(),
                    error = %e,
                    "proposal era fetch failed"
                );
                failed_eras.push(era);
                None
            }
        };
        let mills = settle(GovEra::Mills, mills);
        let alpha = settle(GovEra::Alpha, alpha);
        if mills.is_none() && alpha.is_none() {
            return Err(GovernanceError::AllErasFailed);
        }

        let previous_counts = previous.as_ref().and_then(|s| s.era_counts);
        let alpha_count = match (&alpha, previous_counts) {
            (Some(fetch), _) => fetch.count,
            (None, Some(counts)) => counts.alpha,
            (None, None) => return Err(GovernanceError::UnknownLegacyCount),
        };
        let mills_count = match (&mills, previous_counts) {
            (Some(fetch), _) => fetch.count,
            (None, Some(counts)) => counts.mills,
            (None, None) => 0,
        };

        let mut fresh = Vec::new();
        let mut fetched = 0;
        for (era, fetch) in [(GovEra::Mills, mills), (GovEra::Alpha, alpha)] {
            match fetch {
                Some(fetch) => {
                    fetched += fetch.proposals.len();
                    fresh.extend(fetch.proposals.into_iter().map(|mut p| {
                        p.proposal_num = proposal_num(era, p.id, alpha_count);
                        p
                    }));
                }
                None => {
                    if let Some(prev) = &previous {
                        fresh.extend(prev.proposals.iter().filter(|p| p.era == era).cloned());
                    }
                }
            }
        }

        let merged = merge_eras(fresh, archive.proposals.clone());
        let terminal = split_terminal(&merged);
        let report = SyncReport {
            network,
            block_number,
            fetched,
            total: merged.len(),
            archived: terminal.len(),
            failed_eras,
        };

        let snapshot = ProposalSnapshot {
            block_number,
            timestamp: now,
            era_counts: Some(EraCounts {
                mills: mills_count,
                alpha: alpha_count,
            }),
            proposals: merged,
        };
        let new_archive = ProposalArchive {
            block_number,
            timestamp: now,
            proposals: terminal,
        };
        self.store
            .set(&keys::proposals(network), &serde_json::to_string(&snapshot)?)
            .await?;
        self.store
            .set(
                &keys::proposals_archived(network),
                &serde_json::to_string(&new_archive)?,
            )
            .await?;

        info!(
            network = %network,
            block_number,
            total = report.total,
            archived = report.archived,
            partial = report.is_partial(),
            "proposals synced"
        );
        Ok(report)
    }

    /// Read and decode `key`. A value from an older schema decodes as absent;
    /// store failures are returned.
    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, kind = "governance_decode", error = %e, "stored value undecodable; ignoring");
                Ok(None)
            }
        }
    }
}

impl EraContext<'_> {
    async fn fetch(&self, era: GovEra, governor: Address) -> Result<EraFetch, ChainError> {
        let mut source = ChainSource::required(self.network, governor, Interface::Governor);
        if era == GovEra::Alpha {
            source = source.legacy();
        }

        let (count, quorum, created, votes) = futures_util::try_join!(
            self.reader.proposal_count(governor),
            self.reader.quorum_votes(governor),
            self.reader.proposal_created_logs(governor, self.from_block),
            self.reader.vote_cast_logs(governor, self.from_block),
        )
        .map_err(|e| e.at(source.to_string()))?;

        let reads = ids_to_fetch(count, self.archive, era)
            .into_iter()
            .map(|id| {
                let read = self.fetch_proposal(era, governor, id, quorum, &created, &votes);
                (source.clone(), read)
            })
            .collect();
        let proposals = require_all(reads).await?;
        Ok(EraFetch { count, proposals })
    }

    async fn fetch_proposal(
        &self,
        era: GovEra,
        governor: Address,
        id: u64,
        quorum: U256,
        created: &[ProposalCreatedLog],
        votes: &[VoteCastLog],
    ) -> Result<Proposal, ChainError> {
        let state = self.reader.proposal(governor, id).await?;
        let event = created
            .iter()
            .find(|log| log.id == state.id)
            .ok_or_else(|| ChainError::Decode(format!("no ProposalCreated event for proposal {id}")))?;

        let start_timestamp = self.block_time_ms(state.start_block).await?;
        let end_timestamp = if self.block_number > state.end_block {
            self.block_time_ms(state.end_block).await?
        } else {
            start_timestamp + PROPOSAL_DURATION.as_millis() as u64
        };

        let status = derive_status(&StatusInputs {
            canceled: state.canceled,
            executed: state.executed,
            eta_secs: state.eta,
            start_block: state.start_block,
            end_block: state.end_block,
            current_block: self.block_number,
            for_votes: state.for_votes,
            against_votes: state.against_votes,
            quorum,
            now: self.now,
        });
        let (title, description) = parse_description(&event.description);

        let functions = event
            .targets
            .iter()
            .zip(&event.signatures)
            .zip(&event.calldatas)
            .map(|((target, signature), call_data)| ProposalFunction {
                target: *target,
                signature: signature.clone(),
                call_data: call_data.clone(),
            })
            .collect();
        let voters = votes
            .iter()
            .filter(|vote| vote.proposal_id == state.id)
            .map(|vote| ProposalVote {
                id: vote.proposal_id,
                voter: vote.voter,
                support: vote.support,
                votes: to_decimal(vote.votes, self.decimals),
            })
            .collect();

        Ok(Proposal {
            id: state.id,
            proposal_num: 0,
            title,
            description,
            proposer: state.proposer,
            eta_timestamp: state.eta * 1000,
            start_timestamp,
            end_timestamp,
            start_block: state.start_block,
            end_block: state.end_block,
            for_votes: to_decimal(state.for_votes, self.decimals),
            against_votes: to_decimal(state.against_votes, self.decimals),
            canceled: state.canceled,
            executed: state.executed,
            status,
            functions,
            voters,
            era,
        })
    }

    /// Block time in milliseconds; estimated for blocks not yet mined.
    async fn block_time_ms(&self, block: u64) -> Result<u64, ChainError> {
        if block > self.block_number {
            let remaining = (block - self.block_number) as f64;
            let ahead_ms = remaining * self.network.seconds_per_block() * 1000.0;
            return Ok(self.now.as_millis() + ahead_ms.round() as u64);
        }
        Ok(self.reader.block_timestamp(block).await? * 1000)
    }
}
