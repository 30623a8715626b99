//! Shared handler state.

use std::sync::Arc;

use inverse_chain::{ChainRegistry, NetworkSet};
use inverse_governance::{AllowList, DraftService, ProposalSync};
use inverse_store::{CacheGateway, KvStore};
use inverse_transparency::{DaoPipeline, StabilizerPipeline};
use inverse_types::{Clock, NetworkId};

use crate::ApiMetrics;

/// Everything the server is built from.
pub struct ApiContext {
    pub chains: ChainRegistry,
    pub networks: Arc<NetworkSet>,
    /// Network whose transparency and stabilizer contracts are served.
    pub home: NetworkId,
    pub store: Arc<dyn KvStore>,
    pub clock: Arc<dyn Clock>,
    pub allow_list: AllowList,
    /// Bearer token of the scheduled sync job.
    pub sync_secret: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub cache: CacheGateway,
    pub proposals: Arc<ProposalSync>,
    pub drafts: Arc<DraftService>,
    pub dao: Arc<DaoPipeline>,
    pub stabilizer: Arc<StabilizerPipeline>,
    pub sync_secret: Option<Arc<str>>,
    pub metrics: Arc<ApiMetrics>,
}

impl AppState {
    pub fn new(ctx: ApiContext) -> Self {
        let ApiContext {
            chains,
            networks,
            home,
            store,
            clock,
            allow_list,
            sync_secret,
        } = ctx;

        Self {
            cache: CacheGateway::new(store.clone(), clock.clone()),
            proposals: Arc::new(ProposalSync::new(
                chains.clone(),
                networks.clone(),
                store.clone(),
                clock.clone(),
            )),
            drafts: Arc::new(DraftService::new(store, clock, allow_list)),
            dao: Arc::new(DaoPipeline::new(chains.clone(), networks.clone(), home)),
            stabilizer: Arc::new(StabilizerPipeline::new(chains, networks, home)),
            sync_secret: sync_secret.map(Arc::from),
            metrics: Arc::new(ApiMetrics::new()),
        }
    }
}
