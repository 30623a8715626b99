//! Nullable chain: a scriptable [`ChainReader`].

use async_trait::async_trait;
use inverse_chain::{
    ChainError, ChainReader, FedKind, ProposalCreatedLog, ProposalState, VoteCastLog,
};
use inverse_types::{Address, NetworkId, U256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct Governor {
    quorum: U256,
    proposals: BTreeMap<u64, ProposalState>,
    created: Vec<ProposalCreatedLog>,
    votes: Vec<VoteCastLog>,
}

#[derive(Default)]
struct State {
    block_number: u64,
    genesis_secs: u64,
    secs_per_block: u64,
    block_timestamps: HashMap<u64, u64>,
    native_balances: HashMap<Address, U256>,
    supplies: HashMap<Address, U256>,
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    reserves: HashMap<Address, U256>,
    owners: HashMap<Address, Vec<Address>>,
    thresholds: HashMap<Address, u64>,
    fed_supplies: HashMap<Address, U256>,
    stabilizer_supplies: HashMap<Address, U256>,
    governors: HashMap<Address, Governor>,
    failing_addresses: HashSet<Address>,
    failing_methods: HashSet<&'static str>,
    fail_all: bool,
    calls: HashMap<&'static str, usize>,
    proposal_reads: Vec<(Address, u64)>,
}

/// An in-memory chain for testing.
///
/// Unset balances and supplies read as zero. Block timestamps default to
/// `genesis + block * secs_per_block` unless set explicitly. Reads can be
/// made to fail per contract address, per method, or globally.
pub struct NullChain {
    network: NetworkId,
    state: Mutex<State>,
}

impl NullChain {
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            state: Mutex::new(State {
                secs_per_block: 13,
                ..State::default()
            }),
        }
    }

    pub fn set_block_number(&self, block: u64) {
        self.state.lock().unwrap().block_number = block;
    }

    /// Timestamp schedule for blocks without an explicit timestamp.
    pub fn set_block_schedule(&self, genesis_secs: u64, secs_per_block: u64) {
        let mut state = self.state.lock().unwrap();
        state.genesis_secs = genesis_secs;
        state.secs_per_block = secs_per_block;
    }

    pub fn set_block_timestamp(&self, block: u64, secs: u64) {
        self.state.lock().unwrap().block_timestamps.insert(block, secs);
    }

    pub fn set_native_balance(&self, holder: Address, amount: U256) {
        self.state.lock().unwrap().native_balances.insert(holder, amount);
    }

    pub fn set_total_supply(&self, token: Address, amount: U256) {
        self.state.lock().unwrap().supplies.insert(token, amount);
    }

    pub fn set_balance(&self, token: Address, holder: Address, amount: U256) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert((token, holder), amount);
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.state
            .lock()
            .unwrap()
            .allowances
            .insert((token, owner, spender), amount);
    }

    pub fn set_reserves(&self, market: Address, amount: U256) {
        self.state.lock().unwrap().reserves.insert(market, amount);
    }

    pub fn set_multisig(&self, wallet: Address, owners: Vec<Address>, threshold: u64) {
        let mut state = self.state.lock().unwrap();
        state.owners.insert(wallet, owners);
        state.thresholds.insert(wallet, threshold);
    }

    pub fn set_fed_supply(&self, fed: Address, amount: U256) {
        self.state.lock().unwrap().fed_supplies.insert(fed, amount);
    }

    pub fn set_stabilizer_supply(&self, stabilizer: Address, amount: U256) {
        self.state
            .lock()
            .unwrap()
            .stabilizer_supplies
            .insert(stabilizer, amount);
    }

    pub fn set_quorum(&self, governor: Address, quorum: U256) {
        self.state
            .lock()
            .unwrap()
            .governors
            .entry(governor)
            .or_default()
            .quorum = quorum;
    }

    /// Register a proposal: its on-chain state and its creation event.
    pub fn add_proposal(&self, governor: Address, state: ProposalState, created: ProposalCreatedLog) {
        let mut chain = self.state.lock().unwrap();
        let gov = chain.governors.entry(governor).or_default();
        gov.proposals.insert(state.id, state);
        gov.created.push(created);
    }

    /// Replace a proposal's on-chain state, e.g. after it was executed.
    pub fn update_proposal(&self, governor: Address, state: ProposalState) {
        self.state
            .lock()
            .unwrap()
            .governors
            .entry(governor)
            .or_default()
            .proposals
            .insert(state.id, state);
    }

    pub fn add_vote(&self, governor: Address, vote: VoteCastLog) {
        self.state
            .lock()
            .unwrap()
            .governors
            .entry(governor)
            .or_default()
            .votes
            .push(vote);
    }

    /// Fail every read that targets `address`.
    pub fn fail_address(&self, address: Address) {
        self.state.lock().unwrap().failing_addresses.insert(address);
    }

    /// Fail every call of one trait method, by method name.
    pub fn fail_method(&self, method: &'static str) {
        self.state.lock().unwrap().failing_methods.insert(method);
    }

    pub fn fail_all(&self, fail: bool) {
        self.state.lock().unwrap().fail_all = fail;
    }

    /// Clear all injected failures.
    pub fn heal(&self) {
        let mut state = self.state.lock().unwrap();
        state.failing_addresses.clear();
        state.failing_methods.clear();
        state.fail_all = false;
    }

    /// Number of calls made to one trait method.
    pub fn calls(&self, method: &str) -> usize {
        self.state.lock().unwrap().calls.get(method).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.values().sum()
    }

    /// Every `(governor, id)` passed to [`ChainReader::proposal`], in order.
    pub fn proposal_reads(&self) -> Vec<(Address, u64)> {
        self.state.lock().unwrap().proposal_reads.clone()
    }

    pub fn reset_calls(&self) {
        let mut state = self.state.lock().unwrap();
        state.calls.clear();
        state.proposal_reads.clear();
    }

    /// Count the call and apply failure injection; on success run `f`.
    fn read<T>(
        &self,
        method: &'static str,
        address: Option<Address>,
        f: impl FnOnce(&mut State) -> Result<T, ChainError>,
    ) -> Result<T, ChainError> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(method).or_default() += 1;
        let address_fails = address.is_some_and(|a| state.failing_addresses.contains(&a));
        if state.fail_all || address_fails || state.failing_methods.contains(method) {
            return Err(ChainError::Transport(format!("null chain: {method} failed")));
        }
        f(&mut state)
    }
}

fn reverted(what: &str) -> ChainError {
    ChainError::Rpc {
        code: 3,
        message: format!("execution reverted: {what}"),
    }
}

#[async_trait]
impl ChainReader for NullChain {
    fn network(&self) -> NetworkId {
        self.network
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.read("block_number", None, |s| Ok(s.block_number))
    }

    async fn block_timestamp(&self, block: u64) -> Result<u64, ChainError> {
        self.read("block_timestamp", None, |s| {
            if block > s.block_number {
                return Err(ChainError::BlockNotFound(block));
            }
            Ok(s.block_timestamps
                .get(&block)
                .copied()
                .unwrap_or(s.genesis_secs + block * s.secs_per_block))
        })
    }

    async fn native_balance(&self, holder: Address) -> Result<U256, ChainError> {
        self.read("native_balance", Some(holder), |s| {
            Ok(s.native_balances.get(&holder).copied().unwrap_or_default())
        })
    }

    async fn total_supply(&self, token: Address) -> Result<U256, ChainError> {
        self.read("total_supply", Some(token), |s| {
            Ok(s.supplies.get(&token).copied().unwrap_or_default())
        })
    }

    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, ChainError> {
        self.read("balance_of", Some(token), |s| {
            Ok(s.balances.get(&(token, holder)).copied().unwrap_or_default())
        })
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        self.read("allowance", Some(token), |s| {
            Ok(s.allowances
                .get(&(token, owner, spender))
                .copied()
                .unwrap_or_default())
        })
    }

    async fn total_reserves(&self, market: Address) -> Result<U256, ChainError> {
        self.read("total_reserves", Some(market), |s| {
            Ok(s.reserves.get(&market).copied().unwrap_or_default())
        })
    }

    async fn multisig_owners(&self, wallet: Address) -> Result<Vec<Address>, ChainError> {
        self.read("multisig_owners", Some(wallet), |s| {
            s.owners.get(&wallet).cloned().ok_or_else(|| reverted("not a multisig"))
        })
    }

    async fn multisig_threshold(&self, wallet: Address) -> Result<u64, ChainError> {
        self.read("multisig_threshold", Some(wallet), |s| {
            s.thresholds.get(&wallet).copied().ok_or_else(|| reverted("not a multisig"))
        })
    }

    async fn fed_supply(&self, fed: Address, _kind: FedKind) -> Result<U256, ChainError> {
        self.read("fed_supply", Some(fed), |s| {
            Ok(s.fed_supplies.get(&fed).copied().unwrap_or_default())
        })
    }

    async fn stabilizer_supply(&self, stabilizer: Address) -> Result<U256, ChainError> {
        self.read("stabilizer_supply", Some(stabilizer), |s| {
            Ok(s.stabilizer_supplies
                .get(&stabilizer)
                .copied()
                .unwrap_or_default())
        })
    }

    async fn proposal_count(&self, governor: Address) -> Result<u64, ChainError> {
        self.read("proposal_count", Some(governor), |s| {
            let gov = s.governors.get(&governor).ok_or_else(|| reverted("no governor"))?;
            Ok(gov.proposals.keys().next_back().copied().unwrap_or(0))
        })
    }

    async fn quorum_votes(&self, governor: Address) -> Result<U256, ChainError> {
        self.read("quorum_votes", Some(governor), |s| {
            let gov = s.governors.get(&governor).ok_or_else(|| reverted("no governor"))?;
            Ok(gov.quorum)
        })
    }

    async fn proposal(&self, governor: Address, id: u64) -> Result<ProposalState, ChainError> {
        self.read("proposal", Some(governor), |s| {
            s.proposal_reads.push((governor, id));
            let gov = s.governors.get(&governor).ok_or_else(|| reverted("no governor"))?;
            gov.proposals
                .get(&id)
                .cloned()
                .ok_or_else(|| reverted("invalid proposal id"))
        })
    }

    async fn proposal_created_logs(
        &self,
        governor: Address,
        _from_block: u64,
    ) -> Result<Vec<ProposalCreatedLog>, ChainError> {
        self.read("proposal_created_logs", Some(governor), |s| {
            Ok(s.governors
                .get(&governor)
                .map(|gov| gov.created.clone())
                .unwrap_or_default())
        })
    }

    async fn vote_cast_logs(
        &self,
        governor: Address,
        _from_block: u64,
    ) -> Result<Vec<VoteCastLog>, ChainError> {
        self.read("vote_cast_logs", Some(governor), |s| {
            Ok(s.governors
                .get(&governor)
                .map(|gov| gov.votes.clone())
                .unwrap_or_default())
        })
    }
}
