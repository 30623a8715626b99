//! [`ChainReader`] over Ethereum JSON-RPC.

use alloy_primitives::{Bytes, B256, U64};
use alloy_sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::trace;

use inverse_types::{Address, NetworkId, U256};

use crate::bindings::{ICToken, IERC20, IFed, IGovernor, IMultisig, IStabilizer, IXChainFed};
use crate::reader::{ChainReader, FedKind, ProposalCreatedLog, ProposalState, VoteCastLog};
use crate::ChainError;

/// Timeouts applied to every provider request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RpcTimeouts {
    pub request: Duration,
    pub connect: Duration,
}

impl Default for RpcTimeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            connect: Duration::from_secs(10),
        }
    }
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct RpcBlock {
    timestamp: U64,
}

#[derive(Deserialize)]
struct RpcLog {
    topics: Vec<B256>,
    data: Bytes,
}

/// JSON-RPC client bound to one network's provider URL.
pub struct RpcChainReader {
    network: NetworkId,
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcChainReader {
    pub fn new(
        network: NetworkId,
        url: impl Into<String>,
        timeouts: RpcTimeouts,
    ) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.request)
            .connect_timeout(timeouts.connect)
            .build()
            .map_err(|e| ChainError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            network,
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Send one request and return its `result`, `None` when the provider
    /// answers `null`.
    async fn request_opt<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<Option<T>, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        trace!(network = %self.network, method, id, "rpc request");
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self.http.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(ChainError::Http(response.status().as_u16()));
        }

        let parsed: RpcResponse<T> = response.json().await?;
        if let Some(err) = parsed.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(parsed.result)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<T, ChainError> {
        self.request_opt(method, params)
            .await?
            .ok_or_else(|| ChainError::Decode(format!("{method}: response has no result")))
    }

    /// `eth_call` against the latest block.
    async fn call<C: SolCall + Send>(&self, to: Address, call: C) -> Result<C::Return, ChainError> {
        let data = Bytes::from(call.abi_encode());
        let output: Bytes = self
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        Ok(C::abi_decode_returns(&output)?)
    }

    async fn logs<E: SolEvent>(&self, address: Address, from_block: u64) -> Result<Vec<E>, ChainError> {
        let filter = json!({
            "address": address,
            "fromBlock": format!("{from_block:#x}"),
            "toBlock": "latest",
            "topics": [E::SIGNATURE_HASH],
        });
        let logs: Vec<RpcLog> = self.request("eth_getLogs", json!([filter])).await?;
        logs.into_iter()
            .map(|log| {
                E::decode_raw_log(log.topics.iter().copied(), &log.data).map_err(ChainError::from)
            })
            .collect()
    }
}

fn to_u64(value: U256, what: &'static str) -> Result<u64, ChainError> {
    u64::try_from(value).map_err(|_| ChainError::Decode(format!("{what} does not fit in 64 bits")))
}

#[async_trait]
impl ChainReader for RpcChainReader {
    fn network(&self) -> NetworkId {
        self.network
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        let number: U64 = self.request("eth_blockNumber", json!([])).await?;
        Ok(number.to::<u64>())
    }

    async fn block_timestamp(&self, block: u64) -> Result<u64, ChainError> {
        let found: Option<RpcBlock> = self
            .request_opt("eth_getBlockByNumber", json!([format!("{block:#x}"), false]))
            .await?;
        found
            .map(|b| b.timestamp.to::<u64>())
            .ok_or(ChainError::BlockNotFound(block))
    }

    async fn native_balance(&self, holder: Address) -> Result<U256, ChainError> {
        self.request("eth_getBalance", json!([holder, "latest"])).await
    }

    async fn total_supply(&self, token: Address) -> Result<U256, ChainError> {
        self.call(token, IERC20::totalSupplyCall {}).await
    }

    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, ChainError> {
        self.call(token, IERC20::balanceOfCall { owner: holder }).await
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        self.call(token, IERC20::allowanceCall { owner, spender }).await
    }

    async fn total_reserves(&self, market: Address) -> Result<U256, ChainError> {
        self.call(market, ICToken::totalReservesCall {}).await
    }

    async fn multisig_owners(&self, wallet: Address) -> Result<Vec<Address>, ChainError> {
        self.call(wallet, IMultisig::getOwnersCall {}).await
    }

    async fn multisig_threshold(&self, wallet: Address) -> Result<u64, ChainError> {
        let threshold = self.call(wallet, IMultisig::getThresholdCall {}).await?;
        to_u64(threshold, "multisig threshold")
    }

    async fn fed_supply(&self, fed: Address, kind: FedKind) -> Result<U256, ChainError> {
        match kind {
            FedKind::SameChain => self.call(fed, IFed::supplyCall {}).await,
            FedKind::CrossChain => self.call(fed, IXChainFed::dstSupplyCall {}).await,
        }
    }

    async fn stabilizer_supply(&self, stabilizer: Address) -> Result<U256, ChainError> {
        self.call(stabilizer, IStabilizer::supplyCall {}).await
    }

    async fn proposal_count(&self, governor: Address) -> Result<u64, ChainError> {
        let count = self.call(governor, IGovernor::proposalCountCall {}).await?;
        to_u64(count, "proposal count")
    }

    async fn quorum_votes(&self, governor: Address) -> Result<U256, ChainError> {
        self.call(governor, IGovernor::quorumVotesCall {}).await
    }

    async fn proposal(&self, governor: Address, id: u64) -> Result<ProposalState, ChainError> {
        let p = self
            .call(
                governor,
                IGovernor::proposalsCall {
                    proposalId: U256::from(id),
                },
            )
            .await?;
        Ok(ProposalState {
            id: to_u64(p.id, "proposal id")?,
            proposer: p.proposer,
            eta: to_u64(p.eta, "proposal eta")?,
            start_block: to_u64(p.startBlock, "proposal start block")?,
            end_block: to_u64(p.endBlock, "proposal end block")?,
            for_votes: p.forVotes,
            against_votes: p.againstVotes,
            canceled: p.canceled,
            executed: p.executed,
        })
    }

    async fn proposal_created_logs(
        &self,
        governor: Address,
        from_block: u64,
    ) -> Result<Vec<ProposalCreatedLog>, ChainError> {
        let events = self
            .logs::<IGovernor::ProposalCreated>(governor, from_block)
            .await?;
        events
            .into_iter()
            .map(|e| {
                Ok(ProposalCreatedLog {
                    id: to_u64(e.id, "proposal id")?,
                    proposer: e.proposer,
                    targets: e.targets,
                    signatures: e.signatures,
                    calldatas: e.calldatas,
                    start_block: to_u64(e.startBlock, "proposal start block")?,
                    end_block: to_u64(e.endBlock, "proposal end block")?,
                    description: e.description,
                })
            })
            .collect()
    }

    async fn vote_cast_logs(
        &self,
        governor: Address,
        from_block: u64,
    ) -> Result<Vec<VoteCastLog>, ChainError> {
        let events = self.logs::<IGovernor::VoteCast>(governor, from_block).await?;
        events
            .into_iter()
            .map(|e| {
                Ok(VoteCastLog {
                    voter: e.voter,
                    proposal_id: to_u64(e.proposalId, "vote proposal id")?,
                    support: e.support,
                    votes: e.votes,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_u64_rejects_overflow() {
        assert_eq!(to_u64(U256::from(42u64), "x").unwrap(), 42);
        let err = to_u64(U256::MAX, "x").unwrap_err();
        assert_eq!(err.kind(), "chain_decode");
    }

    #[test]
    fn call_encoding_uses_selector() {
        let data = IERC20::balanceOfCall {
            owner: Address::repeat_byte(0xab),
        }
        .abi_encode();
        // balanceOf(address)
        assert_eq!(&data[..4], &[0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(data.len(), 4 + 32);
    }

    #[test]
    fn decodes_single_return_value() {
        let mut word = [0u8; 32];
        word[31] = 7;
        let supply = IERC20::totalSupplyCall::abi_decode_returns(&word).unwrap();
        assert_eq!(supply, U256::from(7u64));
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_transport_error() {
        let reader = RpcChainReader::new(
            NetworkId::Mainnet,
            "http://127.0.0.1:1",
            RpcTimeouts {
                request: Duration::from_millis(500),
                connect: Duration::from_millis(200),
            },
        )
        .unwrap();
        let err = reader.block_number().await.unwrap_err();
        assert!(matches!(
            err,
            ChainError::Transport(_) | ChainError::Timeout(_)
        ));
    }
}
