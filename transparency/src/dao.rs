//! DAO transparency snapshot.
//!
//! Core token supplies, treasury holdings, Anchor reserves, multisig funds
//! and same-chain Fed supplies are required: any failure aborts the run and
//! the caller falls back to the cache. Mirror-chain supplies and Feds on
//! other chains are optional and read as zero when their chain fails.

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use inverse_chain::{
    fetch_batch, require_all, ChainError, ChainReader, ChainRegistry, ChainSource, CoreTokens,
    FedKind, Interface, MultisigConfig, NetworkConfig, NetworkSet, TransparencyContracts,
};
use inverse_types::{Address, NetworkId, Token, U256};

use crate::TransparencyError;

pub const DAO_MAX_AGE: Duration = Duration::from_secs(300);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub token: Token,
    pub balance: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorSupply {
    pub chain_id: NetworkId,
    pub dola_total_supply: f64,
    pub inv_total_supply: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultisigFund {
    pub token: Token,
    pub balance: f64,
    /// Treasury allowance to the multisig; `None` for the native coin.
    pub allowance: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultisigSnapshot {
    pub address: Address,
    pub name: String,
    pub owners: Vec<Address>,
    pub funds: Vec<MultisigFund>,
    pub threshold: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FedSupply {
    pub address: Address,
    pub chain_id: NetworkId,
    pub name: String,
    pub project_image: String,
    pub is_xchain: bool,
    pub supply: f64,
}

/// Cached payload of the DAO transparency endpoint. Lists keep the
/// configured order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaoSnapshot {
    pub dola_total_supply: f64,
    pub inv_total_supply: f64,
    pub anchor_reserves: Vec<TokenBalance>,
    pub treasury: Vec<TokenBalance>,
    pub mirrors: Vec<MirrorSupply>,
    pub multisigs: Vec<MultisigSnapshot>,
    pub fed_supplies: Vec<FedSupply>,
}

pub struct DaoPipeline {
    chains: ChainRegistry,
    networks: Arc<NetworkSet>,
    home: NetworkId,
}

fn registry_token(config: &NetworkConfig, address: Address) -> Result<Token, TransparencyError> {
    config
        .token(&address)
        .cloned()
        .ok_or(TransparencyError::UnknownToken {
            network: config.id,
            address,
        })
}

async fn tagged<T>(
    source: ChainSource,
    read: impl Future<Output = Result<T, ChainError>>,
) -> Result<T, ChainError> {
    read.await.map_err(|e| e.at(source.to_string()))
}

impl DaoPipeline {
    pub fn new(chains: ChainRegistry, networks: Arc<NetworkSet>, home: NetworkId) -> Self {
        Self {
            chains,
            networks,
            home,
        }
    }

    /// Read every source and build the snapshot.
    pub async fn fetch(&self) -> Result<DaoSnapshot, TransparencyError> {
        let config = self
            .networks
            .get(self.home)
            .ok_or(TransparencyError::NotConfigured {
                network: self.home,
                section: "network",
            })?;
        let contracts = config
            .transparency
            .as_ref()
            .ok_or(TransparencyError::NotConfigured {
                network: self.home,
                section: "transparency",
            })?;
        let core = config
            .core_tokens
            .as_ref()
            .ok_or(TransparencyError::NotConfigured {
                network: self.home,
                section: "core_tokens",
            })?;
        let dola = registry_token(config, core.dola)?;
        let inv = registry_token(config, core.inv)?;
        let reader = self.chains.get(self.home)?;
        let reader = reader.as_ref();

        let (supplies, treasury, anchor_reserves, multisigs, fed_supplies, mirrors) = futures_util::try_join!(
            self.core_supplies(reader, core),
            self.treasury(reader, config, contracts),
            self.anchor_reserves(reader, config, contracts),
            self.multisigs(reader, config, contracts),
            self.fed_supplies(contracts, dola.decimals),
            self.mirrors(contracts),
        )?;

        Ok(DaoSnapshot {
            dola_total_supply: dola.to_decimal(supplies[0]),
            inv_total_supply: inv.to_decimal(supplies[1]),
            anchor_reserves,
            treasury,
            mirrors,
            multisigs,
            fed_supplies,
        })
    }

    fn source(&self, address: Address, interface: Interface) -> ChainSource {
        ChainSource::required(self.home, address, interface)
    }

    async fn core_supplies(
        &self,
        reader: &dyn ChainReader,
        core: &CoreTokens,
    ) -> Result<Vec<U256>, TransparencyError> {
        let reads = vec![
            (self.source(core.dola, Interface::Erc20), reader.total_supply(core.dola)),
            (self.source(core.inv, Interface::Erc20), reader.total_supply(core.inv)),
        ];
        Ok(require_all(reads).await?)
    }

    async fn treasury(
        &self,
        reader: &dyn ChainReader,
        config: &NetworkConfig,
        contracts: &TransparencyContracts,
    ) -> Result<Vec<TokenBalance>, TransparencyError> {
        let tokens = contracts
            .treasury_tokens
            .iter()
            .map(|address| registry_token(config, *address))
            .collect::<Result<Vec<_>, _>>()?;
        let reads: Vec<_> = tokens
            .iter()
            .map(|token| {
                (
                    self.source(token.address, Interface::Erc20),
                    reader.balance_of(token.address, contracts.treasury),
                )
            })
            .collect();
        let raw = require_all(reads).await?;
        Ok(tokens
            .into_iter()
            .zip(raw)
            .map(|(token, raw)| TokenBalance {
                balance: token.to_decimal(raw),
                token,
            })
            .collect())
    }

    async fn anchor_reserves(
        &self,
        reader: &dyn ChainReader,
        config: &NetworkConfig,
        contracts: &TransparencyContracts,
    ) -> Result<Vec<TokenBalance>, TransparencyError> {
        let underlying = contracts
            .anchor_markets
            .iter()
            .map(|market| registry_token(config, market.underlying))
            .collect::<Result<Vec<_>, _>>()?;
        let reads: Vec<_> = contracts
            .anchor_markets
            .iter()
            .map(|market| {
                (
                    self.source(market.market, Interface::CToken),
                    reader.total_reserves(market.market),
                )
            })
            .collect();
        let raw = require_all(reads).await?;
        Ok(underlying
            .into_iter()
            .zip(raw)
            .map(|(token, raw)| TokenBalance {
                balance: token.to_decimal(raw),
                token,
            })
            .collect())
    }

    async fn multisigs(
        &self,
        reader: &dyn ChainReader,
        config: &NetworkConfig,
        contracts: &TransparencyContracts,
    ) -> Result<Vec<MultisigSnapshot>, TransparencyError> {
        let tokens = contracts
            .multisig_tokens
            .iter()
            .map(|address| registry_token(config, *address))
            .collect::<Result<Vec<_>, _>>()?;
        let native = config.native_token();
        Ok(try_join_all(contracts.multisigs.iter().map(|multisig| {
            self.multisig(reader, multisig, &tokens, &native, contracts.treasury)
        }))
        .await?)
    }

    async fn multisig(
        &self,
        reader: &dyn ChainReader,
        multisig: &MultisigConfig,
        tokens: &[Token],
        native: &Token,
        treasury: Address,
    ) -> Result<MultisigSnapshot, ChainError> {
        let wallet = multisig.address;
        let balances: Vec<_> = tokens
            .iter()
            .map(|t| (self.source(t.address, Interface::Erc20), reader.balance_of(t.address, wallet)))
            .collect();
        let allowances: Vec<_> = tokens
            .iter()
            .map(|t| {
                (
                    self.source(t.address, Interface::Erc20),
                    reader.allowance(t.address, treasury, wallet),
                )
            })
            .collect();

        let (owners, threshold, balances, allowances, native_balance) = futures_util::try_join!(
            tagged(self.source(wallet, Interface::Multisig), reader.multisig_owners(wallet)),
            tagged(self.source(wallet, Interface::Multisig), reader.multisig_threshold(wallet)),
            require_all(balances),
            require_all(allowances),
            tagged(self.source(wallet, Interface::Native), reader.native_balance(wallet)),
        )?;

        let mut funds: Vec<MultisigFund> = tokens
            .iter()
            .zip(balances.into_iter().zip(allowances))
            .map(|(token, (balance, allowance))| MultisigFund {
                token: token.clone(),
                balance: token.to_decimal(balance),
                allowance: Some(token.to_decimal(allowance)),
            })
            .collect();
        funds.push(MultisigFund {
            token: native.clone(),
            balance: native.to_decimal(native_balance),
            allowance: None,
        });

        Ok(MultisigSnapshot {
            address: wallet,
            name: multisig.name.clone(),
            owners,
            funds,
            threshold,
        })
    }

    /// Fed supplies in DOLA of each Fed's own chain. A chain without a
    /// declared DOLA falls back to `home_decimals`.
    async fn fed_supplies(
        &self,
        contracts: &TransparencyContracts,
        home_decimals: u8,
    ) -> Result<Vec<FedSupply>, TransparencyError> {
        let reads: Vec<_> = contracts
            .feds
            .iter()
            .map(|fed| {
                let interface = if fed.is_xchain {
                    Interface::CrossChainFed
                } else {
                    Interface::Fed
                };
                let source = if fed.is_xchain || fed.chain_id != self.home {
                    ChainSource::optional(fed.chain_id, fed.address, interface)
                } else {
                    ChainSource::required(fed.chain_id, fed.address, interface)
                };
                let reader = self.chains.get(fed.chain_id);
                let read = async move {
                    reader?
                        .fed_supply(fed.address, FedKind::from_xchain(fed.is_xchain))
                        .await
                };
                (source, read)
            })
            .collect();
        let raw = fetch_batch(reads, U256::ZERO).await?;

        Ok(contracts
            .feds
            .iter()
            .zip(raw)
            .map(|(fed, raw)| FedSupply {
                address: fed.address,
                chain_id: fed.chain_id,
                name: fed.name.clone(),
                project_image: fed.project_image.clone(),
                is_xchain: fed.is_xchain,
                supply: inverse_types::to_decimal(
                    raw,
                    self.dola_decimals(fed.chain_id, home_decimals),
                ),
            })
            .collect())
    }

    fn dola_decimals(&self, network: NetworkId, fallback: u8) -> u8 {
        self.networks
            .get(network)
            .and_then(|config| {
                let dola = config.core_tokens.as_ref()?.dola;
                config.token(&dola)
            })
            .map_or(fallback, |token| token.decimals)
    }

    async fn mirrors(
        &self,
        contracts: &TransparencyContracts,
    ) -> Result<Vec<MirrorSupply>, TransparencyError> {
        let supply_of = |network: NetworkId, token: Option<Address>| {
            let source =
                ChainSource::optional(network, token.unwrap_or(Address::ZERO), Interface::Erc20);
            let reader = self.chains.get(network);
            let read = async move {
                let token = token.ok_or(ChainError::UnsupportedNetwork(network))?;
                reader?.total_supply(token).await
            };
            (source, read)
        };

        let mut reads = Vec::with_capacity(contracts.mirrors.len() * 2);
        let mut decimals = Vec::with_capacity(contracts.mirrors.len());
        for network in &contracts.mirrors {
            let config = self.networks.get(*network);
            let core = config.and_then(|c| c.core_tokens.as_ref());
            let token_decimals = |address: Option<Address>| {
                address
                    .and_then(|a| config.and_then(|c| c.token(&a)))
                    .map_or(18, |t| t.decimals)
            };
            let dola = core.map(|c| c.dola);
            let inv = core.map(|c| c.inv);
            decimals.push((token_decimals(dola), token_decimals(inv)));
            reads.push(supply_of(*network, dola));
            reads.push(supply_of(*network, inv));
        }
        let raw = fetch_batch(reads, U256::ZERO).await?;

        Ok(contracts
            .mirrors
            .iter()
            .zip(raw.chunks(2))
            .zip(decimals)
            .map(|((network, pair), (dola_decimals, inv_decimals))| MirrorSupply {
                chain_id: *network,
                dola_total_supply: inverse_types::to_decimal(pair[0], dola_decimals),
                inv_total_supply: inverse_types::to_decimal(pair[1], inv_decimals),
            })
            .collect())
    }
}
