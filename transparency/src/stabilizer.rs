//! Stabilizer balance snapshot.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use inverse_chain::{ChainRegistry, ChainSource, Interface, NetworkSet};
use inverse_types::{Address, NetworkId};

use crate::TransparencyError;

pub const STABILIZER_MAX_AGE: Duration = Duration::from_secs(60);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StabilizerBalance {
    /// Price-feed identifier of the collateral token.
    pub token: String,
    pub address: Address,
    pub balance: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StabilizerBalances {
    pub balances: Vec<StabilizerBalance>,
}

pub struct StabilizerPipeline {
    chains: ChainRegistry,
    networks: Arc<NetworkSet>,
    home: NetworkId,
}

impl StabilizerPipeline {
    pub fn new(chains: ChainRegistry, networks: Arc<NetworkSet>, home: NetworkId) -> Self {
        Self {
            chains,
            networks,
            home,
        }
    }

    /// Collateral held by the stabilizer, in the collateral token's decimals.
    pub async fn fetch(&self) -> Result<StabilizerBalances, TransparencyError> {
        let config = self.networks.get(self.home);
        let stabilizer = config
            .and_then(|c| c.stabilizer.as_ref())
            .ok_or(TransparencyError::NotConfigured {
                network: self.home,
                section: "stabilizer",
            })?;
        let token = config
            .and_then(|c| c.token(&stabilizer.token))
            .ok_or(TransparencyError::UnknownToken {
                network: self.home,
                address: stabilizer.token,
            })?;

        let source = ChainSource::required(self.home, stabilizer.address, Interface::Stabilizer);
        let supply = self
            .chains
            .get(self.home)?
            .stabilizer_supply(stabilizer.address)
            .await
            .map_err(|e| e.at(source.to_string()))?;

        Ok(StabilizerBalances {
            balances: vec![StabilizerBalance {
                token: token
                    .coingecko_id
                    .clone()
                    .unwrap_or_else(|| token.symbol.to_lowercase()),
                address: stabilizer.token,
                balance: token.to_decimal(supply),
            }],
        })
    }
}
