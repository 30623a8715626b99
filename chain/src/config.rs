//! Per-network contract configuration.
//!
//! Each supported network is described by one closed [`NetworkConfig`]
//! record. Contract sections are optional: a network without a
//! `governance` section cannot be synced, one without `transparency` cannot
//! serve the DAO snapshot. [`NetworkSet::validate`] runs at startup and
//! rejects any reference the pipelines could not resolve.

use inverse_types::{Address, NetworkId, Token};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("network {0} is declared more than once")]
    DuplicateNetwork(NetworkId),

    #[error("network {0} has no rpc url")]
    MissingRpcUrl(NetworkId),

    #[error("network {network}: {context} references token {address} missing from the registry")]
    UnknownToken {
        network: NetworkId,
        address: Address,
        context: &'static str,
    },

    #[error("network {network}: mirror network {mirror} is not declared")]
    UnknownMirror {
        network: NetworkId,
        mirror: NetworkId,
    },

    #[error("network {0}: core tokens (DOLA, INV) are required")]
    MissingCoreTokens(NetworkId),

    #[error("network {network}: governance {field} address must not be zero")]
    ZeroGovernanceAddress {
        network: NetworkId,
        field: &'static str,
    },

    #[error("network {0}: both governance eras point at the same contract")]
    SharedGovernanceContract(NetworkId),
}

impl ConfigError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateNetwork(_) => "config_duplicate_network",
            Self::MissingRpcUrl(_) => "config_missing_rpc_url",
            Self::UnknownToken { .. } => "config_unknown_token",
            Self::UnknownMirror { .. } => "config_unknown_mirror",
            Self::MissingCoreTokens(_) => "config_missing_core_tokens",
            Self::ZeroGovernanceAddress { .. } => "config_zero_governance_address",
            Self::SharedGovernanceContract(_) => "config_shared_governance_contract",
        }
    }
}

/// The protocol's stablecoin and governance token on one network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreTokens {
    pub dola: Address,
    pub inv: Address,
}

/// Both governance contract generations on one network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceContracts {
    /// Current generation ("mills").
    pub governor: Address,
    /// Legacy generation ("alpha").
    pub governor_alpha: Address,
    /// Token whose decimals vote weights are expressed in.
    pub vote_token: Address,
    /// First block scanned for governance events.
    #[serde(default)]
    pub from_block: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorMarket {
    pub market: Address,
    pub underlying: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigConfig {
    pub address: Address,
    pub name: String,
}

/// A contract allowed to expand and contract DOLA supply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FedConfig {
    pub address: Address,
    pub name: String,
    /// Network the Fed contract lives on.
    pub chain_id: NetworkId,
    #[serde(default)]
    pub project_image: String,
    /// Cross-chain Feds report the supply minted on their destination chain.
    #[serde(default)]
    pub is_xchain: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransparencyContracts {
    pub treasury: Address,
    #[serde(default)]
    pub treasury_tokens: Vec<Address>,
    #[serde(default)]
    pub anchor_markets: Vec<AnchorMarket>,
    #[serde(default)]
    pub multisigs: Vec<MultisigConfig>,
    /// Tokens whose balance and allowance to the treasury are reported for
    /// every multisig. The native coin is always reported as well.
    #[serde(default)]
    pub multisig_tokens: Vec<Address>,
    #[serde(default)]
    pub feds: Vec<FedConfig>,
    /// Networks whose DOLA and INV supplies are reported as mirrors.
    #[serde(default)]
    pub mirrors: Vec<NetworkId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilizerContracts {
    pub address: Address,
    /// Collateral token held by the stabilizer.
    pub token: Address,
}

/// Everything the pipelines need to know about one network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub id: NetworkId,
    pub rpc_url: String,
    /// Dedicated endpoint for the proposal sync job, which issues far more
    /// calls than the read endpoints.
    #[serde(default)]
    pub sync_rpc_url: Option<String>,
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub core_tokens: Option<CoreTokens>,
    #[serde(default)]
    pub governance: Option<GovernanceContracts>,
    #[serde(default)]
    pub transparency: Option<TransparencyContracts>,
    #[serde(default)]
    pub stabilizer: Option<StabilizerContracts>,
}

impl NetworkConfig {
    pub fn new(id: NetworkId, rpc_url: impl Into<String>) -> Self {
        Self {
            id,
            rpc_url: rpc_url.into(),
            sync_rpc_url: None,
            tokens: Vec::new(),
            core_tokens: None,
            governance: None,
            transparency: None,
            stabilizer: None,
        }
    }

    /// Look up a registry token by address.
    pub fn token(&self, address: &Address) -> Option<&Token> {
        self.tokens.iter().find(|t| &t.address == address)
    }

    /// The chain's native coin. A registry entry at the zero address
    /// overrides the built-in descriptor.
    pub fn native_token(&self) -> Token {
        if let Some(token) = self.token(&Address::ZERO) {
            return token.clone();
        }
        let (name, symbol, coingecko) = match self.id {
            NetworkId::Fantom => ("Fantom", "FTM", "fantom"),
            NetworkId::Mainnet | NetworkId::Rinkeby => ("Ether", "ETH", "ethereum"),
        };
        Token {
            address: Address::ZERO,
            name: name.to_string(),
            symbol: symbol.to_string(),
            image: String::new(),
            decimals: 18,
            coingecko_id: Some(coingecko.to_string()),
        }
    }

    /// Check that every address a section refers to resolves.
    pub fn validate(&self, declared: &HashSet<NetworkId>) -> Result<(), ConfigError> {
        if self.rpc_url.trim().is_empty() {
            return Err(ConfigError::MissingRpcUrl(self.id));
        }

        if let Some(core) = &self.core_tokens {
            self.require_token(&core.dola, "core_tokens.dola")?;
            self.require_token(&core.inv, "core_tokens.inv")?;
        }

        if let Some(gov) = &self.governance {
            if gov.governor == Address::ZERO {
                return Err(ConfigError::ZeroGovernanceAddress {
                    network: self.id,
                    field: "governor",
                });
            }
            if gov.governor_alpha == Address::ZERO {
                return Err(ConfigError::ZeroGovernanceAddress {
                    network: self.id,
                    field: "governor_alpha",
                });
            }
            if gov.governor == gov.governor_alpha {
                return Err(ConfigError::SharedGovernanceContract(self.id));
            }
            self.require_token(&gov.vote_token, "governance.vote_token")?;
        }

        if let Some(tr) = &self.transparency {
            if self.core_tokens.is_none() {
                return Err(ConfigError::MissingCoreTokens(self.id));
            }
            for token in &tr.treasury_tokens {
                self.require_token(token, "transparency.treasury_tokens")?;
            }
            for market in &tr.anchor_markets {
                self.require_token(&market.underlying, "transparency.anchor_markets")?;
            }
            for token in &tr.multisig_tokens {
                self.require_token(token, "transparency.multisig_tokens")?;
            }
            for mirror in &tr.mirrors {
                if !declared.contains(mirror) {
                    return Err(ConfigError::UnknownMirror {
                        network: self.id,
                        mirror: *mirror,
                    });
                }
            }
            for fed in &tr.feds {
                if !declared.contains(&fed.chain_id) {
                    return Err(ConfigError::UnknownMirror {
                        network: self.id,
                        mirror: fed.chain_id,
                    });
                }
            }
        }

        if let Some(stab) = &self.stabilizer {
            self.require_token(&stab.token, "stabilizer.token")?;
        }
        Ok(())
    }

    fn require_token(&self, address: &Address, context: &'static str) -> Result<(), ConfigError> {
        if self.token(address).is_some() {
            Ok(())
        } else {
            Err(ConfigError::UnknownToken {
                network: self.id,
                address: *address,
                context,
            })
        }
    }
}

/// The full set of configured networks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkSet {
    networks: Vec<NetworkConfig>,
}

impl NetworkSet {
    pub fn new(networks: Vec<NetworkConfig>) -> Self {
        Self { networks }
    }

    pub fn get(&self, id: NetworkId) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.id == id)
    }

    pub fn get_mut(&mut self, id: NetworkId) -> Option<&mut NetworkConfig> {
        self.networks.iter_mut().find(|n| n.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkConfig> {
        self.networks.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Validate every network, and that each is declared once. Mirror
    /// networks additionally need core tokens so their supplies can be read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut declared = HashSet::new();
        for network in &self.networks {
            if !declared.insert(network.id) {
                return Err(ConfigError::DuplicateNetwork(network.id));
            }
        }
        for network in &self.networks {
            network.validate(&declared)?;
            if let Some(tr) = &network.transparency {
                for mirror in &tr.mirrors {
                    let has_core = self.get(*mirror).is_some_and(|m| m.core_tokens.is_some());
                    if !has_core {
                        return Err(ConfigError::MissingCoreTokens(*mirror));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAINNET: &str = r#"
        id = "1"
        rpc_url = "https://rpc.example"

        [[tokens]]
        address = "0x865377367054516e17014CcdED1e7d814EDC9ce4"
        name = "Dola USD Stablecoin"
        symbol = "DOLA"
        decimals = 18

        [[tokens]]
        address = "0x41D5D79431A913C4aE7d69a668ecdfE5fF9DFB68"
        name = "Inverse DAO"
        symbol = "INV"
        decimals = 18
        coingeckoId = "inverse-finance"

        [core_tokens]
        dola = "0x865377367054516e17014CcdED1e7d814EDC9ce4"
        inv = "0x41D5D79431A913C4aE7d69a668ecdfE5fF9DFB68"

        [governance]
        governor = "0xBeCCB6bb0aa4ab551966A7E4B97cec74bb359Bf6"
        governor_alpha = "0x35d9f4953748b318f18c30634bA299b237eeDfff"
        vote_token = "0x41D5D79431A913C4aE7d69a668ecdfE5fF9DFB68"
    "#;

    fn mainnet() -> NetworkConfig {
        toml::from_str(MAINNET).unwrap()
    }

    #[test]
    fn parses_typed_sections() {
        let cfg = mainnet();
        assert_eq!(cfg.id, NetworkId::Mainnet);
        assert_eq!(cfg.tokens.len(), 2);
        assert_eq!(cfg.governance.as_ref().unwrap().from_block, 0);
        assert!(cfg.transparency.is_none());
        NetworkSet::new(vec![cfg]).validate().unwrap();
    }

    #[test]
    fn rejects_unknown_vote_token() {
        let mut cfg = mainnet();
        cfg.governance.as_mut().unwrap().vote_token = Address::repeat_byte(0x11);
        let err = NetworkSet::new(vec![cfg]).validate().unwrap_err();
        assert_eq!(err.kind(), "config_unknown_token");
    }

    #[test]
    fn rejects_shared_governance_contract() {
        let mut cfg = mainnet();
        let gov = cfg.governance.as_mut().unwrap();
        gov.governor_alpha = gov.governor;
        let err = NetworkSet::new(vec![cfg]).validate().unwrap_err();
        assert_eq!(err, ConfigError::SharedGovernanceContract(NetworkId::Mainnet));
    }

    #[test]
    fn rejects_undeclared_mirror() {
        let mut cfg = mainnet();
        cfg.transparency = Some(TransparencyContracts {
            treasury: Address::repeat_byte(0x22),
            treasury_tokens: vec![],
            anchor_markets: vec![],
            multisigs: vec![],
            multisig_tokens: vec![],
            feds: vec![],
            mirrors: vec![NetworkId::Fantom],
        });
        let err = NetworkSet::new(vec![cfg]).validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownMirror { .. }));
    }

    #[test]
    fn rejects_duplicate_network() {
        let err = NetworkSet::new(vec![mainnet(), mainnet()]).validate().unwrap_err();
        assert_eq!(err, ConfigError::DuplicateNetwork(NetworkId::Mainnet));
    }

    #[test]
    fn native_token_defaults_per_network() {
        let ftm = NetworkConfig::new(NetworkId::Fantom, "https://rpc.ftm");
        assert_eq!(ftm.native_token().symbol, "FTM");
        assert!(ftm.native_token().is_native());
        assert_eq!(mainnet().native_token().symbol, "ETH");
    }
}
