//! Network identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Identifies which EVM chain a source lives on.
///
/// Serialized as the decimal chain id string (`"1"`, `"250"`), which is also
/// the prefix of per-network cache keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NetworkId {
    /// Ethereum mainnet.
    Mainnet,
    /// Rinkeby test network.
    Rinkeby,
    /// Fantom opera.
    Fantom,
}

impl NetworkId {
    pub const ALL: [NetworkId; 3] = [Self::Mainnet, Self::Rinkeby, Self::Fantom];

    /// Numeric chain id.
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Mainnet => 1,
            Self::Rinkeby => 4,
            Self::Fantom => 250,
        }
    }

    /// Chain id as used in query strings and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "1",
            Self::Rinkeby => "4",
            Self::Fantom => "250",
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Rinkeby => "rinkeby",
            Self::Fantom => "fantom",
        }
    }

    /// Average block time, used to estimate timestamps of future blocks.
    pub fn seconds_per_block(&self) -> f64 {
        match self {
            Self::Mainnet | Self::Rinkeby => 13.5,
            Self::Fantom => 1.0,
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" | "mainnet" => Ok(Self::Mainnet),
            "4" | "rinkeby" => Ok(Self::Rinkeby),
            "250" | "fantom" | "ftm" => Ok(Self::Fantom),
            other => Err(TypesError::InvalidNetwork(other.to_string())),
        }
    }
}

impl TryFrom<String> for NetworkId {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NetworkId> for String {
    fn from(id: NetworkId) -> Self {
        id.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_and_names() {
        assert_eq!("1".parse::<NetworkId>().unwrap(), NetworkId::Mainnet);
        assert_eq!("ftm".parse::<NetworkId>().unwrap(), NetworkId::Fantom);
        assert!("56".parse::<NetworkId>().is_err());
    }

    #[test]
    fn serializes_as_chain_id_string() {
        let json = serde_json::to_string(&NetworkId::Fantom).unwrap();
        assert_eq!(json, "\"250\"");
        let back: NetworkId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NetworkId::Fantom);
    }
}
