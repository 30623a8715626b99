//! Descriptors of individual on-chain read targets.

use inverse_types::{Address, NetworkId};
use std::fmt;

/// Contract interface a source is read through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interface {
    Erc20,
    CToken,
    Multisig,
    Fed,
    CrossChainFed,
    Stabilizer,
    Governor,
    Native,
}

impl Interface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Erc20 => "erc20",
            Self::CToken => "ctoken",
            Self::Multisig => "multisig",
            Self::Fed => "fed",
            Self::CrossChainFed => "xchain-fed",
            Self::Stabilizer => "stabilizer",
            Self::Governor => "governor",
            Self::Native => "native",
        }
    }
}

/// Contract generation. Governance has been redeployed once; both
/// generations keep their own id sequences.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Generation {
    #[default]
    Current,
    Legacy,
}

/// What a failed read does to the batch it belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Requirement {
    /// Failure aborts the whole pipeline run.
    #[default]
    Required,
    /// Failure is logged and replaced by a neutral value.
    Optional,
}

/// One on-chain read target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainSource {
    pub network: NetworkId,
    pub address: Address,
    pub interface: Interface,
    pub generation: Generation,
    pub requirement: Requirement,
}

impl ChainSource {
    pub fn required(network: NetworkId, address: Address, interface: Interface) -> Self {
        Self {
            network,
            address,
            interface,
            generation: Generation::Current,
            requirement: Requirement::Required,
        }
    }

    pub fn optional(network: NetworkId, address: Address, interface: Interface) -> Self {
        Self {
            requirement: Requirement::Optional,
            ..Self::required(network, address, interface)
        }
    }

    pub fn legacy(mut self) -> Self {
        self.generation = Generation::Legacy;
        self
    }

    pub fn is_optional(&self) -> bool {
        self.requirement == Requirement::Optional
    }
}

impl fmt::Display for ChainSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}@{}",
            self.network.name(),
            self.interface.as_str(),
            self.address
        )?;
        if self.generation == Generation::Legacy {
            f.write_str(" (legacy)")?;
        }
        Ok(())
    }
}
