//! Per-network reader lookup.

use std::collections::HashMap;
use std::sync::Arc;

use inverse_types::NetworkId;

use crate::config::NetworkSet;
use crate::rpc::{RpcChainReader, RpcTimeouts};
use crate::{ChainError, ChainReader};

/// Maps each configured network to its readers.
///
/// The proposal sync job may use a dedicated provider; when none is
/// configured it shares the default reader.
#[derive(Clone, Default)]
pub struct ChainRegistry {
    readers: HashMap<NetworkId, Arc<dyn ChainReader>>,
    sync_readers: HashMap<NetworkId, Arc<dyn ChainReader>>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build JSON-RPC readers for every configured network.
    pub fn from_networks(networks: &NetworkSet, timeouts: RpcTimeouts) -> Result<Self, ChainError> {
        let mut registry = Self::new();
        for network in networks.iter() {
            let reader = RpcChainReader::new(network.id, network.rpc_url.clone(), timeouts)?;
            registry.insert(Arc::new(reader));
            if let Some(url) = &network.sync_rpc_url {
                let reader = RpcChainReader::new(network.id, url.clone(), timeouts)?;
                registry.insert_sync(Arc::new(reader));
            }
        }
        Ok(registry)
    }

    pub fn insert(&mut self, reader: Arc<dyn ChainReader>) {
        self.readers.insert(reader.network(), reader);
    }

    pub fn insert_sync(&mut self, reader: Arc<dyn ChainReader>) {
        self.sync_readers.insert(reader.network(), reader);
    }

    pub fn with_reader(mut self, reader: Arc<dyn ChainReader>) -> Self {
        self.insert(reader);
        self
    }

    pub fn get(&self, network: NetworkId) -> Result<Arc<dyn ChainReader>, ChainError> {
        self.readers
            .get(&network)
            .cloned()
            .ok_or(ChainError::UnsupportedNetwork(network))
    }

    /// Reader for the proposal sync job.
    pub fn get_for_sync(&self, network: NetworkId) -> Result<Arc<dyn ChainReader>, ChainError> {
        match self.sync_readers.get(&network) {
            Some(reader) => Ok(reader.clone()),
            None => self.get(network),
        }
    }

    pub fn networks(&self) -> impl Iterator<Item = NetworkId> + '_ {
        self.readers.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;

    #[test]
    fn unknown_network_is_unsupported() {
        let registry = ChainRegistry::new();
        let err = registry.get(NetworkId::Fantom).err().unwrap();
        assert!(matches!(err, ChainError::UnsupportedNetwork(NetworkId::Fantom)));
    }

    #[test]
    fn sync_reader_falls_back_to_default() {
        let mut with_sync = NetworkConfig::new(NetworkId::Mainnet, "http://main.example");
        with_sync.sync_rpc_url = Some("http://sync.example".into());
        let plain = NetworkConfig::new(NetworkId::Fantom, "http://ftm.example");
        let registry =
            ChainRegistry::from_networks(&NetworkSet::new(vec![with_sync, plain]), RpcTimeouts::default())
                .unwrap();

        assert_eq!(registry.get_for_sync(NetworkId::Mainnet).unwrap().network(), NetworkId::Mainnet);
        assert_eq!(registry.get_for_sync(NetworkId::Fantom).unwrap().network(), NetworkId::Fantom);
        assert!(registry.get_for_sync(NetworkId::Rinkeby).is_err());
        assert_eq!(registry.networks().count(), 2);
    }
}
