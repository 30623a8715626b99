//! Daemon configuration with TOML file support.
//!
//! The file declares the listen address, logging, client timeouts and the
//! `[[networks]]` tables. Secrets and provider credentials only ever come
//! from the environment; see [`Secrets`].

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use inverse_chain::{NetworkSet, RpcTimeouts};
use inverse_store_redis::ReconnectPolicy;
use inverse_types::NetworkId;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Network whose transparency and stabilizer contracts are served.
    #[serde(default = "default_home_network")]
    pub home_network: NetworkId,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub rpc: RpcSection,

    #[serde(default)]
    pub redis: RedisSection,

    #[serde(default)]
    pub networks: NetworkSet,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcSection {
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisSection {
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
    #[serde(default = "default_op_timeout")]
    pub op_timeout_secs: u64,
}

/// Values read from the environment only.
#[derive(Clone, Debug, Default, clap::Args)]
pub struct Secrets {
    /// Bearer token of the scheduled proposal sync.
    #[arg(long, env = "INVERSE_API_SECRET_KEY", hide_env_values = true)]
    pub api_secret_key: Option<String>,

    /// Redis URL; without it the daemon keeps its cache in memory.
    #[arg(long, env = "INVERSE_REDIS_URL", hide_env_values = true)]
    pub redis_url: Option<String>,

    /// Comma separated addresses allowed to edit drafts.
    #[arg(long, env = "INVERSE_DRAFT_ADDRESS_WHITELIST", default_value = "")]
    pub draft_address_whitelist: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_home_network() -> NetworkId {
    NetworkId::Mainnet
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_reconnect_delay() -> u64 {
    10
}

fn default_op_timeout() -> u64 {
    2
}

impl Default for RpcSection {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for RedisSection {
    fn default() -> Self {
        Self {
            reconnect_delay_secs: default_reconnect_delay(),
            op_timeout_secs: default_op_timeout(),
        }
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Replace provider URLs with `INVERSE_RPC_URL_<chainId>` values, which
    /// carry credentials that do not belong in the file.
    pub fn apply_rpc_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for id in [NetworkId::Mainnet, NetworkId::Rinkeby, NetworkId::Fantom] {
            let Some(url) = lookup(&format!("INVERSE_RPC_URL_{}", id.as_str())) else {
                continue;
            };
            if let Some(network) = self.networks.get_mut(id) {
                network.rpc_url = url;
            }
        }
    }

    /// Check the configuration before anything is started.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.networks.is_empty() {
            bail!("no networks configured");
        }
        self.networks.validate()?;
        if self.networks.get(self.home_network).is_none() {
            bail!(
                "home network {} is not declared in [[networks]]",
                self.home_network.as_str()
            );
        }
        Ok(())
    }

    pub fn rpc_timeouts(&self) -> RpcTimeouts {
        RpcTimeouts {
            request: Duration::from_secs(self.rpc.request_timeout_secs),
            connect: Duration::from_secs(self.rpc.connect_timeout_secs),
        }
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            delay: Duration::from_secs(self.redis.reconnect_delay_secs),
            op_timeout: Duration::from_secs(self.redis.op_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = include_str!("../../config/inverse.toml");

    #[test]
    fn sample_config_is_valid() {
        let config = DaemonConfig::from_toml_str(SAMPLE).expect("sample should parse");
        config.validate().expect("sample should validate");
        assert_eq!(config.home_network, NetworkId::Mainnet);
        let mainnet = config.networks.get(NetworkId::Mainnet).unwrap();
        assert_eq!(mainnet.governance.as_ref().unwrap().from_block, 11_498_340);
        assert!(mainnet.transparency.is_some());
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = DaemonConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.listen, default_listen());
        assert_eq!(config.log_format, "human");
        assert_eq!(config.rpc_timeouts(), RpcTimeouts::default());
        assert_eq!(config.reconnect_policy(), ReconnectPolicy::default());
        assert!(config.validate().is_err());
    }

    #[test]
    fn undeclared_home_network_is_rejected() {
        let toml = r#"
            home_network = "250"

            [[networks]]
            id = "1"
            rpc_url = "http://localhost:8545"
        "#;
        let config = DaemonConfig::from_toml_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("250"));
    }

    #[test]
    fn env_overrides_replace_provider_urls() {
        let mut config = DaemonConfig::from_toml_str(SAMPLE).unwrap();
        config.apply_rpc_overrides(|key| {
            (key == "INVERSE_RPC_URL_250").then(|| "https://ftm.example/key".to_string())
        });
        let fantom = config.networks.get(NetworkId::Fantom).unwrap();
        assert_eq!(fantom.rpc_url, "https://ftm.example/key");
        let mainnet = config.networks.get(NetworkId::Mainnet).unwrap();
        assert_eq!(mainnet.rpc_url, "https://cloudflare-eth.com");
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = DaemonConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.networks.iter().count(), 2);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = DaemonConfig::from_toml_file(Path::new("/nonexistent/inverse.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/inverse.toml"));
    }
}
