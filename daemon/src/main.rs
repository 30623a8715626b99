//! Inverse dashboard daemon: serves the aggregation API or runs the proposal
//! sync once.

mod config;
mod shutdown;

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use inverse_api::{ApiContext, ApiServer, AppState};
use inverse_chain::ChainRegistry;
use inverse_governance::{AllowList, ProposalSync};
use inverse_store::{KvStore, MemoryStore};
use inverse_store_redis::{ReconnectPolicy, RedisStore};
use inverse_types::{Clock, NetworkId, SystemClock};
use inverse_utils::{format_duration, init_tracing, LogFormat};

use crate::config::{DaemonConfig, Secrets};
use crate::shutdown::Shutdown;

#[derive(Parser)]
#[command(name = "inverse-daemon", about = "Inverse dashboard API daemon")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config/inverse.toml", env = "INVERSE_CONFIG")]
    config: PathBuf,

    /// Listen address; overrides the file.
    #[arg(long, env = "INVERSE_LISTEN")]
    listen: Option<SocketAddr>,

    /// Log format: "human" or "json"; overrides the file.
    #[arg(long, env = "INVERSE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error"; overrides the file.
    #[arg(long, env = "INVERSE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(flatten)]
    secrets: Secrets,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Serve,
    /// Run the governance proposal sync once and exit.
    SyncProposals {
        /// Chain id to sync.
        #[arg(long, default_value = "1")]
        chain_id: NetworkId,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = DaemonConfig::from_toml_file(&cli.config)?;
    let log_format = match cli.log_format {
        Some(format) => format,
        None => config
            .log_format
            .parse()
            .map_err(anyhow::Error::msg)
            .context("invalid log_format")?,
    };
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_tracing(log_format, &log_level);

    if let Some(listen) = cli.listen {
        config.listen = listen;
    }
    config.apply_rpc_overrides(|key| std::env::var(key).ok());
    config.validate().context("invalid configuration")?;
    info!(config = %cli.config.display(), "loaded configuration");

    let chains = ChainRegistry::from_networks(&config.networks, config.rpc_timeouts())?;
    let redis = match cli.secrets.redis_url.as_deref() {
        Some(url) => Some(open_redis(url, config.reconnect_policy()).await?),
        None => {
            warn!("INVERSE_REDIS_URL not set; using an in-memory store");
            None
        }
    };
    let store: Arc<dyn KvStore> = match &redis {
        Some(redis) => Arc::new(redis.clone()),
        None => Arc::new(MemoryStore::new()),
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let networks = Arc::new(config.networks.clone());

    let result = match cli.command {
        Command::Serve => {
            let allow_list = AllowList::parse(&cli.secrets.draft_address_whitelist);
            if allow_list.is_empty() {
                warn!("draft allow-list is empty; every draft write will be rejected");
            }
            if cli.secrets.api_secret_key.is_none() {
                warn!("INVERSE_API_SECRET_KEY not set; proposal sync endpoint is disabled");
            }
            let state = AppState::new(ApiContext {
                chains,
                networks,
                home: config.home_network,
                store,
                clock,
                allow_list,
                sync_secret: cli.secrets.api_secret_key.clone(),
            });

            let shutdown = Shutdown::new();
            let signals = shutdown.clone();
            tokio::spawn(async move { signals.on_os_signal().await });
            ApiServer::new(config.listen)
                .serve(state, shutdown.wait())
                .await
                .context("api server failed")
        }
        Command::SyncProposals { chain_id } => {
            let job = ProposalSync::new(chains, networks, store, clock);
            let started = std::time::Instant::now();
            match job.run(chain_id).await {
                Ok(report) => {
                    info!(
                        network = %chain_id,
                        block = report.block_number,
                        fetched = report.fetched,
                        total = report.total,
                        archived = report.archived,
                        failed_eras = ?report.failed_eras,
                        elapsed = %format_duration(started.elapsed()),
                        "proposal sync finished"
                    );
                    Ok(())
                }
                Err(e) => {
                    error!(network = %chain_id, kind = e.kind(), error = %e, "proposal sync failed");
                    Err(e.into())
                }
            }
        }
    };

    if let Some(redis) = redis {
        redis.close().await;
    }
    info!("inverse daemon exited");
    result
}

/// Open the Redis store. A failed first connect is not fatal: the
/// supervisor keeps retrying and reads degrade to cache misses meanwhile.
async fn open_redis(url: &str, policy: ReconnectPolicy) -> anyhow::Result<RedisStore> {
    let redis = RedisStore::open(url, policy).context("invalid INVERSE_REDIS_URL")?;
    if let Err(e) = redis.connect().await {
        warn!(kind = "redis_connection", error = %e, "initial redis connect failed");
        redis.reconnect_on_error(&e);
    }
    Ok(redis)
}
