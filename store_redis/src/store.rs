//! Redis-backed [`KvStore`] with explicit connection lifecycle.
//!
//! Lifecycle:
//! 1. [`RedisStore::open`] validates the URL; no I/O happens yet.
//! 2. [`RedisStore::connect`] establishes the multiplexed connection.
//! 3. When a command fails with a connection-level error the handle is dropped
//!    and [`RedisStore::reconnect_on_error`] starts a single supervisor task
//!    that retries `connect` with a fixed delay until it succeeds or the store
//!    is closed. Commands issued meanwhile fail fast with `Unavailable`, which
//!    the cache layer treats as a miss.
//! 4. [`RedisStore::close`] stops the supervisor and drops the connection.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use inverse_store::{KvStore, StoreError};

use crate::RedisStoreError;

/// Fixed-backoff reconnect policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before each reconnect attempt.
    pub delay: Duration,
    /// Upper bound on a single command or connect attempt.
    pub op_timeout: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(10),
            op_timeout: Duration::from_secs(2),
        }
    }
}

struct Inner {
    client: redis::Client,
    conn: RwLock<Option<MultiplexedConnection>>,
    policy: ReconnectPolicy,
    reconnecting: AtomicBool,
    closed: AtomicBool,
}

/// Cloneable handle to a Redis connection.
#[derive(Clone)]
pub struct RedisStore {
    inner: Arc<Inner>,
}

impl RedisStore {
    /// Validate the URL and build an unconnected store.
    pub fn open(url: &str, policy: ReconnectPolicy) -> Result<Self, RedisStoreError> {
        let client =
            redis::Client::open(url).map_err(|e| RedisStoreError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(Inner {
                client,
                conn: RwLock::new(None),
                policy,
                reconnecting: AtomicBool::new(false),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Establish the connection, replacing any previous one.
    pub async fn connect(&self) -> Result<(), RedisStoreError> {
        self.inner.connect().await
    }

    /// Whether a live connection handle is currently held.
    pub async fn is_connected(&self) -> bool {
        self.inner.conn.read().await.is_some()
    }

    /// Drop the current connection and start the reconnect supervisor, unless
    /// one is already running or the store has been closed.
    pub fn reconnect_on_error(&self, error: &RedisStoreError) {
        Inner::reconnect_on_error(&self.inner, error);
    }

    /// Stop reconnecting and release the connection.
    pub async fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.conn.write().await.take();
        info!("redis store closed");
    }

    async fn run<T, F, Fut>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(RedisStoreError::Closed.into());
        }
        let conn = self.inner.conn.read().await.clone();
        let Some(conn) = conn else {
            return Err(StoreError::Unavailable("redis not connected".into()));
        };

        let timeout = self.inner.policy.op_timeout;
        let err = match tokio::time::timeout(timeout, f(conn)).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) if is_connection_error(&e) => RedisStoreError::Connect(e.to_string()),
            Ok(Err(e)) => return Err(RedisStoreError::Command(e.to_string()).into()),
            Err(_) => RedisStoreError::Timeout(timeout),
        };

        debug!(op, kind = "redis_connection", error = %err, "redis command failed");
        self.reconnect_on_error(&err);
        Err(err.into())
    }
}

impl Inner {
    async fn connect(&self) -> Result<(), RedisStoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RedisStoreError::Closed);
        }
        let conn = tokio::time::timeout(
            self.policy.op_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| RedisStoreError::Timeout(self.policy.op_timeout))?
        .map_err(|e| RedisStoreError::Connect(e.to_string()))?;
        *self.conn.write().await = Some(conn);
        info!("redis connected");
        Ok(())
    }

    fn reconnect_on_error(this: &Arc<Self>, error: &RedisStoreError) {
        if this.closed.load(Ordering::SeqCst) {
            return;
        }
        if this.reconnecting.swap(true, Ordering::SeqCst) {
            return;
        }
        warn!(
            kind = "redis_connection",
            error = %error,
            retry_in_secs = this.policy.delay.as_secs(),
            "redis connection lost; scheduling reconnect"
        );
        let inner = Arc::clone(this);
        tokio::spawn(async move {
            inner.conn.write().await.take();
            loop {
                tokio::time::sleep(inner.policy.delay).await;
                if inner.closed.load(Ordering::SeqCst) {
                    break;
                }
                match inner.connect().await {
                    Ok(()) => break,
                    Err(e) => warn!(kind = "redis_connection", error = %e, "redis reconnect failed"),
                }
            }
            inner.reconnecting.store(false, Ordering::SeqCst);
        });
    }
}

fn is_connection_error(e: &redis::RedisError) -> bool {
    e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = key.to_string();
        self.run("get", |mut conn| async move { conn.get(key).await })
            .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        let value = value.to_string();
        self.run("set", |mut conn| async move { conn.set(key, value).await })
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        self.run("del", |mut conn| async move { conn.del(key).await })
            .await
    }
}
