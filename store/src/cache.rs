//! Timestamped snapshot cache on top of a [`KvStore`].
//!
//! Entries are stored as `{"timestamp": <ms>, "data": <payload>}`. Staleness is
//! judged at read time against a caller-supplied maximum age, so a stale entry
//! stays readable as a fallback when a refresh fails.
//!
//! Both directions degrade instead of failing: a read that hits a store outage
//! or an undecodable entry returns `None`, and a failed write is logged and
//! dropped. Callers decide what absence means.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use inverse_types::{Clock, Timestamp};

use crate::KvStore;

/// The stored envelope around a cached payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub timestamp: Timestamp,
    pub data: T,
}

/// Read policy for [`CacheGateway::get_cached`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// Return the entry regardless of age.
    Any,
    /// Return the entry only if it is younger than the given age.
    MaxAge(Duration),
}

impl Freshness {
    pub fn within_secs(secs: u64) -> Self {
        Self::MaxAge(Duration::from_secs(secs))
    }
}

/// Cache policy layer shared by every read endpoint.
#[derive(Clone)]
pub struct CacheGateway {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl CacheGateway {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The underlying store, for callers that need strict (non-degrading) access.
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Read the whole envelope, ignoring freshness.
    pub async fn get_entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, kind = e.kind(), error = %e, "cache read failed; treating as miss");
                return None;
            }
        };
        match serde_json::from_str::<CacheEntry<T>>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key, kind = "cache_decode", error = %e, "undecodable cache entry; treating as miss");
                None
            }
        }
    }

    /// Return the cached payload if present and, under [`Freshness::MaxAge`],
    /// younger than the maximum age.
    pub async fn get_cached<T: DeserializeOwned>(
        &self,
        key: &str,
        freshness: Freshness,
    ) -> Option<T> {
        let entry = self.get_entry::<T>(key).await?;
        match freshness {
            Freshness::Any => Some(entry.data),
            Freshness::MaxAge(max_age) => {
                let now = self.clock.now();
                if entry.timestamp.is_fresh(max_age, now) {
                    Some(entry.data)
                } else {
                    debug!(
                        key,
                        age_ms = entry.timestamp.elapsed_since(now).as_millis() as u64,
                        "cache entry stale"
                    );
                    None
                }
            }
        }
    }

    /// Store `data` stamped with the current time. Best effort: failures are logged.
    pub async fn set_cached<T: Serialize + ?Sized>(&self, key: &str, data: &T) {
        let entry = CacheEntry {
            timestamp: self.clock.now(),
            data,
        };
        let encoded = match serde_json::to_string(&entry) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key, kind = "cache_encode", error = %e, "failed to encode cache entry");
                return;
            }
        };
        if let Err(e) = self.store.set(key, &encoded).await {
            warn!(key, kind = e.kind(), error = %e, "cache write failed; continuing");
        }
    }
}
