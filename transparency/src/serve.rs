//! Stale-while-revalidate serving of a snapshot.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use inverse_store::{CacheGateway, Freshness};

use crate::TransparencyError;

/// How a snapshot request was answered.
#[derive(Clone, Debug, PartialEq)]
pub enum Served<T> {
    /// A cache entry younger than the maximum age.
    Fresh(T),
    /// Freshly fetched and written back.
    Refreshed(T),
    /// The refresh failed; the last cached entry regardless of age.
    Stale(T),
    /// The refresh failed and nothing was cached.
    Unavailable,
}

impl<T> Served<T> {
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Fresh(data) | Self::Refreshed(data) | Self::Stale(data) => Some(data),
            Self::Unavailable => None,
        }
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Fresh(_) => "fresh",
            Self::Refreshed(_) => "refreshed",
            Self::Stale(_) => "stale",
            Self::Unavailable => "unavailable",
        }
    }
}

/// Serve `key` from cache while fresh, otherwise run `refresh`.
///
/// A failed refresh falls back to the cached entry ignoring its age.
/// Concurrent callers may all refresh; the last write wins.
pub async fn serve_cached<T, F, Fut>(
    cache: &CacheGateway,
    key: &str,
    max_age: Duration,
    refresh: F,
) -> Served<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, TransparencyError>>,
{
    if let Some(data) = cache.get_cached(key, Freshness::MaxAge(max_age)).await {
        debug!(key, "serving fresh snapshot");
        return Served::Fresh(data);
    }

    match refresh().await {
        Ok(data) => {
            cache.set_cached(key, &data).await;
            Served::Refreshed(data)
        }
        Err(e) => {
            warn!(key, kind = e.kind(), error = %e, "snapshot refresh failed");
            match cache.get_cached(key, Freshness::Any).await {
                Some(data) => {
                    warn!(key, "serving last cached snapshot");
                    Served::Stale(data)
                }
                None => Served::Unavailable,
            }
        }
    }
}
