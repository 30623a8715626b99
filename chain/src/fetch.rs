//! Concurrent fan-out over chain sources.
//!
//! Reads in a batch run concurrently. Results are associated with their
//! source by position in the request list, never by completion order.
//! [`fetch_batch`] waits for every read and then applies each source's
//! [`Requirement`](crate::Requirement): a failed optional read becomes the
//! neutral value, a failed required read fails the batch. [`require_all`]
//! is the fail-fast variant for batches with only required reads.

use futures_util::future::{join_all, try_join_all};
use std::future::Future;
use tracing::warn;

use crate::{ChainError, ChainSource};

/// Outcome of one read in a settled batch.
#[derive(Debug)]
pub struct Settled<T> {
    pub source: ChainSource,
    pub outcome: Result<T, ChainError>,
}

/// Run every read to completion and report each outcome in request order.
pub async fn settle_all<T, Fut>(reads: Vec<(ChainSource, Fut)>) -> Vec<Settled<T>>
where
    Fut: Future<Output = Result<T, ChainError>>,
{
    let (sources, futures): (Vec<_>, Vec<_>) = reads.into_iter().unzip();
    let outcomes = join_all(futures).await;
    sources
        .into_iter()
        .zip(outcomes)
        .map(|(source, outcome)| Settled { source, outcome })
        .collect()
}

/// Settle a mixed batch, replacing failed optional reads with `neutral`.
///
/// Returns the first required failure, tagged with its source.
pub async fn fetch_batch<T, Fut>(
    reads: Vec<(ChainSource, Fut)>,
    neutral: T,
) -> Result<Vec<T>, ChainError>
where
    T: Clone,
    Fut: Future<Output = Result<T, ChainError>>,
{
    let settled = settle_all(reads).await;
    let mut values = Vec::with_capacity(settled.len());
    for Settled { source, outcome } in settled {
        match outcome {
            Ok(value) => values.push(value),
            Err(e) if source.is_optional() => {
                warn!(
                    source = %source,
                    kind = e.kind(),
                    error = %e,
                    "optional source failed; using neutral value"
                );
                values.push(neutral.clone());
            }
            Err(e) => return Err(e.at(source.to_string())),
        }
    }
    Ok(values)
}

/// Run required reads concurrently; the first failure aborts the batch.
pub async fn require_all<T, Fut>(reads: Vec<(ChainSource, Fut)>) -> Result<Vec<T>, ChainError>
where
    Fut: Future<Output = Result<T, ChainError>>,
{
    try_join_all(reads.into_iter().map(|(source, read)| async move {
        read.await.map_err(|e| e.at(source.to_string()))
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Interface;
    use futures_util::future::BoxFuture;
    use futures_util::FutureExt;
    use inverse_types::{Address, NetworkId};
    use std::time::Duration;

    fn src(byte: u8, optional: bool) -> ChainSource {
        let address = Address::repeat_byte(byte);
        if optional {
            ChainSource::optional(NetworkId::Fantom, address, Interface::Erc20)
        } else {
            ChainSource::required(NetworkId::Mainnet, address, Interface::Erc20)
        }
    }

    fn delayed(ms: u64, result: Result<u64, ChainError>) -> BoxFuture<'static, Result<u64, ChainError>> {
        async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            result
        }
        .boxed()
    }

    #[tokio::test]
    async fn results_follow_request_order_not_completion_order() {
        let values = fetch_batch(
            vec![
                (src(1, false), delayed(30, Ok(1))),
                (src(2, false), delayed(0, Ok(2))),
                (src(3, false), delayed(10, Ok(3))),
            ],
            0,
        )
        .await
        .unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn optional_failure_becomes_neutral() {
        let values = fetch_batch(
            vec![
                (src(1, false), delayed(0, Ok(10))),
                (src(2, true), delayed(0, Err(ChainError::Transport("down".into())))),
                (src(3, false), delayed(0, Ok(30))),
            ],
            0,
        )
        .await
        .unwrap();
        assert_eq!(values, vec![10, 0, 30]);
    }

    #[tokio::test]
    async fn required_failure_is_tagged_with_source() {
        let err = fetch_batch(
            vec![
                (src(1, true), delayed(0, Ok(1))),
                (src(2, false), delayed(0, Err(ChainError::Http(502)))),
            ],
            0,
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "chain_http");
        assert!(err.to_string().contains("mainnet:erc20@"));
    }

    #[tokio::test]
    async fn require_all_aborts_on_first_failure() {
        let err = require_all(vec![
            (src(1, false), delayed(0, Ok(1))),
            (src(2, false), delayed(0, Err(ChainError::Decode("bad".into())))),
        ])
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "chain_decode");

        let ok = require_all(vec![(src(1, false), delayed(5, Ok(7)))]).await.unwrap();
        assert_eq!(ok, vec![7]);
    }

    #[tokio::test]
    async fn settle_all_keeps_every_outcome() {
        let settled = settle_all(vec![
            (src(1, true), delayed(0, Err(ChainError::Http(500)))),
            (src(2, true), delayed(0, Ok(5))),
        ])
        .await;
        assert!(settled[0].outcome.is_err());
        assert_eq!(settled[1].outcome.as_ref().unwrap(), &5);
        assert_eq!(settled[1].source.address, Address::repeat_byte(2));
    }
}
