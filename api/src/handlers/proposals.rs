//! Proposal feed and the scheduled sync job.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method};
use axum::Json;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{info, warn};

use inverse_governance::Proposal;

use super::ChainQuery;
use crate::{auth, ApiError, AppState};

/// `GET /api/proposals?chainId=<id>`: the last synced snapshot, or an empty
/// list when the network has never been synced.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ChainQuery>,
) -> Result<Json<Value>, ApiError> {
    let network = query
        .network()
        .ok_or_else(|| ApiError::InvalidChainId(query.raw().to_string()))?;
    let proposals: Vec<Proposal> = state
        .proposals
        .latest(network)
        .await
        .map(|snapshot| snapshot.proposals)
        .unwrap_or_default();
    Ok(Json(json!({ "proposals": proposals })))
}

/// `POST /api/cron-proposals?chainId=<id>` with `Authorization: Bearer <secret>`.
pub async fn cron(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<ChainQuery>,
) -> Result<Json<Value>, ApiError> {
    if method != Method::POST {
        return Err(ApiError::JobMethodNotAllowed);
    }
    auth::check_bearer(&headers, state.sync_secret.as_deref())?;
    let network = query
        .network()
        .ok_or_else(|| ApiError::UnsupportedChain(query.raw().to_string()))?;

    let started = Instant::now();
    let report = match state.proposals.run(network).await {
        Ok(report) => report,
        Err(e) => {
            state.metrics.sync_failures.inc();
            return Err(e.into());
        }
    };
    state.metrics.sync_runs.inc();
    state
        .metrics
        .pipeline_duration
        .with_label_values(&["proposals"])
        .observe(started.elapsed().as_secs_f64());

    if report.is_partial() {
        warn!(
            network = %network,
            failed_eras = ?report.failed_eras,
            "proposal sync persisted a partial result"
        );
        return Ok(Json(json!({
            "success": true,
            "partial": true,
            "failedEras": report.failed_eras,
        })));
    }
    info!(
        network = %network,
        block = report.block_number,
        fetched = report.fetched,
        total = report.total,
        "proposal sync complete"
    );
    Ok(Json(json!({ "success": true })))
}
