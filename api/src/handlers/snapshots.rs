//! Cached read snapshots: DAO transparency and stabilizer balances.

use axum::extract::State;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

use inverse_store::keys;
use inverse_transparency::{
    serve_cached, DaoSnapshot, StabilizerBalances, TransparencyError, DAO_MAX_AGE,
    STABILIZER_MAX_AGE,
};

use crate::{ApiError, AppState};

/// `GET /api/transparency/dao`
pub async fn dao(State(state): State<AppState>) -> Result<Json<DaoSnapshot>, ApiError> {
    let pipeline = state.dao.clone();
    serve(&state, "dao", keys::DAO_SNAPSHOT, DAO_MAX_AGE, move || async move {
        pipeline.fetch().await
    })
    .await
}

/// `GET /api/stabilizer/balances`
pub async fn stabilizer(
    State(state): State<AppState>,
) -> Result<Json<StabilizerBalances>, ApiError> {
    let pipeline = state.stabilizer.clone();
    serve(
        &state,
        "stabilizer",
        keys::STABILIZER_BALANCES,
        STABILIZER_MAX_AGE,
        move || async move { pipeline.fetch().await },
    )
    .await
}

async fn serve<T, F, Fut>(
    state: &AppState,
    pipeline: &'static str,
    key: &str,
    max_age: Duration,
    refresh: F,
) -> Result<Json<T>, ApiError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, TransparencyError>>,
{
    let histogram = state
        .metrics
        .pipeline_duration
        .with_label_values(&[pipeline]);
    let served = serve_cached(&state.cache, key, max_age, || async move {
        let _timer = histogram.start_timer();
        refresh().await
    })
    .await;
    state.metrics.record_served(served.outcome());
    served.into_data().map(Json).ok_or(ApiError::SnapshotUnavailable)
}
