//! Request handlers, grouped by endpoint family.

pub mod drafts;
pub mod proposals;
pub mod snapshots;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::warn;

use inverse_types::NetworkId;

use crate::AppState;

pub async fn health() -> &'static str {
    "OK"
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            warn!(kind = "metrics_encode", error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `?chainId=<id>`, defaulting to mainnet.
#[derive(Debug, Default, Deserialize)]
pub struct ChainQuery {
    #[serde(rename = "chainId")]
    pub chain_id: Option<String>,
}

impl ChainQuery {
    pub fn raw(&self) -> &str {
        self.chain_id.as_deref().unwrap_or(NetworkId::Mainnet.as_str())
    }

    pub fn network(&self) -> Option<NetworkId> {
        self.raw().parse().ok()
    }
}
