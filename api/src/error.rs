//! API error types and their HTTP mapping.
//!
//! Job endpoints answer with `{success: false}` bodies, draft endpoints with
//! `{status, message}`. Read endpoints only fail when nothing at all can be
//! served.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use inverse_governance::{DraftError, GovernanceError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("method not allowed")]
    JobMethodNotAllowed,

    #[error("missing or invalid bearer token")]
    Unauthorized,

    #[error("no sync support on {0} network")]
    UnsupportedChain(String),

    #[error("invalid chain id: {0}")]
    InvalidChainId(String),

    #[error("proposal sync failed: {0}")]
    Sync(#[from] GovernanceError),

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("snapshot unavailable")]
    SnapshotUnavailable,
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::JobMethodNotAllowed => "api_method_not_allowed",
            Self::Unauthorized => "api_unauthorized",
            Self::UnsupportedChain(_) => "api_unsupported_chain",
            Self::InvalidChainId(_) => "api_invalid_chain_id",
            Self::Sync(e) => e.kind(),
            Self::Draft(e) => e.kind(),
            Self::MalformedBody(_) => "api_malformed_body",
            Self::SnapshotUnavailable => "api_snapshot_unavailable",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::JobMethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::UnsupportedChain(_) => StatusCode::FORBIDDEN,
            Self::InvalidChainId(_) | Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::Sync(GovernanceError::NotConfigured(_)) => StatusCode::FORBIDDEN,
            Self::Sync(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Draft(e) => match e {
                DraftError::Unauthorized | DraftError::InvalidSignature(_) => {
                    StatusCode::UNAUTHORIZED
                }
                DraftError::NotFound(_) => StatusCode::NOT_FOUND,
                DraftError::Invalid(_) => StatusCode::BAD_REQUEST,
                DraftError::Store(_) | DraftError::Corrupt(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::SnapshotUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::JobMethodNotAllowed | Self::Unauthorized => json!({ "success": false }),
            Self::UnsupportedChain(_) | Self::InvalidChainId(_) => {
                json!({ "success": false, "message": self.to_string() })
            }
            Self::Sync(GovernanceError::NotConfigured(network)) => json!({
                "success": false,
                "message": format!("No sync support on {} network", network.as_str()),
            }),
            Self::Sync(_) => json!({ "success": false }),
            Self::Draft(e) => match e {
                DraftError::Unauthorized | DraftError::InvalidSignature(_) => {
                    json!({ "status": "warning", "message": "Unauthorized" })
                }
                DraftError::NotFound(_) => {
                    json!({ "status": "warning", "message": "Draft not found" })
                }
                DraftError::Invalid(reason) => json!({
                    "status": "error",
                    "message": format!("Invalid Draft Proposal: {reason}"),
                }),
                DraftError::Store(_) | DraftError::Corrupt(_) => json!({
                    "status": "error",
                    "message": "Drafts are temporarily unavailable",
                }),
            },
            Self::MalformedBody(_) => json!({ "status": "error", "message": self.to_string() }),
            Self::SnapshotUnavailable => json!({}),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(kind = self.kind(), error = %self, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inverse_types::NetworkId;

    #[test]
    fn draft_errors_map_to_documented_statuses() {
        assert_eq!(
            ApiError::from(DraftError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(DraftError::InvalidSignature("short".into())).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(DraftError::NotFound("9".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DraftError::Invalid("title is required")).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn unauthorized_draft_body_is_a_warning() {
        let body = ApiError::from(DraftError::Unauthorized).body();
        assert_eq!(body, json!({ "status": "warning", "message": "Unauthorized" }));
    }

    #[test]
    fn unconfigured_sync_is_forbidden_with_message() {
        let err = ApiError::from(GovernanceError::NotConfigured(NetworkId::Fantom));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.body()["message"], "No sync support on 250 network");
        assert_eq!(err.body()["success"], false);
    }

    #[test]
    fn other_sync_failures_are_opaque() {
        let err = ApiError::from(GovernanceError::AllErasFailed);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body(), json!({ "success": false }));
    }

    #[test]
    fn unavailable_snapshot_is_an_empty_object() {
        let err = ApiError::SnapshotUnavailable;
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.body(), json!({}));
    }
}
