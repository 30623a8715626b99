//! Bearer-token check for the scheduled sync job.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use tracing::warn;

use crate::ApiError;

/// The token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Accept the request only if its bearer token equals the configured
/// secret. Without a configured secret every request is rejected.
pub fn check_bearer(headers: &HeaderMap, secret: Option<&str>) -> Result<(), ApiError> {
    match (secret, bearer_token(headers)) {
        (Some(secret), Some(token)) if !secret.is_empty() && token == secret => Ok(()),
        (None, _) => {
            warn!(kind = "api_unauthorized", "sync secret not configured; rejecting");
            Err(ApiError::Unauthorized)
        }
        _ => Err(ApiError::Unauthorized),
    }
}
