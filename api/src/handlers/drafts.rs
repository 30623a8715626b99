//! Draft proposal CRUD.
//!
//! Reads are public. Writes carry a `sig` field whose recovered signer must
//! be on the allow-list; authorization is checked before anything is read
//! or written.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use inverse_governance::{DraftError, DraftInput};

use crate::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct SignedRequest {
    #[serde(default)]
    pub sig: String,
}

fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::MalformedBody(format!("invalid draft id {raw:?}")))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError::MalformedBody(e.body_text()))
}

/// `GET /api/drafts`
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let drafts = state.drafts.list().await?;
    Ok(Json(json!({ "status": "success", "drafts": drafts })))
}

/// `POST /api/drafts`
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<DraftInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let input = body(payload)?;
    let draft = state.drafts.create(&input).await?;
    Ok(Json(json!({ "status": "success", "draft": draft })))
}

/// `GET /api/drafts/:id`. An id that is not a number matches no draft.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let Ok(numeric) = id.parse() else {
        return Err(DraftError::NotFound(id).into());
    };
    let draft = state.drafts.get(numeric).await?;
    Ok(Json(json!({ "status": "success", "draft": draft })))
}

/// `PUT /api/drafts/:id`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<DraftInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let input = body(payload)?;
    let draft = state.drafts.update(id, &input).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Draft updated",
        "draft": draft,
    })))
}

/// `DELETE /api/drafts/:id`
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SignedRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let request = body(payload)?;
    state.drafts.delete(id, &request.sig).await?;
    Ok(Json(json!({ "status": "success", "message": "Draft removed" })))
}
