//! Label CRUD, scoped to the caller's namespace.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use postbox_store::LabelId;
use serde::Deserialize;
use serde_json::json;

use crate::{auth::Identity, error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct LabelBody {
    name: Option<String>,
}

/// `GET /labels` — every label in the caller's namespace.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Identity(user): Identity,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.labels.list(&user)?))
}

/// `POST /labels` — create a label.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Identity(user): Identity,
    Json(body): Json<LabelBody>,
) -> Result<impl IntoResponse, ApiError> {
    let name = require_name(body)?;
    let label = state.labels.create(&user, &name)?;
    Ok((StatusCode::CREATED, Json(label)))
}

/// `GET /labels/{id}` — one label by id.
pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Identity(user): Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let label = state
        .labels
        .get(&user, id)?
        .ok_or_else(|| ApiError::NotFound("Label not found".to_string()))?;
    Ok(Json(label))
}

/// `PATCH /labels/{id}` — rename a label.
pub async fn rename(
    State(state): State<Arc<AppState>>,
    Identity(user): Identity,
    Path(id): Path<String>,
    Json(body): Json<LabelBody>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let name = require_name(body)?;
    let label = state.labels.rename(&user, id, &name)?;
    Ok(Json(label))
}

/// `DELETE /labels/{id}` — remove a label from the namespace.
///
/// Mail copies keep the dangling identifier; it simply stops resolving.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Identity(user): Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    if state.labels.delete(&user, id)? {
        Ok(Json(json!({ "message": "Label deleted" })))
    } else {
        Err(ApiError::NotFound("Label not found".to_string()))
    }
}

fn parse_id(id: &str) -> Result<LabelId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::NotFound("Label not found".to_string()))
}

fn require_name(body: LabelBody) -> Result<String, ApiError> {
    body.name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Label name required".to_string()))
}
