//! Administrative passthrough to the blacklist service.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use postbox_blacklist::RemoveOutcome;
use serde::Deserialize;

use crate::{auth::Identity, error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct AddUrlBody {
    url: Option<String>,
}

/// `POST /blacklist` — put a URL on the shared blacklist.
pub async fn add(
    State(state): State<Arc<AppState>>,
    Identity(_user): Identity,
    Json(body): Json<AddUrlBody>,
) -> Result<impl IntoResponse, ApiError> {
    let url = body
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("URL is required".to_string()))?;

    state.screen.register(&url).await?;
    Ok(StatusCode::CREATED)
}

/// `DELETE /blacklist/{url}` — take a URL off the shared blacklist.
///
/// The wildcard segment accepts URLs whether or not the caller
/// percent-encoded their slashes.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Identity(_user): Identity,
    Path(url): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.screen.unregister(&url).await? {
        RemoveOutcome::Removed => Ok(StatusCode::NO_CONTENT),
        RemoveOutcome::NotFound => Ok(StatusCode::NOT_FOUND),
    }
}
