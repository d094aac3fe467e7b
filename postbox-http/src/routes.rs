//! Router assembly.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use tower_http::timeout::TimeoutLayer;

use crate::{handlers, state::AppState};

/// Build the full API router over shared state.
pub fn router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .route(
            "/mails",
            post(handlers::mails::create).get(handlers::mails::list),
        )
        .route("/mails/search", get(handlers::mails::search))
        .route(
            "/mails/{id}",
            get(handlers::mails::get_by_id)
                .patch(handlers::mails::update)
                .delete(handlers::mails::delete),
        )
        .route("/mails/{id}/labels", patch(handlers::mails::set_labels))
        .route("/mails/{id}/label", patch(handlers::mails::set_labels))
        .route(
            "/labels",
            get(handlers::labels::list).post(handlers::labels::create),
        )
        .route(
            "/labels/{id}",
            get(handlers::labels::get_by_id)
                .patch(handlers::labels::rename)
                .delete(handlers::labels::delete),
        )
        .route("/blacklist", post(handlers::blacklist::add))
        .route("/blacklist/{*url}", delete(handlers::blacklist::remove))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
