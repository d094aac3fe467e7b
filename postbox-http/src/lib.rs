//! HTTP/JSON surface for the Postbox mail backend.
//!
//! Every route requires a caller identity resolved from a bearer token at
//! the [`auth::Authenticator`] boundary; token issuance and verification
//! proper live outside this repository.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use auth::{Authenticator, Identity, TokenTable};
pub use error::ApiError;
pub use routes::router;
pub use server::{HttpServer, ServerError};
pub use state::AppState;
