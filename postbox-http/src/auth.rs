//! The bearer-token identity boundary.
//!
//! Token issuance and verification are an external collaborator; the API
//! only needs a way to turn a presented token into a user identity. The
//! [`Authenticator`] trait is that seam, and [`TokenTable`] is the
//! configuration-seeded implementation used by the reference deployment.

use std::{collections::HashMap, sync::Arc};

use axum::{extract::FromRequestParts, http::header, http::request::Parts};

use crate::{error::ApiError, state::AppState};

/// Resolves a bearer token to a user identity.
pub trait Authenticator: Send + Sync {
    /// The user the token belongs to, or `None` for an unknown token.
    fn resolve(&self, token: &str) -> Option<String>;
}

/// Static token-to-user mapping seeded from configuration.
#[derive(Debug, Default)]
pub struct TokenTable {
    tokens: HashMap<String, String>,
}

impl TokenTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for a user.
    pub fn insert(&mut self, token: impl Into<String>, user: impl Into<String>) {
        self.tokens.insert(token.into(), user.into());
    }
}

impl FromIterator<(String, String)> for TokenTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

impl Authenticator for TokenTable {
    fn resolve(&self, token: &str) -> Option<String> {
        self.tokens.get(token).cloned()
    }
}

/// The authenticated caller, extracted from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct Identity(pub String);

impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        state
            .authenticator
            .resolve(token.trim())
            .map(Identity)
            .ok_or(ApiError::Unauthorized)
    }
}
