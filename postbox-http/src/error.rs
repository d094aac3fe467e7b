//! API error type and its mapping onto HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use postbox_blacklist::BlacklistError;
use postbox_delivery::DeliveryError;
use postbox_store::StoreError;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to API callers as `{"error": ...}` JSON bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unresolvable bearer token.
    #[error("Unauthorized: missing user data")]
    Unauthorized,

    /// Malformed or missing request fields.
    #[error("{0}")]
    BadRequest(String),

    /// The caller may not perform this operation.
    #[error("{0}")]
    Forbidden(String),

    /// The referenced resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness constraint was violated.
    #[error("{0}")]
    Conflict(String),

    /// Infrastructure failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Internal(_)) {
            tracing::error!(error = %self, "Request failed");
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::MailNotFound(_) => Self::NotFound("Mail not found".to_string()),
            StoreError::LabelNotFound(_) => Self::NotFound("Label not found".to_string()),
            StoreError::DuplicateName(_) => Self::Conflict(e.to_string()),
            StoreError::InvalidName(_) | StoreError::UnknownMailbox(_) => {
                Self::BadRequest(e.to_string())
            }
            StoreError::Internal(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<DeliveryError> for ApiError {
    fn from(e: DeliveryError) -> Self {
        match e {
            DeliveryError::Validation(m) => Self::BadRequest(m),
            DeliveryError::Forbidden(m) => Self::Forbidden(m),
            DeliveryError::UnknownRecipient(_) | DeliveryError::UnknownLabels(_) => {
                Self::BadRequest(e.to_string())
            }
            // A blacklist-gate failure is an infrastructure problem, never a
            // verdict; it must not degrade into a 4xx the caller could blame
            // on their own input.
            DeliveryError::Screen(_) => {
                tracing::error!(error = %e, "Blacklist gate failure");
                Self::Internal("Failed to validate message links".to_string())
            }
            DeliveryError::SpamLabelingFailed { .. } => Self::Internal(e.to_string()),
            DeliveryError::Store(inner) => inner.into(),
        }
    }
}

impl From<BlacklistError> for ApiError {
    fn from(e: BlacklistError) -> Self {
        Self::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_taxonomy() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(DeliveryError::Validation("x".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DeliveryError::Forbidden("x".to_string())).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(StoreError::DuplicateName("Spam".to_string())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(BlacklistError::Timeout).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn screen_failures_are_server_errors_not_verdicts() {
        let err = ApiError::from(DeliveryError::Screen(BlacklistError::Timeout));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to validate message links");
    }
}
