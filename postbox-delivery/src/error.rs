//! Typed error handling for fan-out delivery.
//!
//! The taxonomy keeps caller mistakes (validation, authorization), missing
//! resources, and infrastructure failures apart so the HTTP layer can map
//! them to distinct status codes, and so a blacklist outage can never be
//! mistaken for a clean verdict.

use postbox_blacklist::BlacklistError;
use postbox_store::StoreError;
use thiserror::Error;

/// Top-level delivery error type.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Malformed or missing request fields.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The authenticated identity may not perform this operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A recipient has no provisioned mailbox.
    #[error("Recipient does not exist: {0}")]
    UnknownRecipient(String),

    /// Post-delivery labeling referenced names absent from the caller's
    /// namespace.
    #[error("Invalid labels for user: {}", .0.join(", "))]
    UnknownLabels(Vec<String>),

    /// A spam label could not be provisioned for one of the recipients; the
    /// whole send is aborted rather than delivering unlabeled mail.
    #[error("Failed to provision spam label for {recipient}: {source}")]
    SpamLabelingFailed {
        recipient: String,
        source: StoreError,
    },

    /// The blacklist screen could not produce a verdict.
    #[error("Blacklist screening failed: {0}")]
    Screen(#[from] BlacklistError),

    /// Store-level failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for delivery operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;

impl DeliveryError {
    /// Returns `true` if the error is the caller's fault (4xx class).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Forbidden(_)
                | Self::UnknownRecipient(_)
                | Self::UnknownLabels(_)
        ) || matches!(
            self,
            Self::Store(
                StoreError::MailNotFound(_)
                    | StoreError::LabelNotFound(_)
                    | StoreError::DuplicateName(_)
                    | StoreError::InvalidName(_)
                    | StoreError::UnknownMailbox(_)
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_labels_lists_the_offenders() {
        let err = DeliveryError::UnknownLabels(vec!["work".to_string(), "urgent".to_string()]);
        assert_eq!(err.to_string(), "Invalid labels for user: work, urgent");
    }

    #[test]
    fn infrastructure_errors_are_not_client_errors() {
        assert!(!DeliveryError::Screen(BlacklistError::Timeout).is_client_error());
        assert!(DeliveryError::Validation("missing".to_string()).is_client_error());
    }
}
