//! Error types for the postbox-store crate.

use thiserror::Error;

use crate::types::{LabelId, MailId};

/// Top-level store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced user has no provisioned mailbox.
    #[error("Unknown mailbox: {0}")]
    UnknownMailbox(String),

    /// Mail record not found in any reachable collection.
    #[error("Mail not found: {0}")]
    MailNotFound(MailId),

    /// Label not found in the user's namespace.
    #[error("Label not found: {0}")]
    LabelNotFound(LabelId),

    /// A case-insensitive match for the name already exists in the namespace.
    #[error("A label named '{0}' already exists")]
    DuplicateName(String),

    /// The label name is empty or whitespace-only.
    #[error("Invalid label name: '{0}'")]
    InvalidName(String),

    /// Internal error (lock poisoning, etc.).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Specialized `Result` type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

// Convenience conversion for lock poisoning
impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("Lock poisoned: {e}"))
    }
}
