//! Error types for blacklist operations.
//!
//! A socket-level failure and a nonconforming response are deliberately kept
//! apart, and neither is ever collapsed into a "not blacklisted" answer: a
//! network outage must not look like a clean verdict.

use thiserror::Error;

/// Errors that can occur while talking to the blacklist service.
#[derive(Debug, Error)]
pub enum BlacklistError {
    /// Socket-level failure reaching the service.
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The round trip exceeded its bound.
    #[error("Blacklist request timed out")]
    Timeout,

    /// The service answered with something outside the response grammar.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type for blacklist operations.
pub type Result<T> = std::result::Result<T, BlacklistError>;
