//! Error types for the SBAT watcher
//!
//! This module defines all error types used throughout the crate.
//! Per-partition fetch outcomes use [`crate::traits::FetchError`] instead,
//! because a 401 there is a recoverable state transition rather than a failure.

use thiserror::Error;

/// Result type alias for watcher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the SBAT watcher
#[derive(Error, Debug)]
pub enum Error {
    /// Identity endpoint rejected the credentials or was unreachable.
    /// Fatal to the poll session; the operator must re-enter credentials.
    #[error("authentication failed: {detail}")]
    Authentication {
        /// HTTP status, if the endpoint answered at all
        status: Option<u16>,
        /// Status line, response body excerpt, or transport error
        detail: String,
    },

    /// Credential store errors
    #[error("credential store error: {0}")]
    CredentialStore(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an authentication error
    pub fn authentication(status: Option<u16>, detail: impl Into<String>) -> Self {
        Self::Authentication {
            status,
            detail: detail.into(),
        }
    }

    /// Create a credential store error
    pub fn credential_store(msg: impl Into<String>) -> Self {
        Self::CredentialStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
