// # Slot Source Trait
//
// Defines the interface for querying one exam-center partition of the
// availability endpoint.
//
// ## Implementations
//
// - HTTP: `sbat-api-http` crate
// - Test doubles: `tests/common/mod.rs`

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Center, QueryTemplate, Slot};

/// Per-partition fetch failure
///
/// A 401 is its own variant because it drives a state transition
/// (re-authentication) rather than the failed-cycle path.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The bearer token was rejected; the watcher must re-authenticate
    #[error("authorization token expired or rejected")]
    AuthExpired,

    /// Timeout, transport error, non-2xx/401 status, or unparseable body.
    /// Recoverable: the cycle is marked failed and retried next tick.
    #[error("availability request failed: {0}")]
    Request(String),
}

/// Trait for availability endpoint implementations
///
/// One partition per call. Implementations build the wire payload by
/// overlaying the center id onto the shared template and MUST recompute
/// `startDate` fresh for every call; a cached date would drift as the
/// process runs across midnight.
///
/// No retry logic here: outcome handling is owned by the watcher.
#[async_trait]
pub trait SlotSource: Send + Sync {
    /// Query one center's available slots
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Slot>)`: Parsed slot list; empty means "no slots", which is
    ///   a valid result and not an error
    /// - `Err(FetchError::AuthExpired)`: The endpoint answered 401
    /// - `Err(FetchError::Request)`: Anything else that went wrong
    async fn fetch(
        &self,
        token: &str,
        center: &Center,
        template: &QueryTemplate,
    ) -> Result<Vec<Slot>, FetchError>;
}
