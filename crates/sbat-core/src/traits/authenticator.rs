// # Authenticator Trait
//
// Defines the interface for acquiring a bearer token from the identity
// endpoint.
//
// ## Implementations
//
// - HTTP: `sbat-api-http` crate
// - Test doubles: `tests/common/mod.rs`

use async_trait::async_trait;

use crate::types::Credentials;

/// Trait for identity endpoint implementations
///
/// One call, one attempt: retry and re-authentication policy belong to the
/// watcher, not here. Implementations are stateless between calls; the
/// watcher owns the returned token and substitutes it into fetch requests.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchange credentials for a bearer token
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The bearer token (opaque, non-empty)
    /// - `Err(Error::Authentication)`: Bad credentials, empty body, or the
    ///   endpoint was unreachable; carries status/body detail for diagnostics
    async fn authenticate(&self, credentials: &Credentials) -> Result<String, crate::Error>;
}
