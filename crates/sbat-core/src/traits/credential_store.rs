// # Credential Store Trait
//
// Supplies and persists the operator's username/password. The core makes no
// assumption about the storage medium; both operations are fallible I/O.

use async_trait::async_trait;

use crate::types::Credentials;

/// Trait for credential storage implementations
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load stored credentials
    ///
    /// # Returns
    ///
    /// - `Ok(Credentials)`: Previously saved credentials
    /// - `Err(Error::CredentialStore)`: Nothing stored, or the medium failed
    async fn load(&self) -> Result<Credentials, crate::Error>;

    /// Persist credentials for the next session
    async fn save(&self, credentials: &Credentials) -> Result<(), crate::Error>;
}
