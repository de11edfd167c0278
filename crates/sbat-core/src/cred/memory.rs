// # Memory Credential Store
//
// In-memory implementation of CredentialStore. Nothing persists across
// restarts; useful for tests and for shells that manage credentials
// themselves (e.g. a GUI with its own entry fields).

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::CredentialStore;
use crate::types::Credentials;

/// Credential store that holds credentials in memory only
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    inner: Arc<RwLock<Option<Credentials>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with credentials
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(credentials))),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Credentials, Error> {
        self.inner
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::credential_store("no credentials stored"))
    }

    async fn save(&self, credentials: &Credentials) -> Result<(), Error> {
        *self.inner.write().await = Some(credentials.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_store_has_no_credentials() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().await.is_err());
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = MemoryCredentialStore::new();
        store.save(&Credentials::new("u", "p")).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.username, "u");
    }

    #[tokio::test]
    async fn prepopulated_store_loads() {
        let store = MemoryCredentialStore::with_credentials(Credentials::new("a", "b"));
        assert!(store.load().await.is_ok());
    }
}
