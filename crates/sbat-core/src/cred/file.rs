// # File Credential Store
//
// File-based implementation of CredentialStore.
//
// ## File Format
//
// ```json
// {
//   "username": "operator@example.be",
//   "password": "..."
// }
// ```
//
// Writes are atomic (write to a temporary file, then rename) so a crash
// mid-save never leaves a truncated credential file behind. No backup copy
// is kept: credentials are re-enterable, unlike observation state.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::CredentialStore;
use crate::types::Credentials;

/// Credential store backed by a JSON file
///
/// # Example
///
/// ```rust,no_run
/// use sbat_core::cred::FileCredentialStore;
/// use sbat_core::traits::CredentialStore;
/// use sbat_core::types::Credentials;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileCredentialStore::new("/var/lib/sbat/credentials.json");
///     store.save(&Credentials::new("user", "pass")).await?;
///     let credentials = store.load().await?;
///     assert_eq!(credentials.username, "user");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut path = self.path.clone();
        path.set_extension("tmp");
        path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Credentials, Error> {
        if !self.path.exists() {
            return Err(Error::credential_store(format!(
                "credential file not found: {}",
                self.path.display()
            )));
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::credential_store(format!(
                "failed to read credential file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let credentials: Credentials = serde_json::from_str(&content).map_err(|e| {
            Error::credential_store(format!(
                "failed to parse credential file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(credentials)
    }

    async fn save(&self, credentials: &Credentials) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::credential_store(format!(
                        "failed to create credential directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(credentials)
            .map_err(|e| Error::credential_store(format!("failed to serialize credentials: {}", e)))?;

        // Write to temporary file first
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::credential_store(format!(
                    "failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::credential_store(format!(
                    "failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::credential_store(format!(
                    "failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Atomic rename (temp -> actual)
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::credential_store(format!(
                "failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!("credentials saved to {}", self.path.display());
        Ok(())
    }
}
