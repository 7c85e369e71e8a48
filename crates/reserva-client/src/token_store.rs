//! Credential storage.
//!
//! The session persists exactly three values: the access token, the refresh
//! token and the account email. A record missing any of them counts as "no
//! session".
//!
//! - [`MemoryCredentialStore`] keeps them in process (tests, embedding).
//! - [`FileCredentialStore`] keeps them in a JSON file readable only by the
//!   owner.

use crate::models::AuthResponse;
use async_trait::async_trait;
use common::secret::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access credentials at {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Credentials file is corrupt: {0}")]
    Corrupt(String),
}

/// A persisted session.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub email: String,
}

impl StoredCredentials {
    fn is_complete(&self) -> bool {
        !self.access_token.expose_secret().is_empty()
            && !self.refresh_token.expose_secret().is_empty()
            && !self.email.is_empty()
    }
}

impl From<AuthResponse> for StoredCredentials {
    fn from(auth: AuthResponse) -> Self {
        Self {
            access_token: auth.access_token,
            refresh_token: auth.refresh_token,
            email: auth.email,
        }
    }
}

/// Storage for the session's credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a complete credential set, replacing any previous one.
    async fn save(&self, credentials: &StoredCredentials) -> Result<(), StoreError>;

    /// Load the credential set, `None` when absent or incomplete.
    async fn load(&self) -> Result<Option<StoredCredentials>, StoreError>;

    /// Remove all stored credentials.
    async fn clear(&self) -> Result<(), StoreError>;

    async fn access_token(&self) -> Result<Option<SecretString>, StoreError> {
        Ok(self.load().await?.map(|c| c.access_token))
    }

    async fn refresh_token(&self) -> Result<Option<SecretString>, StoreError> {
        Ok(self.load().await?.map(|c| c.refresh_token))
    }
}

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Option<StoredCredentials>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing session.
    #[must_use]
    pub fn with_credentials(credentials: StoredCredentials) -> Self {
        Self {
            inner: RwLock::new(Some(credentials)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn save(&self, credentials: &StoredCredentials) -> Result<(), StoreError> {
        *self.inner.write().await = Some(credentials.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<StoredCredentials>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .clone()
            .filter(StoredCredentials::is_complete))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.inner.write().await = None;
        Ok(())
    }
}

// =============================================================================
// File store
// =============================================================================

/// On-disk shape of the credentials file.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsFile {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    email: String,
}

/// JSON file credential store.
///
/// Writes go to a uniquely named sibling temp file, created owner-only, and
/// are renamed into place, so a crash never leaves half a token pair behind
/// and concurrent saves never share a temp file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, err: &std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn save(&self, credentials: &StoredCredentials) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(&e))?;
            }
        }

        let file = CredentialsFile {
            access_token: credentials.access_token.expose_secret().to_string(),
            refresh_token: credentials.refresh_token.expose_secret().to_string(),
            email: credentials.email.clone(),
        };
        let contents =
            serde_json::to_vec_pretty(&file).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_private(&path, &contents))
            .await
            .map_err(|e| StoreError::Io {
                path: self.path.clone(),
                message: e.to_string(),
            })?
            .map_err(|e| self.io_error(&e))?;

        debug!(target: "reserva.token_store", path = %self.path.display(), "Credentials saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<StoredCredentials>, StoreError> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(&e)),
        };

        let file: CredentialsFile =
            serde_json::from_slice(&contents).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let credentials = StoredCredentials {
            access_token: SecretString::from(file.access_token),
            refresh_token: SecretString::from(file.refresh_token),
            email: file.email,
        };

        Ok(Some(credentials).filter(StoredCredentials::is_complete))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(target: "reserva.token_store", path = %self.path.display(), "Credentials cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(&e)),
        }
    }
}

/// Write `contents` to `path` through an owner-only temp file in the same
/// directory.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    // tempfile creates the file with mode 0600 on Unix
    let mut tmp = tempfile::Builder::new()
        .prefix(".credentials-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
