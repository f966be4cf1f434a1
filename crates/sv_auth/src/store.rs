//! Credential storage backends.
//!
//! The session only ever stores two values, the opaque session
//! token and the linked Steam ID, so every backend is a plain
//! string key-value store.

use std::{
    collections::HashMap,
    fmt::Display,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::encrypted_store::{EncryptedFileCredentialStore, CREDENTIALS_FILE};

/// Keyring service name, and the file name prefix for the file store.
pub const SERVICE_NAME: &str = "SteamViewer";

/// The keys the session persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    Token,
    SteamId,
}

impl CredentialKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialKey::Token => "token",
            CredentialKey::SteamId => "steamId",
        }
    }
}

impl Display for CredentialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub struct KeyringError(pub keyring::Error);

impl Display for KeyringError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Credential keyring error:")?;
        match &self.0 {
            #[cfg(target_os = "linux")]
            keyring::Error::PlatformFailure(error)
                if error.to_string().contains("The name is not activatable") =>
            {
                write!(f, "{error}\n\nTry installing gnome-keyring and libsecret packages\n(may be called differently depending on your distro)\nor set \"token_storage\": \"file\" in config.json to use a password-encrypted file")
            }
            _ => write!(f, "{}", self.0),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Keyring(#[from] KeyringError),
    #[error("credential file {path:?}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("credential file {path:?} is corrupted: {error}")]
    Json {
        path: PathBuf,
        error: serde_json::Error,
    },
    #[error("credential file is corrupted: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("credential encryption failed: {0}")]
    Crypto(String),
    #[error("wrong password for the credential file")]
    InvalidPassword,
    #[error("the credential file needs a password\nSet STEAM_VIEWER_PASSWORD")]
    PasswordRequired,
}

impl From<keyring::Error> for StoreError {
    fn from(err: keyring::Error) -> Self {
        StoreError::Keyring(KeyringError(err))
    }
}

/// Persistent key-value storage for session credentials.
///
/// `get` returns `Ok(None)` for keys that were never set
/// (or were removed). `remove` on a missing key is not an error.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: CredentialKey, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: CredentialKey) -> Result<(), StoreError>;
}

/// Where credentials get saved. Chosen in `config.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenStorageMethod {
    #[default]
    #[serde(rename = "keyring")]
    Keyring,
    /// Password-encrypted file, see [`EncryptedFileCredentialStore`].
    #[serde(rename = "file")]
    File,
    /// Nothing survives a restart. Mostly for testing.
    #[serde(rename = "memory")]
    Memory,
}

impl Display for TokenStorageMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            TokenStorageMethod::Keyring => "keyring",
            TokenStorageMethod::File => "file",
            TokenStorageMethod::Memory => "memory",
        })
    }
}

impl TokenStorageMethod {
    /// Build the backend. `dir` and `password` are only
    /// used by [`TokenStorageMethod::File`].
    pub fn into_store(
        self,
        dir: &Path,
        password: Option<String>,
    ) -> Result<Arc<dyn CredentialStore>, StoreError> {
        Ok(match self {
            TokenStorageMethod::Keyring => Arc::new(KeyringCredentialStore::default()),
            TokenStorageMethod::File => {
                let password = password
                    .filter(|p| !p.is_empty())
                    .ok_or(StoreError::PasswordRequired)?;
                Arc::new(EncryptedFileCredentialStore::new(
                    dir.join(CREDENTIALS_FILE),
                    password,
                ))
            }
            TokenStorageMethod::Memory => Arc::new(MemoryCredentialStore::default()),
        })
    }
}

/// System keyring (Secret Service, Keychain, Credential Manager).
pub struct KeyringCredentialStore {
    service: String,
}

impl KeyringCredentialStore {
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: CredentialKey) -> Result<keyring::Entry, StoreError> {
        Ok(keyring::Entry::new(&self.service, key.as_str())?)
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new(SERVICE_NAME)
    }
}

#[async_trait]
impl CredentialStore for KeyringCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: CredentialKey, value: &str) -> Result<(), StoreError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    async fn remove(&self, key: CredentialKey) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    values: Mutex<HashMap<CredentialKey, String>>,
}

impl MemoryCredentialStore {
    /// Pre-populated store, handy for simulating a previous run.
    #[must_use]
    pub fn with_values(values: impl IntoIterator<Item = (CredentialKey, String)>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().await.get(&key).cloned())
    }

    async fn set(&self, key: CredentialKey, value: &str) -> Result<(), StoreError> {
        self.values.lock().await.insert(key, value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: CredentialKey) -> Result<(), StoreError> {
        self.values.lock().await.remove(&key);
        Ok(())
    }
}
