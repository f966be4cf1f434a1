//! Password-protected credential file, for systems without a keyring.
//!
//! - Argon2id derives the key from the user's password and a
//!   random salt kept in the file
//! - every value is sealed with AES-256-GCM under its own nonce
//! - a known plaintext is sealed too, so a wrong password is
//!   reported as such instead of as corrupted entries

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sv_core::info;
use tokio::sync::Mutex;

use crate::store::{CredentialKey, CredentialStore, StoreError};

pub const CREDENTIALS_FILE: &str = "encrypted_credentials.json";

const FILE_VERSION: u32 = 1;

const ARGON2_M_COST: u32 = 65536; // 64 MB
const ARGON2_T_COST: u32 = 3;
const ARGON2_P_COST: u32 = 4;

const VERIFICATION_PLAINTEXT: &str = "SteamViewer_PasswordVerification_v1";

#[derive(Serialize, Deserialize)]
struct EncryptedCredentialsFile {
    version: u32,
    /// Argon2 salt, in `SaltString`'s B64 form.
    salt: String,
    verification: SealedValue,
    values: HashMap<String, SealedValue>,
}

#[derive(Serialize, Deserialize, Clone)]
struct SealedValue {
    /// Base64, 12 bytes.
    nonce: String,
    /// Base64, includes the GCM tag.
    ciphertext: String,
}

/// The key derived for the file currently on disk.
struct Unlocked {
    key: [u8; 32],
    salt: String,
}

pub struct EncryptedFileCredentialStore {
    path: PathBuf,
    password: String,
    // Also serializes read-modify-write cycles on the file.
    unlocked: Mutex<Option<Unlocked>>,
}

fn crypto_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Crypto(e.to_string())
}

fn derive_key(password: &str, salt: &SaltString) -> Result<[u8; 32], StoreError> {
    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2::Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(32))
            .map_err(crypto_err)?,
    );
    let hash = argon2
        .hash_password(password.as_bytes(), salt)
        .map_err(crypto_err)?;
    let output = hash
        .hash
        .ok_or_else(|| StoreError::Crypto("Argon2 produced no output".to_owned()))?;

    let mut key = [0u8; 32];
    key.copy_from_slice(output.as_bytes());
    Ok(key)
}

fn seal(cipher: &Aes256Gcm, plaintext: &str) -> Result<SealedValue, StoreError> {
    let mut nonce_bytes = [0u8; 12];
    OsRng.fill_bytes(&mut nonce_bytes);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
        .map_err(crypto_err)?;
    Ok(SealedValue {
        nonce: BASE64.encode(nonce_bytes),
        ciphertext: BASE64.encode(ciphertext),
    })
}

/// `None` if the GCM tag doesn't match (wrong key or tampered data).
fn open(cipher: &Aes256Gcm, sealed: &SealedValue) -> Result<Option<String>, StoreError> {
    let nonce = BASE64.decode(&sealed.nonce)?;
    if nonce.len() != 12 {
        return Err(StoreError::Crypto(format!(
            "nonce is {} bytes, expected 12",
            nonce.len()
        )));
    }
    let ciphertext = BASE64.decode(&sealed.ciphertext)?;
    let Ok(plaintext) = cipher.decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice()) else {
        return Ok(None);
    };
    String::from_utf8(plaintext).map(Some).map_err(crypto_err)
}

impl EncryptedFileCredentialStore {
    #[must_use]
    pub fn new(path: PathBuf, password: impl Into<String>) -> Self {
        Self {
            path,
            password: password.into(),
            unlocked: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, error: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            error,
        }
    }

    async fn read_file(&self) -> Result<Option<EncryptedCredentialsFile>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(n) => n,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(self.io_err(error)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|error| StoreError::Json {
                path: self.path.clone(),
                error,
            })
    }

    /// Derive (once) the key for `file`, or for a fresh salt if there's no file yet.
    async fn cipher(
        &self,
        unlocked: &mut Option<Unlocked>,
        file: Option<&EncryptedCredentialsFile>,
    ) -> Result<(Aes256Gcm, String), StoreError> {
        if let Some(u) = unlocked.as_ref() {
            if file.is_none_or(|f| f.salt == u.salt) {
                let cipher = Aes256Gcm::new_from_slice(&u.key).map_err(crypto_err)?;
                return Ok((cipher, u.salt.clone()));
            }
        }

        let salt = match file {
            Some(f) => SaltString::from_b64(&f.salt).map_err(crypto_err)?,
            None => SaltString::generate(&mut OsRng),
        };
        let password = self.password.clone();
        let salt_for_task = salt.clone();
        // Argon2 blocks for a noticeable time
        let key = tokio::task::spawn_blocking(move || derive_key(&password, &salt_for_task))
            .await
            .map_err(crypto_err)??;
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(crypto_err)?;

        if let Some(f) = file {
            if open(&cipher, &f.verification)?.as_deref() != Some(VERIFICATION_PLAINTEXT) {
                return Err(StoreError::InvalidPassword);
            }
        }

        info!("Unlocked credential file");
        *unlocked = Some(Unlocked {
            key,
            salt: salt.as_str().to_owned(),
        });
        Ok((cipher, salt.as_str().to_owned()))
    }

    async fn write_file(&self, file: &EncryptedCredentialsFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_err(e))?;
        }
        let json = serde_json::to_string_pretty(file).map_err(|error| StoreError::Json {
            path: self.path.clone(),
            error,
        })?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| self.io_err(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| self.io_err(e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for EncryptedFileCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, StoreError> {
        let mut unlocked = self.unlocked.lock().await;
        let Some(file) = self.read_file().await? else {
            return Ok(None);
        };
        let (cipher, _) = self.cipher(&mut *unlocked, Some(&file)).await?;
        let Some(sealed) = file.values.get(key.as_str()) else {
            return Ok(None);
        };
        open(&cipher, sealed)?
            .map(Some)
            .ok_or_else(|| StoreError::Crypto(format!("entry {key} failed authentication")))
    }

    async fn set(&self, key: CredentialKey, value: &str) -> Result<(), StoreError> {
        let mut unlocked = self.unlocked.lock().await;
        let file = self.read_file().await?;
        let (cipher, salt) = self.cipher(&mut *unlocked, file.as_ref()).await?;

        let mut values = file.map(|f| f.values).unwrap_or_default();
        values.insert(key.as_str().to_owned(), seal(&cipher, value)?);
        self.write_file(&EncryptedCredentialsFile {
            version: FILE_VERSION,
            salt,
            verification: seal(&cipher, VERIFICATION_PLAINTEXT)?,
            values,
        })
        .await
    }

    async fn remove(&self, key: CredentialKey) -> Result<(), StoreError> {
        let mut unlocked = self.unlocked.lock().await;
        let Some(mut file) = self.read_file().await? else {
            return Ok(());
        };
        // Proves the password before touching the file.
        self.cipher(&mut *unlocked, Some(&file)).await?;
        if file.values.remove(key.as_str()).is_some() {
            self.write_file(&file).await?;
        }
        Ok(())
    }
}
