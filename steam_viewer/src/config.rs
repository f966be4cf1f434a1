use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sv_auth::{broker::DEFAULT_REDIRECT_URI, TokenStorageMethod};
use sv_core::{err, APP_DIR};
use sv_steam::{SteamConfig, DEFAULT_API_BASE_URL};

pub const ENV_API_KEY: &str = "STEAM_API_KEY";
pub const ENV_API_BASE_URL: &str = "STEAM_API_BASE_URL";
/// Unlocks the `"file"` credential store.
pub const ENV_STORE_PASSWORD: &str = "STEAM_VIEWER_PASSWORD";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file {path:?}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("couldn't serialize config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no Steam Web API key configured\nSet STEAM_API_KEY or \"api_key\" in {0:?}")]
    MissingApiKey(PathBuf),
}

trait IoPath<T> {
    fn path(self, path: &Path) -> Result<T, ConfigError>;
}

impl<T> IoPath<T> for std::io::Result<T> {
    fn path(self, path: &Path) -> Result<T, ConfigError> {
        self.map_err(|error| ConfigError::Io {
            path: path.to_owned(),
            error,
        })
    }
}

/// App configuration stored in `SteamViewer/config.json`.
///
/// Every field is an `Option` so older or hand-written
/// files keep loading; `None` means "use the default".
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewerConfig {
    /// Steam Web API key (<https://steamcommunity.com/dev/apikey>).
    /// Overridden by `STEAM_API_KEY`.
    pub api_key: Option<String>,
    /// Overridden by `STEAM_API_BASE_URL`.
    pub api_base_url: Option<String>,
    /// Where Steam sends the user back after signing in.
    pub redirect_uri: Option<String>,
    /// `"keyring"` (default), `"file"` or `"memory"`.
    pub token_storage: Option<TokenStorageMethod>,
}

impl ViewerConfig {
    #[must_use]
    pub fn default_path() -> PathBuf {
        APP_DIR.join("config.json")
    }

    /// Load the config from `path`, creating it if missing.
    ///
    /// A corrupted file is backed up to `config.json.bak`
    /// and replaced with defaults (with an error log)
    /// instead of failing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Self::create(path);
        }

        let contents = std::fs::read_to_string(path).path(path)?;
        match serde_json::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(error) => {
                err!("Invalid config at {path:?}, resetting to defaults.\nError: {error}");
                _ = std::fs::copy(path, path.with_extension("json.bak"));
                Self::create(path)
            }
        }
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, config.as_bytes()).await.path(path)
    }

    /// Change the file at `path` and save it.
    ///
    /// Works on what's on disk, so environment overrides
    /// never end up persisted.
    pub async fn update(
        path: &Path,
        change: impl FnOnce(&mut Self),
    ) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        change(&mut config);
        config.save(path).await?;
        Ok(config)
    }

    fn create(path: &Path) -> Result<Self, ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).path(parent)?;
        }
        let config = Self::default();
        std::fs::write(path, serde_json::to_string_pretty(&config)?.as_bytes()).path(path)?;
        Ok(config)
    }

    /// Apply environment overrides. `var` is `std::env::var` outside tests.
    #[must_use]
    pub fn with_env(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| var(name).filter(|v: &String| !v.trim().is_empty());
        if let Some(key) = non_empty(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(url) = non_empty(ENV_API_BASE_URL) {
            self.api_base_url = Some(url);
        }
        self
    }

    pub fn c_steam(&self, path: &Path) -> Result<SteamConfig, ConfigError> {
        let key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(path.to_owned()))?;
        Ok(SteamConfig::new(key.trim())
            .with_base_url(self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)))
    }

    #[must_use]
    pub fn c_redirect_uri(&self) -> &str {
        self.redirect_uri
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_REDIRECT_URI)
    }

    #[must_use]
    pub fn c_token_storage(&self) -> TokenStorageMethod {
        self.token_storage.unwrap_or_default()
    }
}
