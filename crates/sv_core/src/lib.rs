//! Shared building blocks for Steam Viewer:
//! the [`SteamId`] type, logging macros ([`info!`], [`pt!`], [`err!`])
//! and the location of the app's data directory.

use std::{fmt::Display, path::PathBuf, str::FromStr, sync::LazyLock};

use serde::{Deserialize, Serialize};

pub mod print;

pub const APP_NAME: &str = "SteamViewer";

/// Per-user directory holding `config.json`,
/// the file-based credential store and logs.
///
/// Falls back to `./SteamViewer` if the platform
/// has no config directory.
pub static APP_DIR: LazyLock<PathBuf> = LazyLock::new(|| {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
});

/// A 64-bit Steam account identifier, kept in its decimal string form
/// (the form Steam's Web API and OpenID both use).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SteamId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid Steam ID {0:?}: expected a non-empty string of digits")]
pub struct InvalidSteamId(pub String);

impl SteamId {
    /// Validates that `value` is a non-empty run of ASCII digits.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidSteamId> {
        let value = value.into();
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(value))
        } else {
            Err(InvalidSteamId(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SteamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SteamId {
    type Err = InvalidSteamId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SteamId {
    type Error = InvalidSteamId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SteamId> for String {
    fn from(value: SteamId) -> Self {
        value.0
    }
}

impl AsRef<str> for SteamId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
