/// Everything a Steam data load can fail with.
#[derive(Debug, thiserror::Error)]
pub enum SteamError {
    #[error("No Steam account is linked to this session")]
    MissingIdentifier,
    #[error("Steam Web API key is invalid or unauthorized")]
    Unauthorized,
    #[error("This Steam profile is private. Make it public in Steam's privacy settings")]
    PrivateProfile,
    #[error("Steam Web API returned HTTP {0}")]
    Http(u16),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl SteamError {
    /// Maps a non-success status from the Web API.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => SteamError::Unauthorized,
            403 => SteamError::PrivateProfile,
            n => SteamError::Http(n),
        }
    }

    /// Whether simply running the same load again could help.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, SteamError::Http(_) | SteamError::Network(_))
    }

    /// Short hint for what the user should do about it.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            SteamError::MissingIdentifier => "Link your Steam account to see this.",
            SteamError::Unauthorized => {
                "The Steam Web API key was rejected. The app needs a valid key."
            }
            SteamError::PrivateProfile => {
                "Your profile is private. Set \"Game details\" and \"Friends list\" to Public in Steam."
            }
            SteamError::Http(_) => "Steam returned an error. Try again.",
            SteamError::Network(_) => "Couldn't reach Steam. Check your connection and try again.",
        }
    }
}
