//! Display-ready view models built by [`crate::aggregate`].

use std::fmt::Display;

use serde::Serialize;
use sv_core::SteamId;

use crate::{error::SteamError, format};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PresenceState {
    Offline,
    Online,
    Busy,
    Away,
    Snooze,
    Unknown,
}

impl PresenceState {
    /// From Steam's `personastate`. The "looking to trade/play"
    /// states (5, 6) and anything newer are [`PresenceState::Unknown`].
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Offline,
            1 => Self::Online,
            2 => Self::Busy,
            3 => Self::Away,
            4 => Self::Snooze,
            _ => Self::Unknown,
        }
    }

    /// Higher means "more present". Used for sorting friend lists.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Online => 5,
            Self::Busy => 4,
            Self::Away => 3,
            Self::Snooze => 2,
            Self::Offline => 1,
            Self::Unknown => 0,
        }
    }
}

impl Display for PresenceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::Offline => "Offline",
            Self::Online => "Online",
            Self::Busy => "Busy",
            Self::Away => "Away",
            Self::Snooze => "Snooze",
            Self::Unknown => "Unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendSummary {
    pub steam_id: SteamId,
    pub display_name: String,
    pub avatar_url: String,
    pub presence: PresenceState,
    pub current_game: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnedGame {
    pub app_id: u32,
    pub name: String,
    pub icon_hash: Option<String>,
    pub total_playtime_minutes: u64,
    /// Last two weeks.
    pub recent_playtime_minutes: u64,
}

impl OwnedGame {
    #[must_use]
    pub fn icon_url(&self) -> Option<String> {
        format::game_icon_url(self.app_id, self.icon_hash.as_deref())
    }
}

/// Owned games sorted by playtime, with totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameLibrary {
    pub games: Vec<OwnedGame>,
    /// Sum over `games`.
    pub total_playtime_minutes: u64,
    /// What Steam reports, which may include games it didn't list.
    pub game_count: u32,
}

impl GameLibrary {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementView {
    pub api_name: String,
    pub display_name: String,
    pub description: String,
    pub unlocked_icon_url: String,
    pub locked_icon_url: String,
    pub achieved: bool,
    /// Unix seconds. Only set for unlocked achievements.
    pub unlock_timestamp: Option<i64>,
}

impl AchievementView {
    /// The icon to show for the current state.
    #[must_use]
    pub fn icon_url(&self) -> &str {
        if self.achieved {
            &self.unlocked_icon_url
        } else {
            &self.locked_icon_url
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    pub total_count: usize,
    pub unlocked_count: usize,
    /// 0-100, rounded.
    pub percentage: u8,
}

impl AggregateStats {
    #[must_use]
    pub fn from_achievements(achievements: &[AchievementView]) -> Self {
        let total_count = achievements.len();
        let unlocked_count = achievements.iter().filter(|a| a.achieved).count();
        let percentage = if total_count == 0 {
            0
        } else {
            (unlocked_count as f64 / total_count as f64 * 100.0).round() as u8
        };
        Self {
            total_count,
            unlocked_count,
            percentage,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AchievementReport {
    pub app_id: u32,
    /// Unlocked first, then by name.
    pub achievements: Vec<AchievementView>,
    pub stats: AggregateStats,
    /// Player progress couldn't be loaded (usually private game
    /// details), so everything shows as locked.
    pub progress_unavailable: bool,
}

impl AchievementReport {
    #[must_use]
    pub fn empty(app_id: u32) -> Self {
        Self {
            app_id,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.achievements.is_empty()
    }
}

/// What a screen shows for one load.
///
/// Retrying is just running the load again and
/// replacing this value.
#[derive(Debug)]
pub enum LoadState<T> {
    Loading,
    Empty,
    Ready(T),
    Failed(SteamError),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<T> LoadState<T> {
    /// `is_empty` decides between [`LoadState::Empty`] and [`LoadState::Ready`].
    pub fn from_result(result: Result<T, SteamError>, is_empty: impl FnOnce(&T) -> bool) -> Self {
        match result {
            Ok(value) if is_empty(&value) => Self::Empty,
            Ok(value) => Self::Ready(value),
            Err(err) => Self::Failed(err),
        }
    }

    #[must_use]
    pub fn can_retry(&self) -> bool {
        matches!(self, Self::Failed(e) if e.is_retriable())
    }
}
