//! # Steam Viewer data
//!
//! Reads a user's friends, games and achievements from the
//! public Steam Web API and shapes them for display.
//!
//! - [`client`]: one request function per endpoint ([`SteamApi`])
//! - [`aggregate`]: the loads screens call (`load_friends`, ...)
//! - [`models`]: the view models those loads return
//! - [`format`]: text helpers (playtime, dates, icon URLs)

pub mod aggregate;
pub mod client;
mod error;
pub mod format;
pub mod models;
pub mod wire;

pub use aggregate::{
    load_achievement_games, load_achievements, load_friends, load_owned_games, load_profile,
};
pub use client::{SteamApi, SteamClient, SteamConfig, DEFAULT_API_BASE_URL, MAX_SUMMARY_BATCH};
pub use error::SteamError;
pub use models::{
    AchievementReport, AchievementView, AggregateStats, FriendSummary, GameLibrary, LoadState,
    OwnedGame, PresenceState,
};
