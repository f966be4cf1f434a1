//! Turns raw Web API responses into what the screens show.
//!
//! Every load is a plain function of its arguments. Nothing is
//! cached between calls, so retrying a failed load is just calling
//! it again.

use std::collections::{HashMap, HashSet};

use sv_core::{err, info, pt, SteamId};

use crate::{
    client::{SteamApi, MAX_SUMMARY_BATCH},
    error::SteamError,
    models::{
        AchievementReport, AchievementView, AggregateStats, FriendSummary, GameLibrary, OwnedGame,
        PresenceState,
    },
    wire::{Game, PlayerAchievement, PlayerSummary},
};

fn require(steam_id: Option<&SteamId>) -> Result<&SteamId, SteamError> {
    steam_id.ok_or(SteamError::MissingIdentifier)
}

/// The user's friends with their current status,
/// most present first, then by name.
///
/// Summaries are fetched in batches of [`MAX_SUMMARY_BATCH`], one after
/// another. If any batch fails the whole load fails.
pub async fn load_friends(
    api: &impl SteamApi,
    steam_id: Option<&SteamId>,
) -> Result<Vec<FriendSummary>, SteamError> {
    let steam_id = require(steam_id)?;

    let mut seen = HashSet::new();
    let friend_ids: Vec<SteamId> = api
        .friend_list(steam_id)
        .await?
        .into_iter()
        .filter_map(|raw| match SteamId::new(raw) {
            Ok(id) => Some(id),
            Err(e) => {
                err!("Skipping friend: {e}");
                None
            }
        })
        .filter(|id| seen.insert(id.clone()))
        .collect();
    if friend_ids.is_empty() {
        pt!("No friends to load");
        return Ok(Vec::new());
    }

    let mut summaries: Vec<PlayerSummary> = Vec::with_capacity(friend_ids.len());
    for chunk in friend_ids.chunks(MAX_SUMMARY_BATCH) {
        summaries.extend(api.player_summaries(chunk).await?);
    }

    let mut by_id: HashMap<String, PlayerSummary> = summaries
        .into_iter()
        .map(|s| (s.steamid.clone(), s))
        .collect();
    let mut friends: Vec<FriendSummary> = friend_ids
        .into_iter()
        .filter_map(|id| {
            let summary = by_id.remove(id.as_str())?;
            Some(FriendSummary {
                steam_id: id,
                display_name: summary.personaname,
                avatar_url: summary.avatarfull,
                presence: PresenceState::from_code(summary.personastate),
                current_game: summary.gameextrainfo.filter(|g| !g.is_empty()),
            })
        })
        .collect();

    sort_friends(&mut friends);
    info!("Loaded {} friends", friends.len());
    Ok(friends)
}

/// Presence rank descending, then display name (case-sensitive).
pub fn sort_friends(friends: &mut [FriendSummary]) {
    friends.sort_by(|a, b| {
        b.presence
            .rank()
            .cmp(&a.presence.rank())
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
}

/// The user's own profile, from the same summary endpoint.
///
/// `Ok(None)` if Steam has no record for the ID.
pub async fn load_profile(
    api: &impl SteamApi,
    steam_id: Option<&SteamId>,
) -> Result<Option<FriendSummary>, SteamError> {
    let steam_id = require(steam_id)?;
    let summary = api
        .player_summaries(std::slice::from_ref(steam_id))
        .await?
        .into_iter()
        .find(|s| s.steamid == steam_id.as_str());
    Ok(summary.map(|s| FriendSummary {
        steam_id: steam_id.clone(),
        display_name: s.personaname,
        avatar_url: s.avatarfull,
        presence: PresenceState::from_code(s.personastate),
        current_game: s.gameextrainfo.filter(|g| !g.is_empty()),
    }))
}

/// Every owned game, most played first.
pub async fn load_owned_games(
    api: &impl SteamApi,
    steam_id: Option<&SteamId>,
) -> Result<GameLibrary, SteamError> {
    let steam_id = require(steam_id)?;
    let owned = api.owned_games(steam_id).await?;
    let library = build_library(owned.games, owned.game_count);
    info!(
        "Loaded {} games ({} min total)",
        library.games.len(),
        library.total_playtime_minutes
    );
    Ok(library)
}

/// Owned games worth picking for the achievements view:
/// only ones that were actually played.
pub async fn load_achievement_games(
    api: &impl SteamApi,
    steam_id: Option<&SteamId>,
) -> Result<GameLibrary, SteamError> {
    let steam_id = require(steam_id)?;
    let owned = api.owned_games(steam_id).await?;
    let played: Vec<Game> = owned
        .games
        .into_iter()
        .filter(|g| g.playtime_forever > 0)
        .collect();
    Ok(build_library(played, owned.game_count))
}

fn build_library(games: Vec<Game>, game_count: u32) -> GameLibrary {
    let mut games: Vec<OwnedGame> = games
        .into_iter()
        .map(|g| OwnedGame {
            app_id: g.appid,
            name: g.name,
            icon_hash: g.img_icon_url.filter(|h| !h.is_empty()),
            total_playtime_minutes: g.playtime_forever,
            recent_playtime_minutes: g.playtime_2weeks,
        })
        .collect();
    let total_playtime_minutes = games.iter().map(|g| g.total_playtime_minutes).sum();
    // stable: equal playtimes keep Steam's order
    games.sort_by(|a, b| b.total_playtime_minutes.cmp(&a.total_playtime_minutes));

    GameLibrary {
        game_count: game_count.max(games.len() as u32),
        games,
        total_playtime_minutes,
    }
}

/// Achievements of `app_id` merged with the player's progress.
///
/// A game without achievements gives an empty report. If the
/// player's progress can't be fetched (private game details,
/// no stats for the app) every achievement shows as locked and
/// [`AchievementReport::progress_unavailable`] is set; only a
/// failed schema request is an error.
pub async fn load_achievements(
    api: &impl SteamApi,
    steam_id: Option<&SteamId>,
    app_id: u32,
) -> Result<AchievementReport, SteamError> {
    let steam_id = require(steam_id)?;

    let schema = api.achievement_schema(app_id).await?;
    if schema.is_empty() {
        pt!("App {app_id} has no achievements");
        return Ok(AchievementReport::empty(app_id));
    }

    let (progress, progress_unavailable) = match api.player_achievements(steam_id, app_id).await
    {
        Ok(progress) => (progress, false),
        Err(e) => {
            err!("Couldn't load achievement progress for app {app_id}, showing all as locked: {e}");
            (Vec::new(), true)
        }
    };

    let progress: HashMap<&str, &PlayerAchievement> =
        progress.iter().map(|p| (p.apiname.as_str(), p)).collect();
    let mut achievements: Vec<AchievementView> = schema
        .into_iter()
        .map(|s| {
            let record = progress.get(s.name.as_str());
            let achieved = record.is_some_and(|p| p.achieved == 1);
            AchievementView {
                display_name: if s.display_name.trim().is_empty() {
                    s.name.clone()
                } else {
                    s.display_name
                },
                description: s.description,
                unlocked_icon_url: s.icon,
                locked_icon_url: s.icongray,
                achieved,
                unlock_timestamp: record
                    .filter(|_| achieved)
                    .map(|p| p.unlocktime)
                    .filter(|t| *t > 0),
                api_name: s.name,
            }
        })
        .collect();

    sort_achievements(&mut achievements);
    let stats = AggregateStats::from_achievements(&achievements);
    info!(
        "App {app_id}: {}/{} achievements unlocked ({}%)",
        stats.unlocked_count, stats.total_count, stats.percentage
    );

    Ok(AchievementReport {
        app_id,
        achievements,
        stats,
        progress_unavailable,
    })
}

/// Unlocked first, then display name.
pub fn sort_achievements(achievements: &mut [AchievementView]) {
    achievements.sort_by(|a, b| {
        b.achieved
            .cmp(&a.achieved)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
}
