//! Steam Web API response shapes.
//!
//! Only the fields the app reads are modelled. Steam likes to omit
//! whole objects instead of sending empty lists (a game without
//! achievements answers `{"game":{}}`, a private friend list may
//! answer `{}`), so every container defaults to empty.

use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub(crate) struct FriendListResponse {
    #[serde(default)]
    pub friendslist: FriendsList,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct FriendsList {
    #[serde(default)]
    pub friends: Vec<Friend>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Friend {
    pub steamid: String,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct PlayerSummariesResponse {
    #[serde(default)]
    pub response: PlayerSummaries,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct PlayerSummaries {
    #[serde(default)]
    pub players: Vec<PlayerSummary>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PlayerSummary {
    pub steamid: String,
    #[serde(default)]
    pub personaname: String,
    #[serde(default)]
    pub avatarfull: String,
    /// 0 offline, 1 online, 2 busy, 3 away, 4 snooze,
    /// 5/6 "looking to trade/play".
    #[serde(default)]
    pub personastate: u8,
    /// Name of the game being played right now.
    pub gameextrainfo: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct OwnedGamesResponse {
    #[serde(default)]
    pub response: OwnedGames,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct OwnedGames {
    #[serde(default)]
    pub games: Vec<Game>,
    #[serde(default)]
    pub game_count: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Game {
    pub appid: u32,
    #[serde(default)]
    pub name: String,
    pub img_icon_url: Option<String>,
    /// Minutes
    #[serde(default)]
    pub playtime_forever: u64,
    /// Minutes
    #[serde(default)]
    pub playtime_2weeks: u64,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct SchemaResponse {
    #[serde(default)]
    pub game: SchemaGame,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct SchemaGame {
    #[serde(default, rename = "availableGameStats")]
    pub available_game_stats: AvailableGameStats,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct AvailableGameStats {
    #[serde(default)]
    pub achievements: Vec<SchemaAchievement>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SchemaAchievement {
    /// The API name, what player progress refers to.
    pub name: String,
    #[serde(default, rename = "displayName")]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub icongray: String,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct PlayerStatsResponse {
    #[serde(default)]
    pub playerstats: PlayerStats,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct PlayerStats {
    #[serde(default)]
    pub achievements: Vec<PlayerAchievement>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PlayerAchievement {
    pub apiname: String,
    /// 0 or 1
    #[serde(default)]
    pub achieved: u8,
    /// Unix seconds, 0 if locked.
    #[serde(default)]
    pub unlocktime: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_containers_decode_as_empty() {
        let schema: SchemaResponse = serde_json::from_str(r#"{"game":{}}"#).unwrap();
        assert!(schema.game.available_game_stats.achievements.is_empty());

        let friends: FriendListResponse = serde_json::from_str("{}").unwrap();
        assert!(friends.friendslist.friends.is_empty());

        let stats: PlayerStatsResponse = serde_json::from_str(
            r#"{"playerstats":{"error":"Requested app has no stats","success":false}}"#,
        )
        .unwrap();
        assert!(stats.playerstats.achievements.is_empty());

        let games: OwnedGamesResponse = serde_json::from_str(r#"{"response":{}}"#).unwrap();
        assert!(games.response.games.is_empty());
    }

    #[test]
    fn optional_game_fields() {
        let games: OwnedGamesResponse = serde_json::from_str(
            r#"{"response":{"game_count":1,"games":[{"appid":440,"name":"Team Fortress 2","playtime_forever":90}]}}"#,
        )
        .unwrap();
        let game = &games.response.games[0];
        assert_eq!(game.appid, 440);
        assert_eq!(game.playtime_2weeks, 0);
        assert!(game.img_icon_url.is_none());
    }
}
