//! Steam Web API requests.
//!
//! One function per endpoint, no retries, no caching. Non-success
//! statuses are turned into [`SteamError`] via [`SteamError::from_status`].

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use sv_core::{err, pt, SteamId};

use crate::{
    error::SteamError,
    wire::{
        FriendListResponse, OwnedGames, OwnedGamesResponse, PlayerAchievement,
        PlayerStatsResponse, PlayerSummariesResponse, PlayerSummary, SchemaAchievement,
        SchemaResponse,
    },
};

pub const DEFAULT_API_BASE_URL: &str = "https://api.steampowered.com";

/// Most Steam IDs `GetPlayerSummaries` accepts in one call.
pub const MAX_SUMMARY_BATCH: usize = 100;

/// The Steam Web API endpoints the app reads.
///
/// [`SteamClient`] is the real implementation;
/// the aggregation functions are generic over this so
/// they can be driven by fakes.
#[async_trait]
pub trait SteamApi: Send + Sync {
    /// Steam IDs of `steam_id`'s friends, as returned.
    async fn friend_list(&self, steam_id: &SteamId) -> Result<Vec<String>, SteamError>;

    /// At most [`MAX_SUMMARY_BATCH`] IDs per call.
    async fn player_summaries(&self, steam_ids: &[SteamId])
        -> Result<Vec<PlayerSummary>, SteamError>;

    async fn owned_games(&self, steam_id: &SteamId) -> Result<OwnedGames, SteamError>;

    async fn achievement_schema(&self, app_id: u32) -> Result<Vec<SchemaAchievement>, SteamError>;

    async fn player_achievements(
        &self,
        steam_id: &SteamId,
        app_id: u32,
    ) -> Result<Vec<PlayerAchievement>, SteamError>;
}

#[derive(Debug, Clone)]
pub struct SteamConfig {
    pub api_key: String,
    /// Without trailing slash. Overridable for testing.
    pub base_url: String,
}

impl SteamConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE_URL.to_owned(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }
}

#[derive(Debug, Clone)]
pub struct SteamClient {
    client: Client,
    config: SteamConfig,
}

impl SteamClient {
    #[must_use]
    pub fn new(config: SteamConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    #[must_use]
    pub fn with_client(client: Client, config: SteamConfig) -> Self {
        Self { client, config }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, SteamError> {
        let url = format!("{}/{endpoint}/", self.config.base_url);
        pt!(no_log, "GET {endpoint}");

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .query(params)
            .send()
            .await
            .inspect_err(|e| err!("{endpoint}: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let error = SteamError::from_status(status.as_u16());
            err!("{endpoint}: {error}");
            return Err(error);
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SteamApi for SteamClient {
    async fn friend_list(&self, steam_id: &SteamId) -> Result<Vec<String>, SteamError> {
        let response: FriendListResponse = self
            .get_json(
                "ISteamUser/GetFriendList/v1",
                &[("steamid", steam_id.as_str()), ("relationship", "friend")],
            )
            .await?;
        Ok(response
            .friendslist
            .friends
            .into_iter()
            .map(|f| f.steamid)
            .collect())
    }

    async fn player_summaries(
        &self,
        steam_ids: &[SteamId],
    ) -> Result<Vec<PlayerSummary>, SteamError> {
        debug_assert!(steam_ids.len() <= MAX_SUMMARY_BATCH);
        let ids = steam_ids
            .iter()
            .map(SteamId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let response: PlayerSummariesResponse = self
            .get_json("ISteamUser/GetPlayerSummaries/v2", &[("steamids", ids.as_str())])
            .await?;
        Ok(response.response.players)
    }

    async fn owned_games(&self, steam_id: &SteamId) -> Result<OwnedGames, SteamError> {
        let response: OwnedGamesResponse = self
            .get_json(
                "IPlayerService/GetOwnedGames/v1",
                &[
                    ("steamid", steam_id.as_str()),
                    ("include_appinfo", "1"),
                    ("include_played_free_games", "1"),
                ],
            )
            .await?;
        Ok(response.response)
    }

    async fn achievement_schema(&self, app_id: u32) -> Result<Vec<SchemaAchievement>, SteamError> {
        let app_id = app_id.to_string();
        let response: SchemaResponse = self
            .get_json("ISteamUserStats/GetSchemaForGame/v2", &[("appid", app_id.as_str())])
            .await?;
        Ok(response.game.available_game_stats.achievements)
    }

    async fn player_achievements(
        &self,
        steam_id: &SteamId,
        app_id: u32,
    ) -> Result<Vec<PlayerAchievement>, SteamError> {
        let app_id = app_id.to_string();
        let response: PlayerStatsResponse = self
            .get_json(
                "ISteamUserStats/GetPlayerAchievements/v1",
                &[("steamid", steam_id.as_str()), ("appid", app_id.as_str())],
            )
            .await?;
        Ok(response.playerstats.achievements)
    }
}
