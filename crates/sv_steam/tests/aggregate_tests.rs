//! Aggregation rules, driven by an in-memory Steam API.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use sv_core::SteamId;
use sv_steam::{
    load_achievement_games, load_achievements, load_friends, load_owned_games, load_profile,
    wire::{Game, OwnedGames, PlayerAchievement, PlayerSummary, SchemaAchievement},
    PresenceState, SteamApi, SteamError,
};

const ME: &str = "76561198000000000";

#[derive(Default)]
struct FakeSteam {
    friends: Vec<String>,
    players: Vec<PlayerSummary>,
    games: Vec<Game>,
    schema: Vec<SchemaAchievement>,
    progress: Vec<PlayerAchievement>,
    /// endpoint -> HTTP status to fail with
    failures: HashMap<&'static str, u16>,
    /// 0-based summary call that should fail
    fail_summary_call: Option<usize>,
    summary_calls: Mutex<Vec<usize>>,
}

impl FakeSteam {
    fn fail(&self, endpoint: &str) -> Result<(), SteamError> {
        match self.failures.get(endpoint) {
            Some(status) => Err(SteamError::from_status(*status)),
            None => Ok(()),
        }
    }

    fn summary_calls(&self) -> Vec<usize> {
        self.summary_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SteamApi for FakeSteam {
    async fn friend_list(&self, _steam_id: &SteamId) -> Result<Vec<String>, SteamError> {
        self.fail("friends")?;
        Ok(self.friends.clone())
    }

    async fn player_summaries(
        &self,
        steam_ids: &[SteamId],
    ) -> Result<Vec<PlayerSummary>, SteamError> {
        let call = {
            let mut calls = self.summary_calls.lock().unwrap();
            calls.push(steam_ids.len());
            calls.len() - 1
        };
        if self.fail_summary_call == Some(call) {
            return Err(SteamError::Http(502));
        }
        self.fail("summaries")?;
        Ok(self
            .players
            .iter()
            .filter(|p| steam_ids.iter().any(|id| id.as_str() == p.steamid))
            .cloned()
            .collect())
    }

    async fn owned_games(&self, _steam_id: &SteamId) -> Result<OwnedGames, SteamError> {
        self.fail("games")?;
        Ok(OwnedGames {
            game_count: self.games.len() as u32,
            games: self.games.clone(),
        })
    }

    async fn achievement_schema(&self, _app_id: u32) -> Result<Vec<SchemaAchievement>, SteamError> {
        self.fail("schema")?;
        Ok(self.schema.clone())
    }

    async fn player_achievements(
        &self,
        _steam_id: &SteamId,
        _app_id: u32,
    ) -> Result<Vec<PlayerAchievement>, SteamError> {
        self.fail("progress")?;
        Ok(self.progress.clone())
    }
}

fn me() -> SteamId {
    SteamId::new(ME).unwrap()
}

fn player(id: &str, name: &str, state: u8) -> PlayerSummary {
    PlayerSummary {
        steamid: id.to_owned(),
        personaname: name.to_owned(),
        avatarfull: format!("https://avatars.example/{id}.jpg"),
        personastate: state,
        gameextrainfo: None,
    }
}

fn game(appid: u32, name: &str, minutes: u64) -> Game {
    Game {
        appid,
        name: name.to_owned(),
        img_icon_url: Some(format!("icon{appid}")),
        playtime_forever: minutes,
        playtime_2weeks: 0,
    }
}

fn schema(name: &str, display: &str) -> SchemaAchievement {
    SchemaAchievement {
        name: name.to_owned(),
        display_name: display.to_owned(),
        description: format!("{display} description"),
        icon: format!("https://cdn.example/{name}.jpg"),
        icongray: format!("https://cdn.example/{name}_gray.jpg"),
    }
}

fn progress(name: &str, achieved: u8, unlocktime: i64) -> PlayerAchievement {
    PlayerAchievement {
        apiname: name.to_owned(),
        achieved,
        unlocktime,
    }
}

#[tokio::test]
async fn friends_sorted_by_presence_then_name() {
    let api = FakeSteam {
        friends: vec!["1".into(), "2".into(), "3".into()],
        players: vec![
            player("1", "Zed", 0),
            player("2", "Ann", 1),
            player("3", "Mid", 2),
        ],
        ..Default::default()
    };

    let friends = load_friends(&api, Some(&me())).await.unwrap();
    let order: Vec<(PresenceState, &str)> = friends
        .iter()
        .map(|f| (f.presence, f.display_name.as_str()))
        .collect();
    assert_eq!(
        order,
        [
            (PresenceState::Online, "Ann"),
            (PresenceState::Busy, "Mid"),
            (PresenceState::Offline, "Zed"),
        ]
    );
}

#[tokio::test]
async fn friend_names_compare_case_sensitively() {
    let api = FakeSteam {
        friends: vec!["1".into(), "2".into(), "3".into(), "4".into()],
        players: vec![
            player("1", "alice", 1),
            player("2", "Bob", 1),
            player("3", "Carl", 3),
            player("4", "Dora", 4),
        ],
        ..Default::default()
    };

    let friends = load_friends(&api, Some(&me())).await.unwrap();
    let names: Vec<&str> = friends.iter().map(|f| f.display_name.as_str()).collect();
    assert_eq!(names, ["Bob", "alice", "Carl", "Dora"]);
}

#[tokio::test]
async fn friends_without_summary_are_dropped_and_duplicates_collapsed() {
    let mut playing = player("2", "Ann", 1);
    playing.gameextrainfo = Some("Portal 2".into());
    let api = FakeSteam {
        friends: vec!["1".into(), "2".into(), "2".into(), "bogus".into()],
        players: vec![playing],
        ..Default::default()
    };

    let friends = load_friends(&api, Some(&me())).await.unwrap();
    assert_eq!(friends.len(), 1);
    assert_eq!(friends[0].steam_id.as_str(), "2");
    assert_eq!(friends[0].current_game.as_deref(), Some("Portal 2"));
    assert_eq!(api.summary_calls(), [2]);
}

#[tokio::test]
async fn empty_friend_list_is_not_an_error() {
    let api = FakeSteam::default();
    let friends = load_friends(&api, Some(&me())).await.unwrap();
    assert!(friends.is_empty());
    assert!(api.summary_calls().is_empty());
}

#[tokio::test]
async fn summaries_fetched_in_chunks_of_100() {
    let ids: Vec<String> = (0..150).map(|i| format!("{}", 1000 + i)).collect();
    let api = FakeSteam {
        players: ids
            .iter()
            .map(|id| player(id, &format!("p{id}"), 0))
            .collect(),
        friends: ids,
        ..Default::default()
    };

    let friends = load_friends(&api, Some(&me())).await.unwrap();
    assert_eq!(friends.len(), 150);
    assert_eq!(api.summary_calls(), [100, 50]);
}

#[tokio::test]
async fn failing_chunk_aborts_whole_load() {
    let ids: Vec<String> = (0..250).map(|i| format!("{}", 1000 + i)).collect();
    let api = FakeSteam {
        players: ids.iter().map(|id| player(id, "p", 0)).collect(),
        friends: ids,
        fail_summary_call: Some(1),
        ..Default::default()
    };

    let result = load_friends(&api, Some(&me())).await;
    assert!(matches!(result, Err(SteamError::Http(502))));
    // sequential: the third chunk is never requested
    assert_eq!(api.summary_calls(), [100, 100]);
}

#[tokio::test]
async fn missing_identifier_for_every_load() {
    let api = FakeSteam::default();
    assert!(matches!(
        load_friends(&api, None).await,
        Err(SteamError::MissingIdentifier)
    ));
    assert!(matches!(
        load_owned_games(&api, None).await,
        Err(SteamError::MissingIdentifier)
    ));
    assert!(matches!(
        load_achievement_games(&api, None).await,
        Err(SteamError::MissingIdentifier)
    ));
    assert!(matches!(
        load_achievements(&api, None, 440).await,
        Err(SteamError::MissingIdentifier)
    ));
    assert!(matches!(
        load_profile(&api, None).await,
        Err(SteamError::MissingIdentifier)
    ));
}

#[tokio::test]
async fn games_sorted_by_playtime_stably() {
    let api = FakeSteam {
        games: vec![
            game(10, "First tie", 120),
            game(20, "Most played", 900),
            game(30, "Second tie", 120),
            game(40, "Never played", 0),
        ],
        ..Default::default()
    };

    let library = load_owned_games(&api, Some(&me())).await.unwrap();
    let ids: Vec<u32> = library.games.iter().map(|g| g.app_id).collect();
    assert_eq!(ids, [20, 10, 30, 40]);
    assert_eq!(library.total_playtime_minutes, 1140);
    assert_eq!(library.game_count, 4);
    assert_eq!(
        library.games[0].icon_url().as_deref(),
        Some("https://media.steampowered.com/steamcommunity/public/images/apps/20/icon20.jpg")
    );
}

#[tokio::test]
async fn achievement_picker_skips_unplayed_games() {
    let api = FakeSteam {
        games: vec![game(10, "Played", 5), game(20, "Unplayed", 0)],
        ..Default::default()
    };

    let library = load_achievement_games(&api, Some(&me())).await.unwrap();
    assert_eq!(library.games.len(), 1);
    assert_eq!(library.games[0].app_id, 10);

    // the plain games view keeps them
    let all = load_owned_games(&api, Some(&me())).await.unwrap();
    assert_eq!(all.games.len(), 2);
}

#[tokio::test]
async fn achievements_left_join_schema_with_progress() {
    let api = FakeSteam {
        schema: vec![
            schema("ACH_WIN", "Winner"),
            schema("ACH_LOSE", "Loser"),
            schema("ACH_DRAW", "Draw"),
        ],
        progress: vec![progress("ACH_WIN", 1, 1_700_000_000)],
        ..Default::default()
    };

    let report = load_achievements(&api, Some(&me()), 440).await.unwrap();
    assert_eq!(report.app_id, 440);
    assert_eq!(report.achievements.len(), 3);
    assert_eq!(report.achievements.iter().filter(|a| a.achieved).count(), 1);
    assert_eq!(report.stats.total_count, 3);
    assert_eq!(report.stats.unlocked_count, 1);
    assert_eq!(report.stats.percentage, 33);
    assert!(!report.progress_unavailable);

    let names: Vec<&str> = report
        .achievements
        .iter()
        .map(|a| a.display_name.as_str())
        .collect();
    assert_eq!(names, ["Winner", "Draw", "Loser"]);

    let winner = &report.achievements[0];
    assert_eq!(winner.unlock_timestamp, Some(1_700_000_000));
    assert_eq!(winner.icon_url(), "https://cdn.example/ACH_WIN.jpg");
    assert_eq!(
        report.achievements[1].icon_url(),
        "https://cdn.example/ACH_DRAW_gray.jpg"
    );
    assert_eq!(report.achievements[1].unlock_timestamp, None);
}

#[tokio::test]
async fn locked_progress_records_stay_locked() {
    let api = FakeSteam {
        schema: vec![schema("A", "Alpha"), schema("B", "")],
        progress: vec![progress("A", 0, 0), progress("B", 1, 0)],
        ..Default::default()
    };

    let report = load_achievements(&api, Some(&me()), 1).await.unwrap();
    // blank display name falls back to the api name
    assert_eq!(report.achievements[0].display_name, "B");
    assert!(report.achievements[0].achieved);
    assert_eq!(report.achievements[0].unlock_timestamp, None);
    assert!(!report.achievements[1].achieved);
    assert_eq!(report.stats.percentage, 50);
}

#[tokio::test]
async fn progress_failure_degrades_to_nothing_unlocked() {
    let api = FakeSteam {
        schema: vec![schema("A", "Alpha"), schema("B", "Beta")],
        progress: vec![progress("A", 1, 5)],
        failures: HashMap::from([("progress", 403)]),
        ..Default::default()
    };

    let report = load_achievements(&api, Some(&me()), 1).await.unwrap();
    assert_eq!(report.achievements.len(), 2);
    assert!(report.achievements.iter().all(|a| !a.achieved));
    assert_eq!(report.stats.percentage, 0);
    assert!(report.progress_unavailable);
}

#[tokio::test]
async fn game_without_achievements_is_empty_not_error() {
    let api = FakeSteam {
        progress: vec![progress("A", 1, 5)],
        ..Default::default()
    };

    let report = load_achievements(&api, Some(&me()), 1).await.unwrap();
    assert!(report.is_empty());
    assert_eq!(report.stats.total_count, 0);
    assert_eq!(report.stats.percentage, 0);
}

#[tokio::test]
async fn schema_failure_propagates() {
    let api = FakeSteam {
        failures: HashMap::from([("schema", 401)]),
        ..Default::default()
    };
    assert!(matches!(
        load_achievements(&api, Some(&me()), 1).await,
        Err(SteamError::Unauthorized)
    ));
}

#[tokio::test]
async fn loads_are_repeatable() {
    let api = FakeSteam {
        friends: vec!["1".into(), "2".into()],
        players: vec![player("1", "Zed", 3), player("2", "Ann", 3)],
        games: vec![game(1, "A", 3), game(2, "B", 3)],
        ..Default::default()
    };

    let first = load_friends(&api, Some(&me())).await.unwrap();
    let second = load_friends(&api, Some(&me())).await.unwrap();
    assert_eq!(first, second);

    let (me_a, me_b) = (me(), me());
    let (a, b) = tokio::join!(
        load_owned_games(&api, Some(&me_a)),
        load_owned_games(&api, Some(&me_b))
    );
    assert_eq!(a.unwrap(), b.unwrap());
}

#[tokio::test]
async fn profile_comes_from_summaries() {
    let mut mine = player(ME, "Me", 1);
    mine.gameextrainfo = Some(String::new());
    let api = FakeSteam {
        players: vec![mine],
        ..Default::default()
    };

    let profile = load_profile(&api, Some(&me())).await.unwrap().unwrap();
    assert_eq!(profile.display_name, "Me");
    assert_eq!(profile.presence, PresenceState::Online);
    assert_eq!(profile.current_game, None);

    let nobody = FakeSteam::default();
    assert_eq!(load_profile(&nobody, Some(&me())).await.unwrap(), None);
}
