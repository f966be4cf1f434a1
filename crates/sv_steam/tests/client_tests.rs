//! HTTP behaviour of [`SteamClient`] against a mock Steam Web API.

use serde_json::json;
use sv_core::SteamId;
use sv_steam::{
    load_achievements, load_friends, load_owned_games, SteamApi, SteamClient, SteamConfig,
    SteamError,
};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const KEY: &str = "test-key";
const ME: &str = "76561198000000000";

const FRIENDS: &str = "/ISteamUser/GetFriendList/v1/";
const SUMMARIES: &str = "/ISteamUser/GetPlayerSummaries/v2/";
const OWNED: &str = "/IPlayerService/GetOwnedGames/v1/";
const SCHEMA: &str = "/ISteamUserStats/GetSchemaForGame/v2/";
const PROGRESS: &str = "/ISteamUserStats/GetPlayerAchievements/v1/";

fn client(server: &MockServer) -> SteamClient {
    SteamClient::new(SteamConfig::new(KEY).with_base_url(server.uri()))
}

fn me() -> SteamId {
    SteamId::new(ME).unwrap()
}

async fn respond(server: &MockServer, endpoint: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn friends_load_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FRIENDS))
        .and(query_param("key", KEY))
        .and(query_param("steamid", ME))
        .and(query_param("relationship", "friend"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "friendslist": {"friends": [
                {"steamid": "111", "relationship": "friend", "friend_since": 1},
                {"steamid": "222", "relationship": "friend", "friend_since": 2}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SUMMARIES))
        .and(query_param("key", KEY))
        .and(query_param("steamids", "111,222"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"players": [
                {"steamid": "111", "personaname": "Zed", "avatarfull": "z.jpg", "personastate": 0},
                {"steamid": "222", "personaname": "Ann", "avatarfull": "a.jpg", "personastate": 1,
                 "gameextrainfo": "Dota 2"}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let friends = load_friends(&client(&server), Some(&me())).await.unwrap();
    assert_eq!(friends.len(), 2);
    assert_eq!(friends[0].display_name, "Ann");
    assert_eq!(friends[0].current_game.as_deref(), Some("Dota 2"));
    assert_eq!(friends[1].display_name, "Zed");
    assert_eq!(friends[1].avatar_url, "z.jpg");
}

#[tokio::test]
async fn owned_games_request_includes_app_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(OWNED))
        .and(query_param("key", KEY))
        .and(query_param("steamid", ME))
        .and(query_param("include_appinfo", "1"))
        .and(query_param("include_played_free_games", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"game_count": 2, "games": [
                {"appid": 10, "name": "Counter-Strike", "playtime_forever": 30, "img_icon_url": "abc"},
                {"appid": 440, "name": "Team Fortress 2", "playtime_forever": 600,
                 "playtime_2weeks": 12, "img_icon_url": "def"}
            ]}
        })))
        .mount(&server)
        .await;

    let library = load_owned_games(&client(&server), Some(&me())).await.unwrap();
    assert_eq!(library.game_count, 2);
    assert_eq!(library.total_playtime_minutes, 630);
    assert_eq!(library.games[0].app_id, 440);
    assert_eq!(library.games[0].recent_playtime_minutes, 12);
    assert_eq!(library.games[1].name, "Counter-Strike");
}

#[tokio::test]
async fn achievements_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SCHEMA))
        .and(query_param("appid", "440"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "game": {"gameName": "TF2", "availableGameStats": {"achievements": [
                {"name": "TF_PLAY", "displayName": "Play", "description": "Play once",
                 "icon": "play.jpg", "icongray": "play_gray.jpg", "hidden": 0},
                {"name": "TF_WIN", "displayName": "Win", "description": "",
                 "icon": "win.jpg", "icongray": "win_gray.jpg", "hidden": 1}
            ]}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROGRESS))
        .and(query_param("steamid", ME))
        .and(query_param("appid", "440"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "playerstats": {"steamID": ME, "gameName": "TF2", "success": true, "achievements": [
                {"apiname": "TF_PLAY", "achieved": 0, "unlocktime": 0},
                {"apiname": "TF_WIN", "achieved": 1, "unlocktime": 1_600_000_000}
            ]}
        })))
        .mount(&server)
        .await;

    let report = load_achievements(&client(&server), Some(&me()), 440).await.unwrap();
    assert_eq!(report.stats.percentage, 50);
    assert_eq!(report.achievements[0].api_name, "TF_WIN");
    assert_eq!(report.achievements[0].icon_url(), "win.jpg");
    assert_eq!(report.achievements[1].icon_url(), "play_gray.jpg");
}

#[tokio::test]
async fn forbidden_means_private_profile_everywhere() {
    let server = MockServer::start().await;
    for endpoint in [FRIENDS, SUMMARIES, OWNED, SCHEMA, PROGRESS] {
        respond(&server, endpoint, 403).await;
    }
    let api = client(&server);

    assert!(matches!(api.friend_list(&me()).await, Err(SteamError::PrivateProfile)));
    assert!(matches!(
        api.player_summaries(&[me()]).await,
        Err(SteamError::PrivateProfile)
    ));
    assert!(matches!(api.owned_games(&me()).await, Err(SteamError::PrivateProfile)));
    assert!(matches!(
        api.achievement_schema(440).await,
        Err(SteamError::PrivateProfile)
    ));
    assert!(matches!(
        api.player_achievements(&me(), 440).await,
        Err(SteamError::PrivateProfile)
    ));

    assert!(matches!(
        load_friends(&api, Some(&me())).await,
        Err(SteamError::PrivateProfile)
    ));
    assert!(matches!(
        load_owned_games(&api, Some(&me())).await,
        Err(SteamError::PrivateProfile)
    ));
    assert!(matches!(
        load_achievements(&api, Some(&me()), 440).await,
        Err(SteamError::PrivateProfile)
    ));
}

#[tokio::test]
async fn other_statuses() {
    let server = MockServer::start().await;
    respond(&server, FRIENDS, 401).await;
    respond(&server, OWNED, 500).await;
    let api = client(&server);

    let unauthorized = api.friend_list(&me()).await.unwrap_err();
    assert!(matches!(unauthorized, SteamError::Unauthorized));
    assert!(!unauthorized.is_retriable());

    let server_error = api.owned_games(&me()).await.unwrap_err();
    assert!(matches!(server_error, SteamError::Http(500)));
    assert!(server_error.is_retriable());
}

#[tokio::test]
async fn unreadable_body_is_a_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(OWNED))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let result = client(&server).owned_games(&me()).await;
    assert!(matches!(result, Err(SteamError::Network(_))));
}

#[tokio::test]
async fn no_request_without_identifier() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = load_friends(&client(&server), None).await;
    assert!(matches!(result, Err(SteamError::MissingIdentifier)));
}
