//! # Steam Viewer
//!
//! Terminal front-end: sign in with Steam, then browse your
//! friends, game library and achievements.
//!
//! The interesting parts live in the library crates:
//! - `sv_auth`: session, credential storage, Steam sign-in
//! - `sv_steam`: Web API client and the data shaping
//! - `sv_core`: logging and shared types

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use sv_auth::{
    BrokerError, DeepLinkOutcome, IdentityBroker, IdentityUpdate, LoginOutcome, SessionManager,
    StoreError, TokenStorageMethod,
};
use sv_core::{
    err, info,
    print::{is_print, set_log_file, set_print},
    InvalidSteamId, APP_DIR,
};
use sv_steam::{
    load_achievement_games, load_achievements, load_friends, load_owned_games, load_profile,
    AchievementReport, GameLibrary, LoadState, SteamClient, SteamError,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};

use crate::{
    config::{ConfigError, ViewerConfig, ENV_STORE_PASSWORD},
    redirect::PastedRedirectSession,
};

mod config;
mod redirect;
mod views;

#[derive(Parser)]
#[command(
    name = "steam_viewer",
    version,
    about = "View your Steam friends, games and achievements"
)]
struct Cli {
    /// Print log messages to the terminal
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Use this config file instead of the default one
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show whether you're signed in and which Steam account is linked
    Status,
    /// Sign in with Steam in your browser
    Login,
    /// Sign in with an existing session token
    Auth {
        token: String,
        /// Steam ID to link. Pass "" to unlink, omit to keep the current one
        #[arg(long)]
        steam_id: Option<String>,
    },
    /// Handle a sign-in callback URL (as received by the app's URL handler)
    Link { url: String },
    /// Handle callback URLs read from stdin, one per line, until EOF
    Listen,
    /// Unlink the Steam account but stay signed in
    Disconnect,
    /// Sign out and forget everything
    Logout,
    /// Your own Steam profile
    Profile,
    /// Your friends and what they're doing
    Friends,
    /// Your game library, most played first
    Games {
        /// Also print each game's icon URL
        #[arg(long)]
        icons: bool,
    },
    /// Achievements for a game, or the list of games to pick from
    Achievements { app_id: Option<u32> },
    /// Choose where credentials are kept: keyring, file or memory
    ///
    /// "file" is encrypted with the password in STEAM_VIEWER_PASSWORD.
    Storage {
        #[arg(value_parser = parse_storage)]
        method: TokenStorageMethod,
    },
}

fn parse_storage(value: &str) -> Result<TokenStorageMethod, String> {
    serde_json::from_value(serde_json::Value::String(value.to_owned()))
        .map_err(|_| format!("expected keyring, file or memory, got {value:?}"))
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Broker(#[from] BrokerError),
    #[error("{}\n{}", .0, .0.user_message())]
    Steam(#[from] SteamError),
    #[error("{0}")]
    SteamId(#[from] InvalidSteamId),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("deep link listener crashed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    set_print(cli.verbose);
    if let Err(e) = set_log_file(&APP_DIR.join("logs").join("steam_viewer.log")) {
        err!(no_log, "Couldn't set up log file: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // with --verbose, err! already printed it
            err!(no_log, "{e}");
            if !is_print() {
                eprintln!("{} {e}", "error:".red().bold());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config_path = cli.config.unwrap_or_else(ViewerConfig::default_path);
    if let Command::Storage { method } = cli.command {
        ViewerConfig::update(&config_path, |c| c.token_storage = Some(method)).await?;
        println!("Credentials will be kept in: {}", method.bold());
        return Ok(());
    }
    let config = ViewerConfig::load(&config_path)?.with_env(|name| std::env::var(name).ok());

    let password = std::env::var(ENV_STORE_PASSWORD).ok();
    let store = config.c_token_storage().into_store(&APP_DIR, password)?;
    let session = Arc::new(SessionManager::new(store));
    session.initialize().await;

    let broker = Arc::new(IdentityBroker::new(
        session.clone(),
        Arc::new(PastedRedirectSession::stdin()),
        config.c_redirect_uri(),
    ));

    match cli.command {
        Command::Status => views::status(&session.snapshot()),
        Command::Login => match broker.begin_login().await? {
            LoginOutcome::Linked(id) => println!("Linked Steam account {}", id.bold()),
            LoginOutcome::Cancelled => println!("Sign-in cancelled"),
        },
        Command::Auth { token, steam_id } => {
            let identity = match steam_id {
                Some(value) => IdentityUpdate::from_value(&value)?,
                None => IdentityUpdate::Keep,
            };
            session.authenticate(&token, identity).await;
            views::status(&session.snapshot());
        }
        Command::Link { url } => print_link(broker.handle_deep_link(&url).await),
        Command::Listen => listen(broker, &session).await?,
        Command::Disconnect => {
            session.disconnect_identity().await;
            println!("Steam account unlinked");
        }
        Command::Logout => {
            session.logout().await;
            println!("Signed out");
        }
        Command::Profile => {
            let client = steam_client(&config, &config_path)?;
            let profile = load_profile(&client, session.steam_id().as_ref()).await;
            show(
                LoadState::from_result(profile, Option::is_none),
                "Steam has no profile for this account",
                |p| p.iter().for_each(views::profile),
            )?;
        }
        Command::Friends => {
            let client = steam_client(&config, &config_path)?;
            let friends = load_friends(&client, session.steam_id().as_ref()).await;
            show(
                LoadState::from_result(friends, Vec::is_empty),
                "No friends to show",
                |f| views::friends(&f),
            )?;
        }
        Command::Games { icons } => {
            let client = steam_client(&config, &config_path)?;
            let library = load_owned_games(&client, session.steam_id().as_ref()).await;
            show(
                LoadState::from_result(library, GameLibrary::is_empty),
                "No games found",
                |l| views::games(&l, icons),
            )?;
        }
        Command::Achievements { app_id: None } => {
            let client = steam_client(&config, &config_path)?;
            let library = load_achievement_games(&client, session.steam_id().as_ref()).await;
            show(
                LoadState::from_result(library, GameLibrary::is_empty),
                "No played games found",
                |l| views::achievement_games(&l),
            )?;
        }
        Command::Achievements {
            app_id: Some(app_id),
        } => {
            let client = steam_client(&config, &config_path)?;
            let report = load_achievements(&client, session.steam_id().as_ref(), app_id).await;
            show(
                LoadState::from_result(report, AchievementReport::is_empty),
                "This game has no achievements",
                |r| views::achievements(&r),
            )?;
        }
        Command::Storage { .. } => {}
    }
    Ok(())
}

fn steam_client(config: &ViewerConfig, path: &std::path::Path) -> Result<SteamClient, AppError> {
    Ok(SteamClient::new(config.c_steam(path)?))
}

fn show<T>(state: LoadState<T>, empty: &str, render: impl FnOnce(T)) -> Result<(), AppError> {
    let retry = state.can_retry();
    match state {
        LoadState::Loading => {}
        LoadState::Empty => println!("{}", empty.bright_black()),
        LoadState::Ready(value) => render(value),
        LoadState::Failed(e) => {
            if retry {
                println!("{}", "Run the command again to retry.".bright_black());
            }
            return Err(e.into());
        }
    }
    Ok(())
}

fn print_link(outcome: DeepLinkOutcome) {
    match outcome {
        DeepLinkOutcome::Linked(id) => println!("Linked Steam account {}", id.bold()),
        DeepLinkOutcome::AlreadyLinked => println!("A Steam account is already linked, ignored"),
        DeepLinkOutcome::Duplicate => println!("Already handled this link"),
        DeepLinkOutcome::NoIdentifier => println!("{}", "No Steam ID in that link".yellow()),
    }
}

async fn listen(
    broker: Arc<IdentityBroker>,
    broker_session: &SessionManager,
) -> Result<(), AppError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = broker.listen(rx);
    info!("Waiting for sign-in links on stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if tx.send(line.to_owned()).is_err() {
            break;
        }
    }
    drop(tx);
    handle.await?;
    views::status(&broker_session.snapshot());
    Ok(())
}
