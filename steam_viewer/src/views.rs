//! Terminal rendering of loaded Steam data.

use owo_colors::OwoColorize;
use sv_auth::{Session, SessionState};
use sv_steam::{
    format::{format_playtime, format_unlock_date},
    AchievementReport, FriendSummary, GameLibrary, PresenceState,
};

fn presence(p: PresenceState) -> String {
    let label = format!("{p:<8}");
    match p {
        PresenceState::Online => label.green().to_string(),
        PresenceState::Busy => label.red().to_string(),
        PresenceState::Away | PresenceState::Snooze => label.yellow().to_string(),
        PresenceState::Offline | PresenceState::Unknown => label.bright_black().to_string(),
    }
}

pub fn status(session: &Session) {
    let state = match session.state() {
        SessionState::Uninitialized | SessionState::Loading => "starting up",
        SessionState::Anonymous => "signed out",
        SessionState::AuthenticatedNoIdentity => "signed in, no Steam account linked",
        SessionState::AuthenticatedWithIdentity => "signed in",
    };
    println!("{} {state}", "Session:".bold());
    match &session.steam_id {
        Some(id) => println!("{} {id}", "Steam ID:".bold()),
        None => println!("{} {}", "Steam ID:".bold(), "none".bright_black()),
    }
}

pub fn profile(profile: &FriendSummary) {
    println!("{}", profile.display_name.bold());
    println!("  {}", presence(profile.presence));
    if let Some(game) = &profile.current_game {
        println!("  Playing {}", game.cyan());
    }
    println!("  Steam ID: {}", profile.steam_id);
    println!("  Avatar:   {}", profile.avatar_url.underline());
}

pub fn friends(friends: &[FriendSummary]) {
    println!("{} ({})", "Friends".bold(), friends.len());
    for friend in friends {
        match &friend.current_game {
            Some(game) => println!(
                "  {} {}  {}",
                presence(friend.presence),
                friend.display_name,
                game.cyan()
            ),
            None => println!("  {} {}", presence(friend.presence), friend.display_name),
        }
    }
}

pub fn games(library: &GameLibrary, icons: bool) {
    println!(
        "{} ({} games, {} played)",
        "Library".bold(),
        library.game_count,
        format_playtime(library.total_playtime_minutes)
    );
    for game in &library.games {
        println!(
            "  {:>8}  {:<40} {}",
            game.app_id.bright_black(),
            game.name,
            format_playtime(game.total_playtime_minutes)
        );
        if icons {
            if let Some(url) = game.icon_url() {
                println!("            {}", url.bright_black());
            }
        }
    }
}

pub fn achievement_games(library: &GameLibrary) {
    println!(
        "{}\nRun `achievements <APP_ID>` for one of these:",
        "Played games".bold()
    );
    for game in &library.games {
        println!("  {:>8}  {}", game.app_id, game.name);
    }
}

pub fn achievements(report: &AchievementReport) {
    let stats = report.stats;
    println!(
        "{} {}/{} unlocked ({}%)",
        "Achievements".bold(),
        stats.unlocked_count,
        stats.total_count,
        stats.percentage
    );
    if report.progress_unavailable {
        println!(
            "{}",
            "Couldn't read your progress for this game (is \"Game details\" public?), showing all as locked."
                .yellow()
        );
    }
    for achievement in &report.achievements {
        if achievement.achieved {
            println!(
                "  {} {}  {}",
                "[x]".green(),
                achievement.display_name.bold(),
                format_unlock_date(achievement.unlock_timestamp).bright_black()
            );
        } else {
            println!("  [ ] {}", achievement.display_name);
        }
        if !achievement.description.is_empty() {
            println!("      {}", achievement.description.bright_black());
        }
    }
}
