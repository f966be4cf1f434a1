//! Terminal + log file output used by the [`crate::info`],
//! [`crate::pt`] and [`crate::err`] macros.
//!
//! Every line is passed through [`auto_redact`] first,
//! so API keys and session tokens never reach the terminal or disk.

use std::{
    collections::VecDeque,
    fmt::Display,
    io::Write,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        LazyLock, Mutex, OnceLock,
    },
};

use owo_colors::OwoColorize;
use regex::Regex;

mod macros;

/// Lines kept in memory. Older lines are dropped first.
const MEMORY_LOG_LIMIT: usize = 2000;

static IS_PRINT: AtomicBool = AtomicBool::new(true);
static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();
static LOGGER: LazyLock<Mutex<VecDeque<(String, LogType)>>> =
    LazyLock::new(|| Mutex::new(VecDeque::new()));

static SECRET_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(key|token|api_key)=[^&\s"']+"#).expect("static regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogType {
    Info,
    Error,
    Point,
}

impl Display for LogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                LogType::Info => "[info]",
                LogType::Error => "[error]",
                LogType::Point => "-",
            }
        )
    }
}

/// Whether log lines are echoed to the terminal.
#[must_use]
pub fn is_print() -> bool {
    IS_PRINT.load(Ordering::Relaxed)
}

pub fn set_print(print: bool) {
    IS_PRINT.store(print, Ordering::Relaxed);
}

/// Start mirroring log lines into `path`.
/// Only the first call has any effect.
pub fn set_log_file(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    _ = LOG_FILE.set(path.to_owned());
    Ok(())
}

/// Masks `key=...`/`token=...` query values.
#[must_use]
pub fn auto_redact(msg: &str) -> String {
    SECRET_PARAM.replace_all(msg, "$1=[REDACTED]").into_owned()
}

pub fn print_to_terminal(msg: &str, t: LogType) {
    match t {
        LogType::Info => println!("{} {msg}", t.yellow()),
        LogType::Error => eprintln!("{} {msg}", t.red()),
        LogType::Point => println!("{} {msg}", t.bold()),
    }
}

pub fn print_to_memory(msg: &str, t: LogType) {
    if let Ok(mut lines) = LOGGER.lock() {
        push_bounded(&mut *lines, (msg.to_owned(), t), MEMORY_LOG_LIMIT);
    }
}

fn push_bounded<T>(lines: &mut VecDeque<T>, line: T, limit: usize) {
    while lines.len() >= limit {
        lines.pop_front();
    }
    lines.push_back(line);
}

pub fn print_to_file(msg: &str, t: LogType) {
    print_to_memory(msg, t);

    let Some(path) = LOG_FILE.get() else {
        return;
    };
    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    else {
        return;
    };
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    _ = writeln!(file, "{now} {t} {msg}");
}

/// Snapshot of the in-memory log, oldest first.
#[must_use]
pub fn get_logs() -> Vec<(String, LogType)> {
    LOGGER
        .lock()
        .map(|l| l.iter().cloned().collect())
        .unwrap_or_default()
}
