use anyhow::Result;
use std::path::PathBuf;

pub const APP_DIR: &str = ".passman";
pub const DB_FILE: &str = "passwords.db";
pub const LOG_FILE: &str = "passman.log";

/// Directory holding passman's default files, `~/.passman`.
///
/// Falls back to the working directory when no home directory is known.
pub fn app_dir() -> PathBuf {
    match dirs_next::home_dir() {
        Some(home_path) => home_path.join(APP_DIR),
        None => PathBuf::from("."),
    }
}

/// Default database location. Creates its directory if necessary but not
/// the file itself; the store creates that on first open.
pub fn default_database_path() -> Result<PathBuf> {
    let dir = app_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir.join(DB_FILE))
}

pub fn default_log_path() -> PathBuf {
    app_dir().join(LOG_FILE)
}
