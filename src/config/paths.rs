//! Where the per-user `settings.toml` lives.
//!
//! `dirs::config_dir()` gives `%APPDATA%` on Windows,
//! `~/Library/Application Support` on macOS and `~/.config` on Linux.

use std::path::PathBuf;

const APP_DIR: &str = "memeforge";
const SETTINGS_FILE: &str = "settings.toml";

/// `<config dir>/memeforge/settings.toml`, or `./memeforge/settings.toml`
/// when the platform has no config dir.
pub fn settings_path() -> PathBuf {
    settings_path_in(dirs::config_dir())
}

fn settings_path_in(config_dir: Option<PathBuf>) -> PathBuf {
    config_dir
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(SETTINGS_FILE)
}
