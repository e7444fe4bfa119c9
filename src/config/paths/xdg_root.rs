//! XDG Base Directory utilities for store and config locations.

use crate::error::ApiError;
use std::path::PathBuf;

/// Application name used to namespace every per-user directory
pub const APP_NAME: &str = "timeline-for-humanity";

fn non_empty_env(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Get the per-user cache directory
///
/// Returns `$XDG_CACHE_HOME` if set, otherwise the platform cache directory
/// (`$HOME/.cache` on Linux, `~/Library/Caches` on macOS).
pub fn cache_home() -> Option<PathBuf> {
    non_empty_env("XDG_CACHE_HOME")
        .or_else(|| directories::BaseDirs::new().map(|dirs| dirs.cache_dir().to_path_buf()))
}

/// Get the application cache directory
///
/// Returns `<cache home>/timeline-for-humanity/`. The timeline and photo
/// stores live underneath it by default.
pub fn app_cache_dir() -> Result<PathBuf, ApiError> {
    cache_home().map(|dir| dir.join(APP_NAME)).ok_or_else(|| {
        ApiError::ConfigError(
            "Could not determine user cache directory (HOME not set)".to_string(),
        )
    })
}

/// Get XDG config home directory
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise defaults to `$HOME/.config`
pub fn config_home() -> Result<PathBuf, ApiError> {
    if let Some(xdg_config_home) = non_empty_env("XDG_CONFIG_HOME") {
        return Ok(xdg_config_home);
    }

    let home = non_empty_env("HOME").ok_or_else(|| {
        ApiError::ConfigError(
            "Could not determine XDG config home directory (HOME not set)".to_string(),
        )
    })?;

    Ok(home.join(".config"))
}

/// Get global config file path
///
/// Returns `$XDG_CONFIG_HOME/timeline-for-humanity/config.toml`. The file need not exist.
pub fn global_config_path() -> Result<PathBuf, ApiError> {
    Ok(config_home()?.join(APP_NAME).join("config.toml"))
}
