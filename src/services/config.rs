use crate::calm::CalmError;
use crate::domain::constants::CONFIG_ENV;
use crate::domain::models::CalmConfig;
use std::path::{Path, PathBuf};

/// `CALM_CONFIG`, else `$HOME/.config/calm/config.toml`. `None` when
/// neither is set.
pub fn config_path() -> Option<PathBuf> {
    resolve_config_path(std::env::var(CONFIG_ENV).ok(), std::env::var("HOME").ok())
}

fn resolve_config_path(explicit: Option<String>, home: Option<String>) -> Option<PathBuf> {
    explicit
        .map(PathBuf::from)
        .or_else(|| home.map(|h| PathBuf::from(h).join(".config/calm/config.toml")))
}

/// Reads the user config. A missing file, or no place to look for one,
/// yields the defaults.
pub fn load_config() -> anyhow::Result<CalmConfig> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(CalmConfig::default()),
    }
}

pub fn load_config_from(path: &Path) -> anyhow::Result<CalmConfig> {
    if !path.exists() {
        return Ok(CalmConfig::default());
    }
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw).map_err(|e| {
        CalmError::Config {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}
