// src/config.rs
//
// User settings, stored as JSON next to the other app data.
// Precedence: CLI flags > environment > config file > defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::get_database_path;
use crate::error::{AppError, AppResult};
use crate::services::StatsOptions;

const CONFIG_DIR: &str = "seriesguide";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_PUBLISH_INTERVAL_MS: u64 = 1000;
const MIN_PUBLISH_INTERVAL_MS: u64 = 50;

pub const ENV_DATABASE_PATH: &str = "SERIESGUIDE_DB";
pub const ENV_INCLUDE_SPECIALS: &str = "SERIESGUIDE_INCLUDE_SPECIALS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Count season 0 episodes in episode totals and watched runtime
    pub include_specials: bool,
    /// Minimum spacing of intermediate runtime updates
    pub publish_interval_ms: u64,
    /// Database file, `None` for the platform data directory
    pub database_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            include_specials: true,
            publish_interval_ms: DEFAULT_PUBLISH_INTERVAL_MS,
            database_path: None,
        }
    }
}

impl AppConfig {
    /// Load from the default location, then apply environment overrides.
    /// Never writes; the file only appears once settings are saved.
    pub fn load() -> AppResult<Self> {
        Self::load_file()?.with_env_overrides()
    }

    /// The settings stored in the config file, without environment overrides
    pub fn load_file() -> AppResult<Self> {
        load_from(&config_path()?)
    }

    pub fn save(&self) -> AppResult<()> {
        let path = config_path()?;
        save(&path, self)?;
        log::info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn set_publish_interval_ms(&mut self, interval_ms: u64) {
        self.publish_interval_ms = interval_ms;
        normalize_config(self);
    }

    pub fn with_env_overrides(self) -> AppResult<Self> {
        self.with_overrides(
            std::env::var(ENV_DATABASE_PATH).ok(),
            std::env::var(ENV_INCLUDE_SPECIALS).ok(),
        )
    }

    fn with_overrides(
        mut self,
        database_path: Option<String>,
        include_specials: Option<String>,
    ) -> AppResult<Self> {
        if let Some(path) = database_path.filter(|p| !p.trim().is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = include_specials {
            self.include_specials = parse_bool(&raw).ok_or_else(|| {
                AppError::Config(format!("{} must be true or false, got '{}'", ENV_INCLUDE_SPECIALS, raw))
            })?;
        }
        Ok(self)
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms)
    }

    pub fn resolved_database_path(&self) -> AppResult<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => get_database_path(),
        }
    }

    pub fn stats_options(&self) -> StatsOptions {
        StatsOptions {
            exclude_specials: !self.include_specials,
            publish_interval: self.publish_interval(),
        }
    }
}

/// Read the config at `path`. A missing file means defaults.
/// A corrupt file is left in place and defaults are used until it is fixed or saved over.
pub fn load_from(path: &Path) -> AppResult<AppConfig> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(path)?;
    match serde_json::from_str::<AppConfig>(&raw) {
        Ok(mut config) => {
            normalize_config(&mut config);
            Ok(config)
        }
        Err(e) => {
            log::warn!("Config at {} is unreadable ({}), using defaults", path.display(), e);
            Ok(AppConfig::default())
        }
    }
}

pub fn save(path: &Path, config: &AppConfig) -> AppResult<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn config_path() -> AppResult<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| AppError::Config("Could not determine config directory".to_string()))?;
    Ok(dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

fn normalize_config(config: &mut AppConfig) {
    if config.publish_interval_ms < MIN_PUBLISH_INTERVAL_MS {
        config.publish_interval_ms = MIN_PUBLISH_INTERVAL_MS;
    }
    if config
        .database_path
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        config.database_path = None;
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
