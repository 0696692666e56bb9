use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use storage_engine::RefreshSettings;
use storage_logging::{refresh_info, refresh_warn};
use thiserror::Error;

use super::logging::LogDestination;

pub const DEFAULT_CONFIG_FILENAME: &str = "storage_app.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("unknown log level {0:?}")]
    LogLevel(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub refresh: RefreshSettings,
    /// Interval between consumer ticks.
    pub tick_ms: u64,
    /// Upper bound on ticks before the demo gives up waiting for a settled state.
    pub max_ticks: u64,
    pub log_destination: LogDestination,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh: RefreshSettings::default(),
            tick_ms: 16,
            max_ticks: 2_000,
            log_destination: LogDestination::Terminal,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}

/// Config path from the first command line argument, else the default file name.
pub fn config_path(arg: Option<String>) -> PathBuf {
    arg.map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME))
}

/// Reads `path`. A missing file yields `Ok(None)`.
pub fn try_load_config(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let config: AppConfig = ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.level_filter()?;
    Ok(Some(config))
}

/// Like [`try_load_config`], but falls back to defaults with a warning.
///
/// Runs before the logger exists, so the returned messages are logged by the
/// caller once logging is up.
pub fn load_config(path: &Path) -> (AppConfig, Vec<String>) {
    match try_load_config(path) {
        Ok(Some(config)) => (config, vec![format!("Loaded config from {:?}", path)]),
        Ok(None) => (
            AppConfig::default(),
            vec![format!("No config at {:?}, using defaults", path)],
        ),
        Err(err) => (
            AppConfig::default(),
            vec![format!("Ignoring config: {err}; using defaults")],
        ),
    }
}

pub fn report_config_messages(messages: &[String]) {
    for message in messages {
        if message.starts_with("Ignoring") {
            refresh_warn!("{message}");
        } else {
            refresh_info!("{message}");
        }
    }
}
