use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// Time-related constants
// =============================================================================

/// Default release metadata refresh interval in milliseconds (24 hours)
pub const DEFAULT_REFRESH_INTERVAL_MS: i64 = 24 * 60 * 60 * 1000;

/// Timeout for release API requests in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Default GraphQL endpoint serving release metadata
pub const DEFAULT_API_URL: &str = "https://api.fontawesome.com";

/// Runtime configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub releases: ReleasesConfig,
    pub multisite: MultisiteConfig,
}

/// Release metadata configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ReleasesConfig {
    /// GraphQL endpoint queried for available releases
    pub api_url: String,
    /// Release metadata refresh interval in milliseconds
    pub refresh_interval: i64,
}

impl Default for ReleasesConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL_MS,
        }
    }
}

/// Multisite configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct MultisiteConfig {
    /// Network whose options hold network-wide data such as release metadata
    pub main_network_id: u64,
    /// Site whose settings apply to the current process
    pub site_id: u64,
}

impl Default for MultisiteConfig {
    fn default() -> Self {
        Self {
            main_network_id: 1,
            site_id: 1,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Config {
    /// Loads configuration from a JSON file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Returns the path to the data directory for fa-requirements.
/// Uses $XDG_DATA_HOME/fa-requirements if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/fa-requirements,
/// or ./fa-requirements if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the options database file.
pub fn db_path() -> PathBuf {
    data_dir().join("options.db")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("fa-requirements.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("fa-requirements")
}
