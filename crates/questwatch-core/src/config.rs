//! Configuration management for questwatch.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use crate::types::WatchedQuest;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration.
///
/// This is loaded from `~/.config/questwatch/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Trigger endpoint settings
    pub server: ServerConfig,
    /// Tracked page and store settings
    pub tracker: TrackerConfig,
    /// Page fetch settings
    pub fetch: FetchConfig,
    /// Outbound email settings
    pub mail: MailConfig,
    /// Quests whose new instances trigger an alert
    pub watchlist: Vec<WatchedQuest>,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `QUESTWATCH_LISTEN_PORT`: Override the trigger endpoint port
    /// - `QUESTWATCH_PAGE_URL`: Override the tracked page URL
    /// - `QUESTWATCH_DB_PATH`: Override the store path
    /// - `QUESTWATCH_SMTP_USERNAME` / `QUESTWATCH_SMTP_PASSWORD`: SMTP credentials
    /// - `QUESTWATCH_MAIL_TO` / `QUESTWATCH_MAIL_FROM`: Alert addresses
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;

        // Override from environment
        if let Ok(val) = std::env::var("QUESTWATCH_LISTEN_PORT") {
            if let Ok(port) = val.parse() {
                config.server.listen_port = port;
                tracing::debug!("Override listen_port from env: {}", port);
            }
        }

        if let Ok(val) = std::env::var("QUESTWATCH_PAGE_URL") {
            tracing::debug!("Override page_url from env: {}", val);
            config.tracker.page_url = val;
        }

        if let Ok(val) = std::env::var("QUESTWATCH_DB_PATH") {
            tracing::debug!("Override database_path from env: {}", val);
            config.tracker.database_path = val;
        }

        if let Ok(val) = std::env::var("QUESTWATCH_SMTP_USERNAME") {
            config.mail.username = val;
        }

        if let Ok(val) = std::env::var("QUESTWATCH_SMTP_PASSWORD") {
            config.mail.password = val;
        }

        if let Ok(val) = std::env::var("QUESTWATCH_MAIL_TO") {
            config.mail.to = val;
        }

        if let Ok(val) = std::env::var("QUESTWATCH_MAIL_FROM") {
            config.mail.from = val;
        }

        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/questwatch/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "questwatch", "questwatch").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/questwatch`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "questwatch", "questwatch").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

/// Trigger endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port the trigger endpoint listens on
    pub listen_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen_port: 3000 }
    }
}

/// Tracked page and store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// URL of the page carrying the quest listing
    pub page_url: String,
    /// Path to the SQLite store (or `:memory:`)
    pub database_path: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            page_url: "https://www.wowhead.com/world-quests/na".to_string(),
            database_path: "questwatch.db".to_string(),
        }
    }
}

/// Page fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("questwatch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Outbound email settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Whether alerts are sent at all (logging still happens when disabled)
    pub enabled: bool,
    /// SMTP relay host
    pub smtp_host: String,
    /// SMTP relay port
    pub smtp_port: u16,
    /// SMTP username (usually overridden from the environment)
    pub username: String,
    /// SMTP password (usually overridden from the environment)
    pub password: String,
    /// From address for alerts
    pub from: String,
    /// To address for alerts
    pub to: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "email-smtp.us-west-2.amazonaws.com".to_string(),
            smtp_port: 465,
            username: String::new(),
            password: String::new(),
            from: String::new(),
            to: String::new(),
        }
    }
}

/// Default watch list: the four battle quests the original deployment tracked.
fn default_watchlist() -> Vec<WatchedQuest> {
    [
        (41896, "Operation Murloc Freedom"),
        (42023, "Black Rook Rumble"),
        (42025, "Bareback Brawl"),
        (41013, "Darkbrul Arena"),
    ]
    .into_iter()
    .map(|(id, name)| WatchedQuest {
        id,
        name: name.to_string(),
    })
    .collect()
}

impl AppConfig {
    /// Configuration with the default watch list filled in.
    ///
    /// `Default::default` keeps the watch list empty so deserialization of a
    /// config file without a `watchlist` table stays explicit; callers that
    /// want the stock deployment use this instead.
    #[must_use]
    pub fn with_default_watchlist() -> Self {
        let mut config = Self::default();
        config.watchlist = default_watchlist();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.listen_port, 3000);
        assert_eq!(
            config.tracker.page_url,
            "https://www.wowhead.com/world-quests/na"
        );
        assert_eq!(config.fetch.timeout_secs, 30);
        assert!(!config.mail.enabled);
        assert!(config.watchlist.is_empty());
    }

    #[test]
    fn test_default_watchlist() {
        let config = AppConfig::with_default_watchlist();
        assert_eq!(config.watchlist.len(), 4);
        assert_eq!(config.watchlist[0].id, 41896);
        assert_eq!(config.watchlist[0].name, "Operation Murloc Freedom");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            listen_port = 8080

            [[watchlist]]
            id = 41013
            name = "Darkbrul Arena"
            "#,
        )
        .expect("parse partial config");

        assert_eq!(config.server.listen_port, 8080);
        // Unspecified sections fall back to defaults
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.watchlist.len(), 1);
        assert_eq!(config.watchlist[0].id, 41013);
    }

    #[test]
    fn test_roundtrip_serialization() {
        let config = AppConfig::with_default_watchlist();
        let toml_str = toml::to_string_pretty(&config).expect("serialize config");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("reparse config");
        assert_eq!(parsed.watchlist, config.watchlist);
        assert_eq!(parsed.server.listen_port, config.server.listen_port);
    }
}
