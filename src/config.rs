//! Configuration for reelbot.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (credentials, REELBOT_STAGING_DIR)
//! 2. Config file (`--config`, REELBOT_CONFIG, or .reelbot/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .reelbot/config.yaml
//!
//! Credentials are never read from the config file and have no defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::adapters::{InstagramConfig, DEFAULT_CAPTION};
use crate::core::{PacingPolicy, SelectionPolicy, DEFAULT_STAGING_DIR};

/// Account name environment variable
pub const USERNAME_VAR: &str = "INSTAGRAM_USERNAME";

/// Access token environment variable
pub const ACCESS_TOKEN_VAR: &str = "INSTAGRAM_ACCESS_TOKEN";

/// Staging directory override
pub const STAGING_DIR_VAR: &str = "REELBOT_STAGING_DIR";

/// Errors raised while assembling configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingCredential(&'static str),

    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub selection: SelectionSection,
    #[serde(default)]
    pub pacing: PacingSection,
    #[serde(default)]
    pub staging: StagingSection,
    #[serde(default)]
    pub publish: PublishSection,
    #[serde(default)]
    pub instagram: InstagramSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionSection {
    pub lookback_days: Option<i64>,
    pub min_engagement: Option<u64>,
    pub max_scan: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PacingSection {
    pub after_download_secs: Option<u64>,
    pub after_publish_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StagingSection {
    /// Relative to the working directory
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishSection {
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstagramSection {
    pub api_base: Option<String>,
    pub upload_base: Option<String>,
    pub api_version: Option<String>,
    pub page_size: Option<u32>,
    pub status_poll_interval_secs: Option<u64>,
    pub max_status_polls: Option<u32>,
    pub request_timeout_secs: Option<u64>,
}

/// Account credentials, supplied through the environment
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    access_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            access_token: access_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Read both credentials from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read both credentials through `lookup`. Missing or blank values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingCredential(key))
        };

        Ok(Self {
            username: required(USERNAME_VAR)?,
            access_token: required(ACCESS_TOKEN_VAR)?,
        })
    }
}

/// Resolved settings with defaults applied
#[derive(Debug, Clone)]
pub struct Settings {
    pub selection: SelectionPolicy,
    pub pacing: PacingPolicy,
    pub staging_dir: PathBuf,
    pub caption: String,
    pub instagram: InstagramConfig,
    /// Path to config file (if one was used)
    pub config_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            selection: SelectionPolicy::default(),
            pacing: PacingPolicy::default(),
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            caption: DEFAULT_CAPTION.to_string(),
            instagram: InstagramConfig::default(),
            config_file: None,
        }
    }
}

impl Settings {
    /// Load settings from an explicit config path, or a discovered one, plus
    /// the process environment
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config_file = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(),
        };

        let file = match &config_file {
            Some(path) => load_config_file(path)?,
            None => ConfigFile::default(),
        };

        Self::resolve(file, config_file, |key| std::env::var(key).ok())
    }

    /// Apply a parsed config file and environment overrides on top of defaults
    pub fn resolve<F>(
        file: ConfigFile,
        config_file: Option<PathBuf>,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let lookback_days = file.selection.lookback_days.unwrap_or(7);
        if !(1..=36_500).contains(&lookback_days) {
            return Err(ConfigError::Invalid(format!(
                "selection.lookback_days must be between 1 and 36500, got {}",
                lookback_days
            )));
        }

        let selection = SelectionPolicy {
            lookback: chrono::Duration::days(lookback_days),
            min_engagement: file
                .selection
                .min_engagement
                .unwrap_or(defaults.selection.min_engagement),
            max_scan: file.selection.max_scan.unwrap_or(defaults.selection.max_scan),
        };

        let pacing = PacingPolicy {
            after_download: file
                .pacing
                .after_download_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.pacing.after_download),
            after_publish: file
                .pacing
                .after_publish_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.pacing.after_publish),
        };

        let staging_dir = lookup(STAGING_DIR_VAR)
            .filter(|v| !v.trim().is_empty())
            .or(file.staging.dir)
            .map(PathBuf::from)
            .unwrap_or(defaults.staging_dir);

        let caption = file
            .publish
            .caption
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(defaults.caption);

        let ig = file.instagram;
        let base = defaults.instagram;
        let instagram = InstagramConfig {
            api_base: ig.api_base.unwrap_or(base.api_base),
            upload_base: ig.upload_base.unwrap_or(base.upload_base),
            api_version: ig.api_version.unwrap_or(base.api_version),
            page_size: ig.page_size.unwrap_or(base.page_size),
            status_poll_interval: ig
                .status_poll_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(base.status_poll_interval),
            max_status_polls: ig.max_status_polls.unwrap_or(base.max_status_polls),
            request_timeout: ig
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(base.request_timeout),
        };

        if instagram.page_size == 0 {
            return Err(ConfigError::Invalid("instagram.page_size must be at least 1".into()));
        }
        if instagram.max_status_polls == 0 {
            return Err(ConfigError::Invalid(
                "instagram.max_status_polls must be at least 1".into(),
            ));
        }

        Ok(Self {
            selection,
            pacing,
            staging_dir,
            caption,
            instagram,
            config_file,
        })
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".reelbot").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
