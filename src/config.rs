//! Engine configuration parsing and validation.

use std::fs;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Deserialize;

use crate::activity::ConversationFilter;
use crate::window::{parse_timezone, DateWindowCalculator};
use crate::{AppError, Result};

/// Directory name used under the user cache directory.
const APP_CACHE_DIR: &str = "slack-activity";

/// File name of the persistent identity cache.
const IDENTITY_CACHE_FILE: &str = "identities.json";

fn default_timezone() -> String {
    "UTC".into()
}

/// Engine configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Directory that receives exported archives.
    pub output_dir: PathBuf,
    /// IANA timezone defining the export day.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Conversation name globs to include; empty includes everything.
    #[serde(default)]
    pub include_patterns: Vec<String>,
    /// Conversation name globs to exclude; wins over includes.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    /// Identity cache file; defaults to the user cache directory.
    #[serde(default)]
    pub identity_cache_path: Option<PathBuf>,
    /// slackdump credential cache; defaults to the platform location.
    #[serde(default)]
    pub credential_cache_dir: Option<PathBuf>,
    /// Local hour at which the export day starts.
    #[serde(default)]
    pub day_start_hour: u32,
}

impl EngineConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Parsed timezone.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidTimezone` if the zone name is unknown.
    pub fn tz(&self) -> Result<Tz> {
        parse_timezone(&self.timezone)
    }

    /// Compiled include/exclude filter.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an invalid glob.
    pub fn filter(&self) -> Result<ConversationFilter> {
        ConversationFilter::new(&self.include_patterns, &self.exclude_patterns)
    }

    /// Window calculator honouring `day_start_hour`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the hour is out of range.
    pub fn window_calculator(&self) -> Result<DateWindowCalculator> {
        DateWindowCalculator::with_day_start_hour(self.day_start_hour)
    }

    /// Resolved identity cache path.
    #[must_use]
    pub fn identity_cache_path(&self) -> PathBuf {
        if let Some(path) = &self.identity_cache_path {
            return path.clone();
        }
        dirs::cache_dir()
            .map_or_else(|| self.output_dir.join(".cache"), |dir| dir.join(APP_CACHE_DIR))
            .join(IDENTITY_CACHE_FILE)
    }

    fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(AppError::Config("output_dir must not be empty".into()));
        }
        self.tz()
            .map_err(|_| AppError::Config(format!("unknown timezone {:?}", self.timezone)))?;
        self.filter()?;
        self.window_calculator()?;
        Ok(())
    }
}
