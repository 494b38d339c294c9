//! Layered configuration.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. `<config_dir>/adhyayan/config.toml`
//! 3. `./adhyayan.toml`
//! 4. `ADHYAYAN_*` environment variables, `__` separating sections
//!    (`ADHYAYAN_SESSION__KEY` -> `session.key`)

use chrono::NaiveDate;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::PathBuf;
use thiserror::Error;

use crate::session::DEFAULT_SESSION_KEY;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

fn default_session_key() -> String {
    DEFAULT_SESSION_KEY.to_string()
}

const fn default_wrap_width() -> usize {
    72
}

fn default_date_format() -> String {
    "%b %-d, %Y".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Key the `{user, userType}` record is stored under.
    #[serde(default = "default_session_key")]
    pub key: String,

    /// SQLite file holding the saved session. Platform data dir when unset.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key: default_session_key(),
            db_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Column to wrap long text (notification bodies, event descriptions) at.
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,

    /// chrono format string for dates.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl DisplayConfig {
    /// Render `date` with `date_format`. `None` when the format needs fields
    /// a calendar date does not have (`%H`, `%Z`, ...) or does not parse.
    pub fn format_date(&self, date: NaiveDate) -> Option<String> {
        let mut out = String::new();
        write!(out, "{}", date.format(&self.date_format)).ok()?;
        Some(out)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            wrap_width: default_wrap_width(),
            date_format: default_date_format(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PortalConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl PortalConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from("adhyayan.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("ADHYAYAN_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "adhyayan")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.key.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "session.key".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.display.wrap_width < 20 {
            return Err(ConfigError::InvalidValue {
                field: "display.wrap_width".to_string(),
                reason: format!("{} is narrower than 20 columns", self.display.wrap_width),
            });
        }
        let sample = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default();
        if self.display.format_date(sample).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "display.date_format".to_string(),
                reason: format!("'{}' is not a valid date format", self.display.date_format),
            });
        }
        Ok(())
    }
}
