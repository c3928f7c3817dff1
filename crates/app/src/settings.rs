//! Handles settings for the application. Configuration is read from an
//! optional file (`settings.toml` by default) and from `DRESSCODE__*`
//! environment variables, the latter taking precedence.
//!
//! See `settings.example.toml` for the configuration.
use std::{path::Path, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use telegram_bot::RestrictionMode;

const ENV_PREFIX: &str = "DRESSCODE";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Database {
    pub url: String,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: "sqlite:./dresscode.db?mode=rwc".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Polling {
    /// Seconds.
    pub timeout: u64,
}

impl Default for Polling {
    fn default() -> Self {
        Self { timeout: 10 }
    }
}

impl Polling {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    pub token: String,
    #[serde(default)]
    pub polling: Polling,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Restriction {
    pub mode: RestrictionMode,
    pub whitelist: Vec<u64>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub database: Database,
    pub telegram: Option<Telegram>,
    #[serde(default)]
    pub restriction: Restriction,
}

impl Settings {
    pub fn new(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path),
            None => File::with_name("settings").required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("restriction.whitelist")
                    .with_list_parse_key("restriction.permissions"),
            )
            .build()?;

        settings.try_deserialize()
    }
}
