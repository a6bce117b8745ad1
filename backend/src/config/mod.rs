//! Central module for application-wide configuration settings.
//!
//! Configuration is layered with figment: built-in defaults, then an optional
//! YAML file, then `FUNAPPS_`-prefixed environment variables.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Read when no `--config` is given and the file exists.
pub const DEFAULT_CONFIG_FILE: &str = "funapps.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file does not exist: {0}")]
    MissingFile(String),

    #[error(transparent)]
    Figment(#[from] figment::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub max_connections: u32,
    /// Deployment identity ad snippets are keyed by.
    pub site_id: i64,
    /// Filter the index by the language named in the request subdomain.
    pub locale_enabled: bool,
    pub default_locale: String,
    pub related_limit: usize,
    pub index_page_size: u32,
    pub monitor_page_size: u32,
    /// Uid exposed for signed-in users without a social account.
    pub fallback_uid: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            database_url: "sqlite://funapps.db?mode=rwc".to_string(),
            max_connections: 5,
            site_id: 1,
            locale_enabled: false,
            default_locale: "en".to_string(),
            related_limit: 12,
            index_page_size: 13,
            monitor_page_size: 60,
            fallback_uid: "4".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::MissingFile(path.display().to_string()));
                }
                figment = figment.merge(Yaml::file(path));
            }
            None => figment = figment.merge(Yaml::file(DEFAULT_CONFIG_FILE)),
        }

        let config: Config = figment.merge(Env::prefixed("FUNAPPS_")).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index_page_size == 0 || self.monitor_page_size == 0 {
            return Err(ConfigError::Invalid("page sizes must be positive".into()));
        }
        if self.related_limit == 0 {
            return Err(ConfigError::Invalid("related_limit must be positive".into()));
        }
        if self.default_locale.trim().is_empty() {
            return Err(ConfigError::Invalid("default_locale must not be empty".into()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid("max_connections must be positive".into()));
        }
        Ok(())
    }
}
