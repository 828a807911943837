use std::path::PathBuf;

use dotenvy::dotenv;
use thiserror::Error;

use crate::application::handlers::delivery_scheduler::{
    DEFAULT_EXPIRATION_DELAY_SECONDS, DeliverySettings, MAX_EXPIRATION_DELAY_SECONDS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("An error occured while getting {0} env param")]
    Missing(&'static str),
    #[error("An error occured while parsing {name} env param: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub scheme: String,
    pub host: String,
    pub log_level: String,
    pub log_format: LogFormat,
    pub default_expiration_delay: u32,
    pub max_expiration_delay: u32,
    pub enabled_policies: Vec<String>,
    pub enabled_channels: Vec<String>,
    pub default_email_channel: Option<String>,
    pub transactional_email_channel: Option<String>,
    pub template_dir: PathBuf,
    pub file_email_dir: PathBuf,
    pub http_email_endpoint: Option<String>,
    pub http_email_api_key: Option<String>,
    pub http_email_from: Option<String>,
    pub push_endpoint: Option<String>,
    pub push_api_key: Option<String>,
    pub default_from_email: Option<String>,
    pub denied_messages: String,
}

impl Config {
    pub fn try_parse() -> Result<Config, ConfigError> {
        let _ = dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any key/value source; blank values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));
        let number = |name: &'static str, default: u32| -> Result<u32, ConfigError> {
            get(name).map_or(Ok(default), |value| {
                value.parse::<u32>().map_err(|err| ConfigError::Invalid {
                    name,
                    reason: err.to_string(),
                })
            })
        };
        let list = |name: &str| -> Vec<String> {
            get(name)
                .map(|value| {
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|item| !item.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        };

        let log_format = match get("LOG_FORMAT").as_deref().map(str::to_ascii_lowercase) {
            None => LogFormat::Pretty,
            Some(format) if format == "pretty" => LogFormat::Pretty,
            Some(format) if format == "json" => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    reason: format!("expected pretty or json, got '{other}'"),
                });
            }
        };

        Ok(Config {
            port: required("PORT")?
                .parse::<u16>()
                .map_err(|err| ConfigError::Invalid {
                    name: "PORT",
                    reason: err.to_string(),
                })?,
            scheme: required("SCHEME")?,
            host: required("HOST")?,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format,
            default_expiration_delay: number(
                "ACE_DEFAULT_EXPIRATION_DELAY",
                DEFAULT_EXPIRATION_DELAY_SECONDS,
            )?,
            max_expiration_delay: number("ACE_MAX_EXPIRATION_DELAY", MAX_EXPIRATION_DELAY_SECONDS)?
                .min(MAX_EXPIRATION_DELAY_SECONDS),
            enabled_policies: list("ACE_ENABLED_POLICIES"),
            enabled_channels: list("ACE_ENABLED_CHANNELS"),
            default_email_channel: get("ACE_CHANNEL_DEFAULT_EMAIL"),
            transactional_email_channel: get("ACE_CHANNEL_TRANSACTIONAL_EMAIL"),
            template_dir: get("ACE_TEMPLATE_DIR")
                .unwrap_or_else(|| "templates".to_string())
                .into(),
            file_email_dir: get("ACE_FILE_EMAIL_DIR")
                .unwrap_or_else(|| "ace_messages".to_string())
                .into(),
            http_email_endpoint: get("ACE_HTTP_EMAIL_ENDPOINT"),
            http_email_api_key: get("ACE_HTTP_EMAIL_API_KEY"),
            http_email_from: get("ACE_HTTP_EMAIL_FROM"),
            push_endpoint: get("ACE_PUSH_ENDPOINT"),
            push_api_key: get("ACE_PUSH_API_KEY"),
            default_from_email: get("DEFAULT_FROM_EMAIL"),
            denied_messages: get("ACE_DENIED_MESSAGES").unwrap_or_default(),
        })
    }

    pub fn server_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn delivery_settings(&self) -> DeliverySettings {
        DeliverySettings::from_seconds(self.default_expiration_delay, self.max_expiration_delay)
    }
}
