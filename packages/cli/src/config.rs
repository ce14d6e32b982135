use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use patentdesk_config::constants::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {source}")]
    InvalidNumber {
        name: &'static str,
        #[source]
        source: ParseIntError,
    },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("Invalid URL in {name}: {value}")]
    InvalidUrl { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub database_url: String,
    pub http_timeout: Duration,
    pub notification_retries: u32,
    pub identity_api_key: Option<String>,
    pub identity_url: String,
    pub session_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; unset and blank values take the default
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_base_url = get(PATENTDESK_API_BASE_URL)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        check_url(PATENTDESK_API_BASE_URL, &api_base_url)?;

        let identity_url = get(PATENTDESK_IDENTITY_URL)
            .unwrap_or_else(|| DEFAULT_IDENTITY_URL.to_string());
        check_url(PATENTDESK_IDENTITY_URL, &identity_url)?;

        let timeout_secs = match get(PATENTDESK_HTTP_TIMEOUT_SECS) {
            Some(v) => parse_positive::<u64>(PATENTDESK_HTTP_TIMEOUT_SECS, &v)?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let notification_retries = match get(PATENTDESK_NOTIFICATION_RETRIES) {
            Some(v) => parse_positive::<u32>(PATENTDESK_NOTIFICATION_RETRIES, &v)?,
            None => DEFAULT_NOTIFICATION_RETRIES,
        };

        Ok(Config {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            database_url: get(PATENTDESK_DATABASE_URL)
                .unwrap_or_else(patentdesk_config::default_database_url),
            http_timeout: Duration::from_secs(timeout_secs),
            notification_retries,
            identity_api_key: get(PATENTDESK_IDENTITY_API_KEY),
            identity_url,
            session_file: get(PATENTDESK_SESSION_FILE)
                .map(PathBuf::from)
                .unwrap_or_else(patentdesk_config::default_session_file),
        })
    }
}

fn check_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            name,
            value: value.to_string(),
        })
    }
}

fn parse_positive<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr<Err = ParseIntError> + PartialEq + Default,
{
    let parsed = value
        .trim()
        .parse::<T>()
        .map_err(|source| ConfigError::InvalidNumber { name, source })?;
    if parsed == T::default() {
        return Err(ConfigError::Zero(name));
    }
    Ok(parsed)
}
