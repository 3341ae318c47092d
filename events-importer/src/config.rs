//! Backend connection settings
//!
//! The endpoint URL and publishable key are read once at startup, after an
//! optional `.env` load, and checked before any spreadsheet row is touched.

use log::{debug, warn};
use std::fmt;
use thiserror::Error;
use url::Url;

/// Environment variable holding the Supabase project URL
pub const URL_VAR: &str = "VITE_SUPABASE_URL";
/// Environment variable holding the Supabase publishable (anon) key
pub const KEY_VAR: &str = "VITE_SUPABASE_PUBLISHABLE_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {var} is not set")]
    Missing { var: &'static str },

    #[error("environment variable {var} is not a valid URL: '{value}'")]
    InvalidUrl {
        var: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Validated connection settings for the backend
#[derive(Clone)]
pub struct Config {
    pub url: Url,
    pub api_key: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("url", &self.url.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Build the config from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the config from an arbitrary variable lookup
    ///
    /// Empty or whitespace-only values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = required(&lookup, URL_VAR)?;
        let api_key = required(&lookup, KEY_VAR)?;

        let url = match Url::parse(&raw_url) {
            Ok(url) => url,
            Err(source) => {
                return Err(ConfigError::InvalidUrl {
                    var: URL_VAR,
                    value: raw_url,
                    source,
                });
            }
        };

        Ok(Self { url, api_key })
    }
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing { var })
}

/// Load `.env` from the working directory (or a parent) if there is one.
/// Variables already present in the environment are left alone.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => debug!("No .env file found"),
        Err(err) => warn!("Ignoring unreadable .env file: {}", err),
    }
}
