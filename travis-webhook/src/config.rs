//! Configuration module for environment variable parsing.
//!
//! All settings are read once at startup and handed to the web handlers
//! through [`crate::web::AppState`].

use std::env;
use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::error::ConfigError;

/// Default endpoint serving the Travis CI public key.
pub const DEFAULT_TRAVIS_CONFIG_URL: &str = "https://api.travis-ci.com/config";

/// Default image shown in the chat card header.
pub const DEFAULT_CARD_IMAGE_URL: &str =
    "https://travis-webhook.netlify.app/assets/travis-logo.png";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Chat webhook that receives the build notifications
    pub webhook_url: Url,

    /// Travis endpoint returning `config.notifications.webhook.public_key`
    pub travis_config_url: Url,

    /// Port for the web server to listen on
    pub port: u16,

    /// Timeout applied to the key fetch and the notification post
    pub request_timeout_ms: u64,

    /// Image shown in the chat card header
    pub card_image_url: String,

    /// Verbose logging when no `RUST_LOG` is set
    pub debug: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `WEBHOOK_URL` is required; everything else falls back to a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let webhook_url = match env::var("WEBHOOK_URL") {
            Ok(v) if !v.trim().is_empty() => parse_url("WEBHOOK_URL", v.trim())?,
            _ => return Err(ConfigError::Missing("WEBHOOK_URL")),
        };

        let travis_config_url = match env::var("TRAVIS_CONFIG_URL") {
            Ok(v) if !v.trim().is_empty() => parse_url("TRAVIS_CONFIG_URL", v.trim())?,
            _ => parse_url("TRAVIS_CONFIG_URL", DEFAULT_TRAVIS_CONFIG_URL)?,
        };

        Ok(Config {
            webhook_url,
            travis_config_url,

            port: parse_or("PORT", 8080),

            request_timeout_ms: parse_or("REQUEST_TIMEOUT_MS", 10_000),

            card_image_url: env::var("CARD_IMAGE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CARD_IMAGE_URL.to_string()),

            debug: env::var("DEBUG").map(|v| v == "true").unwrap_or(false),
        })
    }

    /// Build a configuration pointing at explicit endpoints, with defaults
    /// for everything else.
    pub fn new(webhook_url: Url, travis_config_url: Url) -> Self {
        Config {
            webhook_url,
            travis_config_url,
            port: 8080,
            request_timeout_ms: 10_000,
            card_image_url: DEFAULT_CARD_IMAGE_URL.to_string(),
            debug: false,
        }
    }

    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }

    /// Outbound request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { name, source })
}

/// Parse a numeric variable, warning and falling back on garbage.
fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
                default
            }
        },
        Err(_) => default,
    }
}
