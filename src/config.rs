//! Configuration types for rowfetch

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Environment variable holding the lookup endpoint base URL
pub const ENV_API_URL: &str = "API_URL";
/// Environment variable holding the Telegram bot token
pub const ENV_BOT_TOKEN: &str = "BOT_TOKEN";
/// Environment variable holding the Telegram chat id
pub const ENV_CHAT_ID: &str = "CHAT_ID";

/// Retry policy for transient lookup failures
///
/// The delay between attempts is fixed by default (`backoff_multiplier` = 1.0);
/// setting a multiplier above 1.0 grows the delay after each failed attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the initial one (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts (default: 10 seconds)
    #[serde(default = "default_retry_delay", with = "duration_serde")]
    pub delay: Duration,

    /// Multiplier applied to the delay after each failed attempt (default: 1.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay: default_retry_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Remote lookup endpoint configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Base URL of the lookup endpoint; the row id is appended as `?id={id}`
    pub base_url: String,

    /// Per-attempt request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Retry policy for transient failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            request_timeout: default_request_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

/// Concurrent fetch configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum number of lookups in flight at once (default: 8)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_lookups: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: default_max_concurrent(),
        }
    }
}

/// Completion notification configuration (Telegram sendMessage)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Bot token used to build the `bot{token}/sendMessage` path
    pub bot_token: String,

    /// Chat id the message is delivered to
    pub chat_id: String,

    /// API base URL (default: `https://api.telegram.org`); overridable for tests
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Delivery timeout (default: 10 seconds)
    #[serde(default = "default_notify_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_api_base(),
            timeout: default_notify_timeout(),
        }
    }
}

/// Main configuration for the pipeline
///
/// Resolved once at process start ([`Config::from_env`] or explicit
/// construction) and passed by reference to every component; nothing reads
/// process-wide state during execution.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote lookup endpoint settings
    #[serde(default)]
    pub lookup: LookupConfig,

    /// Concurrent fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Completion notification settings
    #[serde(default)]
    pub notification: NotificationConfig,
}

impl Config {
    /// Resolve configuration from the process environment
    ///
    /// Reads `API_URL`, `BOT_TOKEN`, and `CHAT_ID`, applies defaults for
    /// everything else, and validates the result. Call this once at startup.
    pub fn from_env() -> Result<Self> {
        Self::from_env_source(|key| std::env::var(key).ok())
    }

    fn from_env_source<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| -> Result<String> {
            get(key).filter(|v| !v.is_empty()).ok_or_else(|| Error::Config {
                message: format!("missing required environment variable {key}"),
                key: Some(key.to_string()),
            })
        };

        let config = Self {
            lookup: LookupConfig {
                base_url: require(ENV_API_URL)?,
                ..Default::default()
            },
            fetch: FetchConfig::default(),
            notification: NotificationConfig {
                bot_token: require(ENV_BOT_TOKEN)?,
                chat_id: require(ENV_CHAT_ID)?,
                ..Default::default()
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration, reporting the first invalid setting
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.lookup.base_url).map_err(|e| Error::Config {
            message: format!("invalid lookup base URL '{}': {e}", self.lookup.base_url),
            key: Some("lookup.base_url".to_string()),
        })?;

        Url::parse(&self.notification.api_base).map_err(|e| Error::Config {
            message: format!(
                "invalid notification API base '{}': {e}",
                self.notification.api_base
            ),
            key: Some("notification.api_base".to_string()),
        })?;

        if self.notification.bot_token.is_empty() {
            return Err(Error::Config {
                message: "notification bot token is empty".to_string(),
                key: Some("notification.bot_token".to_string()),
            });
        }

        if self.notification.chat_id.is_empty() {
            return Err(Error::Config {
                message: "notification chat id is empty".to_string(),
                key: Some("notification.chat_id".to_string()),
            });
        }

        if self.fetch.max_concurrent_lookups == 0 {
            return Err(Error::Config {
                message: "max_concurrent_lookups must be at least 1".to_string(),
                key: Some("fetch.max_concurrent_lookups".to_string()),
            });
        }

        Ok(())
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_concurrent() -> usize {
    8
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_notify_timeout() -> Duration {
    Duration::from_secs(10)
}

// Duration serialization helper (seconds as u64)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
