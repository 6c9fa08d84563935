use std::path::PathBuf;
use std::time::Duration;

use logitrack_client::DEFAULT_API_URL;
use logitrack_live::{ReconnectConfig, DEFAULT_WS_URL};

/// Directory holding the persisted session when none is configured.
pub const DEFAULT_SESSION_DIR: &str = ".logitrack";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Client configuration loaded from environment variables.
///
/// All fields have defaults pointing at a local development backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL, including the `/api` prefix.
    pub api_url: String,
    /// Live update endpoint.
    pub ws_url: String,
    /// Where the `token` and `user` slots are stored.
    pub session_dir: PathBuf,
    /// Backoff for the live channel; `None` disables reconnection.
    pub reconnect: Option<ReconnectConfig>,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                     |
    /// |----------------------------------|-----------------------------|
    /// | `LOGITRACK_API_URL`              | `http://localhost:3000/api` |
    /// | `LOGITRACK_WS_URL`               | `ws://localhost:3000`       |
    /// | `LOGITRACK_SESSION_DIR`          | `.logitrack`                |
    /// | `LOGITRACK_RECONNECT`            | `false`                     |
    /// | `LOGITRACK_RECONNECT_INITIAL_MS` | `1000`                      |
    /// | `LOGITRACK_RECONNECT_MAX_SECS`   | `30`                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("LOGITRACK_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        let ws_url = lookup("LOGITRACK_WS_URL").unwrap_or_else(|| DEFAULT_WS_URL.into());
        let session_dir = lookup("LOGITRACK_SESSION_DIR")
            .unwrap_or_else(|| DEFAULT_SESSION_DIR.into())
            .into();

        let enabled = match lookup("LOGITRACK_RECONNECT") {
            Some(value) => parse_bool("LOGITRACK_RECONNECT", &value)?,
            None => false,
        };

        let reconnect = if enabled {
            let defaults = ReconnectConfig::default();
            let initial_delay = match lookup("LOGITRACK_RECONNECT_INITIAL_MS") {
                Some(value) => Duration::from_millis(parse_positive(
                    "LOGITRACK_RECONNECT_INITIAL_MS",
                    &value,
                )?),
                None => defaults.initial_delay,
            };
            let max_delay = match lookup("LOGITRACK_RECONNECT_MAX_SECS") {
                Some(value) => {
                    Duration::from_secs(parse_positive("LOGITRACK_RECONNECT_MAX_SECS", &value)?)
                }
                None => defaults.max_delay,
            };
            Some(ReconnectConfig {
                initial_delay,
                max_delay: max_delay.max(initial_delay),
                ..defaults
            })
        } else {
            None
        };

        Ok(Self {
            api_url,
            ws_url,
            session_dir,
            reconnect,
        })
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            expected: "a boolean",
            value: value.to_string(),
        }),
    }
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            var,
            expected: "a positive integer",
            value: value.to_string(),
        }),
    }
}
