//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use poker_bridge::table::{BotDifficulty, MAX_DECISION_TIMEOUT, MAX_TABLE_OPPONENTS, MatchDefaults};
use std::{net::SocketAddr, str::FromStr, time::Duration};

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus scrape address; no exporter when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Settings every match starts from
    pub match_defaults: MatchDefaults,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `metrics_bind_override` - Optional metrics address override (from CLI args)
    ///
    /// # Returns
    ///
    /// * `Result<ServerConfig, ConfigError>` - Loaded configuration or error
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        metrics_bind_override: Option<SocketAddr>,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(bind_override, metrics_bind_override, |key| {
            std::env::var(key).ok()
        })
    }

    /// Same as [`ServerConfig::from_env`] with variables read through `lookup`.
    pub fn from_lookup(
        bind_override: Option<SocketAddr>,
        metrics_bind_override: Option<SocketAddr>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_var(&lookup, "SERVER_BIND")?
                .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 6969))),
        };
        let metrics_bind = match metrics_bind_override {
            Some(bind) => Some(bind),
            None => parse_var(&lookup, "METRICS_BIND")?,
        };

        let fallback = MatchDefaults::default();
        let decision_timeout = parse_var::<u64>(&lookup, "DECISION_TIMEOUT_SECS")?
            .map_or(fallback.decision_timeout, Duration::from_secs);
        let think_min = parse_var::<u64>(&lookup, "THINK_MIN_MS")?
            .map_or(fallback.think_min, Duration::from_millis);
        let think_max = parse_var::<u64>(&lookup, "THINK_MAX_MS")?
            .map_or(fallback.think_max, Duration::from_millis);
        let round_pause = parse_var::<u64>(&lookup, "ROUND_PAUSE_MS")?
            .map_or(fallback.round_pause, Duration::from_millis);
        let max_opponents =
            parse_var(&lookup, "MAX_OPPONENTS")?.unwrap_or(fallback.max_opponents);
        let max_rounds = parse_var(&lookup, "MAX_ROUNDS")?.or(fallback.max_rounds);

        let difficulty = match lookup("DEFAULT_BOT_DIFFICULTY") {
            Some(value) => {
                value
                    .parse::<BotDifficulty>()
                    .map_err(|reason| ConfigError::Invalid {
                        var: "DEFAULT_BOT_DIFFICULTY".to_string(),
                        reason,
                    })?
            }
            None => fallback.difficulty,
        };

        Ok(ServerConfig {
            bind,
            metrics_bind,
            match_defaults: MatchDefaults {
                decision_timeout,
                think_min,
                think_max,
                round_pause,
                max_opponents,
                difficulty,
                max_rounds,
            },
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        let defaults = &self.match_defaults;

        if defaults.decision_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "DECISION_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if defaults.decision_timeout > MAX_DECISION_TIMEOUT {
            return Err(ConfigError::Invalid {
                var: "DECISION_TIMEOUT_SECS".to_string(),
                reason: format!("Must be at most {}", MAX_DECISION_TIMEOUT.as_secs()),
            });
        }

        if defaults.think_max < defaults.think_min {
            return Err(ConfigError::Invalid {
                var: "THINK_MAX_MS".to_string(),
                reason: format!(
                    "Must not be below THINK_MIN_MS ({})",
                    defaults.think_min.as_millis()
                ),
            });
        }

        if defaults.max_opponents == 0 || defaults.max_opponents > MAX_TABLE_OPPONENTS {
            return Err(ConfigError::Invalid {
                var: "MAX_OPPONENTS".to_string(),
                reason: format!("Must be between 1 and {MAX_TABLE_OPPONENTS}"),
            });
        }

        if defaults.max_rounds == Some(0) {
            return Err(ConfigError::Invalid {
                var: "MAX_ROUNDS".to_string(),
                reason: "Must be greater than 0 when set".to_string(),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse an optional variable. Unset is `None`; set but unparsable is an error.
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|value| {
            value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("`{value}`: {e}"),
            })
        })
        .transpose()
}
