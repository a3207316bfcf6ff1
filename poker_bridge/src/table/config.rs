//! Match configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::messages::StartRequest;
use crate::game::{engine::EngineError, entities::Chips};

/// Most opponents a single table can seat.
pub const MAX_TABLE_OPPONENTS: usize = 9;

/// Longest a human decision may stay open.
pub const MAX_DECISION_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Bot difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotDifficulty {
    Easy,     // Loose-passive, high VPIP (45%), low aggression
    Standard, // Balanced, moderate VPIP (30%), TAG-style
    Tag,      // Tight-aggressive, low VPIP (20%), high aggression
}

impl std::fmt::Display for BotDifficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotDifficulty::Easy => write!(f, "easy"),
            BotDifficulty::Standard => write!(f, "standard"),
            BotDifficulty::Tag => write!(f, "tag"),
        }
    }
}

impl std::str::FromStr for BotDifficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "standard" => Ok(Self::Standard),
            "tag" => Ok(Self::Tag),
            other => Err(format!("unknown bot difficulty `{other}`")),
        }
    }
}

#[derive(Debug, Error)]
pub enum StartError {
    #[error("invalid match configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to spawn match thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Server-wide settings every match starts from.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchDefaults {
    pub decision_timeout: Duration,
    pub think_min: Duration,
    pub think_max: Duration,
    /// Pause between a finished round and the next deal.
    pub round_pause: Duration,
    pub max_opponents: usize,
    pub difficulty: BotDifficulty,
    pub max_rounds: Option<u64>,
}

impl Default for MatchDefaults {
    fn default() -> Self {
        Self {
            decision_timeout: Duration::from_secs(30),
            think_min: Duration::from_millis(400),
            think_max: Duration::from_millis(1200),
            round_pause: Duration::from_millis(1500),
            max_opponents: 5,
            difficulty: BotDifficulty::Standard,
            max_rounds: None,
        }
    }
}

/// Settings of one match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    pub player_name: String,
    pub opponents: usize,
    pub starting_stack: Chips,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub difficulty: BotDifficulty,
    pub decision_timeout: Duration,
    pub think_min: Duration,
    pub think_max: Duration,
    pub round_pause: Duration,
    pub max_rounds: Option<u64>,
    max_opponents: usize,
}

impl MatchConfig {
    /// Combine a start request with the server defaults. The big blind is
    /// twice the requested blind.
    pub fn from_request(request: &StartRequest, defaults: &MatchDefaults) -> Result<Self, StartError> {
        let config = Self {
            player_name: request.player_name.trim().to_string(),
            opponents: request.opponents,
            starting_stack: request.starting_stack,
            small_blind: request.blind,
            big_blind: request.blind.saturating_mul(2),
            difficulty: request.difficulty.unwrap_or(defaults.difficulty),
            decision_timeout: request
                .decision_timeout_secs
                .map_or(defaults.decision_timeout, Duration::from_secs),
            think_min: defaults.think_min,
            think_max: defaults.think_max,
            round_pause: defaults.round_pause,
            max_rounds: defaults.max_rounds,
            max_opponents: defaults.max_opponents.min(MAX_TABLE_OPPONENTS),
        };
        config.validate().map_err(StartError::InvalidConfig)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.player_name.is_empty() {
            return Err("Player name must not be empty".to_string());
        }

        if self.player_name.chars().count() > 32 {
            return Err("Player name must be at most 32 characters".to_string());
        }

        if self.opponents == 0 || self.opponents > self.max_opponents {
            return Err(format!(
                "Opponents must be between 1 and {}",
                self.max_opponents
            ));
        }

        if self.small_blind == 0 {
            return Err("Blind must be positive".to_string());
        }

        if self.starting_stack < self.big_blind {
            return Err("Starting stack must cover the big blind".to_string());
        }

        let table_chips = Chips::try_from(self.seats())
            .ok()
            .and_then(|seats| self.starting_stack.checked_mul(seats));
        if table_chips.is_none() {
            return Err("Starting stack is too large for this many seats".to_string());
        }

        if self.decision_timeout.is_zero() {
            return Err("Decision timeout must be positive".to_string());
        }

        if self.decision_timeout > MAX_DECISION_TIMEOUT {
            return Err(format!(
                "Decision timeout must be at most {} seconds",
                MAX_DECISION_TIMEOUT.as_secs()
            ));
        }

        if self.think_max < self.think_min {
            return Err("Maximum think time must not be below the minimum".to_string());
        }

        Ok(())
    }

    /// Number of seats including the human.
    pub fn seats(&self) -> usize {
        self.opponents + 1
    }
}
