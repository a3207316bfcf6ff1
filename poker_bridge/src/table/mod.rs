//! Match lifecycle.
//!
//! - [`MatchManager`]: owns the session, starts, resets and replaces the
//!   single running match, and routes the human's actions to it
//! - [`run_match`]: body of the engine thread, one per match
//! - [`MatchConfig`]: per-match settings validated from a [`StartRequest`]
//!
//! ## Example
//!
//! ```no_run
//! use poker_bridge::table::{MatchDefaults, MatchManager, StartRequest};
//!
//! let manager = MatchManager::new(MatchDefaults::default());
//! let match_id = manager
//!     .start(&StartRequest {
//!         player_name: "Alice".to_string(),
//!         opponents: 2,
//!         starting_stack: 1000,
//!         blind: 10,
//!         difficulty: None,
//!         decision_timeout_secs: None,
//!     })
//!     .unwrap();
//!
//! let view = manager.state(None);
//! assert_eq!(view.match_id, match_id);
//! ```

pub mod config;
pub mod manager;
pub mod messages;
pub mod runner;

pub use config::{
    BotDifficulty, MAX_DECISION_TIMEOUT, MAX_TABLE_OPPONENTS, MatchConfig, MatchDefaults, StartError,
};
pub use manager::MatchManager;
pub use messages::{
    ActionBody, ActionResponse, ErrorResponse, ForceAdvanceResponse, StartRequest, StartResponse,
    StatusResponse,
};
pub use runner::{MatchContext, run_match};
