//! Bridge between the synchronous engine thread and polling HTTP clients.
//!
//! - [`TurnSignal`]: single-slot handoff of the human's action with timeout
//! - [`HumanGate`]: the human seat's [`DecisionPolicy`](crate::game::DecisionPolicy)
//! - [`SharedSession`] / [`MatchWriter`]: the state polls read, and the
//!   match-scoped handle the engine thread writes it through
//! - [`SnapshotBuilder`]: what the human may see of the table
//! - [`detect`]: round boundary classification from consecutive polls

pub mod errors;
pub mod gate;
pub mod signal;
pub mod snapshot;
pub mod state;
pub mod token;
pub mod transition;

pub use errors::{SnapshotError, SubmitError, SubmitResult};
pub use gate::HumanGate;
pub use signal::{Awaited, PendingDecision, TurnSignal, parse_action, validate_action};
pub use snapshot::{GameResult, RoundSnapshot, SeatSnapshot, SnapshotBuilder, TerminalRoundData};
pub use state::{MatchWriter, SessionState, SessionView, SharedSession};
pub use token::MatchToken;
pub use transition::{Detection, Observation, RoundPhase, detect};
