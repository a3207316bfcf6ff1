//! # Poker Bridge
//!
//! Lets a human play no-limit hold'em against automated opponents through a
//! polling HTTP client, while a synchronous engine runs each match on its own
//! thread and calls back into per-seat decision policies.
//!
//! ## Architecture
//!
//! The engine thread never waits on HTTP and HTTP handlers never wait on the
//! engine. The two meet in the session:
//!
//! - Automated seats decide through a [`ThinkingProxy`](bot::ThinkingProxy),
//!   which marks the seat as thinking and paces the answer.
//! - The human seat decides through a [`HumanGate`](session::HumanGate): it
//!   publishes a snapshot with the legal actions, then blocks on a
//!   [`TurnSignal`](session::TurnSignal) until an action arrives, the
//!   decision times out (fold), or the match is torn down (fold).
//! - Round results are pushed into the session by an observer and the next
//!   round starts on the same thread.
//! - Clients classify round boundaries from consecutive polls with
//!   [`detect`](session::detect).
//!
//! ## Core Modules
//!
//! - [`game`]: engine contract, reference hold'em engine, hand evaluation
//! - [`bot`]: heuristic opponents and their pacing
//! - [`session`]: handoff, snapshots, shared state, round transitions
//! - [`table`]: match configuration, lifecycle and the engine thread

pub mod bot;
pub mod game;
pub mod session;
pub mod table;

pub use game::{
    ActionKind, ActionRequest, Card, Chips, DecisionPolicy, GameEngine, HoldemEngine,
    LegalActions, MatchId, SeatId, Street,
};
pub use session::{RoundPhase, SessionView, SubmitError, detect};
pub use table::{MatchDefaults, MatchManager, StartRequest};
