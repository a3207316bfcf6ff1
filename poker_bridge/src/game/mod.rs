//! Card game side of the bridge: entities shared with the session layer, the
//! engine contract, and a reference hold'em engine with its hand evaluator.

pub mod engine;
pub mod entities;
pub mod eval;

pub use engine::{
    DecisionPolicy, DecisionRequest, EngineError, GameEngine, HoldemEngine, NoopObserver,
    Payout, PolicyError, PolicyFn, RoundObserver, RoundOutcome, ShownHand, policy_fn,
};
pub use entities::{
    ActionKind, ActionRequest, Card, Chips, HUMAN_SEAT, LegalActions, MatchId, RaiseBounds, SeatId,
    Street, TableView,
};
