//! Session error types.

use thiserror::Error;

use crate::game::entities::{Chips, SeatId};

/// Why a submitted action was not accepted. A rejection never changes any
/// state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("no active match")]
    NoMatch,

    #[error("no pending decision")]
    NoPendingDecision,

    #[error("seat {submitted} cannot act, waiting on seat {pending}")]
    WrongSeat { submitted: SeatId, pending: SeatId },

    #[error("decision {submitted} is no longer pending (current: {current})")]
    StaleDecision { submitted: u64, current: u64 },

    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("amount must be a non-negative integer, got {0}")]
    InvalidAmount(i64),

    #[error("{0} is not allowed here")]
    IllegalAction(String),

    #[error("amount {amount} is outside {min}..={max}")]
    AmountOutOfBounds { amount: Chips, min: Chips, max: Chips },
}

impl SubmitError {
    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NoMatch => "no_match",
            Self::NoPendingDecision => "no_pending_decision",
            Self::WrongSeat { .. } => "wrong_seat",
            Self::StaleDecision { .. } => "stale_decision",
            Self::UnknownAction(_) => "unknown_action",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::IllegalAction(_) => "illegal_action",
            Self::AmountOutOfBounds { .. } => "amount_out_of_bounds",
        }
    }

    /// Rejections caused by timing (the decision moved on) rather than by
    /// malformed input.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::NoMatch
                | Self::NoPendingDecision
                | Self::WrongSeat { .. }
                | Self::StaleDecision { .. }
        )
    }
}

/// Engine views the snapshot builder refuses to publish.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("table view has no seats")]
    NoSeats,

    #[error("seat {index} carries id {id}")]
    SeatIdMismatch { index: usize, id: SeatId },

    #[error("acting seat {0} is not at the table")]
    UnknownActingSeat(SeatId),

    #[error("board has {0} cards")]
    BoardTooLarge(usize),

    #[error("round {offered} is older than installed round {installed}")]
    RoundRegressed { offered: u64, installed: u64 },
}

/// Session result type
pub type SubmitResult<T> = Result<T, SubmitError>;
