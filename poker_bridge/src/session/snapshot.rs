//! Client-facing snapshots built from engine views.
//!
//! Snapshots are plain immutable values. They are fully built before the
//! session lock is taken and installed by value.

use serde::{Deserialize, Serialize};

use super::errors::SnapshotError;
use crate::game::{
    engine::{Payout, RoundOutcome, ShownHand},
    entities::{Card, Chips, LegalActions, SeatId, SeatView, Street, TableView},
};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeatSnapshot {
    pub id: SeatId,
    pub name: String,
    pub stack: Chips,
    /// Wager on the current street.
    pub wagered: Chips,
    pub invested: Chips,
    pub folded: bool,
    pub all_in: bool,
    /// Dealt into this round.
    pub active: bool,
    pub is_human: bool,
    /// Hole cards visible to the viewer. Empty when hidden.
    pub cards: Vec<Card>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundSnapshot {
    pub round_seq: u64,
    pub street: Street,
    pub seats: Vec<SeatSnapshot>,
    pub board: Vec<Card>,
    pub pot: Chips,
    pub button: SeatId,
    pub acting_seat: Option<SeatId>,
    /// Present only when the viewer is the seat to act.
    pub legal_actions: Option<LegalActions>,
}

impl RoundSnapshot {
    /// Whether any seat is dealt into the round this snapshot shows.
    pub fn has_live_seats(&self) -> bool {
        self.seats.iter().any(|s| s.active)
    }
}

/// Result of a finished round, kept until the client has seen it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TerminalRoundData {
    pub round_seq: u64,
    pub winners: Vec<Payout>,
    /// Seats after the payout.
    pub final_seats: Vec<SeatSnapshot>,
    pub pot: Chips,
    pub board: Vec<Card>,
    pub shown_hands: Vec<ShownHand>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameResult {
    /// Seat holding every chip, if the match ended that way.
    pub winner: Option<SeatId>,
    pub human_busted: bool,
    pub rounds_played: u64,
    pub final_stacks: Vec<Chips>,
}

/// Builds what one viewer may see of an engine view.
#[derive(Clone, Copy, Debug)]
pub struct SnapshotBuilder {
    viewer: SeatId,
}

impl SnapshotBuilder {
    pub fn new(viewer: SeatId) -> Self {
        Self { viewer }
    }

    /// Build a live snapshot. `legal` is attached only when the viewer is
    /// the acting seat.
    pub fn build(
        &self,
        view: &TableView,
        legal: Option<&LegalActions>,
    ) -> Result<RoundSnapshot, SnapshotError> {
        validate(view)?;
        let legal_actions = match view.acting {
            Some(seat) if seat == self.viewer => legal.copied(),
            _ => None,
        };
        Ok(RoundSnapshot {
            round_seq: view.round_seq,
            street: view.street,
            seats: self.seats(view),
            board: view.board.clone(),
            pot: view.pot(),
            button: view.button,
            acting_seat: view.acting,
            legal_actions,
        })
    }

    pub fn terminal(
        &self,
        view: &TableView,
        outcome: &RoundOutcome,
    ) -> Result<TerminalRoundData, SnapshotError> {
        validate(view)?;
        Ok(TerminalRoundData {
            round_seq: outcome.round_seq,
            winners: outcome.payouts.clone(),
            final_seats: self.seats(view),
            pot: outcome.pot,
            board: outcome.board.clone(),
            shown_hands: outcome.shown_hands.clone(),
        })
    }

    fn seats(&self, view: &TableView) -> Vec<SeatSnapshot> {
        let showdown = view.street == Street::Showdown;
        view.seats
            .iter()
            .map(|seat| SeatSnapshot {
                id: seat.id,
                name: seat.name.clone(),
                stack: seat.stack,
                wagered: seat.street_bet,
                invested: seat.invested,
                folded: seat.folded,
                all_in: seat.all_in(),
                active: seat.in_hand,
                is_human: seat.is_human,
                cards: self.visible_cards(seat, showdown),
            })
            .collect()
    }

    fn visible_cards(&self, seat: &SeatView, showdown: bool) -> Vec<Card> {
        let revealed = showdown && seat.in_hand && !seat.folded;
        if seat.id == self.viewer || revealed {
            seat.hole_cards.clone()
        } else {
            Vec::new()
        }
    }
}

fn validate(view: &TableView) -> Result<(), SnapshotError> {
    if view.seats.is_empty() {
        return Err(SnapshotError::NoSeats);
    }
    if let Some((index, seat)) = view.seats.iter().enumerate().find(|(i, s)| s.id != *i) {
        return Err(SnapshotError::SeatIdMismatch { index, id: seat.id });
    }
    if let Some(acting) = view.acting.filter(|&a| a >= view.seats.len()) {
        return Err(SnapshotError::UnknownActingSeat(acting));
    }
    if view.board.len() > 5 {
        return Err(SnapshotError::BoardTooLarge(view.board.len()));
    }
    Ok(())
}
