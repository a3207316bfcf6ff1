//! Shared session state and the engine thread's scoped writer.
//!
//! Every access is one short critical section. Nothing blocks or sleeps
//! while holding the lock, and values are built before it is taken.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

use super::{
    errors::SnapshotError,
    signal::PendingDecision,
    snapshot::{GameResult, RoundSnapshot, TerminalRoundData},
    transition::{Detection, Observation, RoundPhase, detect},
};
use crate::game::entities::{LegalActions, MatchId, SeatId};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    /// Match that owns this state; 0 when none does.
    pub match_id: MatchId,
    pub active: bool,
    pub snapshot: Option<RoundSnapshot>,
    pub pending: Option<PendingDecision>,
    pub thinking_seat: Option<SeatId>,
    pub terminal: Option<TerminalRoundData>,
    pub game_result: Option<GameResult>,
    /// Set when the engine thread died.
    pub error: Option<String>,
}

impl SessionState {
    pub fn observation(&self) -> Observation {
        Observation {
            round_seq: self.snapshot.as_ref().map_or(0, |s| s.round_seq),
            terminal_round: self.terminal.as_ref().map(|t| t.round_seq),
            live_seats: self
                .snapshot
                .as_ref()
                .is_some_and(RoundSnapshot::has_live_seats),
        }
    }

    pub fn view(&self, previous: Option<&Observation>) -> SessionView {
        let observation = self.observation();
        let detection = previous.map(|previous| detect(Some(previous), &observation));
        SessionView {
            active: self.active,
            match_id: self.match_id,
            snapshot: self.snapshot.clone(),
            pending_seat_id: self.pending.map(|p| p.seat),
            decision_id: self.pending.map(|p| p.decision_id),
            legal_actions: self.pending.map(|p| p.legal),
            thinking_seat_id: self.thinking_seat,
            terminal: self.terminal.clone(),
            game_result: self.game_result.clone(),
            error: self.error.clone(),
            phase: detection.map_or_else(|| observation.phase(), |d| d.phase),
            detection,
        }
    }
}

/// What `GET /state` returns. Always a consistent copy of one instant.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SessionView {
    pub active: bool,
    pub match_id: MatchId,
    pub snapshot: Option<RoundSnapshot>,
    pub pending_seat_id: Option<SeatId>,
    pub decision_id: Option<u64>,
    pub legal_actions: Option<LegalActions>,
    pub thinking_seat_id: Option<SeatId>,
    pub terminal: Option<TerminalRoundData>,
    pub game_result: Option<GameResult>,
    pub error: Option<String>,
    pub phase: RoundPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection: Option<Detection>,
}

impl SessionView {
    pub fn observation(&self) -> Observation {
        Observation {
            round_seq: self.snapshot.as_ref().map_or(0, |s| s.round_seq),
            terminal_round: self.terminal.as_ref().map(|t| t.round_seq),
            live_seats: self
                .snapshot
                .as_ref()
                .is_some_and(RoundSnapshot::has_live_seats),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SharedSession {
    inner: Arc<Mutex<SessionState>>,
}

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` under the lock. The state is plain data, so a poisoned lock
    /// is recovered rather than propagated.
    pub fn with<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn view(&self, previous: Option<&Observation>) -> SessionView {
        self.with(|state| state.view(previous))
    }

    /// Hand the session to a new match and return its writer.
    pub fn begin(&self, match_id: MatchId) -> MatchWriter {
        self.with(|state| {
            *state = SessionState {
                match_id,
                active: true,
                ..SessionState::default()
            }
        });
        MatchWriter {
            session: self.clone(),
            match_id,
        }
    }

    /// Forget everything. Writers of the previous match become stale.
    pub fn reset(&self) {
        self.with(|state| *state = SessionState::default());
    }

    /// Drop the round result on display. Returns whether there was one.
    pub fn clear_terminal(&self) -> bool {
        self.with(|state| state.terminal.take().is_some())
    }

    pub fn is_active(&self) -> bool {
        self.with(|state| state.active)
    }

    /// Drop the pending marker of match `match_id` once `decision_id` has
    /// been answered, so no poll advertises a decision that is already
    /// closed.
    pub fn resolve_pending(&self, match_id: MatchId, decision_id: u64) {
        self.with(|state| {
            let answered = state.match_id == match_id
                && state.pending.is_some_and(|p| p.decision_id == decision_id);
            if answered {
                state.pending = None;
            }
        });
    }
}

/// Engine-thread handle on the session, scoped to one match. Writes from a
/// match that has been reset or replaced are dropped.
#[derive(Clone, Debug)]
pub struct MatchWriter {
    session: SharedSession,
    match_id: MatchId,
}

impl MatchWriter {
    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn is_current(&self) -> bool {
        self.session
            .with(|state| state.active && state.match_id == self.match_id)
    }

    fn write<R>(&self, what: &str, f: impl FnOnce(&mut SessionState) -> R) -> Option<R> {
        self.session.with(|state| {
            if state.active && state.match_id == self.match_id {
                Some(f(state))
            } else {
                debug!("match {}: dropping {what}, session moved on", self.match_id);
                None
            }
        })
    }

    /// Install a live snapshot. With `clear_terminal`, a result from an
    /// earlier round is dropped in the same critical section.
    pub fn install_snapshot(
        &self,
        snapshot: RoundSnapshot,
        clear_terminal: bool,
    ) -> Result<(), SnapshotError> {
        self.write("snapshot", |state| {
            install(state, snapshot, clear_terminal)
        })
        .unwrap_or(Ok(()))
    }

    /// Publish the human's decision point: snapshot, legal actions and
    /// pending seat become visible together.
    pub fn publish_pending(
        &self,
        snapshot: RoundSnapshot,
        pending: PendingDecision,
    ) -> Result<(), SnapshotError> {
        self.write("pending decision", |state| {
            install(state, snapshot, true)?;
            state.pending = Some(pending);
            Ok(())
        })
        .unwrap_or(Ok(()))
    }

    /// Clear the pending marker if it still names `decision_id`.
    pub fn clear_pending(&self, decision_id: u64) {
        self.write("pending clear", |state| {
            if state.pending.is_some_and(|p| p.decision_id == decision_id) {
                state.pending = None;
            }
        });
    }

    pub fn set_thinking(&self, seat: SeatId) {
        self.write("thinking seat", |state| state.thinking_seat = Some(seat));
    }

    /// Clear the thinking marker only if it still names `seat`.
    pub fn clear_thinking_if(&self, seat: SeatId) {
        self.write("thinking clear", |state| {
            if state.thinking_seat == Some(seat) {
                state.thinking_seat = None;
            }
        });
    }

    pub fn publish_terminal(
        &self,
        terminal: TerminalRoundData,
        final_snapshot: RoundSnapshot,
    ) -> Result<(), SnapshotError> {
        self.write("round result", |state| {
            install(state, final_snapshot, false)?;
            state.pending = None;
            state.thinking_seat = None;
            state.terminal = Some(terminal);
            Ok(())
        })
        .unwrap_or(Ok(()))
    }

    pub fn finish(&self, result: GameResult) {
        self.write("game result", |state| {
            state.game_result = Some(result);
            state.active = false;
            state.pending = None;
            state.thinking_seat = None;
        });
    }

    pub fn fail(&self, message: String) {
        self.write("engine failure", |state| {
            state.error = Some(message);
            state.active = false;
            state.pending = None;
            state.thinking_seat = None;
        });
    }
}

fn install(
    state: &mut SessionState,
    snapshot: RoundSnapshot,
    clear_terminal: bool,
) -> Result<(), SnapshotError> {
    let regressed = state
        .snapshot
        .as_ref()
        .map(|s| s.round_seq)
        .filter(|&installed| snapshot.round_seq < installed);
    if let Some(installed) = regressed {
        warn!(
            "match {}: refusing snapshot of round {} over round {installed}",
            state.match_id, snapshot.round_seq
        );
        return Err(SnapshotError::RoundRegressed {
            offered: snapshot.round_seq,
            installed,
        });
    }
    if clear_terminal
        && state
            .terminal
            .as_ref()
            .is_some_and(|t| t.round_seq < snapshot.round_seq)
    {
        state.terminal = None;
    }
    state.snapshot = Some(snapshot);
    Ok(())
}
