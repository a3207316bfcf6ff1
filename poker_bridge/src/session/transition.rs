//! Round boundary detection from two consecutive polls.
//!
//! A poll can show a live round, a finished round whose result is still on
//! display, or both at once when the next round has started underneath a
//! result the client has not dismissed yet. The round sequence number is the
//! primary signal; terminal data disappearing while live seats are present
//! is the secondary one.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundPhase {
    /// A round is in progress and no result is on display.
    Live,
    /// The last round finished and its result is on display.
    Ended,
    /// A result is on display while a later round is already running.
    Transitioning,
}

/// What one poll showed.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Observation {
    /// Round of the live snapshot (0 before the first round).
    pub round_seq: u64,
    /// Round the terminal data belongs to, if any is present.
    pub terminal_round: Option<u64>,
    /// Whether the live snapshot has any seat dealt in.
    pub live_seats: bool,
}

impl Observation {
    pub fn phase(&self) -> RoundPhase {
        match self.terminal_round {
            None => RoundPhase::Live,
            Some(terminal) if self.round_seq > terminal => RoundPhase::Transitioning,
            Some(_) => RoundPhase::Ended,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Detection {
    pub phase: RoundPhase,
    /// The client should drop any round result it is showing.
    pub discard_terminal: bool,
    /// The round counter advanced since the previous poll.
    pub new_round: bool,
}

/// Classify `current` given the poll before it.
pub fn detect(previous: Option<&Observation>, current: &Observation) -> Detection {
    let phase = current.phase();
    let Some(previous) = previous else {
        return Detection {
            phase,
            discard_terminal: false,
            new_round: false,
        };
    };
    let new_round = current.round_seq > previous.round_seq;

    // The counter is authoritative.
    if new_round && phase == RoundPhase::Live {
        return Detection {
            phase,
            discard_terminal: true,
            new_round,
        };
    }

    // Terminal data for a round older than one already shown live.
    let stale = current
        .terminal_round
        .filter(|&t| previous.terminal_round.is_none() && t < previous.round_seq);
    if let Some(terminal) = stale {
        log::debug!("ignoring stale result for round {terminal}");
        return Detection {
            phase: RoundPhase::Live,
            discard_terminal: true,
            new_round,
        };
    }

    if previous.terminal_round.is_some() && current.terminal_round.is_none() {
        if current.live_seats {
            return Detection {
                phase: RoundPhase::Live,
                discard_terminal: true,
                new_round,
            };
        }
        // Neither a result nor live seats and the counter has not moved:
        // keep showing the result until a poll disambiguates.
        return Detection {
            phase: RoundPhase::Ended,
            discard_terminal: false,
            new_round,
        };
    }

    Detection {
        phase,
        discard_terminal: false,
        new_round,
    }
}
