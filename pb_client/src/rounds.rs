//! Which round result the client has on screen.
//!
//! Every poll is classified against the one before it with
//! [`detect`]; the tracker turns that into show and dismiss events so a
//! result stays up until the next round has really taken over.

use poker_bridge::session::{Detection, Observation, RoundPhase, SessionView, detect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultEvent {
    /// A new round result should be printed.
    Show(u64),
    /// The next round started while the result is still up.
    NextRound { result_round: u64, round: u64 },
    /// The result on screen is gone.
    Dismissed(u64),
}

#[derive(Debug, Default)]
pub struct ResultTracker {
    previous: Option<Observation>,
    showing: Option<u64>,
    last_shown: u64,
    announced_round: u64,
}

impl ResultTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// What the client last saw, with the result it actually has on
    /// screen. Sent with the next poll.
    pub fn previous(&self) -> Option<Observation> {
        self.previous.map(|seen| Observation {
            terminal_round: self.showing,
            ..seen
        })
    }

    /// Round of the result on screen.
    pub fn showing(&self) -> Option<u64> {
        self.showing
    }

    /// Feed one poll. The server's classification is used when it sent one.
    pub fn observe(&mut self, view: &SessionView) -> Vec<ResultEvent> {
        let current = view.observation();
        let detection = view
            .detection
            .unwrap_or_else(|| detect(self.previous().as_ref(), &current));
        let events = self.apply(&current, detection);
        self.previous = Some(current);
        events
    }

    /// The user dismissed the result themselves.
    pub fn dismiss(&mut self) -> Option<u64> {
        self.showing.take()
    }

    fn apply(&mut self, current: &Observation, detection: Detection) -> Vec<ResultEvent> {
        let mut events = Vec::new();
        if detection.discard_terminal {
            events.extend(self.showing.take().map(ResultEvent::Dismissed));
            return events;
        }

        let fresh = current.terminal_round.filter(|&round| round > self.last_shown);
        if let Some(round) = fresh {
            events.extend(self.showing.take().map(ResultEvent::Dismissed));
            self.showing = Some(round);
            self.last_shown = round;
            events.push(ResultEvent::Show(round));
        }

        let underway = detection.phase == RoundPhase::Transitioning
            && current.round_seq > self.announced_round;
        if let Some(result_round) = self.showing.filter(|_| underway) {
            self.announced_round = current.round_seq;
            events.push(ResultEvent::NextRound {
                result_round,
                round: current.round_seq,
            });
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(round_seq: u64, terminal_round: Option<u64>) -> Observation {
        Observation {
            round_seq,
            terminal_round,
            live_seats: true,
        }
    }

    fn feed(tracker: &mut ResultTracker, current: Observation) -> Vec<ResultEvent> {
        let detection = detect(tracker.previous().as_ref(), &current);
        let events = tracker.apply(&current, detection);
        tracker.previous = Some(current);
        events
    }

    #[test]
    fn test_result_survives_until_next_round_takes_over() {
        let mut tracker = ResultTracker::new();
        assert!(feed(&mut tracker, obs(1, None)).is_empty());
        assert_eq!(feed(&mut tracker, obs(1, Some(1))), vec![ResultEvent::Show(1)]);
        assert!(feed(&mut tracker, obs(1, Some(1))).is_empty());

        assert_eq!(
            feed(&mut tracker, obs(2, Some(1))),
            vec![ResultEvent::NextRound {
                result_round: 1,
                round: 2
            }]
        );
        assert_eq!(tracker.showing(), Some(1));
        assert!(feed(&mut tracker, obs(2, Some(1))).is_empty());

        assert_eq!(feed(&mut tracker, obs(2, None)), vec![ResultEvent::Dismissed(1)]);
        assert_eq!(tracker.showing(), None);
    }

    #[test]
    fn test_counter_advance_dismisses() {
        let mut tracker = ResultTracker::new();
        feed(&mut tracker, obs(3, Some(3)));
        assert_eq!(feed(&mut tracker, obs(4, None)), vec![ResultEvent::Dismissed(3)]);
    }

    #[test]
    fn test_newer_result_replaces_older() {
        let mut tracker = ResultTracker::new();
        feed(&mut tracker, obs(1, Some(1)));
        assert_eq!(
            feed(&mut tracker, obs(2, Some(2))),
            vec![ResultEvent::Dismissed(1), ResultEvent::Show(2)]
        );
    }

    #[test]
    fn test_result_kept_when_poll_is_ambiguous() {
        let mut tracker = ResultTracker::new();
        feed(&mut tracker, obs(5, Some(5)));
        let empty = Observation {
            round_seq: 5,
            terminal_round: None,
            live_seats: false,
        };
        assert!(feed(&mut tracker, empty).is_empty());
        assert_eq!(tracker.showing(), Some(5));
    }

    #[test]
    fn test_stale_result_is_not_shown() {
        let mut tracker = ResultTracker::new();
        feed(&mut tracker, obs(4, None));
        assert!(feed(&mut tracker, obs(4, Some(3))).is_empty());
        assert_eq!(tracker.showing(), None);
    }

    #[test]
    fn test_manual_dismiss() {
        let mut tracker = ResultTracker::new();
        feed(&mut tracker, obs(1, Some(1)));
        assert_eq!(tracker.dismiss(), Some(1));
        assert_eq!(tracker.previous().unwrap().terminal_round, None);
        // The same result is not shown again once dismissed.
        assert!(feed(&mut tracker, obs(1, Some(1))).is_empty());
    }
}
