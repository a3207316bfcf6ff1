//! Single-slot handoff between the engine thread and request handlers.
//!
//! At most one decision is outstanding at a time. Acceptance of a submission
//! clears the pending decision and stores the action in one critical
//! section, so exactly one submission per decision can ever succeed.

use serde::{Deserialize, Serialize};
use std::{
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use super::errors::SubmitError;
use crate::game::entities::{ActionKind, ActionRequest, Chips, LegalActions, SeatId};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PendingDecision {
    pub decision_id: u64,
    pub seat: SeatId,
    pub legal: LegalActions,
}

/// How a wait on the signal ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Awaited {
    Delivered(ActionRequest),
    TimedOut,
    Cancelled,
}

#[derive(Debug, Default)]
struct Slot {
    pending: Option<PendingDecision>,
    delivered: Option<(u64, ActionRequest)>,
    next_id: u64,
    closed: bool,
}

#[derive(Debug, Default)]
pub struct TurnSignal {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl TurnSignal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a fresh decision for `seat`, dropping anything left over from a
    /// previous one. Returns `None` once the signal has been cancelled.
    pub fn open(&self, seat: SeatId, legal: LegalActions) -> Option<u64> {
        let mut slot = self.lock();
        if slot.closed {
            return None;
        }
        slot.next_id += 1;
        let decision_id = slot.next_id;
        slot.pending = Some(PendingDecision {
            decision_id,
            seat,
            legal,
        });
        slot.delivered = None;
        Some(decision_id)
    }

    /// Offer an action for the pending decision. On success returns the id
    /// of the decision it answered.
    pub fn submit(&self, action: ActionRequest, expected: Option<u64>) -> Result<u64, SubmitError> {
        let mut slot = self.lock();
        let pending = slot.pending.ok_or(SubmitError::NoPendingDecision)?;
        if action.seat != pending.seat {
            return Err(SubmitError::WrongSeat {
                submitted: action.seat,
                pending: pending.seat,
            });
        }
        if let Some(submitted) = expected.filter(|&id| id != pending.decision_id) {
            return Err(SubmitError::StaleDecision {
                submitted,
                current: pending.decision_id,
            });
        }
        let action = validate_action(&pending.legal, action)?;

        slot.pending = None;
        slot.delivered = Some((pending.decision_id, action));
        drop(slot);
        self.ready.notify_all();
        Ok(pending.decision_id)
    }

    /// Block until decision `decision_id` is answered, cancelled or times
    /// out. A timeout closes the decision under the same lock, so a racing
    /// submission is either delivered or rejected.
    pub fn await_one(&self, decision_id: u64, timeout: Duration) -> Awaited {
        // A timeout too large to represent never expires.
        let deadline = Instant::now().checked_add(timeout);
        let mut slot = self.lock();
        loop {
            if let Some((_, action)) = slot.delivered.filter(|(id, _)| *id == decision_id) {
                slot.delivered = None;
                return Awaited::Delivered(action);
            }
            let still_pending = slot
                .pending
                .is_some_and(|p| p.decision_id == decision_id);
            if slot.closed || !still_pending {
                return Awaited::Cancelled;
            }
            let Some(deadline) = deadline else {
                slot = self.ready.wait(slot).unwrap_or_else(PoisonError::into_inner);
                continue;
            };
            let now = Instant::now();
            if now >= deadline {
                slot.pending = None;
                return Awaited::TimedOut;
            }
            slot = self
                .ready
                .wait_timeout(slot, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Close the signal for good. A blocked waiter returns `Cancelled` and
    /// later submissions are rejected.
    pub fn cancel(&self) {
        let mut slot = self.lock();
        slot.closed = true;
        slot.pending = None;
        drop(slot);
        self.ready.notify_all();
    }

    pub fn pending(&self) -> Option<PendingDecision> {
        self.lock().pending
    }

    pub fn is_cancelled(&self) -> bool {
        self.lock().closed
    }
}

/// Turn raw request fields into an action for `seat`.
pub fn parse_action(seat: SeatId, kind: &str, amount: i64) -> Result<ActionRequest, SubmitError> {
    let kind: ActionKind = kind
        .parse()
        .map_err(|_| SubmitError::UnknownAction(kind.to_string()))?;
    let amount = Chips::try_from(amount).map_err(|_| SubmitError::InvalidAmount(amount))?;
    Ok(ActionRequest { seat, kind, amount })
}

/// Check `action` against the advertised legal actions and normalize it.
///
/// A call must name 0 or the advertised call amount; a raise must lie within
/// the advertised bounds; a fold ignores its amount.
pub fn validate_action(legal: &LegalActions, action: ActionRequest) -> Result<ActionRequest, SubmitError> {
    match action.kind {
        ActionKind::Fold if legal.fold => Ok(ActionRequest::fold(action.seat)),
        ActionKind::Fold => Err(SubmitError::IllegalAction("fold".to_string())),
        ActionKind::Call if action.amount == 0 || action.amount == legal.call => {
            Ok(ActionRequest::call(action.seat, legal.call))
        }
        ActionKind::Call => Err(SubmitError::AmountOutOfBounds {
            amount: action.amount,
            min: legal.call,
            max: legal.call,
        }),
        ActionKind::Raise => {
            let bounds = legal
                .raise
                .ok_or_else(|| SubmitError::IllegalAction("raise".to_string()))?;
            if (bounds.min..=bounds.max).contains(&action.amount) {
                Ok(action)
            } else {
                Err(SubmitError::AmountOutOfBounds {
                    amount: action.amount,
                    min: bounds.min,
                    max: bounds.max,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::RaiseBounds;
    use std::{sync::Arc, thread};

    fn legal() -> LegalActions {
        LegalActions {
            fold: true,
            call: 10,
            raise: Some(RaiseBounds { min: 20, max: 100 }),
        }
    }

    #[test]
    fn test_submit_without_pending_decision() {
        let signal = TurnSignal::new();
        assert_eq!(
            signal.submit(ActionRequest::call(0, 10), None),
            Err(SubmitError::NoPendingDecision)
        );
    }

    #[test]
    fn test_second_submission_is_rejected() {
        let signal = TurnSignal::new();
        let id = signal.open(0, legal()).unwrap();
        assert_eq!(signal.submit(ActionRequest::call(0, 10), None), Ok(id));
        assert_eq!(
            signal.submit(ActionRequest::call(0, 10), None),
            Err(SubmitError::NoPendingDecision)
        );
        assert_eq!(
            signal.await_one(id, Duration::from_secs(1)),
            Awaited::Delivered(ActionRequest::call(0, 10))
        );
    }

    #[test]
    fn test_concurrent_submissions_accept_exactly_one() {
        for _ in 0..20 {
            let signal = Arc::new(TurnSignal::new());
            let id = signal.open(0, legal()).unwrap();
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let signal = Arc::clone(&signal);
                    thread::spawn(move || {
                        let action = if i % 2 == 0 {
                            ActionRequest::call(0, 0)
                        } else {
                            ActionRequest::raise(0, 20 + i)
                        };
                        signal.submit(action, Some(id)).is_ok()
                    })
                })
                .collect();
            let accepted = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|&ok| ok)
                .count();
            assert_eq!(accepted, 1);
            assert!(matches!(
                signal.await_one(id, Duration::from_secs(1)),
                Awaited::Delivered(_)
            ));
        }
    }

    #[test]
    fn test_waiter_receives_action_from_other_thread() {
        let signal = Arc::new(TurnSignal::new());
        let id = signal.open(0, legal()).unwrap();
        let submitter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                signal.submit(ActionRequest::raise(0, 40), Some(id))
            })
        };
        assert_eq!(
            signal.await_one(id, Duration::from_secs(5)),
            Awaited::Delivered(ActionRequest::raise(0, 40))
        );
        assert_eq!(submitter.join().unwrap(), Ok(id));
    }

    #[test]
    fn test_timeout_closes_decision() {
        let signal = TurnSignal::new();
        let id = signal.open(0, legal()).unwrap();
        let started = Instant::now();
        assert_eq!(signal.await_one(id, Duration::from_millis(50)), Awaited::TimedOut);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_secs(2));
        assert_eq!(signal.pending(), None);
        assert_eq!(
            signal.submit(ActionRequest::call(0, 10), Some(id)),
            Err(SubmitError::NoPendingDecision)
        );
    }

    #[test]
    fn test_unbounded_timeout_still_delivers() {
        let signal = Arc::new(TurnSignal::new());
        let id = signal.open(0, legal()).unwrap();
        let submitter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                signal.submit(ActionRequest::fold(0), Some(id))
            })
        };
        assert_eq!(
            signal.await_one(id, Duration::MAX),
            Awaited::Delivered(ActionRequest::fold(0))
        );
        assert_eq!(submitter.join().unwrap(), Ok(id));
    }

    #[test]
    fn test_cancel_wakes_waiter() {
        let signal = Arc::new(TurnSignal::new());
        let id = signal.open(0, legal()).unwrap();
        let canceller = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                signal.cancel();
            })
        };
        assert_eq!(signal.await_one(id, Duration::from_secs(10)), Awaited::Cancelled);
        canceller.join().unwrap();
        assert!(signal.is_cancelled());
        assert_eq!(signal.open(0, legal()), None);
    }

    #[test]
    fn test_reopen_drops_stale_delivery() {
        let signal = TurnSignal::new();
        let first = signal.open(0, legal()).unwrap();
        signal.submit(ActionRequest::call(0, 10), None).unwrap();
        let second = signal.open(0, legal()).unwrap();
        assert!(second > first);
        assert_eq!(
            signal.submit(ActionRequest::call(0, 10), Some(first)),
            Err(SubmitError::StaleDecision {
                submitted: first,
                current: second
            })
        );
        assert_eq!(signal.pending().map(|p| p.decision_id), Some(second));
    }

    #[test]
    fn test_wrong_seat_is_rejected_without_side_effects() {
        let signal = TurnSignal::new();
        signal.open(1, legal()).unwrap();
        assert_eq!(
            signal.submit(ActionRequest::call(0, 10), None),
            Err(SubmitError::WrongSeat {
                submitted: 0,
                pending: 1
            })
        );
        assert!(signal.pending().is_some());
    }

    #[test]
    fn test_validate_action_bounds() {
        let legal = legal();
        assert_eq!(
            validate_action(&legal, ActionRequest::call(0, 0)),
            Ok(ActionRequest::call(0, 10))
        );
        assert_eq!(
            validate_action(&legal, ActionRequest::call(0, 7)),
            Err(SubmitError::AmountOutOfBounds {
                amount: 7,
                min: 10,
                max: 10
            })
        );
        assert_eq!(
            validate_action(&legal, ActionRequest::raise(0, 19)),
            Err(SubmitError::AmountOutOfBounds {
                amount: 19,
                min: 20,
                max: 100
            })
        );
        assert_eq!(
            validate_action(&legal, ActionRequest::raise(0, 100)),
            Ok(ActionRequest::raise(0, 100))
        );
        assert_eq!(
            validate_action(&legal, ActionRequest { amount: 55, ..ActionRequest::fold(0) }),
            Ok(ActionRequest::fold(0))
        );

        let no_raise = LegalActions {
            raise: None,
            ..legal
        };
        assert_eq!(
            validate_action(&no_raise, ActionRequest::raise(0, 50)),
            Err(SubmitError::IllegalAction("raise".to_string()))
        );
    }

    #[test]
    fn test_parse_action() {
        assert_eq!(parse_action(0, "Raise", 40), Ok(ActionRequest::raise(0, 40)));
        assert_eq!(
            parse_action(0, "check", 0),
            Err(SubmitError::UnknownAction("check".to_string()))
        );
        assert_eq!(parse_action(0, "call", -1), Err(SubmitError::InvalidAmount(-1)));
    }
}
