//! The human seat's decision policy.

use log::{error, info, warn};
use metrics::counter;
use std::{sync::Arc, time::Duration};

use super::{
    signal::{Awaited, PendingDecision, TurnSignal},
    snapshot::SnapshotBuilder,
    state::MatchWriter,
};
use crate::game::{
    engine::{DecisionPolicy, DecisionRequest, PolicyError},
    entities::ActionRequest,
};

/// Publishes the human's decision point and blocks the engine thread until
/// an action arrives over HTTP, the wait times out, or the match is torn
/// down. Timeouts and cancellations both resolve to a fold.
pub struct HumanGate {
    writer: MatchWriter,
    signal: Arc<TurnSignal>,
    builder: SnapshotBuilder,
    timeout: Duration,
}

impl HumanGate {
    pub fn new(
        writer: MatchWriter,
        signal: Arc<TurnSignal>,
        builder: SnapshotBuilder,
        timeout: Duration,
    ) -> Self {
        Self {
            writer,
            signal,
            builder,
            timeout,
        }
    }
}

impl DecisionPolicy for HumanGate {
    fn decide(&mut self, request: &DecisionRequest<'_>) -> Result<ActionRequest, PolicyError> {
        let seat = request.seat;
        let match_id = self.writer.match_id();
        let snapshot = self
            .builder
            .build(request.view, Some(request.legal))
            .map_err(|e| {
                error!("match {match_id}: cannot publish decision for seat {seat}: {e}");
                PolicyError::Failed(e.to_string())
            })?;

        let Some(decision_id) = self.signal.open(seat, *request.legal) else {
            info!("match {match_id}: seat {seat} decision cancelled before it opened");
            return Ok(ActionRequest::fold(seat));
        };
        let pending = PendingDecision {
            decision_id,
            seat,
            legal: *request.legal,
        };
        if let Err(e) = self.writer.publish_pending(snapshot, pending) {
            warn!("match {match_id}: decision {decision_id} published without snapshot: {e}");
        }

        let awaited = self.signal.await_one(decision_id, self.timeout);
        self.writer.clear_pending(decision_id);

        match awaited {
            Awaited::Delivered(action) => {
                info!("match {match_id}: decision {decision_id} answered: {action}");
                Ok(action)
            }
            Awaited::TimedOut => {
                warn!(
                    "match {match_id}: seat {seat} decision {decision_id} timed out after {:?}, folding",
                    self.timeout
                );
                counter!("decisions_timed_out_total").increment(1);
                Ok(ActionRequest::fold(seat))
            }
            Awaited::Cancelled => {
                info!("match {match_id}: seat {seat} decision {decision_id} cancelled, folding");
                Ok(ActionRequest::fold(seat))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{
        Card, LegalActions, RaiseBounds, SeatView, Street, Suit, TableView,
    };
    use crate::session::state::SharedSession;
    use std::{thread, time::Instant};

    fn table() -> TableView {
        let seat = |id: usize| SeatView {
            id,
            name: format!("p{id}"),
            stack: 95,
            street_bet: 5,
            invested: 5,
            folded: false,
            in_hand: true,
            is_human: id == 0,
            hole_cards: vec![Card(2 + id as u8, Suit::Club), Card(9, Suit::Heart)],
        };
        TableView {
            round_seq: 1,
            street: Street::Preflop,
            seats: vec![seat(0), seat(1)],
            board: vec![],
            button: 0,
            acting: Some(0),
            small_blind: 5,
            big_blind: 10,
        }
    }

    fn legal() -> LegalActions {
        LegalActions {
            fold: true,
            call: 10,
            raise: Some(RaiseBounds { min: 20, max: 100 }),
        }
    }

    fn gate(timeout: Duration) -> (SharedSession, Arc<TurnSignal>, HumanGate) {
        let session = SharedSession::new();
        let signal = Arc::new(TurnSignal::new());
        let gate = HumanGate::new(
            session.begin(1),
            Arc::clone(&signal),
            SnapshotBuilder::new(0),
            timeout,
        );
        (session, signal, gate)
    }

    fn wait_for_pending(session: &SharedSession) -> u64 {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(pending) = session.with(|s| s.pending) {
                return pending.decision_id;
            }
            assert!(Instant::now() < deadline, "decision never published");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_submitted_action_is_returned() {
        let (session, signal, mut gate) = gate(Duration::from_secs(10));
        let engine = thread::spawn(move || {
            let view = table();
            let legal = legal();
            gate.decide(&DecisionRequest {
                seat: 0,
                view: &view,
                legal: &legal,
            })
        });

        let decision_id = wait_for_pending(&session);
        let published = session.view(None);
        assert_eq!(published.legal_actions, Some(legal()));
        assert!(published.snapshot.unwrap().seats[1].cards.is_empty());

        signal
            .submit(ActionRequest::raise(0, 30), Some(decision_id))
            .unwrap();
        assert_eq!(engine.join().unwrap(), Ok(ActionRequest::raise(0, 30)));
        assert_eq!(session.with(|s| s.pending), None);
    }

    #[test]
    fn test_timeout_folds_and_clears_pending() {
        let (session, _signal, mut gate) = gate(Duration::from_millis(60));
        let view = table();
        let legal = legal();
        let started = Instant::now();
        let action = gate
            .decide(&DecisionRequest {
                seat: 0,
                view: &view,
                legal: &legal,
            })
            .unwrap();
        assert_eq!(action, ActionRequest::fold(0));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(session.with(|s| s.pending), None);
    }

    #[test]
    fn test_cancel_releases_waiting_engine() {
        let (session, signal, mut gate) = gate(Duration::from_secs(30));
        let engine = thread::spawn(move || {
            let view = table();
            let legal = legal();
            gate.decide(&DecisionRequest {
                seat: 0,
                view: &view,
                legal: &legal,
            })
        });
        wait_for_pending(&session);
        session.reset();
        signal.cancel();
        assert_eq!(engine.join().unwrap(), Ok(ActionRequest::fold(0)));
        assert_eq!(session.with(|s| s.clone()), Default::default());
    }
}
