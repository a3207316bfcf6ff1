//! Human-like pacing for automated seats.

use log::warn;
use rand::Rng;
use std::time::Duration;

use crate::game::{
    engine::{DecisionPolicy, DecisionRequest, PolicyError},
    entities::ActionRequest,
};
use crate::session::{MatchToken, MatchWriter, SnapshotBuilder};

/// Wraps an automated policy: publishes the table, marks the seat as
/// thinking, waits a random delay, then delegates. The thinking marker is
/// cleared afterwards whether or not the wrapped policy succeeded.
pub struct ThinkingProxy<P> {
    inner: P,
    writer: MatchWriter,
    builder: SnapshotBuilder,
    token: MatchToken,
    think_min: Duration,
    think_max: Duration,
}

impl<P: DecisionPolicy> ThinkingProxy<P> {
    pub fn new(
        inner: P,
        writer: MatchWriter,
        builder: SnapshotBuilder,
        token: MatchToken,
        think_min: Duration,
        think_max: Duration,
    ) -> Self {
        Self {
            inner,
            writer,
            builder,
            token,
            think_min,
            think_max,
        }
    }

    fn think_delay(&self) -> Duration {
        if self.think_max <= self.think_min {
            return self.think_min;
        }
        rand::rng().random_range(self.think_min..=self.think_max)
    }
}

impl<P: DecisionPolicy> DecisionPolicy for ThinkingProxy<P> {
    fn decide(&mut self, request: &DecisionRequest<'_>) -> Result<ActionRequest, PolicyError> {
        let seat = request.seat;
        match self.builder.build(request.view, None) {
            Ok(snapshot) => {
                if let Err(e) = self.writer.install_snapshot(snapshot, false) {
                    warn!("seat {seat}: snapshot not installed: {e}");
                }
            }
            Err(e) => warn!("seat {seat}: keeping previous snapshot: {e}"),
        }

        self.writer.set_thinking(seat);
        if !self.token.is_cancelled() {
            self.token.sleep(self.think_delay());
        }
        let decided = self.inner.decide(request);
        self.writer.clear_thinking_if(seat);
        decided
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::engine::policy_fn;
    use crate::game::entities::{LegalActions, SeatView, Street, TableView};
    use crate::session::SharedSession;
    use std::time::Instant;

    fn table() -> TableView {
        let seat = |id: usize| SeatView {
            id,
            name: format!("p{id}"),
            stack: 100,
            street_bet: 0,
            invested: 0,
            folded: false,
            in_hand: true,
            is_human: id == 0,
            hole_cards: vec![],
        };
        TableView {
            round_seq: 2,
            street: Street::Flop,
            seats: vec![seat(0), seat(1)],
            board: vec![],
            button: 1,
            acting: Some(1),
            small_blind: 5,
            big_blind: 10,
        }
    }

    const LEGAL: LegalActions = LegalActions {
        fold: true,
        call: 0,
        raise: None,
    };

    fn decide_with<P: DecisionPolicy>(proxy: &mut ThinkingProxy<P>) -> Result<ActionRequest, PolicyError> {
        let view = table();
        proxy.decide(&DecisionRequest {
            seat: 1,
            view: &view,
            legal: &LEGAL,
        })
    }

    #[test]
    fn test_thinking_marker_wraps_the_decision() {
        let session = SharedSession::new();
        let observed = session.clone();
        let inner = policy_fn(move |req: &DecisionRequest<'_>| -> Result<ActionRequest, PolicyError> {
            assert_eq!(observed.with(|s| s.thinking_seat), Some(1));
            Ok(ActionRequest::call(req.seat, req.legal.call))
        });
        let mut proxy = ThinkingProxy::new(
            inner,
            session.begin(1),
            SnapshotBuilder::new(0),
            MatchToken::new(),
            Duration::from_millis(10),
            Duration::from_millis(30),
        );

        let started = Instant::now();
        assert_eq!(decide_with(&mut proxy), Ok(ActionRequest::call(1, 0)));
        assert!(started.elapsed() >= Duration::from_millis(10));
        assert_eq!(session.with(|s| s.thinking_seat), None);
        assert_eq!(session.with(|s| s.observation().round_seq), 2);
    }

    #[test]
    fn test_marker_cleared_on_error() {
        let session = SharedSession::new();
        let inner = policy_fn(|_: &DecisionRequest<'_>| -> Result<ActionRequest, PolicyError> {
            Err(PolicyError::Failed("no idea".to_string()))
        });
        let mut proxy = ThinkingProxy::new(
            inner,
            session.begin(1),
            SnapshotBuilder::new(0),
            MatchToken::new(),
            Duration::ZERO,
            Duration::ZERO,
        );
        assert!(decide_with(&mut proxy).is_err());
        assert_eq!(session.with(|s| s.thinking_seat), None);
    }

    #[test]
    fn test_cancelled_match_skips_delay() {
        let session = SharedSession::new();
        let token = MatchToken::new();
        token.cancel();
        let inner = policy_fn(|req: &DecisionRequest<'_>| -> Result<ActionRequest, PolicyError> {
            Ok(ActionRequest::fold(req.seat))
        });
        let mut proxy = ThinkingProxy::new(
            inner,
            session.begin(1),
            SnapshotBuilder::new(0),
            token,
            Duration::from_secs(30),
            Duration::from_secs(30),
        );
        let started = Instant::now();
        assert_eq!(decide_with(&mut proxy), Ok(ActionRequest::fold(1)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
