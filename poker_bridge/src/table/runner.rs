//! The engine thread: one per match, driving rounds until the match ends or
//! is cancelled.

use log::{error, info, warn};
use metrics::{counter, gauge};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Duration,
};

use crate::game::{
    engine::{DecisionPolicy, EngineError, GameEngine, RoundObserver, RoundOutcome},
    entities::{ActionRequest, HUMAN_SEAT, MatchId, TableView},
};
use crate::session::{GameResult, MatchToken, MatchWriter, SnapshotBuilder, TurnSignal};

/// Everything the engine thread owns.
pub struct MatchContext {
    pub match_id: MatchId,
    pub engine: Box<dyn GameEngine>,
    pub policies: Vec<Box<dyn DecisionPolicy>>,
    pub writer: MatchWriter,
    pub signal: Arc<TurnSignal>,
    pub token: MatchToken,
    pub round_pause: Duration,
}

/// Pushes engine progress into the session.
struct SessionObserver {
    writer: MatchWriter,
    builder: SnapshotBuilder,
}

impl SessionObserver {
    fn publish(&self, view: &TableView) {
        match self.builder.build(view, None) {
            Ok(snapshot) => {
                if let Err(e) = self.writer.install_snapshot(snapshot, false) {
                    warn!("match {}: {e}", self.writer.match_id());
                }
            }
            Err(e) => warn!(
                "match {}: keeping previous snapshot: {e}",
                self.writer.match_id()
            ),
        }
    }
}

impl RoundObserver for SessionObserver {
    fn round_started(&mut self, view: &TableView) {
        self.publish(view);
    }

    fn action_applied(&mut self, view: &TableView, _action: &ActionRequest) {
        self.publish(view);
    }

    fn street_dealt(&mut self, view: &TableView) {
        self.publish(view);
    }

    fn round_finished(&mut self, view: &TableView, outcome: &RoundOutcome) {
        let built = self
            .builder
            .terminal(view, outcome)
            .and_then(|terminal| Ok((terminal, self.builder.build(view, None)?)));
        let published = built.and_then(|(terminal, snapshot)| {
            self.writer.publish_terminal(terminal, snapshot)
        });
        if let Err(e) = published {
            warn!(
                "match {}: round {} result not published: {e}",
                self.writer.match_id(),
                outcome.round_seq
            );
        }
    }
}

/// Body of the engine thread. Never panics; engine failures and panics are
/// recorded in the session.
pub fn run_match(ctx: MatchContext) {
    let MatchContext {
        match_id,
        mut engine,
        mut policies,
        writer,
        signal,
        token,
        round_pause,
    } = ctx;
    gauge!("match_active").increment(1.0);
    info!("match {match_id}: engine thread running");

    let played = panic::catch_unwind(AssertUnwindSafe(|| {
        play(match_id, engine.as_mut(), &mut policies, &writer, &token, round_pause)
    }));

    match played {
        Ok(Ok(result)) if token.is_cancelled() => {
            info!(
                "match {match_id}: cancelled after {} rounds",
                result.rounds_played
            );
        }
        Ok(Ok(result)) => {
            info!(
                "match {match_id}: finished after {} rounds, winner {:?}",
                result.rounds_played, result.winner
            );
            writer.finish(result);
        }
        Ok(Err(e)) => {
            error!("match {match_id}: engine error: {e}");
            writer.fail(e.to_string());
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("match {match_id}: engine thread panicked: {message}");
            writer.fail(format!("engine thread panicked: {message}"));
        }
    }
    signal.cancel();
    gauge!("match_active").decrement(1.0);
}

fn play(
    match_id: MatchId,
    engine: &mut dyn GameEngine,
    policies: &mut [Box<dyn DecisionPolicy>],
    writer: &MatchWriter,
    token: &MatchToken,
    round_pause: Duration,
) -> Result<GameResult, EngineError> {
    let mut observer = SessionObserver {
        writer: writer.clone(),
        builder: SnapshotBuilder::new(HUMAN_SEAT),
    };
    while !engine.is_finished() && !token.is_cancelled() {
        let outcome = engine.play_round(policies, &mut observer)?;
        counter!("rounds_played_total").increment(1);
        info!(
            "match {match_id}: round {} paid {:?} from a pot of {}",
            outcome.round_seq,
            outcome
                .payouts
                .iter()
                .map(|p| (p.seat, p.amount))
                .collect::<Vec<_>>(),
            outcome.pot
        );
        if engine.is_finished() {
            break;
        }
        token.sleep(round_pause);
    }
    Ok(game_result(&engine.view(), engine.rounds_played()))
}

fn game_result(view: &TableView, rounds_played: u64) -> GameResult {
    GameResult {
        winner: view.winner(),
        human_busted: view.seat(HUMAN_SEAT).is_some_and(|s| s.stack == 0),
        rounds_played,
        final_stacks: view.seats.iter().map(|s| s.stack).collect(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
