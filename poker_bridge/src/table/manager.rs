//! Match manager owning the session and the single running match.

use log::{debug, info, warn};
use metrics::counter;
use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
};

use super::{
    config::{MatchConfig, MatchDefaults, StartError},
    messages::StartRequest,
    runner::{MatchContext, run_match},
};
use crate::bot::{HeuristicPolicy, Personality, ThinkingProxy};
use crate::game::{
    engine::{DecisionPolicy, HoldemEngine},
    entities::{HUMAN_SEAT, MatchId, SeatId},
};
use crate::session::{
    HumanGate, MatchToken, Observation, SessionView, SharedSession, SnapshotBuilder, SubmitError,
    SubmitResult, TurnSignal, parse_action,
};

/// Handles of the match whose engine thread is running.
struct RunningMatch {
    id: MatchId,
    signal: Arc<TurnSignal>,
    token: MatchToken,
    thread: JoinHandle<()>,
}

impl RunningMatch {
    fn cancel(&self) {
        self.token.cancel();
        self.signal.cancel();
    }
}

/// Owns the session and the running match.
///
/// Lock order is `current` then the session. The engine thread only ever
/// takes the session lock.
pub struct MatchManager {
    session: SharedSession,
    current: Mutex<Option<RunningMatch>>,
    next_match_id: AtomicU64,
    defaults: MatchDefaults,
}

impl MatchManager {
    pub fn new(defaults: MatchDefaults) -> Self {
        Self {
            session: SharedSession::new(),
            current: Mutex::new(None),
            next_match_id: AtomicU64::new(0),
            defaults,
        }
    }

    pub fn defaults(&self) -> &MatchDefaults {
        &self.defaults
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    fn current(&self) -> MutexGuard<'_, Option<RunningMatch>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a match against heuristic bots, replacing any running match.
    ///
    /// # Arguments
    ///
    /// * `request` - Player name, table size and stakes
    ///
    /// # Returns
    ///
    /// * `Result<MatchId, StartError>` - Id of the new match, or why it
    ///   could not start
    pub fn start(&self, request: &StartRequest) -> Result<MatchId, StartError> {
        self.start_with(
            request,
            |_: SeatId, config: &MatchConfig| -> Box<dyn DecisionPolicy> {
                Box::new(HeuristicPolicy::new(Personality::from(config.difficulty)))
            },
        )
    }

    /// Start a match whose automated seats use the policies `make_bot`
    /// builds. Seat 0 is always the human.
    pub fn start_with<F>(&self, request: &StartRequest, mut make_bot: F) -> Result<MatchId, StartError>
    where
        F: FnMut(SeatId, &MatchConfig) -> Box<dyn DecisionPolicy>,
    {
        let config = MatchConfig::from_request(request, &self.defaults)?;
        let names: Vec<String> = std::iter::once(config.player_name.clone())
            .chain((1..config.seats()).map(|i| format!("Bot {i}")))
            .collect();
        let engine = HoldemEngine::new(
            names,
            config.starting_stack,
            config.small_blind,
            config.big_blind,
        )?
        .with_max_rounds(config.max_rounds);

        let mut current = self.current();
        if let Some(previous) = current.take() {
            info!("match {}: replaced by a new match", previous.id);
            previous.cancel();
        }

        let match_id = self.next_match_id.fetch_add(1, Ordering::SeqCst) + 1;
        let writer = self.session.begin(match_id);
        let signal = Arc::new(TurnSignal::new());
        let token = MatchToken::new();

        let mut policies: Vec<Box<dyn DecisionPolicy>> = Vec::with_capacity(config.seats());
        policies.push(Box::new(HumanGate::new(
            writer.clone(),
            Arc::clone(&signal),
            SnapshotBuilder::new(HUMAN_SEAT),
            config.decision_timeout,
        )));
        for seat in 1..config.seats() {
            policies.push(Box::new(ThinkingProxy::new(
                make_bot(seat, &config),
                writer.clone(),
                SnapshotBuilder::new(HUMAN_SEAT),
                token.clone(),
                config.think_min,
                config.think_max,
            )));
        }

        let ctx = MatchContext {
            match_id,
            engine: Box::new(engine),
            policies,
            writer: writer.clone(),
            signal: Arc::clone(&signal),
            token: token.clone(),
            round_pause: config.round_pause,
        };
        let spawned = thread::Builder::new()
            .name(format!("match-{match_id}"))
            .spawn(move || run_match(ctx));
        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                writer.fail(format!("failed to spawn match thread: {e}"));
                return Err(StartError::Spawn(e));
            }
        };

        *current = Some(RunningMatch {
            id: match_id,
            signal,
            token,
            thread,
        });
        counter!("matches_started_total").increment(1);
        info!(
            "match {match_id}: {} vs {} {} bots, stack {}, blinds {}/{}",
            config.player_name,
            config.opponents,
            config.difficulty,
            config.starting_stack,
            config.small_blind,
            config.big_blind
        );
        Ok(match_id)
    }

    /// Deliver the human's action to the pending decision.
    ///
    /// The action is parsed before anything is looked up, so malformed input
    /// is rejected the same way whether or not a match is running.
    pub fn submit_action(
        &self,
        kind: &str,
        amount: i64,
        decision_id: Option<u64>,
    ) -> SubmitResult<u64> {
        let submitted = parse_action(HUMAN_SEAT, kind, amount).and_then(|action| {
            let current = self.current();
            let running = current.as_ref().ok_or(SubmitError::NoMatch)?;
            if !self.session.is_active() {
                return Err(SubmitError::NoMatch);
            }
            let id = running.signal.submit(action, decision_id)?;
            self.session.resolve_pending(running.id, id);
            Ok(id)
        });
        match &submitted {
            Ok(id) => {
                counter!("actions_accepted_total").increment(1);
                debug!("decision {id}: {kind} {amount} accepted");
            }
            Err(e) => {
                counter!("actions_rejected_total", "reason" => e.reason()).increment(1);
                debug!("{kind} {amount} rejected: {e}");
            }
        }
        submitted
    }

    /// Session view for one poll. `previous` is what the client last saw.
    pub fn state(&self, previous: Option<&Observation>) -> SessionView {
        self.session.view(previous)
    }

    /// Tear down the running match. The engine thread is left to wind down
    /// on its own; its writes no longer reach the session. Returns whether
    /// a match was running.
    pub fn reset(&self) -> bool {
        let mut current = self.current();
        self.session.reset();
        match current.take() {
            Some(running) => {
                running.cancel();
                info!("match {}: reset", running.id);
                true
            }
            None => false,
        }
    }

    /// Drop the round result on display. Returns whether there was one.
    pub fn force_advance(&self) -> bool {
        self.session.clear_terminal()
    }

    /// Id of the running match, if its session is still live.
    pub fn active_match(&self) -> Option<MatchId> {
        let current = self.current();
        current
            .as_ref()
            .map(|running| running.id)
            .filter(|_| self.session.is_active())
    }

    /// Cancel the running match and wait for its engine thread.
    pub fn shutdown(&self) {
        let running = self.current().take();
        if let Some(running) = running {
            running.cancel();
            if running.thread.join().is_err() {
                warn!("match {}: engine thread panicked during shutdown", running.id);
            }
        }
    }
}

impl Default for MatchManager {
    fn default() -> Self {
        Self::new(MatchDefaults::default())
    }
}

impl Drop for MatchManager {
    fn drop(&mut self) {
        if let Some(running) = self.current().take() {
            running.cancel();
        }
    }
}
