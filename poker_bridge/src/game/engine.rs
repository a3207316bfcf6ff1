//! Engine contract and the reference no-limit hold'em engine.
//!
//! The engine is synchronous: [`GameEngine::play_round`] drives one full
//! round and calls back into one [`DecisionPolicy`] per seat whenever that
//! seat must act. Progress is reported through a [`RoundObserver`].

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    entities::{
        ActionKind, ActionRequest, Card, Chips, Deck, LegalActions, RaiseBounds, SeatId,
        SeatView, Street, TableView,
    },
    eval::{HandValue, best_hand},
};

/// Everything a policy gets to look at when it is asked for an action.
#[derive(Clone, Copy, Debug)]
pub struct DecisionRequest<'a> {
    pub seat: SeatId,
    pub view: &'a TableView,
    pub legal: &'a LegalActions,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("policy failed: {0}")]
    Failed(String),
}

/// Source of actions for one seat. Human and automated seats both implement
/// this; the engine cannot tell them apart.
pub trait DecisionPolicy: Send {
    fn decide(&mut self, request: &DecisionRequest<'_>) -> Result<ActionRequest, PolicyError>;
}

impl<P: DecisionPolicy + ?Sized> DecisionPolicy for Box<P> {
    fn decide(&mut self, request: &DecisionRequest<'_>) -> Result<ActionRequest, PolicyError> {
        (**self).decide(request)
    }
}

/// Policy backed by a closure. See [`policy_fn`].
pub struct PolicyFn<F>(F);

/// Build a policy from a closure.
pub fn policy_fn<F>(f: F) -> PolicyFn<F>
where
    F: FnMut(&DecisionRequest<'_>) -> Result<ActionRequest, PolicyError> + Send,
{
    PolicyFn(f)
}

impl<F> DecisionPolicy for PolicyFn<F>
where
    F: FnMut(&DecisionRequest<'_>) -> Result<ActionRequest, PolicyError> + Send,
{
    fn decide(&mut self, request: &DecisionRequest<'_>) -> Result<ActionRequest, PolicyError> {
        (self.0)(request)
    }
}

/// Callbacks fired on the engine thread as a round progresses.
pub trait RoundObserver {
    fn round_started(&mut self, _view: &TableView) {}

    fn action_applied(&mut self, _view: &TableView, _action: &ActionRequest) {}

    fn street_dealt(&mut self, _view: &TableView) {}

    fn round_finished(&mut self, view: &TableView, outcome: &RoundOutcome);
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl RoundObserver for NoopObserver {
    fn round_finished(&mut self, _view: &TableView, _outcome: &RoundOutcome) {}
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("match is already finished")]
    MatchFinished,
    #[error("expected {expected} decision policies, got {got}")]
    PolicyCount { expected: usize, got: usize },
    #[error("deck exhausted")]
    DeckExhausted,
    #[error("invalid table: {0}")]
    InvalidTable(String),
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Payout {
    pub seat: SeatId,
    pub name: String,
    pub amount: Chips,
    /// Hand description when the pot went to showdown.
    pub hand: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ShownHand {
    pub seat: SeatId,
    pub cards: Vec<Card>,
    pub description: String,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundOutcome {
    pub round_seq: u64,
    pub payouts: Vec<Payout>,
    pub pot: Chips,
    pub board: Vec<Card>,
    pub shown_hands: Vec<ShownHand>,
}

pub trait GameEngine: Send {
    /// Play one complete round, consulting `policies[seat]` for every
    /// decision. Busted seats are skipped.
    fn play_round(
        &mut self,
        policies: &mut [Box<dyn DecisionPolicy>],
        observer: &mut dyn RoundObserver,
    ) -> Result<RoundOutcome, EngineError>;

    fn is_finished(&self) -> bool;

    fn view(&self) -> TableView;

    fn rounds_played(&self) -> u64;
}

#[derive(Clone, Debug)]
struct Seat {
    name: String,
    stack: Chips,
    street_bet: Chips,
    invested: Chips,
    folded: bool,
    in_hand: bool,
    is_human: bool,
    hole: Vec<Card>,
}

impl Seat {
    fn can_act(&self) -> bool {
        self.in_hand && !self.folded && self.stack > 0
    }

    fn contending(&self) -> bool {
        self.in_hand && !self.folded
    }

    fn commit(&mut self, street_total: Chips) {
        let put = street_total.saturating_sub(self.street_bet).min(self.stack);
        self.stack -= put;
        self.street_bet += put;
        self.invested += put;
    }
}

/// Reference no-limit hold'em engine.
///
/// Seat 0 is the human. The first button is the first seat with chips and it
/// moves one occupied seat per round. Heads-up, the button posts the small
/// blind and acts first before the flop.
#[derive(Debug)]
pub struct HoldemEngine {
    seats: Vec<Seat>,
    deck: Deck,
    next_deck: Option<Deck>,
    board: Vec<Card>,
    street: Street,
    button: Option<SeatId>,
    acting: Option<SeatId>,
    round_seq: u64,
    small_blind: Chips,
    big_blind: Chips,
    max_rounds: Option<u64>,
}

impl HoldemEngine {
    /// `names[0]` is the human seat.
    pub fn new(
        names: Vec<String>,
        starting_stack: Chips,
        small_blind: Chips,
        big_blind: Chips,
    ) -> Result<Self, EngineError> {
        if names.len() < 2 {
            return Err(EngineError::InvalidTable(
                "at least two seats are required".to_string(),
            ));
        }
        if starting_stack == 0 || small_blind == 0 || big_blind < small_blind {
            return Err(EngineError::InvalidTable(format!(
                "stack {starting_stack} with blinds {small_blind}/{big_blind}"
            )));
        }
        let total = Chips::try_from(names.len())
            .ok()
            .and_then(|seats| starting_stack.checked_mul(seats));
        if total.is_none() {
            return Err(EngineError::InvalidTable(format!(
                "{} stacks of {starting_stack} overflow the chip count",
                names.len()
            )));
        }
        let seats = names
            .into_iter()
            .enumerate()
            .map(|(id, name)| Seat {
                name,
                stack: starting_stack,
                street_bet: 0,
                invested: 0,
                folded: false,
                in_hand: false,
                is_human: id == 0,
                hole: Vec::with_capacity(2),
            })
            .collect();
        Ok(Self {
            seats,
            deck: Deck::default(),
            next_deck: None,
            board: Vec::with_capacity(5),
            street: Street::Preflop,
            button: None,
            acting: None,
            round_seq: 0,
            small_blind,
            big_blind,
            max_rounds: None,
        })
    }

    #[must_use]
    pub fn with_max_rounds(mut self, max_rounds: Option<u64>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Use `deck` unshuffled for the next round only.
    pub fn stack_next_deck(&mut self, deck: Deck) {
        self.next_deck = Some(deck);
    }

    fn next_seat(&self, from: SeatId, pred: impl Fn(&Seat) -> bool) -> Option<SeatId> {
        let n = self.seats.len();
        (1..=n)
            .map(|k| (from + k) % n)
            .find(|&id| pred(&self.seats[id]))
    }

    fn current_bet(&self) -> Chips {
        self.seats.iter().map(|s| s.street_bet).max().unwrap_or(0)
    }

    fn contenders(&self) -> usize {
        self.seats.iter().filter(|s| s.contending()).count()
    }

    fn deal(&mut self) -> Result<Card, EngineError> {
        self.deck.deal_card().ok_or(EngineError::DeckExhausted)
    }

    fn legal_actions(&self, seat: SeatId, min_raise: Chips) -> LegalActions {
        let s = &self.seats[seat];
        let current = self.current_bet();
        let to_call = current.saturating_sub(s.street_bet);
        let max = s.street_bet + s.stack;
        let others_can_act = self
            .seats
            .iter()
            .enumerate()
            .any(|(id, other)| id != seat && other.can_act());
        let raise = (s.stack > to_call && others_can_act).then(|| RaiseBounds {
            min: (current + min_raise).min(max),
            max,
        });
        LegalActions {
            fold: true,
            call: s.street_bet + to_call.min(s.stack),
            raise,
        }
    }

    fn start_round(&mut self) -> Result<(), EngineError> {
        self.round_seq += 1;
        for seat in &mut self.seats {
            seat.street_bet = 0;
            seat.invested = 0;
            seat.folded = false;
            seat.in_hand = seat.stack > 0;
            seat.hole.clear();
        }
        self.board.clear();
        self.street = Street::Preflop;
        self.acting = None;
        match self.next_deck.take() {
            Some(deck) => self.deck = deck,
            None => self.deck.shuffle(),
        }

        let button = match self.button {
            Some(previous) => self.next_seat(previous, |s| s.in_hand),
            None => self.next_seat(self.seats.len() - 1, |s| s.in_hand),
        }
        .ok_or_else(|| EngineError::InvalidTable("no seat has chips".to_string()))?;
        self.button = Some(button);
        Ok(())
    }

    fn blinds(&self, button: SeatId) -> Option<(SeatId, SeatId)> {
        let in_hand = self.seats.iter().filter(|s| s.in_hand).count();
        let sb = if in_hand == 2 {
            button
        } else {
            self.next_seat(button, |s| s.in_hand)?
        };
        let bb = self.next_seat(sb, |s| s.in_hand)?;
        Some((sb, bb))
    }

    fn betting_round(
        &mut self,
        first: SeatId,
        policies: &mut [Box<dyn DecisionPolicy>],
        observer: &mut dyn RoundObserver,
    ) {
        let n = self.seats.len();
        let mut needs: Vec<bool> = self.seats.iter().map(Seat::can_act).collect();
        let mut min_raise = self.big_blind;
        let mut cursor = first;

        while self.contenders() > 1 {
            let Some(seat) = (0..n).map(|k| (cursor + k) % n).find(|&id| needs[id]) else {
                break;
            };
            needs[seat] = false;
            cursor = (seat + 1) % n;

            let current = self.current_bet();
            let others_can_act = self
                .seats
                .iter()
                .enumerate()
                .any(|(id, s)| id != seat && s.can_act());
            if !others_can_act && self.seats[seat].street_bet >= current {
                continue;
            }

            let legal = self.legal_actions(seat, min_raise);
            self.acting = Some(seat);
            let view = self.view();
            let request = DecisionRequest {
                seat,
                view: &view,
                legal: &legal,
            };
            let decided = match policies[seat].decide(&request) {
                Ok(action) => action,
                Err(error) => {
                    warn!("seat {seat} policy failed ({error}), folding");
                    ActionRequest::fold(seat)
                }
            };

            let applied = self.apply(seat, decided, &legal);
            if applied.kind == ActionKind::Raise && applied.amount > current {
                let increment = applied.amount - current;
                min_raise = min_raise.max(increment);
                for (id, other) in self.seats.iter().enumerate() {
                    needs[id] = id != seat && other.can_act();
                }
            }
            self.acting = None;
            debug!("round {}: {applied}", self.round_seq);
            observer.action_applied(&self.view(), &applied);
        }
        self.acting = None;
    }

    /// Validate `action` against `legal` and apply it. Anything that does
    /// not fit becomes a fold.
    fn apply(&mut self, seat: SeatId, action: ActionRequest, legal: &LegalActions) -> ActionRequest {
        let applied = match action.kind {
            _ if action.seat != seat => {
                warn!("seat {seat} answered for seat {}, folding", action.seat);
                ActionRequest::fold(seat)
            }
            ActionKind::Fold => ActionRequest::fold(seat),
            ActionKind::Call => ActionRequest::call(seat, legal.call),
            ActionKind::Raise => match legal.raise {
                Some(bounds) if (bounds.min..=bounds.max).contains(&action.amount) => {
                    ActionRequest::raise(seat, action.amount)
                }
                _ => {
                    warn!(
                        "seat {seat} raise to {} is outside {legal}, folding",
                        action.amount
                    );
                    ActionRequest::fold(seat)
                }
            },
        };
        match applied.kind {
            ActionKind::Fold => self.seats[seat].folded = true,
            ActionKind::Call | ActionKind::Raise => self.seats[seat].commit(applied.amount),
        }
        applied
    }

    fn deal_street(&mut self, street: Street) -> Result<(), EngineError> {
        let count = if street == Street::Flop { 3 } else { 1 };
        for _ in 0..count {
            let card = self.deal()?;
            self.board.push(card);
        }
        self.street = street;
        for seat in &mut self.seats {
            seat.street_bet = 0;
        }
        Ok(())
    }

    fn settle(&mut self) -> RoundOutcome {
        let pot: Chips = self.seats.iter().map(|s| s.invested).sum();
        let contenders: Vec<SeatId> = (0..self.seats.len())
            .filter(|&id| self.seats[id].contending())
            .collect();
        let mut won = vec![0 as Chips; self.seats.len()];
        let mut hands: Vec<Option<HandValue>> = vec![None; self.seats.len()];
        let mut shown_hands = Vec::new();

        if contenders.len() == 1 {
            won[contenders[0]] = pot;
        } else {
            self.street = Street::Showdown;
            for &id in &contenders {
                let mut cards = self.seats[id].hole.clone();
                cards.extend_from_slice(&self.board);
                hands[id] = best_hand(&cards);
                if let Some(value) = &hands[id] {
                    shown_hands.push(ShownHand {
                        seat: id,
                        cards: self.seats[id].hole.clone(),
                        description: value.rank.to_string(),
                    });
                }
            }

            // Odd chips go to winners in seat order starting left of the button.
            let button = self.button.unwrap_or(0);
            let n = self.seats.len();
            let order: Vec<SeatId> = (1..=n).map(|k| (button + k) % n).collect();

            let mut levels: Vec<Chips> = contenders
                .iter()
                .map(|&id| self.seats[id].invested)
                .collect();
            levels.sort_unstable();
            levels.dedup();

            let mut previous = 0;
            let mut distributed = 0;
            let mut last_winners = Vec::new();
            for level in levels {
                let layer: Chips = self
                    .seats
                    .iter()
                    .map(|s| s.invested.min(level) - s.invested.min(previous))
                    .sum();
                previous = level;
                let best = contenders
                    .iter()
                    .filter(|&&id| self.seats[id].invested >= level)
                    .filter_map(|&id| hands[id].as_ref())
                    .max()
                    .cloned();
                let winners: Vec<SeatId> = order
                    .iter()
                    .copied()
                    .filter(|&id| {
                        self.seats[id].contending()
                            && self.seats[id].invested >= level
                            && hands[id] == best
                    })
                    .collect();
                if winners.is_empty() || layer == 0 {
                    continue;
                }
                let share = layer / winners.len() as Chips;
                let odd = layer % winners.len() as Chips;
                for (k, &id) in winners.iter().enumerate() {
                    won[id] += share + Chips::from((k as Chips) < odd);
                }
                distributed += layer;
                last_winners = winners;
            }
            // Chips from folded seats above the highest contender level.
            if let Some(&first) = last_winners.first() {
                won[first] += pot - distributed;
            }
        }

        let mut payouts = Vec::new();
        for (id, &amount) in won.iter().enumerate() {
            if amount == 0 {
                continue;
            }
            self.seats[id].stack += amount;
            payouts.push(Payout {
                seat: id,
                name: self.seats[id].name.clone(),
                amount,
                hand: hands[id].as_ref().map(|h| h.rank.to_string()),
            });
        }

        RoundOutcome {
            round_seq: self.round_seq,
            payouts,
            pot,
            board: self.board.clone(),
            shown_hands,
        }
    }
}

impl GameEngine for HoldemEngine {
    fn play_round(
        &mut self,
        policies: &mut [Box<dyn DecisionPolicy>],
        observer: &mut dyn RoundObserver,
    ) -> Result<RoundOutcome, EngineError> {
        if self.is_finished() {
            return Err(EngineError::MatchFinished);
        }
        if policies.len() != self.seats.len() {
            return Err(EngineError::PolicyCount {
                expected: self.seats.len(),
                got: policies.len(),
            });
        }

        self.start_round()?;
        let button = self.button.unwrap_or(0);
        let (sb, bb) = self
            .blinds(button)
            .ok_or_else(|| EngineError::InvalidTable("not enough seats with chips".to_string()))?;
        self.seats[sb].commit(self.small_blind);
        self.seats[bb].commit(self.big_blind);

        for _ in 0..2 {
            let mut id = sb;
            loop {
                if self.seats[id].in_hand {
                    let card = self.deal()?;
                    self.seats[id].hole.push(card);
                }
                id = (id + 1) % self.seats.len();
                if id == sb {
                    break;
                }
            }
        }
        observer.round_started(&self.view());

        let first = if self.seats.iter().filter(|s| s.in_hand).count() == 2 {
            sb
        } else {
            self.next_seat(bb, |s| s.in_hand).unwrap_or(sb)
        };
        self.betting_round(first, policies, observer);

        for street in [Street::Flop, Street::Turn, Street::River] {
            if self.contenders() < 2 {
                break;
            }
            self.deal_street(street)?;
            observer.street_dealt(&self.view());
            let first = self.next_seat(button, Seat::contending).unwrap_or(button);
            self.betting_round(first, policies, observer);
        }

        let outcome = self.settle();
        observer.round_finished(&self.view(), &outcome);
        Ok(outcome)
    }

    fn is_finished(&self) -> bool {
        let human_busted = self.seats.iter().any(|s| s.is_human && s.stack == 0);
        let funded = self.seats.iter().filter(|s| s.stack > 0).count();
        let out_of_rounds = self.max_rounds.is_some_and(|max| self.round_seq >= max);
        human_busted || funded < 2 || out_of_rounds
    }

    fn view(&self) -> TableView {
        TableView {
            round_seq: self.round_seq,
            street: self.street,
            seats: self
                .seats
                .iter()
                .enumerate()
                .map(|(id, s)| SeatView {
                    id,
                    name: s.name.clone(),
                    stack: s.stack,
                    street_bet: s.street_bet,
                    invested: s.invested,
                    folded: s.folded,
                    in_hand: s.in_hand,
                    is_human: s.is_human,
                    hole_cards: s.hole.clone(),
                })
                .collect(),
            board: self.board.clone(),
            button: self.button.unwrap_or(0),
            acting: self.acting,
            small_blind: self.small_blind,
            big_blind: self.big_blind,
        }
    }

    fn rounds_played(&self) -> u64 {
        self.round_seq
    }
}
