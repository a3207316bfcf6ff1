//! Heuristic decision-making for automated seats.

use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::models::Personality;
use crate::game::{
    engine::{DecisionPolicy, DecisionRequest, PolicyError},
    entities::{ActionRequest, Card, Chips, LegalActions, SeatId},
    eval::{Rank, best_hand},
};

/// Knobs shared by every personality.
///
/// # Examples
///
/// ```
/// use poker_bridge::bot::Tuning;
///
/// let tuning = Tuning::default();
/// assert_eq!(tuning.position_adjustment[0], 0.08);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tuning {
    /// Bluff raise size as a fraction of the pot.
    pub bluff_pot_fraction: f32,
    /// Pot odds above this make a marginal call more likely by
    /// `good_odds_bonus`.
    pub good_odds: f32,
    pub good_odds_bonus: f32,
    /// `call chance = call_base + aggression * call_per_aggression`
    pub call_base: f32,
    pub call_per_aggression: f32,
    /// `raise chance = raise_base + aggression * raise_per_aggression`
    pub raise_base: f32,
    pub raise_per_aggression: f32,
    /// Raise sizes vary by up to this fraction either way.
    pub raise_variance: f32,
    /// Strength adjustment by acting order, in five bands from the button
    /// (acts last) to the first seat to act.
    pub position_adjustment: [f32; 5],
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            bluff_pot_fraction: 1.5,
            good_odds: 0.25,
            good_odds_bonus: 0.2,
            call_base: 0.3,
            call_per_aggression: 0.2,
            raise_base: 0.4,
            raise_per_aggression: 0.25,
            raise_variance: 0.2,
            position_adjustment: [0.08, 0.04, 0.0, -0.03, -0.05],
        }
    }
}

/// What the bot wants to do, before it is fitted to the legal actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Fold,
    /// Call, or check when there is nothing to call.
    Call,
    /// Raise by this many chips on top of the call.
    RaiseBy(Chips),
    /// Put the whole stack in.
    Shove,
}

/// The bot's view of one decision.
#[derive(Debug, Clone)]
pub struct Spot<'a> {
    pub hole: &'a [Card],
    pub board: &'a [Card],
    pub pot: Chips,
    /// Chips still needed to call.
    pub to_call: Chips,
    pub stack: Chips,
    /// Seats in hand that act after this one on later streets, counted from
    /// the button: 0 is the button.
    pub position: Option<usize>,
    /// Seats still contesting the pot.
    pub contenders: usize,
}

impl<'a> Spot<'a> {
    pub fn from_request(request: &DecisionRequest<'a>) -> Option<Self> {
        let view = request.view;
        let seat = view.seat(request.seat)?;
        let n = view.seats.len();
        let position = (0..n)
            .map(|k| (view.button + k) % n)
            .filter(|&id| view.seats[id].in_hand)
            .position(|id| id == request.seat);
        Some(Self {
            hole: &seat.hole_cards,
            board: &view.board,
            pot: view.pot(),
            to_call: request.legal.call.saturating_sub(seat.street_bet),
            stack: seat.stack,
            position,
            contenders: view.contenders().count(),
        })
    }

    fn free(&self) -> bool {
        self.to_call == 0
    }

    /// Share of the pot after calling that is already in it.
    fn pot_odds(&self) -> f32 {
        if self.free() {
            return 1.0;
        }
        self.pot as f32 / self.pot.saturating_add(self.to_call) as f32
    }
}

/// Automated seat: rates its hand and plays it according to its
/// [`Personality`].
pub struct HeuristicPolicy {
    personality: Personality,
    tuning: Tuning,
    rng: StdRng,
}

impl HeuristicPolicy {
    pub fn new(personality: Personality) -> Self {
        Self {
            personality,
            tuning: Tuning::default(),
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Reproducible bot for replays and tests.
    pub fn with_seed(personality: Personality, seed: u64) -> Self {
        Self {
            personality,
            tuning: Tuning::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    pub fn decide_intent(&mut self, spot: &Spot<'_>) -> Intent {
        if !spot.free() && spot.stack <= spot.to_call {
            return Intent::Shove;
        }
        let strength = (estimate_hand_strength(spot.hole, spot.board)
            + self.position_adjustment(spot))
        .clamp(0.0, 1.0);

        if strength < self.personality.fold_below {
            self.play_weak(spot)
        } else if strength < self.personality.raise_above {
            self.play_marginal(spot)
        } else {
            self.play_strong(spot)
        }
    }

    fn play_weak(&mut self, spot: &Spot<'_>) -> Intent {
        if spot.free() {
            return Intent::Call;
        }
        let bluff = self.personality.bluff_frequency;
        if self.personality.bluffs() && self.rng.random_bool(f64::from(bluff.min(1.0))) {
            let size = (spot.pot as f32 * self.tuning.bluff_pot_fraction) as Chips;
            return raise_or_shove(spot, size);
        }
        Intent::Fold
    }

    fn play_marginal(&mut self, spot: &Spot<'_>) -> Intent {
        if spot.free() {
            return Intent::Call;
        }
        let odds_bonus = if spot.pot_odds() > self.tuning.good_odds {
            self.tuning.good_odds_bonus
        } else {
            0.0
        };
        let call_chance = self.tuning.call_base
            + self.personality.aggression * self.tuning.call_per_aggression
            + odds_bonus;
        if self.rng.random_bool(f64::from(call_chance.clamp(0.0, 1.0))) {
            Intent::Call
        } else {
            Intent::Fold
        }
    }

    /// Strong hands raise most of the time and otherwise slow-play.
    fn play_strong(&mut self, spot: &Spot<'_>) -> Intent {
        let raise_chance =
            self.tuning.raise_base + self.personality.aggression * self.tuning.raise_per_aggression;
        if self.rng.random_bool(f64::from(raise_chance.clamp(0.0, 1.0))) {
            let size = self.raise_size(spot);
            raise_or_shove(spot, size)
        } else {
            Intent::Call
        }
    }

    fn raise_size(&mut self, spot: &Spot<'_>) -> Chips {
        let multiplier = match self.personality.aggression {
            a if a < 1.0 => 2.0,
            a if a < 2.0 => 2.5,
            _ => 3.0,
        };
        let variance = self.tuning.raise_variance;
        let jitter = self.rng.random_range(-variance..=variance);
        let base = spot.pot.saturating_add(spot.to_call) as f32;
        let size = (base * multiplier * (1.0 + jitter)) as Chips;
        size.clamp(1, spot.stack.max(1))
    }

    /// Late position plays slightly weaker hands; heads-up it does not matter.
    fn position_adjustment(&self, spot: &Spot<'_>) -> f32 {
        if spot.contenders <= 2 {
            return 0.0;
        }
        let position = spot.position.unwrap_or(spot.contenders / 2);
        let band = (position * 5 / spot.contenders).min(4);
        self.tuning.position_adjustment[band]
    }
}

fn raise_or_shove(spot: &Spot<'_>, by: Chips) -> Intent {
    if spot.stack <= spot.to_call.saturating_add(by) {
        Intent::Shove
    } else {
        Intent::RaiseBy(by)
    }
}

/// Fit an intent to what the engine actually allows.
pub fn to_action_request(seat: SeatId, intent: Intent, legal: &LegalActions) -> ActionRequest {
    match (intent, legal.raise) {
        (Intent::Fold, _) => ActionRequest::fold(seat),
        (Intent::Call, _) => ActionRequest::call(seat, legal.call),
        (Intent::RaiseBy(by), Some(bounds)) => {
            let to = legal.call.saturating_add(by);
            ActionRequest::raise(seat, to.clamp(bounds.min, bounds.max))
        }
        (Intent::Shove, Some(bounds)) => ActionRequest::raise(seat, bounds.max),
        (Intent::RaiseBy(_) | Intent::Shove, None) => ActionRequest::call(seat, legal.call),
    }
}

impl DecisionPolicy for HeuristicPolicy {
    fn decide(&mut self, request: &DecisionRequest<'_>) -> Result<ActionRequest, PolicyError> {
        let spot = Spot::from_request(request).ok_or_else(|| {
            PolicyError::Failed(format!("seat {} is not at the table", request.seat))
        })?;
        let intent = self.decide_intent(&spot);
        debug!("bot seat {} chose {intent:?} facing {}", request.seat, request.legal);
        Ok(to_action_request(request.seat, intent, request.legal))
    }
}

fn rank_strength(rank: Rank) -> f32 {
    match rank {
        Rank::HighCard => 0.10,
        Rank::OnePair => 0.25,
        Rank::TwoPair => 0.40,
        Rank::ThreeOfAKind => 0.55,
        Rank::Straight => 0.70,
        Rank::Flush => 0.75,
        Rank::FullHouse => 0.85,
        Rank::FourOfAKind => 0.95,
        Rank::StraightFlush => 0.99,
    }
}

/// Rate a hand from 0.0 to 1.0.
///
/// Before the flop only the two hole cards are rated; afterwards the best
/// made hand decides the base strength and its top card adds up to 0.1.
pub fn estimate_hand_strength(hole: &[Card], board: &[Card]) -> f32 {
    let [first, second, ..] = hole else {
        return 0.0;
    };
    if board.len() < 3 {
        return preflop_strength(*first, *second);
    }

    let cards: Vec<Card> = hole.iter().chain(board).copied().collect();
    let Some(hand) = best_hand(&cards) else {
        return 0.0;
    };
    let top = hand.values.iter().copied().max().unwrap_or(0);
    (rank_strength(hand.rank) + f32::from(top) / 140.0).min(1.0)
}

/// Pairs rate from 0.57 (deuces) to 1.0 (aces); other hands by card sum,
/// with small bonuses for suited and connected cards.
fn preflop_strength(a: Card, b: Card) -> f32 {
    let (high, low) = if a.0 >= b.0 { (a.0, b.0) } else { (b.0, a.0) };
    if high == low {
        return 0.5 + f32::from(high) / 28.0;
    }
    let suited = if a.1 == b.1 { 0.05 } else { 0.0 };
    let connected = match high - low {
        1 => 0.03,
        2 => 0.015,
        _ => 0.0,
    };
    f32::from(high + low) * 0.0125 + suited + connected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{RaiseBounds, Suit};

    fn cards(s: &str) -> Vec<Card> {
        s.split_whitespace().map(|c| c.parse().unwrap()).collect()
    }

    /// Six-handed preflop, 10 to call into a pot of 100.
    fn spot(hole: &[Card]) -> Spot<'_> {
        Spot {
            hole,
            board: &[],
            pot: 100,
            to_call: 10,
            stack: 1000,
            position: Some(0),
            contenders: 6,
        }
    }

    fn count(bot: &mut HeuristicPolicy, spot: &Spot<'_>, trials: usize, f: fn(Intent) -> bool) -> usize {
        (0..trials).filter(|_| f(bot.decide_intent(spot))).count()
    }

    fn is_raise(intent: Intent) -> bool {
        matches!(intent, Intent::RaiseBy(_) | Intent::Shove)
    }

    fn is_fold(intent: Intent) -> bool {
        intent == Intent::Fold
    }

    #[test]
    fn test_easy_bot_is_passive_with_aces() {
        let mut bot = HeuristicPolicy::with_seed(Personality::easy(), 1);
        let hole = cards("As Ah");
        let raises = count(&mut bot, &spot(&hole), 200, is_raise);
        assert!(raises < 140, "easy bot raised {raises} of 200");
    }

    #[test]
    fn test_tag_bot_always_raises_kings() {
        let mut bot = HeuristicPolicy::with_seed(Personality::tag(), 2);
        let hole = cards("Ks Kh");
        assert_eq!(count(&mut bot, &spot(&hole), 100, is_raise), 100);
    }

    #[test]
    fn test_tag_bot_folds_junk_out_of_position() {
        let mut bot = HeuristicPolicy::with_seed(Personality::tag(), 3);
        let hole = cards("7c 2d");
        let utg = Spot {
            position: Some(5),
            ..spot(&hole)
        };
        let folds = count(&mut bot, &utg, 500, is_fold);
        assert!(folds > 300, "tag bot folded 7-2o {folds} of 500");
    }

    #[test]
    fn test_easy_bot_never_folds_on_the_button_with_nine_three() {
        let mut bot = HeuristicPolicy::with_seed(Personality::easy(), 4);
        let hole = cards("9h 3c");
        assert_eq!(count(&mut bot, &spot(&hole), 100, is_fold), 0);
    }

    #[test]
    fn test_button_plays_more_than_first_to_act() {
        let mut bot = HeuristicPolicy::with_seed(Personality::standard(), 5);
        let hole = cards("8s 6s");
        let button = Spot {
            to_call: 20,
            ..spot(&hole)
        };
        let utg = Spot {
            position: Some(5),
            ..button.clone()
        };
        let plays_button = 1000 - count(&mut bot, &button, 1000, is_fold);
        let plays_utg = 1000 - count(&mut bot, &utg, 1000, is_fold);
        assert!(
            plays_button > plays_utg + 50,
            "button played {plays_button}, first to act {plays_utg}"
        );
    }

    #[test]
    fn test_position_ignored_heads_up() {
        let bot = HeuristicPolicy::with_seed(Personality::standard(), 6);
        let hole = cards("8s 6s");
        let heads_up = Spot {
            contenders: 2,
            position: Some(1),
            ..spot(&hole)
        };
        assert_eq!(bot.position_adjustment(&heads_up), 0.0);
        assert_eq!(bot.position_adjustment(&spot(&hole)), 0.08);
    }

    #[test]
    fn test_junk_checks_when_free() {
        let mut bot = HeuristicPolicy::with_seed(Personality::tag(), 7);
        let hole = cards("7c 2d");
        let free = Spot {
            to_call: 0,
            ..spot(&hole)
        };
        assert_eq!(bot.decide_intent(&free), Intent::Call);
    }

    #[test]
    fn test_short_stack_shoves() {
        let mut bot = HeuristicPolicy::with_seed(Personality::easy(), 8);
        let hole = cards("7c 2d");
        let short = Spot {
            to_call: 50,
            stack: 40,
            ..spot(&hole)
        };
        assert_eq!(bot.decide_intent(&short), Intent::Shove);
    }

    #[test]
    fn test_pot_odds() {
        let hole = cards("7c 2d");
        let odds = |pot, to_call| Spot { pot, to_call, ..spot(&hole) }.pot_odds();
        assert!((odds(100, 20) - 0.833).abs() < 0.01);
        assert!((odds(100, 50) - 0.667).abs() < 0.01);
        assert!((odds(50, 100) - 0.333).abs() < 0.01);
        assert_eq!(odds(100, 0), 1.0);
    }

    #[test]
    fn test_hand_strength_ordering() {
        let aces = cards("As Ah");
        let junk = cards("7c 2d");
        assert_eq!(estimate_hand_strength(&aces, &[]), 1.0);
        assert!(estimate_hand_strength(&aces, &[]) > estimate_hand_strength(&junk, &[]));
        assert!(
            estimate_hand_strength(&cards("8s 7s"), &[])
                > estimate_hand_strength(&cards("8s 7d"), &[])
        );

        let board = cards("Ac 7d 2h");
        let trips = estimate_hand_strength(&aces, &board);
        let two_pair = estimate_hand_strength(&junk, &board);
        assert!(trips > two_pair);
        assert!(two_pair >= rank_strength(Rank::TwoPair));
        assert_eq!(estimate_hand_strength(&[Card(14, Suit::Spade)], &board), 0.0);
    }

    #[test]
    fn test_intents_are_fitted_to_legal_bounds() {
        let legal = LegalActions {
            fold: true,
            call: 10,
            raise: Some(RaiseBounds { min: 20, max: 100 }),
        };
        assert_eq!(to_action_request(1, Intent::Call, &legal), ActionRequest::call(1, 10));
        assert_eq!(to_action_request(1, Intent::RaiseBy(5), &legal), ActionRequest::raise(1, 20));
        assert_eq!(
            to_action_request(1, Intent::RaiseBy(500), &legal),
            ActionRequest::raise(1, 100)
        );
        assert_eq!(to_action_request(1, Intent::Shove, &legal), ActionRequest::raise(1, 100));

        let no_raise = LegalActions {
            raise: None,
            ..legal
        };
        assert_eq!(to_action_request(1, Intent::Shove, &no_raise), ActionRequest::call(1, 10));
    }

    #[test]
    fn test_heuristic_policy_always_answers_legally() {
        use crate::game::{GameEngine, HoldemEngine, NoopObserver};

        let names = vec!["human".to_string(), "bot1".to_string(), "bot2".to_string()];
        let mut engine = HoldemEngine::new(names, 200, 5, 10).unwrap().with_max_rounds(Some(20));
        let mut policies: Vec<Box<dyn DecisionPolicy>> = (0..3u64)
            .map(|seed| {
                Box::new(HeuristicPolicy::with_seed(Personality::tag(), seed))
                    as Box<dyn DecisionPolicy>
            })
            .collect();
        while !engine.is_finished() {
            engine.play_round(&mut policies, &mut NoopObserver).unwrap();
        }
        let total: Chips = engine.view().seats.iter().map(|s| s.stack).sum();
        assert_eq!(total, 600);
    }
}
