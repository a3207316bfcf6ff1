use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart];

    fn letter(self) -> char {
        match self {
            Self::Club => 'c',
            Self::Spade => 's',
            Self::Diamond => 'd',
            Self::Heart => 'h',
        }
    }
}

/// Placeholder for card values.
pub type Value = u8;

/// A card is a tuple of a value (deuce=2u8 ... ace=14u8) and a suit.
///
/// Cards travel to clients as two-character strings such as `"As"` or
/// `"Td"`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            14 => 'A',
            13 => 'K',
            12 => 'Q',
            11 => 'J',
            10 => 'T',
            v => char::from(b'0' + v),
        };
        write!(f, "{value}{}", self.1.letter())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid card `{0}`")]
pub struct ParseCardError(String);

impl FromStr for Card {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(v), Some(su), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(ParseCardError(s.to_string()));
        };
        let value = match v.to_ascii_uppercase() {
            'A' => 14,
            'K' => 13,
            'Q' => 12,
            'J' => 11,
            'T' => 10,
            d @ '2'..='9' => d as u8 - b'0',
            _ => return Err(ParseCardError(s.to_string())),
        };
        let suit = match su.to_ascii_lowercase() {
            'c' => Suit::Club,
            's' => Suit::Spade,
            'd' => Suit::Diamond,
            'h' => Suit::Heart,
            _ => return Err(ParseCardError(s.to_string())),
        };
        Ok(Card(value, suit))
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug)]
pub struct Deck {
    cards: Vec<Card>,
    pub deck_idx: usize,
}

impl Deck {
    /// Deck that deals `cards` in the given order without shuffling. Used to
    /// replay a known deal.
    #[must_use]
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards, deck_idx: 0 }
    }

    /// Deal the next card, or `None` once the deck is exhausted.
    pub fn deal_card(&mut self) -> Option<Card> {
        let card = self.cards.get(self.deck_idx).copied()?;
        self.deck_idx += 1;
        Some(card)
    }

    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
        self.deck_idx = 0;
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.deck_idx
    }
}

impl Default for Deck {
    fn default() -> Self {
        let cards = (2u8..=14u8)
            .flat_map(|value| Suit::ALL.into_iter().map(move |suit| Card(value, suit)))
            .collect();
        Self { cards, deck_idx: 0 }
    }
}

/// Whole chips. All bets and stacks are represented as whole chips.
pub type Chips = u32;

/// Seat position at the table. Seat 0 is always the human player.
pub type SeatId = usize;

pub const HUMAN_SEAT: SeatId = 0;

/// Identifier of one match; bumped every time a match is started.
pub type MatchId = u64;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
        };
        write!(f, "{repr}")
    }
}

/// The three action kinds a seat can choose from.
///
/// A call with nothing to call is a check; an all-in is a raise to the
/// maximum advertised amount (or a call for less).
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Fold,
    Call,
    Raise,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Fold => "fold",
            Self::Call => "call",
            Self::Raise => "raise",
        };
        write!(f, "{repr}")
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown action `{0}`")]
pub struct ParseActionError(pub String);

impl FromStr for ActionKind {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fold" => Ok(Self::Fold),
            "call" => Ok(Self::Call),
            "raise" => Ok(Self::Raise),
            _ => Err(ParseActionError(s.to_string())),
        }
    }
}

/// A decided (or submitted) action for one seat.
///
/// `amount` uses "raise-to" semantics: it is the seat's total wager on the
/// current street after the action, not the increment.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionRequest {
    pub seat: SeatId,
    pub kind: ActionKind,
    pub amount: Chips,
}

impl ActionRequest {
    #[must_use]
    pub fn fold(seat: SeatId) -> Self {
        Self {
            seat,
            kind: ActionKind::Fold,
            amount: 0,
        }
    }

    #[must_use]
    pub fn call(seat: SeatId, amount: Chips) -> Self {
        Self {
            seat,
            kind: ActionKind::Call,
            amount,
        }
    }

    #[must_use]
    pub fn raise(seat: SeatId, amount: Chips) -> Self {
        Self {
            seat,
            kind: ActionKind::Raise,
            amount,
        }
    }
}

impl fmt::Display for ActionRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ActionKind::Fold => write!(f, "seat {} folds", self.seat),
            ActionKind::Call => write!(f, "seat {} calls to {}", self.seat, self.amount),
            ActionKind::Raise => write!(f, "seat {} raises to {}", self.seat, self.amount),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RaiseBounds {
    pub min: Chips,
    pub max: Chips,
}

/// Legal actions offered to the seat whose turn it is.
///
/// Folding is always allowed. `call` is the street total after calling
/// (equal to the seat's current wager when checking is possible).
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LegalActions {
    pub fold: bool,
    pub call: Chips,
    pub raise: Option<RaiseBounds>,
}

impl LegalActions {
    #[must_use]
    pub fn can_raise(&self) -> bool {
        self.raise.is_some()
    }
}

impl fmt::Display for LegalActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fold, call ({})", self.call)?;
        if let Some(RaiseBounds { min, max }) = self.raise {
            write!(f, " or raise ({min}..={max})")?;
        }
        Ok(())
    }
}

/// Engine-side view of one seat. Contains every seat's hole cards, so it
/// must go through a snapshot builder before reaching a client.
#[derive(Clone, Debug, PartialEq)]
pub struct SeatView {
    pub id: SeatId,
    pub name: String,
    pub stack: Chips,
    /// Wager on the current street.
    pub street_bet: Chips,
    /// Total contribution to the pot this round.
    pub invested: Chips,
    pub folded: bool,
    /// Dealt into the current round (had chips when it started).
    pub in_hand: bool,
    pub is_human: bool,
    pub hole_cards: Vec<Card>,
}

impl SeatView {
    #[must_use]
    pub fn all_in(&self) -> bool {
        self.in_hand && !self.folded && self.stack == 0
    }
}

/// Engine-native representation of a table at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct TableView {
    pub round_seq: u64,
    pub street: Street,
    pub seats: Vec<SeatView>,
    pub board: Vec<Card>,
    pub button: SeatId,
    pub acting: Option<SeatId>,
    pub small_blind: Chips,
    pub big_blind: Chips,
}

impl TableView {
    #[must_use]
    pub fn pot(&self) -> Chips {
        self.seats.iter().map(|s| s.invested).sum()
    }

    #[must_use]
    pub fn current_bet(&self) -> Chips {
        self.seats.iter().map(|s| s.street_bet).max().unwrap_or(0)
    }

    #[must_use]
    pub fn seat(&self, id: SeatId) -> Option<&SeatView> {
        self.seats.get(id)
    }

    /// Seats still contesting the pot.
    pub fn contenders(&self) -> impl Iterator<Item = &SeatView> {
        self.seats.iter().filter(|s| s.in_hand && !s.folded)
    }

    /// Seat holding every chip, if the table has come down to one seat.
    #[must_use]
    pub fn winner(&self) -> Option<SeatId> {
        let mut funded = self.seats.iter().filter(|s| s.stack > 0);
        match (funded.next(), funded.next()) {
            (Some(seat), None) => Some(seat.id),
            _ => None,
        }
    }
}
