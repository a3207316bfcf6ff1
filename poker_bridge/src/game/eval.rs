//! Five-of-seven hand evaluation used by the reference engine for showdowns.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entities::{Card, Value};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "one pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
        };
        write!(f, "{repr}")
    }
}

/// Comparable value of a five card hand. Ordering is rank first, then the
/// tie-break values from most to least significant.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct HandValue {
    pub rank: Rank,
    pub values: Vec<Value>,
}

/// Evaluate exactly five cards.
#[must_use]
pub fn evaluate_five(cards: &[Card; 5]) -> HandValue {
    let mut counts = [0u8; 15];
    for card in cards {
        counts[card.0 as usize] += 1;
    }

    // Groups ordered by (count desc, value desc).
    let mut groups: Vec<(u8, Value)> = (2..=14u8)
        .rev()
        .filter(|&v| counts[v as usize] > 0)
        .map(|v| (counts[v as usize], v))
        .collect();
    groups.sort_by(|a, b| b.cmp(a));

    let is_flush = cards.iter().all(|c| c.1 == cards[0].1);
    let straight_high = if groups.len() == 5 {
        let high = groups[0].1;
        let low = groups[4].1;
        if high - low == 4 {
            Some(high)
        } else if high == 14 && groups[1].1 == 5 {
            // Wheel: A-2-3-4-5 plays as a five-high straight.
            Some(5)
        } else {
            None
        }
    } else {
        None
    };

    let values: Vec<Value> = groups.iter().map(|&(_, v)| v).collect();
    match (straight_high, is_flush) {
        (Some(high), true) => HandValue {
            rank: Rank::StraightFlush,
            values: vec![high],
        },
        _ if groups[0].0 == 4 => HandValue {
            rank: Rank::FourOfAKind,
            values,
        },
        _ if groups[0].0 == 3 && groups[1].0 == 2 => HandValue {
            rank: Rank::FullHouse,
            values,
        },
        (_, true) => HandValue {
            rank: Rank::Flush,
            values,
        },
        (Some(high), false) => HandValue {
            rank: Rank::Straight,
            values: vec![high],
        },
        _ if groups[0].0 == 3 => HandValue {
            rank: Rank::ThreeOfAKind,
            values,
        },
        _ if groups[0].0 == 2 && groups[1].0 == 2 => HandValue {
            rank: Rank::TwoPair,
            values,
        },
        _ if groups[0].0 == 2 => HandValue {
            rank: Rank::OnePair,
            values,
        },
        _ => HandValue {
            rank: Rank::HighCard,
            values,
        },
    }
}

/// Best five card hand out of five to seven cards. Returns `None` for fewer
/// than five cards.
#[must_use]
pub fn best_hand(cards: &[Card]) -> Option<HandValue> {
    let n = cards.len();
    if n < 5 {
        return None;
    }
    let mut best: Option<HandValue> = None;
    for a in 0..n {
        for b in a + 1..n {
            for c in b + 1..n {
                for d in c + 1..n {
                    for e in d + 1..n {
                        let value =
                            evaluate_five(&[cards[a], cards[b], cards[c], cards[d], cards[e]]);
                        if best.as_ref().is_none_or(|current| value > *current) {
                            best = Some(value);
                        }
                    }
                }
            }
        }
    }
    best
}
