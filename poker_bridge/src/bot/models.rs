//! Bot personalities.

use crate::table::config::BotDifficulty;

/// How one automated opponent plays.
///
/// Strength thresholds are on the 0.0..=1.0 scale produced by
/// [`estimate_hand_strength`](super::decision::estimate_hand_strength).
#[derive(Debug, Clone, PartialEq)]
pub struct Personality {
    /// Hands weaker than this are folded when there is something to call.
    pub fold_below: f32,
    /// Hands at least this strong are raised with some probability.
    pub raise_above: f32,
    /// Ratio of bets and raises to calls; drives call and raise odds and
    /// raise sizing.
    pub aggression: f32,
    /// Chance of raising with a hand below `fold_below`. Zero never bluffs.
    pub bluff_frequency: f32,
}

impl Personality {
    /// Loose-passive: plays many hands, rarely aggressive
    pub fn easy() -> Self {
        Self {
            fold_below: 0.08,
            raise_above: 0.20,
            aggression: 0.5,
            bluff_frequency: 0.0,
        }
    }

    /// Balanced, moderately aggressive
    pub fn standard() -> Self {
        Self {
            fold_below: 0.12,
            raise_above: 0.28,
            aggression: 1.5,
            bluff_frequency: 0.15,
        }
    }

    /// Tight-aggressive: few hands, played hard
    pub fn tag() -> Self {
        Self {
            fold_below: 0.18,
            raise_above: 0.33,
            aggression: 2.5,
            bluff_frequency: 0.25,
        }
    }

    pub fn bluffs(&self) -> bool {
        self.bluff_frequency > 0.0
    }
}

impl From<BotDifficulty> for Personality {
    fn from(difficulty: BotDifficulty) -> Self {
        match difficulty {
            BotDifficulty::Easy => Self::easy(),
            BotDifficulty::Standard => Self::standard(),
            BotDifficulty::Tag => Self::tag(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_get_tighter_and_more_aggressive() {
        let easy = Personality::from(BotDifficulty::Easy);
        let standard = Personality::from(BotDifficulty::Standard);
        let tag = Personality::from(BotDifficulty::Tag);

        assert!(easy.fold_below < standard.fold_below && standard.fold_below < tag.fold_below);
        assert!(easy.aggression < standard.aggression && standard.aggression < tag.aggression);
        assert!(!easy.bluffs());
        assert!(tag.bluffs());
        for p in [easy, standard, tag] {
            assert!(p.fold_below < p.raise_above);
        }
    }
}
