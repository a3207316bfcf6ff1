/// Property-based tests for round boundary detection.
///
/// Every combination of two consecutive polls is fed to the detector; the
/// properties are the guarantees a polling client relies on.
use poker_bridge::session::{Observation, RoundPhase, detect};
use proptest::prelude::*;

fn observation_strategy() -> impl Strategy<Value = Observation> {
    (0u64..20, prop::option::of(0u64..20), any::<bool>()).prop_map(
        |(round_seq, terminal_round, live_seats)| Observation {
            round_seq,
            terminal_round,
            live_seats,
        },
    )
}

proptest! {
    #[test]
    fn test_first_poll_is_classified_alone(current in observation_strategy()) {
        let detection = detect(None, &current);
        prop_assert_eq!(detection.phase, current.phase());
        prop_assert!(!detection.discard_terminal);
        prop_assert!(!detection.new_round);
    }

    #[test]
    fn test_discard_only_when_live(
        previous in observation_strategy(),
        current in observation_strategy(),
    ) {
        let detection = detect(Some(&previous), &current);
        if detection.discard_terminal {
            prop_assert_eq!(detection.phase, RoundPhase::Live);
        }
    }

    #[test]
    fn test_counter_advance_without_result_is_a_new_round(
        previous in observation_strategy(),
        step in 1u64..5,
        live_seats in any::<bool>(),
    ) {
        let current = Observation {
            round_seq: previous.round_seq + step,
            terminal_round: None,
            live_seats,
        };
        let detection = detect(Some(&previous), &current);
        prop_assert!(detection.new_round);
        prop_assert!(detection.discard_terminal);
        prop_assert_eq!(detection.phase, RoundPhase::Live);
    }

    #[test]
    fn test_new_round_tracks_counter(
        previous in observation_strategy(),
        current in observation_strategy(),
    ) {
        let detection = detect(Some(&previous), &current);
        prop_assert_eq!(detection.new_round, current.round_seq > previous.round_seq);
    }

    #[test]
    fn test_result_older_than_live_round_is_ignored(
        round_seq in 1u64..20,
        age in 1u64..5,
        live_seats in any::<bool>(),
    ) {
        let previous = Observation {
            round_seq,
            terminal_round: None,
            live_seats: true,
        };
        let current = Observation {
            round_seq,
            terminal_round: Some(round_seq.saturating_sub(age)),
            live_seats,
        };
        prop_assume!(current.terminal_round < Some(round_seq));
        let detection = detect(Some(&previous), &current);
        prop_assert_eq!(detection.phase, RoundPhase::Live);
        prop_assert!(detection.discard_terminal);
    }

    #[test]
    fn test_ended_needs_a_result(
        previous in observation_strategy(),
        current in observation_strategy(),
    ) {
        let detection = detect(Some(&previous), &current);
        if detection.phase == RoundPhase::Ended {
            prop_assert!(current.terminal_round.is_some() || previous.terminal_round.is_some());
            prop_assert!(!detection.discard_terminal);
        }
    }
}
