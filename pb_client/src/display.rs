//! Plain-text rendering of what `/state` returns.

use poker_bridge::{
    game::{Card, LegalActions},
    session::{GameResult, RoundSnapshot, SessionView, TerminalRoundData},
};

fn cards(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "--".to_string();
    }
    cards
        .iter()
        .map(Card::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The table as the human sees it, one line per seat.
pub fn render_snapshot(snapshot: &RoundSnapshot) -> String {
    let mut out = format!(
        "Round {} ({}), pot {}, board {}\n",
        snapshot.round_seq,
        snapshot.street,
        snapshot.pot,
        cards(&snapshot.board)
    );
    for seat in &snapshot.seats {
        let button = if seat.id == snapshot.button { "D" } else { " " };
        let acting = if snapshot.acting_seat == Some(seat.id) {
            ">"
        } else {
            " "
        };
        let status = if seat.folded {
            " folded"
        } else if seat.all_in {
            " all-in"
        } else if !seat.active {
            " out"
        } else {
            ""
        };
        let hole = if seat.is_human || !seat.cards.is_empty() {
            format!(" [{}]", cards(&seat.cards))
        } else {
            String::new()
        };
        out.push_str(&format!(
            "{acting}{button} {:<12} stack {:>6}  bet {:>5}{hole}{status}\n",
            seat.name, seat.stack, seat.wagered
        ));
    }
    out
}

pub fn render_prompt(legal: &LegalActions) -> String {
    let call = if legal.call == 0 {
        "check".to_string()
    } else {
        format!("call {}", legal.call)
    };
    match legal.raise {
        Some(bounds) => format!("Your turn: fold, {call}, raise {}..{}", bounds.min, bounds.max),
        None => format!("Your turn: fold, {call}"),
    }
}

pub fn render_terminal(terminal: &TerminalRoundData) -> String {
    let mut out = format!(
        "Round {} over, pot {}, board {}\n",
        terminal.round_seq,
        terminal.pot,
        cards(&terminal.board)
    );
    for shown in &terminal.shown_hands {
        let name = terminal
            .final_seats
            .iter()
            .find(|s| s.id == shown.seat)
            .map_or("?", |s| s.name.as_str());
        out.push_str(&format!(
            "  {name} shows {} ({})\n",
            cards(&shown.cards),
            shown.description
        ));
    }
    for winner in &terminal.winners {
        match &winner.hand {
            Some(hand) => out.push_str(&format!(
                "  {} wins {} with {hand}\n",
                winner.name, winner.amount
            )),
            None => out.push_str(&format!("  {} wins {}\n", winner.name, winner.amount)),
        }
    }
    out
}

/// `names` are the seat names from the last snapshot seen.
pub fn render_game_result(result: &GameResult, names: &[String]) -> String {
    let name = |seat: usize| {
        names
            .get(seat)
            .cloned()
            .unwrap_or_else(|| format!("seat {seat}"))
    };
    let headline = if result.human_busted {
        "You busted.".to_string()
    } else {
        match result.winner {
            Some(0) => "You won the match!".to_string(),
            Some(seat) => format!("{} won the match.", name(seat)),
            None => "Match over.".to_string(),
        }
    };
    let stacks = result
        .final_stacks
        .iter()
        .enumerate()
        .map(|(seat, stack)| format!("{} {stack}", name(seat)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{headline} {} rounds played. Final stacks: {stacks}",
        result.rounds_played
    )
}

/// One status line for whoever the table is waiting on.
pub fn render_waiting(view: &SessionView) -> Option<String> {
    let seat = view.thinking_seat_id?;
    let name = view
        .snapshot
        .as_ref()
        .and_then(|s| s.seats.iter().find(|seat_view| seat_view.id == seat))
        .map_or_else(|| format!("seat {seat}"), |s| s.name.clone());
    Some(format!("{name} is thinking..."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use poker_bridge::{
        game::{Payout, RaiseBounds, ShownHand, Street},
        session::{RoundPhase, SeatSnapshot},
    };

    fn seat(id: usize, name: &str, stack: u32, cards: Vec<Card>) -> SeatSnapshot {
        SeatSnapshot {
            id,
            name: name.to_string(),
            stack,
            wagered: 0,
            invested: 0,
            folded: false,
            all_in: false,
            active: true,
            is_human: id == 0,
            cards,
        }
    }

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    #[test]
    fn test_snapshot_hides_nothing_it_was_not_given() {
        let snapshot = RoundSnapshot {
            round_seq: 3,
            street: Street::Flop,
            seats: vec![
                seat(0, "Alice", 90, vec![card("As"), card("Kd")]),
                seat(1, "Bot 1", 110, vec![]),
            ],
            board: vec![card("2c"), card("7h"), card("Td")],
            pot: 20,
            button: 1,
            acting_seat: Some(0),
            legal_actions: None,
        };
        let text = render_snapshot(&snapshot);
        assert!(text.starts_with("Round 3 (flop), pot 20, board 2c 7h Td"));
        assert!(text.contains("[As Kd]"));
        let bot_line = text.lines().find(|l| l.contains("Bot 1")).unwrap();
        assert!(!bot_line.contains('['));
        assert!(bot_line.contains('D'));
    }

    #[test]
    fn test_prompt() {
        let legal = LegalActions {
            fold: true,
            call: 0,
            raise: Some(RaiseBounds { min: 10, max: 90 }),
        };
        assert_eq!(render_prompt(&legal), "Your turn: fold, check, raise 10..90");
        let legal = LegalActions {
            fold: true,
            call: 15,
            raise: None,
        };
        assert_eq!(render_prompt(&legal), "Your turn: fold, call 15");
    }

    #[test]
    fn test_terminal_lists_winners_and_hands() {
        let terminal = TerminalRoundData {
            round_seq: 4,
            winners: vec![Payout {
                seat: 1,
                name: "Bot 1".to_string(),
                amount: 40,
                hand: Some("two pair".to_string()),
            }],
            final_seats: vec![seat(0, "Alice", 80, vec![]), seat(1, "Bot 1", 120, vec![])],
            pot: 40,
            board: vec![],
            shown_hands: vec![ShownHand {
                seat: 1,
                cards: vec![card("Qs"), card("Qh")],
                description: "two pair".to_string(),
            }],
        };
        let text = render_terminal(&terminal);
        assert!(text.contains("Round 4 over, pot 40, board --"));
        assert!(text.contains("Bot 1 shows Qs Qh (two pair)"));
        assert!(text.contains("Bot 1 wins 40 with two pair"));
    }

    #[test]
    fn test_game_result() {
        let names = vec!["Alice".to_string(), "Bot 1".to_string()];
        let won = GameResult {
            winner: Some(0),
            human_busted: false,
            rounds_played: 12,
            final_stacks: vec![200, 0],
        };
        assert_eq!(
            render_game_result(&won, &names),
            "You won the match! 12 rounds played. Final stacks: Alice 200, Bot 1 0"
        );
        let busted = GameResult {
            winner: Some(1),
            human_busted: true,
            rounds_played: 3,
            final_stacks: vec![0, 200],
        };
        assert!(render_game_result(&busted, &names).starts_with("You busted."));
    }

    #[test]
    fn test_waiting_line() {
        let view = SessionView {
            active: true,
            match_id: 1,
            snapshot: None,
            pending_seat_id: None,
            decision_id: None,
            legal_actions: None,
            thinking_seat_id: Some(2),
            terminal: None,
            game_result: None,
            error: None,
            phase: RoundPhase::Live,
            detection: None,
        };
        assert_eq!(render_waiting(&view).unwrap(), "seat 2 is thinking...");
    }
}
