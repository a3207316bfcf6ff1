use poker_bridge::table::ActionBody;
use std::fmt;

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Answer the pending decision.
    Act { action: String, amount: i64 },
    /// Dismiss the round result on display.
    Advance,
    Help,
    Quit,
}

impl Command {
    /// Request body answering decision `decision_id`, if this is an action.
    pub fn into_body(self, decision_id: u64) -> Option<ActionBody> {
        match self {
            Self::Act { action, amount } => Some(ActionBody {
                action,
                amount,
                decision_id: Some(decision_id),
            }),
            _ => None,
        }
    }
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Raise without an amount.
    MissingRaiseAmount,
    /// Invalid raise amount (not a valid number).
    InvalidRaiseAmount(String),
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRaiseAmount => {
                write!(f, "Raise requires a total amount (e.g., 'raise 40')")
            }
            Self::InvalidRaiseAmount(value) => write!(
                f,
                "Invalid raise amount '{}'. Must be a positive number (e.g., 'raise 40')",
                value
            ),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Type 'help' to see available commands",
                cmd
            ),
        }
    }
}

impl std::error::Error for ParseError {}

pub const COMMAND_HELP: &str = "\
  fold           give up the hand
  call | check   match the current bet (checking when there is nothing to call)
  raise N        raise to a street total of N
  next           dismiss the round result
  help           show this help
  quit           leave the client";

/// Parse a command string into a [`Command`].
///
/// # Arguments
///
/// * `input` - The raw command string from user input
///
/// # Returns
///
/// * `Ok(Command)` - Successfully parsed command
/// * `Err(ParseError)` - Parse error with descriptive message
///
/// # Examples
///
/// ```
/// use pb_client::commands::{Command, parse_command};
///
/// assert_eq!(parse_command("fold"), Ok(Command::Act { action: "fold".into(), amount: 0 }));
/// assert_eq!(parse_command("check"), Ok(Command::Act { action: "call".into(), amount: 0 }));
/// assert_eq!(parse_command("raise 40"), Ok(Command::Act { action: "raise".into(), amount: 40 }));
/// ```
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();

    match trimmed {
        "fold" | "f" => return Ok(act("fold", 0)),
        // A check is a call of nothing; the server works out the amount.
        "call" | "check" | "c" => return Ok(act("call", 0)),
        "next" | "n" => return Ok(Command::Advance),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" | "q" => return Ok(Command::Quit),
        _ => {}
    }

    let parts: Vec<&str> = trimmed.split_ascii_whitespace().collect();
    match parts.first() {
        Some(&"raise") | Some(&"r") => parse_raise_command(&parts),
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

fn act(action: &str, amount: i64) -> Command {
    Command::Act {
        action: action.to_string(),
        amount,
    }
}

/// Parse a raise command: "raise AMOUNT"
fn parse_raise_command(parts: &[&str]) -> Result<Command, ParseError> {
    let value = parts.get(1).ok_or(ParseError::MissingRaiseAmount)?;
    let amount = value
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidRaiseAmount(value.to_string()))?;
    Ok(act("raise", i64::from(amount)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_word_commands() {
        assert_eq!(parse_command("fold"), Ok(act("fold", 0)));
        assert_eq!(parse_command("  call \n"), Ok(act("call", 0)));
        assert_eq!(parse_command("check"), Ok(act("call", 0)));
        assert_eq!(parse_command("next"), Ok(Command::Advance));
        assert_eq!(parse_command("help"), Ok(Command::Help));
        assert_eq!(parse_command("q"), Ok(Command::Quit));
    }

    #[test]
    fn test_raise() {
        assert_eq!(parse_command("raise 40"), Ok(act("raise", 40)));
        assert_eq!(parse_command("r 100"), Ok(act("raise", 100)));
        assert_eq!(parse_command("raise"), Err(ParseError::MissingRaiseAmount));
        assert_eq!(
            parse_command("raise -5"),
            Err(ParseError::InvalidRaiseAmount("-5".to_string()))
        );
        assert_eq!(
            parse_command("raise lots"),
            Err(ParseError::InvalidRaiseAmount("lots".to_string()))
        );
    }

    #[test]
    fn test_unrecognized() {
        let err = parse_command("all-in").unwrap_err();
        assert_eq!(err, ParseError::UnrecognizedCommand("all-in".to_string()));
        assert!(err.to_string().contains("help"));
    }

    #[test]
    fn test_into_body_carries_decision() {
        let body = act("raise", 40).into_body(7).unwrap();
        assert_eq!(body.action, "raise");
        assert_eq!(body.amount, 40);
        assert_eq!(body.decision_id, Some(7));
        assert!(Command::Advance.into_body(7).is_none());
    }
}
