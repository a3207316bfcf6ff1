//! A terminal client for the poker_bridge server.
//!
//! The client starts a match, then polls `/state` and plays the human seat
//! from the command line. A round result stays on screen until the next
//! round takes over or the player types `next`.

use anyhow::{Context, Result, bail};
use pico_args::Arguments;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use pb_client::{
    api_client::ApiClient,
    commands::{COMMAND_HELP, Command, parse_command},
    display,
    rounds::{ResultEvent, ResultTracker},
};
use poker_bridge::{
    game::{HUMAN_SEAT, LegalActions},
    session::SessionView,
    table::{ActionBody, BotDifficulty, StartRequest},
};

const HELP: &str = "\
Play a poker_bridge match from the terminal

USAGE:
  pb_client [OPTIONS]

OPTIONS:
  --server URL          Server URL  [default: http://127.0.0.1:6969]
  --name NAME           Player name  [default: Player]
  --opponents N         Number of bots  [default: 3]
  --stack CHIPS         Starting stack  [default: 1000]
  --blind CHIPS         Small blind  [default: 10]
  --difficulty LEVEL    Bot difficulty: easy, standard or tag
  --poll-ms MS          Poll interval  [default: 250]

FLAGS:
  --auto                Call every decision instead of prompting
  -h, --help            Print help information
";

struct Args {
    server_url: String,
    start: StartRequest,
    poll: Duration,
    auto: bool,
}

fn parse_args() -> Result<Args> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let difficulty: Option<BotDifficulty> = pargs
        .opt_value_from_str("--difficulty")
        .context("Invalid --difficulty")?;
    let args = Args {
        server_url: pargs
            .opt_value_from_str("--server")?
            .unwrap_or_else(|| "http://127.0.0.1:6969".to_string()),
        start: StartRequest {
            player_name: pargs
                .opt_value_from_str("--name")?
                .unwrap_or_else(|| "Player".to_string()),
            opponents: pargs.opt_value_from_str("--opponents")?.unwrap_or(3),
            starting_stack: pargs.opt_value_from_str("--stack")?.unwrap_or(1000),
            blind: pargs.opt_value_from_str("--blind")?.unwrap_or(10),
            difficulty,
            decision_timeout_secs: None,
        },
        poll: Duration::from_millis(pargs.opt_value_from_str("--poll-ms")?.unwrap_or(250)),
        auto: pargs.contains("--auto"),
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        bail!("Unexpected arguments: {:?}", remaining);
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;
    run(args).await
}

/// What the client has already shown, so each thing is printed once.
#[derive(Default)]
struct Shown {
    results: ResultTracker,
    answered: Option<u64>,
    /// Decision waiting for a line on stdin.
    open: Option<(u64, LegalActions)>,
    thinking: Option<usize>,
    names: Vec<String>,
}

enum Flow {
    Continue,
    Quit,
}

async fn run(args: Args) -> Result<()> {
    let api = ApiClient::new(args.server_url.clone());
    let started = api.start(&args.start).await?;
    println!(
        "Match {} started against {} bots. Type 'help' for commands.",
        started.match_id, args.start.opponents
    );

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut shown = Shown::default();

    loop {
        let view = api.state(shown.results.previous().as_ref()).await?;
        if view.match_id != started.match_id {
            bail!("Match {} was replaced by match {}", started.match_id, view.match_id);
        }
        if let Some(error) = &view.error {
            bail!("Match failed: {}", error);
        }
        if let Some(snapshot) = &view.snapshot {
            shown.names = snapshot.seats.iter().map(|s| s.name.clone()).collect();
        }

        for event in shown.results.observe(&view) {
            announce(event, &view, args.auto);
        }

        if let Some(result) = &view.game_result {
            println!("{}", display::render_game_result(result, &shown.names));
            return Ok(());
        }
        if !view.active {
            bail!("Match {} was reset", started.match_id);
        }

        if view.thinking_seat_id != shown.thinking {
            shown.thinking = view.thinking_seat_id;
            if let Some(line) = display::render_waiting(&view) {
                println!("{line}");
            }
        }

        // A decision that closed without our answer timed out.
        if let Some((id, _)) = shown.open.filter(|(id, _)| view.decision_id != Some(*id)) {
            println!("Decision {id} closed before an answer arrived.");
            shown.open = None;
        }
        if let Some(decision) = new_decision(&view, shown.answered) {
            shown.answered = Some(decision);
            offer(&api, &view, decision, args.auto, &mut shown).await?;
        }

        tokio::select! {
            line = input.next_line(), if stdin_open => {
                match line.context("Failed to read input")? {
                    Some(line) => {
                        if let Flow::Quit = handle_line(&api, &line, &mut shown).await? {
                            return leave(&api).await;
                        }
                    }
                    None if args.auto => stdin_open = false,
                    None => return leave(&api).await,
                }
            }
            _ = tokio::time::sleep(args.poll) => {}
        }
    }
}

async fn leave(api: &ApiClient) -> Result<()> {
    api.reset().await?;
    println!("Left the match.");
    Ok(())
}

fn announce(event: ResultEvent, view: &SessionView, auto: bool) {
    match event {
        ResultEvent::Show(round) => {
            if let Some(terminal) = view.terminal.as_ref().filter(|t| t.round_seq == round) {
                print!("{}", display::render_terminal(terminal));
            }
            if !auto {
                println!("(type 'next' to dismiss)");
            }
        }
        ResultEvent::NextRound {
            result_round,
            round,
        } => println!("Round {round} is under way; round {result_round} result still shown."),
        ResultEvent::Dismissed(round) => println!("Round {round} result cleared."),
    }
}

/// Id of a human decision the client has not answered yet.
fn new_decision(view: &SessionView, answered: Option<u64>) -> Option<u64> {
    if view.pending_seat_id != Some(HUMAN_SEAT) {
        return None;
    }
    view.decision_id.filter(|id| Some(*id) > answered)
}

/// Show a new decision and either answer it at once or wait for stdin.
async fn offer(
    api: &ApiClient,
    view: &SessionView,
    decision: u64,
    auto: bool,
    shown: &mut Shown,
) -> Result<()> {
    if let Some(snapshot) = &view.snapshot {
        print!("{}", display::render_snapshot(snapshot));
    }
    let Some(legal) = view.legal_actions else {
        return Ok(());
    };

    if auto {
        let body = ActionBody {
            action: "call".to_string(),
            amount: 0,
            decision_id: Some(decision),
        };
        if let Err(rejection) = api.act(&body).await? {
            println!("Action rejected: {}", rejection.message);
        }
        return Ok(());
    }

    println!("{}", display::render_prompt(&legal));
    shown.open = Some((decision, legal));
    Ok(())
}

async fn handle_line(api: &ApiClient, line: &str, shown: &mut Shown) -> Result<Flow> {
    let command = match parse_command(line) {
        Ok(command) => command,
        Err(e) => {
            println!("{e}");
            return Ok(Flow::Continue);
        }
    };
    match command {
        Command::Help => println!("{COMMAND_HELP}"),
        Command::Quit => return Ok(Flow::Quit),
        Command::Advance => {
            let advanced = api.force_advance().await?;
            match shown.results.dismiss() {
                Some(round) if advanced.cleared => println!("Round {round} result cleared."),
                Some(round) => println!("Round {round} result was already gone."),
                None => println!("No round result to dismiss."),
            }
        }
        command => {
            let Some((decision, legal)) = shown.open else {
                println!("Nothing to act on right now.");
                return Ok(Flow::Continue);
            };
            let Some(body) = command.into_body(decision) else {
                return Ok(Flow::Continue);
            };
            match api.act(&body).await? {
                Ok(_) => shown.open = None,
                Err(rejection) if rejection.is_conflict() => {
                    // Timed out or otherwise answered; the next poll shows what happened.
                    println!("Too late: {}", rejection.message);
                    shown.open = None;
                }
                Err(rejection) => {
                    println!("Action rejected: {}", rejection.message);
                    println!("{}", display::render_prompt(&legal));
                }
            }
        }
    }
    Ok(Flow::Continue)
}
