//! Single-session poker bridge server.
//!
//! Serves the match API over HTTP while each match's engine runs on its own
//! thread.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Error};
use pb_server::{
    api::{self, AppState},
    config::ServerConfig,
    logging::{self, LogFormat},
    metrics,
};
use pico_args::Arguments;
use poker_bridge::table::MatchManager;
use tracing::{info, warn};

const HELP: &str = "\
Run a poker bridge server

USAGE:
  pb_server [OPTIONS]

OPTIONS:
  --bind          IP:PORT  Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --metrics-bind  IP:PORT  Prometheus scrape address   [default: env METRICS_BIND, disabled if unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  METRICS_BIND             Prometheus exporter address
  DECISION_TIMEOUT_SECS    Seconds the human has to act before folding [30]
  THINK_MIN_MS             Shortest bot thinking delay [400]
  THINK_MAX_MS             Longest bot thinking delay [1200]
  ROUND_PAUSE_MS           Pause between rounds [1500]
  MAX_OPPONENTS            Most bots a match may request [5]
  MAX_ROUNDS               End matches after this many rounds [unlimited]
  DEFAULT_BOT_DIFFICULTY   easy, standard or tag [standard]
  RUST_LOG                 Log filter [info]
  LOG_FORMAT               text or json [text]
";

struct Args {
    bind: Option<SocketAddr>,
    metrics_bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        metrics_bind: pargs.opt_value_from_str("--metrics-bind")?,
    };

    let log_format = match std::env::var("LOG_FORMAT") {
        Ok(value) => value.parse().map_err(Error::msg)?,
        Err(_) => LogFormat::default(),
    };
    logging::init(log_format);

    let config = ServerConfig::from_env(args.bind, args.metrics_bind)?;
    config.validate()?;
    info!(
        "Match defaults: timeout {:?}, think {:?}..{:?}, round pause {:?}, up to {} {} bots",
        config.match_defaults.decision_timeout,
        config.match_defaults.think_min,
        config.match_defaults.think_max,
        config.match_defaults.round_pause,
        config.match_defaults.max_opponents,
        config.match_defaults.difficulty,
    );

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(Error::msg)?;
        info!("Prometheus metrics at http://{metrics_bind}/metrics");
    }

    let manager = Arc::new(MatchManager::new(config.match_defaults.clone()));
    let app = api::create_router(AppState {
        manager: Arc::clone(&manager),
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    // Joining the engine thread blocks.
    tokio::task::spawn_blocking(move || manager.shutdown())
        .await
        .context("Match shutdown failed")?;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C, shutting down: {e}");
    }
}
