//! Structured logging configuration.
//!
//! Records from the `poker_bridge` library go through the `log` facade and
//! are picked up by the subscriber's `log` bridge, so engine-thread events and
//! request events end up in the same stream.

use std::str::FromStr;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,hyper=warn,tower_http=warn";

/// Output format, chosen with `LOG_FORMAT`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable, one line per event.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format `{other}` (expected text or json)")),
        }
    }
}

/// Initialize structured logging
///
/// Features:
/// - Configurable log levels via RUST_LOG env var
/// - Thread names, so engine threads (`match-<id>`) can be told apart
/// - JSON output for log shippers
///
/// # Example
///
/// ```no_run
/// use pb_server::logging::{self, LogFormat};
///
/// #[tokio::main]
/// async fn main() {
///     logging::init(LogFormat::Text);
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_thread_names(true),
            )
            .init(),
    }

    tracing::info!(?format, "Structured logging initialized");
}

/// Log one answered request. Polls are frequent, so only failures are
/// logged above debug.
pub fn log_api_request(method: &str, route: &str, status_code: u16, duration_ms: u64) {
    if status_code >= 500 {
        tracing::warn!(
            http_method = method,
            http_route = route,
            http_status = status_code,
            duration_ms,
            "API request failed"
        );
    } else if status_code >= 400 {
        tracing::info!(
            http_method = method,
            http_route = route,
            http_status = status_code,
            duration_ms,
            "API request rejected"
        );
    } else {
        tracing::debug!(
            http_method = method,
            http_route = route,
            http_status = status_code,
            duration_ms,
            "API request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse(), Ok(LogFormat::Json));
        assert_eq!(" Text ".parse(), Ok(LogFormat::Text));
        assert_eq!("pretty".parse(), Ok(LogFormat::Text));
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::default(), LogFormat::Text);
    }

    #[test]
    fn test_log_api_request_without_subscriber() {
        log_api_request("GET", "/state", 200, 1);
        log_api_request("POST", "/action", 409, 1);
        log_api_request("POST", "/start", 500, 12);
    }
}
