//! Match API handlers.
//!
//! Rejections map to `400 Bad Request` when the request itself is wrong and
//! to `409 Conflict` when it no longer fits the match (no pending decision,
//! another seat's turn, a decision that has already been answered).
//!
//! # Examples
//!
//! Start a match:
//! ```bash
//! curl -X POST http://localhost:6969/start \
//!   -H "Content-Type: application/json" \
//!   -d '{"player_name": "Alice", "opponents": 2, "starting_stack": 1000, "blind": 10}'
//! ```
//!
//! Answer the pending decision:
//! ```bash
//! curl -X POST http://localhost:6969/action \
//!   -H "Content-Type: application/json" \
//!   -d '{"action": "raise", "amount": 60, "decision_id": 3}'
//! ```

use axum::{
    Extension, Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use poker_bridge::{
    game::EngineError,
    session::{Observation, SessionView, SubmitError},
    table::{
        ActionBody, ActionResponse, ErrorResponse, ForceAdvanceResponse, StartError, StartRequest,
        StartResponse, StatusResponse,
    },
};
use serde::Deserialize;

use super::{AppState, request_id::RequestId};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

fn bad_json(rejection: JsonRejection) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, rejection.body_text())
}

fn start_error(error: &StartError) -> ApiError {
    let status = match error {
        StartError::InvalidConfig(_) | StartError::Engine(EngineError::InvalidTable(_)) => {
            StatusCode::BAD_REQUEST
        }
        StartError::Engine(_) | StartError::Spawn(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, error.to_string())
}

fn submit_error(error: &SubmitError) -> ApiError {
    let status = if error.is_conflict() {
        StatusCode::CONFLICT
    } else {
        StatusCode::BAD_REQUEST
    };
    api_error(status, error.to_string())
}

/// Start a match, replacing any running one.
///
/// # Request Body
///
/// ```json
/// {
///   "player_name": "Alice",
///   "opponents": 2,
///   "starting_stack": 1000,
///   "blind": 10,
///   "difficulty": "tag",          // optional
///   "decision_timeout_secs": 30   // optional
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or invalid match settings
pub async fn start(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> Result<Json<StartResponse>, ApiError> {
    let Json(request) = payload.map_err(bad_json)?;
    match state.manager.start(&request) {
        Ok(match_id) => {
            tracing::info!(request_id = %request_id, match_id, "Match started");
            Ok(Json(StartResponse {
                status: "started".to_string(),
                match_id,
            }))
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Match not started");
            Err(start_error(&e))
        }
    }
}

/// Submit the human's action for the pending decision.
///
/// # Request Body
///
/// ```json
/// {"action": "call", "amount": 0, "decision_id": 3}
/// ```
///
/// `amount` is a street total: `0` or the advertised amount for a call,
/// within the advertised bounds for a raise, ignored for a fold.
///
/// # Errors
///
/// - `400 Bad Request`: Unknown action, negative amount, amount out of bounds
/// - `409 Conflict`: No match, no pending decision, stale decision id
pub async fn action(
    State(state): State<AppState>,
    payload: Result<Json<ActionBody>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let Json(body) = payload.map_err(bad_json)?;
    state
        .manager
        .submit_action(&body.action, body.amount, body.decision_id)
        .map(|decision_id| {
            Json(ActionResponse {
                status: "ok".to_string(),
                decision_id,
            })
        })
        .map_err(|e| submit_error(&e))
}

/// What the client last saw, sent back with each poll.
#[derive(Debug, Default, Deserialize)]
pub struct StateQuery {
    /// Round of the last live snapshot the client rendered.
    pub round: Option<u64>,
    /// Whether the client is currently showing a round result.
    #[serde(default)]
    pub showing_result: bool,
    /// Round of the result on display, when it differs from `round`.
    pub result_round: Option<u64>,
}

impl StateQuery {
    fn observation(&self) -> Option<Observation> {
        let round_seq = self.round?;
        Some(Observation {
            round_seq,
            terminal_round: self
                .showing_result
                .then(|| self.result_round.unwrap_or(round_seq)),
            live_seats: !self.showing_result,
        })
    }
}

/// Poll the session. Idempotent.
///
/// With `round` (and `showing_result`) the response also carries the round
/// boundary classification against what the client last saw.
pub async fn state(
    State(state): State<AppState>,
    Query(query): Query<StateQuery>,
) -> Json<SessionView> {
    let previous = query.observation();
    Json(state.manager.state(previous.as_ref()))
}

pub async fn reset(State(state): State<AppState>) -> Json<StatusResponse> {
    let was_running = state.manager.reset();
    tracing::info!(was_running, "Session reset");
    Json(StatusResponse {
        status: "reset".to_string(),
    })
}

/// Drop the round result on display without waiting for the next round.
pub async fn force_advance(State(state): State<AppState>) -> Json<ForceAdvanceResponse> {
    let cleared = state.manager.force_advance();
    tracing::debug!(cleared, "Force advance");
    Json(ForceAdvanceResponse {
        status: "ok".to_string(),
        cleared,
    })
}
