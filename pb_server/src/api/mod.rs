//! HTTP API for playing a match from a browser.
//!
//! Every handler is a handful of short lock acquisitions on the
//! [`MatchManager`]; none of them waits for the engine thread.
//!
//! # Endpoints Overview
//!
//! - `POST /start` - Start a match, replacing any running one
//! - `POST /action` - Submit the human's action for the pending decision
//! - `GET /state` - Poll the session (`?round=N&showing_result=bool`)
//! - `POST /reset` - Tear down the running match
//! - `POST /force-advance` - Drop the round result on display
//! - `GET /health` - Server health status
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use pb_server::api::{create_router, AppState};
//! use poker_bridge::table::{MatchDefaults, MatchManager};
//! use std::sync::Arc;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let state = AppState {
//!     manager: Arc::new(MatchManager::new(MatchDefaults::default())),
//! };
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:6969").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively so a page served from anywhere can poll.

pub mod game;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use poker_bridge::table::MatchManager;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<MatchManager>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Arguments
///
/// - `state`: Application state with the match manager
///
/// # Returns
///
/// Configured Axum router ready to serve requests
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/start", post(game::start))
        .route("/action", post(game::action))
        .route("/state", get(game::state))
        .route("/reset", post(game::reset))
        .route("/force-advance", post(game::force_advance))
        .layer(axum::middleware::from_fn(request_id::track_request))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.3.0","active_match":null,"timestamp":"2026-10-16T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "active_match": state.manager.active_match(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
