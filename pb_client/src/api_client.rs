//! HTTP API client for the bridge server.

use anyhow::{Context, Result};
use poker_bridge::{
    session::{Observation, SessionView},
    table::{
        ActionBody, ActionResponse, ErrorResponse, ForceAdvanceResponse, StartRequest,
        StartResponse, StatusResponse,
    },
};
use serde::de::DeserializeOwned;

/// What a rejected request told us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub status: u16,
    pub message: String,
}

impl Rejection {
    /// The request no longer fits the match (decision already answered,
    /// no match running).
    pub fn is_conflict(&self) -> bool {
        self.status == 409
    }
}

/// API client for communicating with the bridge server
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a response, turning an error body into a [`Rejection`].
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<std::result::Result<T, Rejection>> {
        let status = response.status();
        if status.is_success() {
            let body = response
                .json()
                .await
                .with_context(|| format!("Failed to parse {what} response"))?;
            return Ok(Ok(body));
        }
        let message = match response.json::<ErrorResponse>().await {
            Ok(error) => error.message,
            Err(e) => format!("Failed to read error response: {}", e),
        };
        Ok(Err(Rejection {
            status: status.as_u16(),
            message,
        }))
    }

    /// Start a match, replacing any running one
    pub async fn start(&self, request: &StartRequest) -> Result<StartResponse> {
        let response = self
            .client
            .post(self.url("/start"))
            .json(request)
            .send()
            .await
            .context("Failed to send start request")?;

        Self::decode(response, "start")
            .await?
            .map_err(|rejection| anyhow::anyhow!("Start failed: {}", rejection.message))
    }

    /// Poll the session. `previous` is what the client last saw, so the
    /// server can classify round boundaries against it.
    pub async fn state(&self, previous: Option<&Observation>) -> Result<SessionView> {
        let mut request = self.client.get(self.url("/state"));
        if let Some(previous) = previous {
            request = request.query(&[("round", previous.round_seq)]);
            if let Some(result_round) = previous.terminal_round {
                request = request.query(&[("showing_result", "true")]);
                request = request.query(&[("result_round", result_round)]);
            }
        }
        let response = request.send().await.context("Failed to poll state")?;

        Self::decode(response, "state")
            .await?
            .map_err(|rejection| anyhow::anyhow!("State poll failed: {}", rejection.message))
    }

    /// Submit an action. A rejection is returned, not raised: a stale
    /// decision is routine for a polling client.
    pub async fn act(&self, body: &ActionBody) -> Result<std::result::Result<ActionResponse, Rejection>> {
        let response = self
            .client
            .post(self.url("/action"))
            .json(body)
            .send()
            .await
            .context("Failed to send action")?;

        Self::decode(response, "action").await
    }

    /// Tear down the running match
    pub async fn reset(&self) -> Result<StatusResponse> {
        let response = self
            .client
            .post(self.url("/reset"))
            .send()
            .await
            .context("Failed to send reset request")?;

        Self::decode(response, "reset")
            .await?
            .map_err(|rejection| anyhow::anyhow!("Reset failed: {}", rejection.message))
    }

    /// Acknowledge the round result on display
    pub async fn force_advance(&self) -> Result<ForceAdvanceResponse> {
        let response = self
            .client
            .post(self.url("/force-advance"))
            .send()
            .await
            .context("Failed to send force-advance request")?;

        Self::decode(response, "force-advance")
            .await?
            .map_err(|rejection| anyhow::anyhow!("Force advance failed: {}", rejection.message))
    }
}
