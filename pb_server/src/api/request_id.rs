//! Request ids and per-request accounting.
//!
//! A client may pick its own id through `x-request-id`; anything that would
//! make a poor log field is replaced with a fresh UUID. The id is echoed on
//! the response and handlers can read it through `Extension<RequestId>`.

use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::{fmt, time::Instant};
use uuid::Uuid;

use crate::{logging, metrics};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_CLIENT_ID_LEN: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The client's id when it is short printable ASCII, otherwise a new one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|id| {
                !id.is_empty()
                    && id.len() <= MAX_CLIENT_ID_LEN
                    && id.bytes().all(|b| b.is_ascii_graphic())
            })
            .map(|id| Self(id.to_string()))
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Route template used as the metrics label, so unknown paths share one
/// series instead of minting a new one per URL.
fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string())
}

/// Tag the request with its id, then record its outcome once the handler
/// has answered.
pub async fn track_request(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_headers(request.headers());
    let method = request.method().to_string();
    let route = route_label(&request);
    let started = Instant::now();

    request.extensions_mut().insert(request_id.clone());
    tracing::trace!(request_id = %request_id, %method, uri = %request.uri(), "request received");

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    let elapsed = started.elapsed();
    let status = response.status().as_u16();
    metrics::http_requests_total(&method, &route, status);
    metrics::http_request_duration_ms(&method, &route, elapsed.as_secs_f64() * 1000.0);
    logging::log_api_request(&method, &route, status, elapsed.as_millis() as u64);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(id: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static(id));
        headers
    }

    #[test]
    fn test_client_id_kept() {
        let id = RequestId::from_headers(&headers_with("poll-42"));
        assert_eq!(id.as_str(), "poll-42");
        assert_eq!(id.to_string(), "poll-42");
    }

    #[test]
    fn test_missing_id_generated() {
        let id = RequestId::from_headers(&HeaderMap::new());
        assert!(Uuid::parse_str(id.as_str()).is_ok());
        assert_ne!(id, RequestId::from_headers(&HeaderMap::new()));
    }

    #[test]
    fn test_unusable_client_id_replaced() {
        let long: &'static str = Box::leak("x".repeat(MAX_CLIENT_ID_LEN + 1).into_boxed_str());
        for bad in ["", "has space", long] {
            let id = RequestId::from_headers(&headers_with(bad));
            assert!(Uuid::parse_str(id.as_str()).is_ok(), "kept {bad:?}");
        }
    }
}
