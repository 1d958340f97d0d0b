//! Network round-trip waits for CDP page session.
//!
//! The editor commands assert on single request/response exchanges with the
//! editing server. A wait is armed *before* the triggering action: arming
//! drains any buffered network events, so the wait can only observe the
//! round trip caused by its own action. `Network.requestWillBeSent` carries
//! the request method and URL; `Network.responseReceived` completes the
//! exchange.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, trace};
use url::Url;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::CdpResponse;

use super::core::PageSession;

/// Matches a single expected request by HTTP method and URL path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPattern {
    pub method: String,
    pub path_prefix: String,
}

impl RequestPattern {
    /// Pattern for a POST request under the given path prefix.
    pub fn post(path_prefix: impl Into<String>) -> Self {
        Self {
            method: "POST".to_string(),
            path_prefix: path_prefix.into(),
        }
    }

    /// Whether a request with this method and URL matches.
    pub fn matches(&self, method: &str, request_url: &str) -> bool {
        if !method.eq_ignore_ascii_case(&self.method) {
            return false;
        }
        match Url::parse(request_url) {
            Ok(parsed) => parsed.path().starts_with(&self.path_prefix),
            // Relative URL; compare against the raw string.
            Err(_) => request_url.starts_with(&self.path_prefix),
        }
    }
}

/// The completed request/response exchange a `RoundTrip` resolved to.
#[derive(Debug, Clone)]
pub struct RoundTripResponse {
    pub request_id: String,
    pub url: String,
    pub status: i64,
}

/// Armed wait for exactly one matching round trip.
pub struct RoundTrip<'a> {
    session: &'a PageSession,
    pattern: RequestPattern,
}

impl PageSession {
    /// Arm a round-trip wait. Call this before the action that triggers the
    /// request, then `wait` on the returned guard after the action.
    pub async fn expect_round_trip(&self, pattern: RequestPattern) -> RoundTrip<'_> {
        let mut rx = self.event_rx.lock().await;
        let mut drained = 0usize;
        while rx.try_recv().is_ok() {
            drained += 1;
        }
        if drained > 0 {
            trace!("Discarded {} stale protocol events", drained);
        }
        RoundTrip {
            session: self,
            pattern,
        }
    }
}

impl RoundTrip<'_> {
    /// Wait until one request matching the pattern has received its
    /// response, or the timeout expires.
    pub async fn wait(self, timeout: Duration) -> Result<RoundTripResponse, CdpError> {
        let deadline = Instant::now() + timeout;
        let mut in_flight: HashMap<String, String> = HashMap::new();
        let mut rx = self.session.event_rx.lock().await;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timeout_error());
            }

            let event = match tokio::time::timeout(remaining, rx.recv()).await {
                Ok(Some(event)) => event,
                Ok(None) => return Err(CdpError::SessionClosed),
                Err(_) => return Err(self.timeout_error()),
            };

            if let Some(response) = observe_event(&self.pattern, &mut in_flight, &event) {
                debug!(
                    "Round trip matched: {} {} ({})",
                    self.pattern.method, response.url, response.status
                );
                return Ok(response);
            }
        }
    }

    fn timeout_error(&self) -> CdpError {
        CdpError::Timeout(format!(
            "No {} round trip under '{}' observed",
            self.pattern.method, self.pattern.path_prefix
        ))
    }
}

/// Feed one protocol event through the matcher. Returns the completed round
/// trip once a matched request's response arrives.
fn observe_event(
    pattern: &RequestPattern,
    in_flight: &mut HashMap<String, String>,
    event: &CdpResponse,
) -> Option<RoundTripResponse> {
    let method = event.method.as_deref()?;
    let params = event.params.as_ref()?;

    match method {
        "Network.requestWillBeSent" => {
            let request_id = params["requestId"].as_str()?;
            let http_method = params["request"]["method"].as_str()?;
            let url = params["request"]["url"].as_str()?;
            if pattern.matches(http_method, url) {
                trace!("Request {} matches pattern: {} {}", request_id, http_method, url);
                in_flight.insert(request_id.to_string(), url.to_string());
            }
            None
        }
        "Network.responseReceived" => {
            let request_id = params["requestId"].as_str()?;
            let url = in_flight.remove(request_id)?;
            let status = params["response"]["status"].as_i64().unwrap_or(0);
            Some(RoundTripResponse {
                request_id: request_id.to_string(),
                url,
                status,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;
