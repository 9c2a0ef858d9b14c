//! Canned-response feature transport.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use layer_runtime::{FeatureTransport, TransportError};
use serde_json::{json, Value};

#[derive(Debug, Default)]
struct FakeState {
    /// (url substring, response); first match wins
    routes: Vec<(String, Value)>,
    failing: Vec<String>,
    requests: Vec<String>,
    delay: Option<Duration>,
    /// (url substring, delay); overrides `delay` for matching URLs
    delays: Vec<(String, Duration)>,
}

/// Answers from a routing table and records every requested URL.
///
/// Unrouted URLs get an empty FeatureCollection.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Respond with `body` for any URL containing `pattern`.
    pub fn respond(&self, pattern: &str, body: Value) -> &Self {
        self.lock().routes.push((pattern.to_string(), body));
        self
    }

    /// Fail any URL containing `pattern` with HTTP 503.
    pub fn fail(&self, pattern: &str) -> &Self {
        self.lock().failing.push(pattern.to_string());
        self
    }

    /// Sleep before answering (tokio time, so paused clocks apply).
    pub fn set_delay(&self, delay: Duration) -> &Self {
        self.lock().delay = Some(delay);
        self
    }

    /// Sleep for `delay` before answering any URL containing `pattern`.
    pub fn delay_for(&self, pattern: &str, delay: Duration) -> &Self {
        self.lock().delays.push((pattern.to_string(), delay));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    /// Requested URLs containing `pattern`.
    pub fn requests_matching(&self, pattern: &str) -> Vec<String> {
        self.lock()
            .requests
            .iter()
            .filter(|u| u.contains(pattern))
            .cloned()
            .collect()
    }

    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }
}

#[async_trait]
impl FeatureTransport for FakeTransport {
    async fn get_json(&self, url: &str) -> Result<Value, TransportError> {
        let delay = {
            let mut state = self.lock();
            state.requests.push(url.to_string());
            state
                .delays
                .iter()
                .find(|(p, _)| url.contains(p.as_str()))
                .map(|(_, d)| *d)
                .or(state.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.lock();
        if state.failing.iter().any(|p| url.contains(p.as_str())) {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: 503,
            });
        }
        Ok(state
            .routes
            .iter()
            .find(|(p, _)| url.contains(p.as_str()))
            .map(|(_, body)| body.clone())
            .unwrap_or_else(|| json!({"type": "FeatureCollection", "features": []})))
    }
}
