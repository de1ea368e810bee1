//! Scripted transport double for sync engine tests
//!
//! Records every dispatched call in order and fails the endpoints it was told
//! to fail, so tests can assert on replay order, partial-failure handling and
//! drain exclusivity without a network stack.

use async_trait::async_trait;
use medi_common::Method;
use medi_sync::transport::{ApiResponse, Transport, TransportError};
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

/// One call the engine dispatched through the double
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub endpoint: String,
    pub payload: Option<Value>,
}

/// Transport double with per-endpoint scripted outcomes.
///
/// Every endpoint succeeds with an empty 200 unless listed via
/// [`fail_endpoint`](Self::fail_endpoint), which makes it return HTTP 500.
/// An optional per-call delay keeps a drain in flight long enough for
/// concurrency tests to observe it.
pub struct ScriptedTransport {
    calls: Mutex<Vec<RecordedCall>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: HashSet::new(),
            delay: None,
        }
    }

    /// Script an endpoint to fail with HTTP 500
    pub fn fail_endpoint(mut self, endpoint: &str) -> Self {
        self.failing.insert(endpoint.to_string());
        self
    }

    /// Hold every dispatched call in flight for `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All calls dispatched so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Endpoints of all calls dispatched so far, in order
    pub fn endpoints(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.endpoint).collect()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn dispatch(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> Result<ApiResponse, TransportError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedCall {
                method,
                endpoint: endpoint.to_string(),
                payload: payload.cloned(),
            });

        if self.failing.contains(endpoint) {
            return Err(TransportError::Http {
                status: 500,
                message: "Internal Server Error".to_string(),
                body: None,
            });
        }

        Ok(ApiResponse {
            data: Value::Null,
            status: 200,
            headers: HeaderMap::new(),
        })
    }
}
