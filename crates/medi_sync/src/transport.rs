//! API transport: HTTP calls with per-attempt timeout and fixed-delay retry
//!
//! The in-call retry here is immediate and bounded; it is a different concept
//! from the durable queue's across-session retry. The transport knows nothing
//! about the queue — the sync engine is the only bridge between the two.

use async_trait::async_trait;
use medi_common::Method;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::time::Duration;

/// Per-call transport configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Additional attempts after the first failure (0 = single attempt)
    pub retries: u32,

    /// Fixed delay between attempts (no exponential backoff)
    pub retry_delay: Duration,

    /// Per-attempt timeout; an elapsed timeout counts as a failed attempt
    pub timeout: Duration,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            retries: 0,
            retry_delay: Duration::from_millis(1_000),
            timeout: Duration::from_millis(10_000),
        }
    }
}

/// Successful response from the remote API
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Decoded JSON body (`Null` for an empty body)
    pub data: Value,

    /// HTTP status code
    pub status: u16,

    /// Response headers
    pub headers: HeaderMap,
}

/// Structured transport failure, raised after retries are exhausted
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        /// Response body, when the server sent a decodable one
        body: Option<Value>,
    },
}

impl TransportError {
    /// HTTP status of the failure, when the server responded at all
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Seam between the sync engine and the network.
///
/// The engine replays queued items through this trait; tests substitute a
/// recording double.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one queued mutation against the remote API
    async fn dispatch(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> Result<ApiResponse, TransportError>;
}

/// HTTP implementation backed by reqwest
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    default_config: RequestConfig,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, default_config: RequestConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            default_config,
        }
    }

    pub async fn get(
        &self,
        endpoint: &str,
        config: Option<RequestConfig>,
    ) -> Result<ApiResponse, TransportError> {
        self.request(reqwest::Method::GET, endpoint, None, config)
            .await
    }

    pub async fn post(
        &self,
        endpoint: &str,
        body: Option<&Value>,
        config: Option<RequestConfig>,
    ) -> Result<ApiResponse, TransportError> {
        self.request(reqwest::Method::POST, endpoint, body, config)
            .await
    }

    pub async fn put(
        &self,
        endpoint: &str,
        body: Option<&Value>,
        config: Option<RequestConfig>,
    ) -> Result<ApiResponse, TransportError> {
        self.request(reqwest::Method::PUT, endpoint, body, config)
            .await
    }

    pub async fn delete(
        &self,
        endpoint: &str,
        config: Option<RequestConfig>,
    ) -> Result<ApiResponse, TransportError> {
        self.request(reqwest::Method::DELETE, endpoint, None, config)
            .await
    }

    async fn request(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        body: Option<&Value>,
        config: Option<RequestConfig>,
    ) -> Result<ApiResponse, TransportError> {
        let config = config.unwrap_or_else(|| self.default_config.clone());
        let url = format!("{}{}", self.base_url, endpoint);

        let mut remaining = config.retries;
        loop {
            match self.attempt(method.clone(), &url, body, config.timeout).await {
                Ok(response) => return Ok(response),
                Err(error) if remaining > 0 => {
                    tracing::debug!(%url, %error, remaining, "Attempt failed, retrying");
                    tokio::time::sleep(config.retry_delay).await;
                    remaining -= 1;
                }
                Err(error) => {
                    tracing::warn!(%url, %error, "Request failed, retries exhausted");
                    return Err(error);
                }
            }
        }
    }

    async fn attempt(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&Value>,
        timeout: Duration,
    ) -> Result<ApiResponse, TransportError> {
        let mut builder = self.client.request(method, url).timeout(timeout);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            // Best-effort decode of the error body; servers do not always send JSON.
            let body = serde_json::from_slice(&bytes).ok();
            return Err(TransportError::Http {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string(),
                body,
            });
        }

        let data = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|e| TransportError::Network(format!("invalid response body: {e}")))?
        };

        Ok(ApiResponse {
            data,
            status: status.as_u16(),
            headers,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn dispatch(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> Result<ApiResponse, TransportError> {
        match method {
            Method::Post => self.post(endpoint, payload, None).await,
            Method::Put => self.put(endpoint, payload, None).await,
            Method::Delete => self.delete(endpoint, None).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request_config() {
        let config = RequestConfig::default();
        assert_eq!(config.retries, 0);
        assert_eq!(config.retry_delay, Duration::from_millis(1_000));
        assert_eq!(config.timeout, Duration::from_millis(10_000));
    }

    #[test]
    fn test_error_status_classification() {
        let http = TransportError::Http {
            status: 404,
            message: "Not Found".to_string(),
            body: None,
        };
        assert_eq!(http.status(), Some(404));
        assert_eq!(TransportError::Timeout.status(), None);
        assert_eq!(TransportError::Network("refused".to_string()).status(), None);
    }

    #[test]
    fn test_error_display_carries_status() {
        let error = TransportError::Http {
            status: 422,
            message: "Unprocessable Entity".to_string(),
            body: Some(serde_json::json!({"field": "calories"})),
        };
        assert_eq!(error.to_string(), "HTTP 422: Unprocessable Entity");
    }

    #[tokio::test]
    async fn test_connection_failure_classified_as_network() {
        // Nothing listens on this port; each attempt fails fast.
        let transport = HttpTransport::new(
            "http://127.0.0.1:9",
            RequestConfig {
                retries: 1,
                retry_delay: Duration::from_millis(10),
                timeout: Duration::from_millis(500),
            },
        );

        let error = transport
            .post("/logs", Some(&serde_json::json!({"a": 1})), None)
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            TransportError::Network(_) | TransportError::Timeout
        ));
    }
}
