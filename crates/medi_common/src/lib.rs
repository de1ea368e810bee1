//! Common types for the MediDiet sync subsystem
//!
//! This crate provides the shared data model used by both the sync engine
//! and the consumer-side stores that enqueue work: the queued-request record
//! persisted across restarts, and the mutation verbs that may be deferred.

pub mod telemetry;

use serde::{Deserialize, Serialize};

/// HTTP mutation verbs that may be queued for offline replay.
///
/// GET is deliberately absent: idempotent reads are never deferred, they are
/// simply retried live by whoever needs the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// A mutation a consumer wants replayed remotely.
///
/// This is the enqueue-call shape: the queue store fills in the id,
/// timestamp and retry counter when it accepts the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRequest {
    /// Logical target resource path (e.g. `/logs`)
    pub endpoint: String,

    /// Mutation verb
    pub method: Method,

    /// Request body; present for POST/PUT, absent for DELETE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// A single pending mutation, as persisted in the durable queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedRequest {
    /// Opaque unique identifier, assigned at enqueue time
    pub id: String,

    /// Logical target resource path
    pub endpoint: String,

    /// Mutation verb
    pub method: Method,

    /// Request body; present for POST/PUT, absent for DELETE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,

    /// Enqueue timestamp (epoch milliseconds), set once and never changed
    pub enqueued_at: i64,

    /// Number of failed replay attempts so far; never decreases
    pub retry_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_serializes_uppercase() {
        let json = serde_json::to_string(&Method::Post).unwrap();
        assert_eq!(json, "\"POST\"");

        let back: Method = serde_json::from_str("\"DELETE\"").unwrap();
        assert_eq!(back, Method::Delete);
    }

    #[test]
    fn test_queued_request_roundtrip() {
        let request = QueuedRequest {
            id: "abc123xyz".to_string(),
            endpoint: "/logs".to_string(),
            method: Method::Post,
            payload: Some(serde_json::json!({"a": 1})),
            enqueued_at: 1_700_000_000_000,
            retry_count: 2,
        };

        let json = serde_json::to_string(&request).unwrap();
        let back: QueuedRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_delete_omits_payload_field() {
        let request = QueuedRequest {
            id: "abc123xyz".to_string(),
            endpoint: "/logs/42".to_string(),
            method: Method::Delete,
            payload: None,
            enqueued_at: 0,
            retry_count: 0,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("payload"));
    }
}
