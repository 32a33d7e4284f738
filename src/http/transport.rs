use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;

use super::HttpMethod;

/// A fully composed call, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl OutboundRequest {
    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// What came back from the server. `body` is the parsed JSON form of
/// `raw_body`, or `None` when the payload is not JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Option<Value>,
    pub raw_body: String,
}

impl TransportResponse {
    #[must_use]
    pub fn new(status: u16, raw_body: String) -> Self {
        let body = serde_json::from_str(&raw_body).ok();
        Self {
            status,
            body,
            raw_body,
        }
    }

    #[must_use]
    pub fn is_2xx(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body handed to flow conditions: parsed JSON when available,
    /// otherwise the raw text as a JSON string.
    #[must_use]
    pub fn body_or_raw(&self) -> Value {
        self.body
            .clone()
            .unwrap_or_else(|| Value::String(self.raw_body.clone()))
    }
}

/// The HTTP-call primitive the core runs on.
///
/// Implementations only move bytes: an `Err` means no response was received
/// at all. Every status code, including 4xx/5xx, is an `Ok` response.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError>;
}
