use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::request::HeaderVec;

/// Response produced by a handler.
///
/// String bodies are written as `text/plain`, anything else as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers (stack-allocated for ≤16 headers)
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body
    pub body: Value,
}

impl Response {
    /// Create a new response with the given status, headers, and body
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with default headers
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a plain-text `200` response
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "text/plain".to_string()));
        Self {
            status: 200,
            headers,
            body: Value::String(body.into()),
        }
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// The response produced when a request falls off the end of the outermost pipeline
    #[must_use]
    pub fn not_found(method: &http::Method, path: &str) -> Self {
        Self::error(404, &format!("Cannot {method} {path}"))
    }

    /// Body as text, if it is a JSON string
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        self.body.as_str()
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}
