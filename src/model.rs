//! Common data models for requests and the merged response envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// HTTP method of an outgoing request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Post,
    Delete,
}

impl RequestMethod {
    /// Wire representation of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Delete => "DELETE",
        }
    }

    /// Whether requests with this method carry a payload body.
    /// `GET` never does.
    pub fn has_body(&self) -> bool {
        matches!(self, RequestMethod::Post | RequestMethod::Delete)
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call request options.
///
/// Created for a single call and discarded after dispatch.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Accepted but not applied to the outbound call; the transport's own
    /// configuration governs timeouts.
    pub timeout: Option<Duration>,

    /// Retry count override for a future retry policy. Carried but unused
    /// while the built-in policy declines every retry.
    pub number_of_retries: Option<u32>,

    /// Caller-supplied headers. Keys are case-normalized before they are
    /// merged into the request.
    pub headers: Map<String, Value>,
}

impl RequestOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the (unapplied) timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the retry count override.
    pub fn with_number_of_retries(mut self, retries: u32) -> Self {
        self.number_of_retries = Some(retries);
        self
    }

    /// Add a single header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Raw response metadata returned alongside the parsed body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// HTTP status code.
    pub status: u16,

    /// Response headers as received.
    pub headers: HashMap<String, String>,
}

/// The merged result of a dispatched request.
///
/// Holds the fields of the parsed JSON body plus a `response` field with
/// the raw status metadata, serialized as a single flat object. A valid
/// but non-object body (e.g. a bare number) contributes no fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Parsed body fields.
    #[serde(flatten)]
    pub data: Map<String, Value>,

    /// Raw response metadata.
    pub response: ResponseMeta,
}

impl ApiResponse {
    /// Look up a field of the parsed body.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}
