//! The transport primitive: send one HTTP request, receive status and body.
//!
//! Everything below header composition (connection pooling, TLS, cookies)
//! sits behind the [`Transport`] trait. The client composes a
//! [`TransportRequest`] and hands it over; tests substitute their own
//! implementation to capture what would have gone on the wire.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use crate::model::RequestMethod;

/// Errors raised by a transport while sending a request.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport failure: {0}")]
    Failed(String),
}

/// A fully composed outbound call.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: RequestMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// The raw outcome of a sent request, body still unparsed.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Sends a composed request and returns the raw response.
///
/// Implementations own retries at the connection level, pooling and TLS;
/// the client never sees any of it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed [`Transport`].
///
/// The inner client is built once and reused across requests. The cookie
/// store is enabled so session identifiers set by the backend ride along
/// on subsequent requests.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build the underlying HTTP client.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let method = match request.method {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Delete => reqwest::Method::DELETE,
        };

        let mut outbound = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            outbound = outbound.header(name, value);
        }
        if let Some(body) = &request.body {
            outbound = outbound.json(body);
        }

        let response = outbound.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;

        tracing::trace!(status, url = %request.url, "request completed");

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
