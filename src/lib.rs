//! # medusa-client - Commerce API Client Library
//!
//! A small, pragmatic Rust client for a Medusa-style commerce backend,
//! covering the request-construction layer: credential selection, header
//! case normalization, idempotency keys and dispatch.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Credential stores and transport injected as traits, no hidden state
//! - Train-Case normalization of caller-supplied headers
//! - Per-attempt idempotency keys for retry-enabled `POST` requests
//!
//! ## Architecture
//!
//! Each call flows through three layers:
//!
//! 1. **Credential resolution** decides which of the static admin key,
//!    per-domain bearer token and publishable key apply to the path.
//! 2. **Header composition** stacks defaults, credentials, an optional
//!    idempotency key, normalized user headers and verbatim custom
//!    headers, in that precedence order.
//! 3. **Dispatch** sends the composed request through the [`Transport`]
//!    and returns the parsed body merged with the raw status metadata.
//!
//! ## Example
//! ```no_run
//! use medusa_client::{Client, ClientConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("http://localhost:9000")
//!         .with_api_key("sk-admin")
//!         .with_publishable_api_key("pk_storefront");
//!
//!     let client = Client::new(config)?;
//!
//!     // GET /admin/orders carries the static admin key.
//!     let orders = client.get("/admin/orders").await?;
//!     println!("{:?}", orders.field("orders"));
//!
//!     // Writes attach the payload as a JSON body.
//!     let cart = client
//!         .post("/store/carts", json!({ "region_id": "reg_1" }))
//!         .await?;
//!     println!("status {}", cart.response.status);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod headers;
pub mod model;
pub mod retry;
pub mod transport;

// Re-exports for convenience
pub use auth::{Domain, JwtStore, MemoryJwtStore, MemoryKeyStore, PublishableKeyStore};
pub use client::{Client, ClientError};
pub use config::{ClientConfig, SecretString};
pub use headers::{normalize_header_name, normalize_headers, HeaderSet};
pub use model::{ApiResponse, RequestMethod, RequestOptions, ResponseMeta};
pub use retry::{NeverRetry, RetryPolicy};
pub use transport::{HttpTransport, Transport, TransportError, TransportRequest, TransportResponse};
