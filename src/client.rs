//! The client: header composition and request dispatch.

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{
    requires_authentication, Domain, JwtStore, MemoryJwtStore, MemoryKeyStore, PublishableKeyStore,
};
use crate::config::ClientConfig;
use crate::headers::{normalize_headers, HeaderSet};
use crate::model::{ApiResponse, RequestMethod, RequestOptions, ResponseMeta};
use crate::retry::{NeverRetry, RetryPolicy};
use crate::transport::{HttpTransport, Transport, TransportRequest};

/// Errors that can occur while dispatching a request.
///
/// There is no internal recovery; every failure propagates directly to
/// the caller.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The underlying send failed (DNS, connection refused, abort).
    #[error("transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    /// The response body was not valid JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// API client holding the configuration and its collaborators.
///
/// Credential stores, the transport and the retry policy are explicit
/// dependencies injected at construction; [`Client::new`] wires the
/// defaults (reqwest transport, empty in-memory stores, never-retry) and
/// the `with_*` methods swap any of them out.
///
/// The client is stateless across calls: each request composes a fresh
/// header set, and the stores and configuration are only ever read, so a
/// single instance can serve many concurrent `request` calls.
pub struct Client {
    config: ClientConfig,
    jwt_store: Arc<dyn JwtStore>,
    key_store: Arc<dyn PublishableKeyStore>,
    transport: Arc<dyn Transport>,
    retry_policy: Arc<dyn RetryPolicy>,
}

impl Client {
    /// Create a client with default collaborators.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            config,
            jwt_store: Arc::new(MemoryJwtStore::new()),
            key_store: Arc::new(MemoryKeyStore::new()),
            transport: Arc::new(HttpTransport::new()?),
            retry_policy: Arc::new(NeverRetry),
        })
    }

    /// Replace the bearer-token store.
    pub fn with_jwt_store(mut self, store: Arc<dyn JwtStore>) -> Self {
        self.jwt_store = store;
        self
    }

    /// Replace the publishable-key store.
    pub fn with_publishable_key_store(mut self, store: Arc<dyn PublishableKeyStore>) -> Self {
        self.key_store = store;
        self
    }

    /// Replace the transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = policy;
        self
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Compose the full header set for one request.
    ///
    /// Layering, later entries winning on key collision:
    /// 1. `Accept` and `Content-Type` defaults;
    /// 2. credentials: the static admin key when
    ///    [`requires_authentication`] holds, the bearer token held for the
    ///    path's [`Domain`], and the publishable key (configuration first,
    ///    store as fallback); none are mutually exclusive;
    /// 3. a fresh `Idempotency-Key` when retries are configured and the
    ///    method is `POST`;
    /// 4. `user_headers`, each key case-normalized;
    /// 5. `custom_headers`, verbatim.
    pub fn set_headers(
        &self,
        user_headers: &Map<String, Value>,
        method: RequestMethod,
        path: &str,
        custom_headers: &Map<String, Value>,
    ) -> HeaderSet {
        let mut headers = HeaderSet::new();
        headers.insert("Accept".to_string(), Value::from("application/json"));
        headers.insert("Content-Type".to_string(), Value::from("application/json"));

        if let Some(api_key) = &self.config.api_key {
            if requires_authentication(path, method) {
                headers.insert(
                    "x-medusa-access-token".to_string(),
                    Value::from(api_key.expose_secret()),
                );
            }
        }

        let domain = Domain::of(path);
        if let Some(token) = self.jwt_store.jwt(domain).filter(|token| !token.is_empty()) {
            headers.insert(
                "Authorization".to_string(),
                Value::from(format!("Bearer {token}")),
            );
        }

        let publishable_api_key = self
            .config
            .publishable_api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| {
                self.key_store
                    .publishable_api_key()
                    .filter(|key| !key.is_empty())
            });
        if let Some(key) = publishable_api_key {
            headers.insert("x-publishable-api-key".to_string(), Value::from(key));
        }

        // Only add an idempotency key if the request is configured to
        // retry. Generated fresh per call, never reused.
        if self.config.max_retries > 0 && method == RequestMethod::Post {
            headers.insert(
                "Idempotency-Key".to_string(),
                Value::from(Uuid::new_v4().to_string()),
            );
        }

        if let Value::Object(normalized) = normalize_headers(&Value::Object(user_headers.clone())) {
            headers.extend(normalized);
        }

        for (name, value) in custom_headers {
            headers.insert(name.clone(), value.clone());
        }

        headers
    }

    /// Dispatch a request and return the merged result.
    ///
    /// The URL is `config.base_url` + `path`. `POST` and `DELETE` attach
    /// `payload` as the body; `GET` never carries one. The response body
    /// is parsed as JSON and returned together with the raw status
    /// metadata in an [`ApiResponse`].
    pub async fn request(
        &self,
        method: RequestMethod,
        path: &str,
        payload: Value,
        options: RequestOptions,
        custom_headers: Map<String, Value>,
    ) -> Result<ApiResponse, ClientError> {
        // Config-level custom headers apply first; call-supplied ones win
        // on conflict.
        let mut merged_custom = self.config.custom_headers.clone().unwrap_or_default();
        merged_custom.extend(custom_headers);

        let headers = self.set_headers(&options.headers, method, path, &merged_custom);

        let transport_request = TransportRequest {
            method,
            url: format!("{}{}", self.config.base_url, path),
            headers: string_pairs(&headers),
            body: method.has_body().then_some(payload),
        };

        tracing::debug!(method = %method, url = %transport_request.url, "dispatching request");

        // The composed request is reused verbatim across attempts so a
        // policy that does grant retries keeps the idempotency key stable.
        let mut attempt = 0;
        let response = loop {
            match self.transport.send(transport_request.clone()).await {
                Ok(response) => break response,
                Err(error) => {
                    if self
                        .retry_policy
                        .should_retry(&error, attempt, self.config.max_retries)
                    {
                        attempt += 1;
                        continue;
                    }
                    return Err(error.into());
                }
            }
        };

        let parsed: Value = serde_json::from_str(&response.body)?;
        let data = match parsed {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Ok(ApiResponse {
            data,
            response: ResponseMeta {
                status: response.status,
                headers: response.headers,
            },
        })
    }

    /// `GET` a path with default options.
    pub async fn get(&self, path: &str) -> Result<ApiResponse, ClientError> {
        self.request(
            RequestMethod::Get,
            path,
            Value::Object(Map::new()),
            RequestOptions::default(),
            Map::new(),
        )
        .await
    }

    /// `POST` a payload to a path with default options.
    pub async fn post(&self, path: &str, payload: Value) -> Result<ApiResponse, ClientError> {
        self.request(
            RequestMethod::Post,
            path,
            payload,
            RequestOptions::default(),
            Map::new(),
        )
        .await
    }

    /// `DELETE` a path with default options.
    pub async fn delete(&self, path: &str, payload: Value) -> Result<ApiResponse, ClientError> {
        self.request(
            RequestMethod::Delete,
            path,
            payload,
            RequestOptions::default(),
            Map::new(),
        )
        .await
    }
}

/// Render composed header values for the wire. JSON strings go out
/// verbatim; anything else is serialized compactly.
fn string_pairs(headers: &HeaderSet) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.clone(), rendered)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{TransportError, TransportResponse};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Transport double that records every request and replies with a
    /// canned response (or a failure).
    struct MockTransport {
        status: u16,
        body: String,
        fail: bool,
        seen: Mutex<Vec<TransportRequest>>,
    }

    impl MockTransport {
        fn replying(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: body.to_string(),
                fail: false,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                status: 0,
                body: String::new(),
                fail: true,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<TransportRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(
            &self,
            request: TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            if self.fail {
                return Err(TransportError::Failed("connection refused".to_string()));
            }
            Ok(TransportResponse {
                status: self.status,
                headers: HashMap::new(),
                body: self.body.clone(),
            })
        }
    }

    fn client(config: ClientConfig) -> Client {
        Client::new(config).unwrap()
    }

    fn header_value(headers: &HeaderSet, name: &str) -> Option<String> {
        headers.get(name).and_then(|v| v.as_str()).map(str::to_owned)
    }

    fn sent_header(request: &TransportRequest, name: &str) -> Option<String> {
        request
            .headers
            .iter()
            .find(|(header, _)| header.as_str() == name)
            .map(|(_, value)| value.clone())
    }

    #[test]
    fn default_headers_are_always_present() {
        let client = client(ClientConfig::default());
        let headers = client.set_headers(&Map::new(), RequestMethod::Get, "/store/orders", &Map::new());

        assert_eq!(
            header_value(&headers, "Accept").as_deref(),
            Some("application/json")
        );
        assert_eq!(
            header_value(&headers, "Content-Type").as_deref(),
            Some("application/json")
        );
    }

    #[test]
    fn admin_paths_get_the_static_key() {
        let client = client(ClientConfig::default().with_api_key("K"));
        let headers =
            client.set_headers(&Map::new(), RequestMethod::Get, "/admin/orders", &Map::new());

        assert_eq!(
            header_value(&headers, "x-medusa-access-token").as_deref(),
            Some("K")
        );
    }

    #[test]
    fn allow_listed_admin_operations_skip_the_static_key() {
        let client = client(ClientConfig::default().with_api_key("K"));
        let headers =
            client.set_headers(&Map::new(), RequestMethod::Post, "/admin/auth", &Map::new());

        assert!(headers.get("x-medusa-access-token").is_none());
    }

    #[test]
    fn store_paths_never_get_the_static_key() {
        let client = client(ClientConfig::default().with_api_key("K"));
        let headers =
            client.set_headers(&Map::new(), RequestMethod::Get, "/store/orders", &Map::new());

        assert!(headers.get("x-medusa-access-token").is_none());
    }

    #[test]
    fn bearer_token_follows_the_path_domain() {
        let jwt_store = Arc::new(MemoryJwtStore::new());
        jwt_store.set_jwt(Domain::Store, "store-token");

        let client = client(ClientConfig::default()).with_jwt_store(jwt_store);

        let store_headers =
            client.set_headers(&Map::new(), RequestMethod::Get, "/store/carts", &Map::new());
        assert_eq!(
            header_value(&store_headers, "Authorization").as_deref(),
            Some("Bearer store-token")
        );

        // No admin token held, so the admin domain gets no bearer header.
        let admin_headers =
            client.set_headers(&Map::new(), RequestMethod::Get, "/admin/orders", &Map::new());
        assert!(admin_headers.get("Authorization").is_none());
    }

    #[test]
    fn empty_jwt_sets_no_bearer_header() {
        let jwt_store = Arc::new(MemoryJwtStore::new());
        jwt_store.set_jwt(Domain::Store, "");

        let client = client(ClientConfig::default()).with_jwt_store(jwt_store);
        let headers =
            client.set_headers(&Map::new(), RequestMethod::Get, "/store/carts", &Map::new());

        assert!(headers.get("Authorization").is_none());
    }

    #[test]
    fn publishable_key_prefers_config_over_store() {
        let key_store = Arc::new(MemoryKeyStore::new());
        key_store.set_publishable_api_key("pk_store");

        let from_config = client(ClientConfig::default().with_publishable_api_key("pk_cfg"))
            .with_publishable_key_store(key_store.clone());
        let headers =
            from_config.set_headers(&Map::new(), RequestMethod::Get, "/store/products", &Map::new());
        assert_eq!(
            header_value(&headers, "x-publishable-api-key").as_deref(),
            Some("pk_cfg")
        );

        let from_store =
            client(ClientConfig::default()).with_publishable_key_store(key_store);
        let headers =
            from_store.set_headers(&Map::new(), RequestMethod::Get, "/store/products", &Map::new());
        assert_eq!(
            header_value(&headers, "x-publishable-api-key").as_deref(),
            Some("pk_store")
        );
    }

    #[test]
    fn empty_config_key_falls_back_to_the_store() {
        let key_store = Arc::new(MemoryKeyStore::new());
        key_store.set_publishable_api_key("pk_store");

        let client = client(ClientConfig::default().with_publishable_api_key(""))
            .with_publishable_key_store(key_store);
        let headers =
            client.set_headers(&Map::new(), RequestMethod::Get, "/store/products", &Map::new());

        assert_eq!(
            header_value(&headers, "x-publishable-api-key").as_deref(),
            Some("pk_store")
        );
    }

    #[test]
    fn idempotency_key_is_fresh_per_call() {
        let client = client(ClientConfig::default().with_max_retries(1));

        let first =
            client.set_headers(&Map::new(), RequestMethod::Post, "/store/carts", &Map::new());
        let second =
            client.set_headers(&Map::new(), RequestMethod::Post, "/store/carts", &Map::new());

        let first_key = header_value(&first, "Idempotency-Key").unwrap();
        let second_key = header_value(&second, "Idempotency-Key").unwrap();
        assert_ne!(first_key, second_key);
    }

    #[test]
    fn no_idempotency_key_without_retries() {
        let client = client(ClientConfig::default());
        for method in [RequestMethod::Get, RequestMethod::Post, RequestMethod::Delete] {
            let headers = client.set_headers(&Map::new(), method, "/store/carts", &Map::new());
            assert!(headers.get("Idempotency-Key").is_none());
        }
    }

    #[test]
    fn no_idempotency_key_for_non_post_methods() {
        let client = client(ClientConfig::default().with_max_retries(3));
        let headers =
            client.set_headers(&Map::new(), RequestMethod::Get, "/store/carts", &Map::new());
        assert!(headers.get("Idempotency-Key").is_none());
    }

    #[test]
    fn user_headers_are_case_normalized() {
        let client = client(ClientConfig::default());
        let mut user_headers = Map::new();
        user_headers.insert("x-custom-thing".to_string(), Value::from("v"));

        let headers =
            client.set_headers(&user_headers, RequestMethod::Get, "/store/orders", &Map::new());

        assert_eq!(header_value(&headers, "X-Custom-Thing").as_deref(), Some("v"));
        assert!(headers.get("x-custom-thing").is_none());
    }

    #[test]
    fn custom_headers_override_generated_credentials() {
        let jwt_store = Arc::new(MemoryJwtStore::new());
        jwt_store.set_jwt(Domain::Store, "token");

        let client = client(ClientConfig::default()).with_jwt_store(jwt_store);
        let mut custom = Map::new();
        custom.insert("Authorization".to_string(), Value::from("X"));

        let headers =
            client.set_headers(&Map::new(), RequestMethod::Get, "/store/carts", &custom);

        assert_eq!(header_value(&headers, "Authorization").as_deref(), Some("X"));
    }

    #[tokio::test]
    async fn get_request_merges_body_and_response_metadata() {
        let transport = MockTransport::replying(200, r#"{"orders": []}"#);
        let client = client(
            ClientConfig::new("http://h").with_api_key("K"),
        )
        .with_transport(transport.clone());

        let result = client.get("/admin/orders").await.unwrap();

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "http://h/admin/orders");
        assert_eq!(sent[0].method, RequestMethod::Get);
        assert!(sent[0].body.is_none());
        assert_eq!(sent_header(&sent[0], "x-medusa-access-token").as_deref(), Some("K"));
        assert!(sent_header(&sent[0], "Idempotency-Key").is_none());

        assert_eq!(result.field("orders"), Some(&json!([])));
        assert_eq!(result.response.status, 200);
    }

    #[tokio::test]
    async fn post_and_delete_carry_the_payload() {
        let transport = MockTransport::replying(200, "{}");
        let client = client(ClientConfig::new("http://h")).with_transport(transport.clone());

        client
            .post("/store/carts", json!({"region_id": "reg_1"}))
            .await
            .unwrap();
        client
            .delete("/store/carts/c_1", json!({}))
            .await
            .unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].body, Some(json!({"region_id": "reg_1"})));
        assert_eq!(sent[1].body, Some(json!({})));
    }

    #[tokio::test]
    async fn call_custom_headers_win_over_config_custom_headers() {
        let transport = MockTransport::replying(200, "{}");
        let client = client(
            ClientConfig::new("http://h")
                .with_custom_header("X-Tenant", "from-config")
                .with_custom_header("X-Env", "staging"),
        )
        .with_transport(transport.clone());

        let mut custom = Map::new();
        custom.insert("X-Tenant".to_string(), Value::from("from-call"));
        client
            .request(
                RequestMethod::Get,
                "/store/orders",
                json!({}),
                RequestOptions::default(),
                custom,
            )
            .await
            .unwrap();

        let sent = transport.requests();
        assert_eq!(sent_header(&sent[0], "X-Tenant").as_deref(), Some("from-call"));
        assert_eq!(sent_header(&sent[0], "X-Env").as_deref(), Some("staging"));
    }

    #[tokio::test]
    async fn request_options_headers_reach_the_wire_normalized() {
        let transport = MockTransport::replying(200, "{}");
        let client = client(ClientConfig::new("http://h")).with_transport(transport.clone());

        // The timeout is accepted but has no effect on the outbound call.
        let options = RequestOptions::new()
            .with_header("x-request-id", "abc")
            .with_timeout(std::time::Duration::from_secs(5));
        client
            .request(
                RequestMethod::Get,
                "/store/orders",
                json!({}),
                options,
                Map::new(),
            )
            .await
            .unwrap();

        let sent = transport.requests();
        assert_eq!(sent_header(&sent[0], "X-Request-Id").as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn invalid_json_bodies_surface_as_parse_errors() {
        let transport = MockTransport::replying(200, "<!doctype html>");
        let client = client(ClientConfig::new("http://h")).with_transport(transport);

        let error = client.get("/store/orders").await.unwrap_err();
        assert!(matches!(error, ClientError::Parse(_)));
    }

    #[tokio::test]
    async fn transport_failures_propagate_after_a_single_attempt() {
        let transport = MockTransport::failing();
        let client = client(ClientConfig::new("http://h").with_max_retries(3))
            .with_transport(transport.clone());

        let error = client.get("/store/orders").await.unwrap_err();
        assert!(matches!(error, ClientError::Transport(_)));
        // NeverRetry declines even with a retry budget configured.
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn non_object_bodies_contribute_no_merged_fields() {
        let transport = MockTransport::replying(204, "42");
        let client = client(ClientConfig::new("http://h")).with_transport(transport);

        let result = client.get("/store/orders").await.unwrap();
        assert!(result.data.is_empty());
        assert_eq!(result.response.status, 204);
    }
}
