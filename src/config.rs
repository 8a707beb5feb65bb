//! Client configuration.

use serde_json::{Map, Value};

/// Base URL used when the configuration does not supply one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:9000";

/// A secret string type for sensitive data like API keys.
/// Prevents accidental logging or display of secrets.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret string.
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Configuration for a [`Client`](crate::Client).
///
/// Created once at client construction and read-only afterwards. Fields
/// left unset fall back to their defaults silently; configuration never
/// fails.
///
/// # Example
/// ```
/// use medusa_client::config::ClientConfig;
///
/// let config = ClientConfig::new("https://api.example.com")
///     .with_api_key("sk-admin")
///     .with_max_retries(2);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL the request path is appended to.
    pub base_url: String,

    /// Number of retries the retry policy may grant. Also gates
    /// idempotency-key generation for `POST` requests.
    pub max_retries: u32,

    /// Static API key for privileged (admin) operations.
    pub api_key: Option<SecretString>,

    /// Publishable key scoped to a storefront; non-secret.
    pub publishable_api_key: Option<String>,

    /// Headers attached to every request, overridable per call.
    pub custom_headers: Option<Map<String, Value>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: 0,
            api_key: None,
            publishable_api_key: None,
            custom_headers: None,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given base URL, with everything else
    /// defaulted.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the static admin API key.
    pub fn with_api_key(mut self, api_key: impl Into<SecretString>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the publishable key.
    pub fn with_publishable_api_key(mut self, key: impl Into<String>) -> Self {
        self.publishable_api_key = Some(key.into());
        self
    }

    /// Add a header sent with every request.
    pub fn with_custom_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom_headers
            .get_or_insert_with(Map::new)
            .insert(name.into(), value.into());
        self
    }
}
