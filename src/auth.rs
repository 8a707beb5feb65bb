//! Credential resolution: which credentials apply to which request.
//!
//! Two external stores feed this module: a JWT store holding one bearer
//! token per [`Domain`], and a store for the publishable key. Both are
//! injected into the client as trait objects so embedding applications
//! control token lifecycle; the client itself only ever reads them.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::model::RequestMethod;

/// Admin operations that are callable without the static API key.
const UNAUTHENTICATED_ADMIN_ENDPOINTS: [(&str, RequestMethod); 4] = [
    ("/admin/auth", RequestMethod::Post),
    ("/admin/users/password-token", RequestMethod::Post),
    ("/admin/users/reset-password", RequestMethod::Post),
    ("/admin/invites/accept", RequestMethod::Post),
];

/// Bearer-token namespace a request is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Admin,
    Store,
}

impl Domain {
    /// Classify a request path.
    ///
    /// A path containing the substring `admin` anywhere is classified as
    /// [`Domain::Admin`]; everything else is [`Domain::Store`]. Note this
    /// is substring containment, not prefix matching, so a store path with
    /// `admin` in a resource name still lands in the admin namespace. It
    /// deliberately disagrees with [`requires_authentication`], which does
    /// check the `/admin` prefix.
    pub fn of(path: &str) -> Self {
        if path.contains("admin") {
            Domain::Admin
        } else {
            Domain::Store
        }
    }

    /// The domain tag as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Admin => "admin",
            Domain::Store => "store",
        }
    }
}

/// Whether a request must carry the static admin API key.
///
/// True for any path under `/admin`, except the fixed allow-list of
/// unauthenticated admin operations (login, password reset, invite
/// acceptance).
pub fn requires_authentication(path: &str, method: RequestMethod) -> bool {
    path.starts_with("/admin")
        && !UNAUTHENTICATED_ADMIN_ENDPOINTS
            .iter()
            .any(|(allowed_path, allowed_method)| *allowed_path == path && *allowed_method == method)
}

/// Read access to per-domain bearer tokens.
pub trait JwtStore: Send + Sync {
    /// The bearer token for `domain`, if one is held.
    fn jwt(&self, domain: Domain) -> Option<String>;
}

/// Read access to the publishable key.
pub trait PublishableKeyStore: Send + Sync {
    /// The publishable key, if one is held.
    fn publishable_api_key(&self) -> Option<String>;
}

/// In-memory [`JwtStore`].
///
/// The embedding application writes tokens (e.g. after a login call) and
/// the client reads them when composing headers.
#[derive(Debug, Default)]
pub struct MemoryJwtStore {
    tokens: RwLock<HashMap<Domain, String>>,
}

impl MemoryJwtStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the bearer token for `domain`.
    pub fn set_jwt(&self, domain: Domain, token: impl Into<String>) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(domain, token.into());
        }
    }

    /// Drop the bearer token for `domain`.
    pub fn clear_jwt(&self, domain: Domain) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.remove(&domain);
        }
    }
}

impl JwtStore for MemoryJwtStore {
    fn jwt(&self, domain: Domain) -> Option<String> {
        self.tokens.read().ok()?.get(&domain).cloned()
    }
}

/// In-memory [`PublishableKeyStore`].
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    key: RwLock<Option<String>>,
}

impl MemoryKeyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the publishable key.
    pub fn set_publishable_api_key(&self, key: impl Into<String>) {
        if let Ok(mut slot) = self.key.write() {
            *slot = Some(key.into());
        }
    }
}

impl PublishableKeyStore for MemoryKeyStore {
    fn publishable_api_key(&self) -> Option<String> {
        self.key.read().ok()?.clone()
    }
}
