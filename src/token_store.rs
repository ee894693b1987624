use std::sync::Arc;

use crate::storage::StorageBackend;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Snapshot of the persisted credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Persists the access/refresh token pair through an injected storage backend.
///
/// Nothing is cached here: each getter reads the backend, so a `store` is visible to the
/// very next read. With a no-op backend every operation is a silent no-op.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn StorageBackend>,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Writes the access token and, when given, the refresh token.
    ///
    /// Passing `None` keeps whatever refresh token is already stored.
    pub fn store(&self, access: &str, refresh: Option<&str>) {
        self.backend.set_item(ACCESS_TOKEN_KEY, access);
        if let Some(refresh) = refresh {
            self.backend.set_item(REFRESH_TOKEN_KEY, refresh);
        }
    }

    pub fn get_access(&self) -> Option<String> {
        self.backend.get_item(ACCESS_TOKEN_KEY)
    }

    pub fn get_refresh(&self) -> Option<String> {
        self.backend.get_item(REFRESH_TOKEN_KEY)
    }

    pub fn pair(&self) -> Option<TokenPair> {
        self.get_access().map(|access_token| TokenPair {
            access_token,
            refresh_token: self.get_refresh(),
        })
    }

    /// Removes both tokens. Clearing an empty store is a no-op.
    pub fn clear(&self) {
        self.backend.remove_item(ACCESS_TOKEN_KEY);
        self.backend.remove_item(REFRESH_TOKEN_KEY);
    }

    /// Presence check only; says nothing about whether the server will accept the token.
    pub fn has_access(&self) -> bool {
        self.get_access().is_some()
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_access", &self.has_access())
            .finish()
    }
}
