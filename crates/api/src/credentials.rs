//! Explicit credential state injected into the HTTP gateway.
//!
//! The token lives in one shared holder with a clear lifecycle: stored at
//! login, attached per request, cleared at logout. No ambient globals.

use std::sync::{Arc, RwLock};

/// Shared holder for the caller's bearer token.
///
/// Cloning shares the same underlying credential, so a login through one
/// handle is visible to every gateway holding a clone.
#[derive(Clone, Debug, Default)]
pub struct CredentialProvider {
    token: Arc<RwLock<Option<String>>>,
}

impl CredentialProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider pre-loaded with a token, for tests and tooling.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let provider = Self::new();
        provider.store(token);
        provider
    }

    /// Store the token acquired at login, replacing any previous one.
    pub fn store(&self, token: impl Into<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token.into());
        }
    }

    /// Clear the stored token at logout.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.token.write() {
            *guard = None;
        }
    }

    /// The current bearer token, if logged in.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.token.read().ok().and_then(|guard| guard.clone())
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.bearer().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_logged_out() {
        let provider = CredentialProvider::new();
        assert!(!provider.is_logged_in());
        assert_eq!(provider.bearer(), None);
    }

    #[test]
    fn store_then_clear() {
        let provider = CredentialProvider::new();
        provider.store("abc123");
        assert_eq!(provider.bearer(), Some("abc123".to_string()));

        provider.clear();
        assert!(!provider.is_logged_in());
    }

    #[test]
    fn clones_share_state() {
        let provider = CredentialProvider::new();
        let clone = provider.clone();
        provider.store("tok");
        assert_eq!(clone.bearer(), Some("tok".to_string()));
    }
}
