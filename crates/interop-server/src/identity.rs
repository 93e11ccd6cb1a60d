//! Session identity lookup.
//!
//! Login itself happens elsewhere; the server only maps an issued session
//! token to the principal it belongs to.

use dashmap::DashMap;
use interop_core::Principal;

/// Resolves a session token to its principal.
pub trait IdentityProvider: Send + Sync {
    fn principal_for_token(&self, token: &str) -> Option<Principal>;
}

/// In-memory token table, loaded from the `users` table at startup and
/// written through when users are created.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Principal>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: impl Into<String>, principal: Principal) {
        self.sessions.insert(token.into(), principal);
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl IdentityProvider for SessionRegistry {
    fn principal_for_token(&self, token: &str) -> Option<Principal> {
        self.sessions.get(token).map(|entry| entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_and_revokes_tokens() {
        let registry = SessionRegistry::new();
        let principal = Principal {
            user_id: 1,
            username: "team-a".to_string(),
            is_superuser: false,
        };
        registry.insert("token-a", principal.clone());

        assert_eq!(registry.principal_for_token("token-a"), Some(principal));
        assert_eq!(registry.principal_for_token("token-b"), None);
        assert!(registry.revoke("token-a"));
        assert!(registry.is_empty());
    }
}
