//! Application state shared by all request handlers.
//!
//! Holds no derived obstacle state: snapshots are recomputed from the store
//! and the clock on every request.

use anyhow::Result;
use chrono::{DateTime, Utc};
use interop_core::{Clock, Principal, SystemClock};
use std::sync::Arc;

use crate::config::Config;
use crate::identity::{IdentityProvider, SessionRegistry};
use crate::persistence::{self, Database};

pub struct AppState {
    db: Database,
    config: Config,
    clock: Arc<dyn Clock>,
    sessions: Arc<SessionRegistry>,
    identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        Self::with_clock(db, config, Arc::new(SystemClock))
    }

    pub fn with_clock(db: Database, config: Config, clock: Arc<dyn Clock>) -> Self {
        let sessions = Arc::new(SessionRegistry::new());
        Self {
            db,
            config,
            clock,
            identity: sessions.clone(),
            sessions,
        }
    }

    /// Replace the identity provider (e.g. an external session service).
    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    /// Load persisted users into the session registry.
    pub async fn load_from_database(&self) -> Result<()> {
        let users = persistence::users::load_all_users(self.db.pool()).await?;
        for user in &users {
            self.sessions.insert(user.session_token.clone(), user.principal());
        }
        tracing::info!("Loaded {} user sessions", users.len());
        Ok(())
    }

    /// Create a user and make their session token usable immediately.
    pub async fn create_user(
        &self,
        username: &str,
        session_token: &str,
        is_superuser: bool,
    ) -> Result<Principal> {
        let principal =
            persistence::users::create_user(self.db.pool(), username, session_token, is_superuser)
                .await?;
        self.sessions.insert(session_token, principal.clone());
        Ok(principal)
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn obstacle_epoch(&self) -> DateTime<Utc> {
        self.config.obstacle_epoch
    }
}
