//! In-memory authorization session store.
//!
//! All sessions live in one table guarded by a single lock. The table keeps a
//! secondary `code -> state` index that is only touched under the same write
//! guard, so the two lookup paths never disagree.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::types::{AuthorizationSession, FlowStage};
use crate::error::{StoreError, StoreResult};
use crate::models::ClientRegistry;

#[derive(Default)]
struct SessionTable {
    by_state: HashMap<String, AuthorizationSession>,
    state_by_code: HashMap<String, String>,
}

impl SessionTable {
    fn live(&self, state: &str, now: Instant, ttl: Duration) -> Option<&AuthorizationSession> {
        self.by_state.get(state).filter(|s| !s.is_expired_at(now, ttl))
    }

    fn live_mut(
        &mut self,
        state: &str,
        now: Instant,
        ttl: Duration,
    ) -> Option<&mut AuthorizationSession> {
        self.by_state.get_mut(state).filter(|s| !s.is_expired_at(now, ttl))
    }

    fn remove(&mut self, state: &str) -> Option<AuthorizationSession> {
        let session = self.by_state.remove(state)?;
        if let Some(code) = &session.code {
            self.state_by_code.remove(code);
        }
        Some(session)
    }
}

/// Authorization session store shared by all handlers and the sweep task.
#[derive(Clone)]
pub struct SessionStore {
    registry: Arc<ClientRegistry>,
    table: Arc<RwLock<SessionTable>>,
    ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(registry: Arc<ClientRegistry>, ttl: Duration) -> Self {
        Self { registry, table: Arc::new(RwLock::new(SessionTable::default())), ttl }
    }

    /// Generate an opaque, unguessable state value.
    #[must_use]
    pub fn generate_state() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Generate an authorization code (two UUIDs, 256 bits).
    fn generate_code() -> String {
        format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
    }

    /// Start a new authorization session bound to `client_id`'s application.
    ///
    /// A live session already using `state` is never replaced; an expired one is.
    pub async fn create(
        &self,
        client_id: &str,
        scope: &str,
        state: String,
    ) -> StoreResult<AuthorizationSession> {
        let app = self
            .registry
            .find_by_client_id(client_id)
            .ok_or_else(|| StoreError::AppNotRegistered { client_id: client_id.to_owned() })?;

        let mut table = self.table.write().await;
        if table.live(&state, Instant::now(), self.ttl).is_some() {
            return Err(StoreError::StateInUse);
        }
        table.remove(&state);

        let session = AuthorizationSession::new(state.clone(), app.id.clone(), scope.to_owned());
        table.by_state.insert(state, session.clone());

        tracing::debug!(state = %session.state, client_id = %client_id, "Created authorization session");
        Ok(session)
    }

    /// Record the authenticated user on a session.
    ///
    /// Only allowed until a code is issued; the identity is fixed from then on.
    pub async fn attach_email(&self, state: &str, email: &str) -> StoreResult<AuthorizationSession> {
        let mut table = self.table.write().await;
        let session =
            table.live_mut(state, Instant::now(), self.ttl).ok_or(StoreError::SessionNotFound)?;

        match session.stage() {
            FlowStage::LoginPending | FlowStage::Authenticated => {}
            stage => return Err(StoreError::FlowOutOfOrder { stage }),
        }

        session.email = Some(email.to_owned());
        Ok(session.clone())
    }

    /// Attach a one-time authorization code to a session.
    ///
    /// A session keeps the first code it was given; repeated calls return it.
    pub async fn attach_code(&self, state: &str) -> StoreResult<(AuthorizationSession, String)> {
        let mut guard = self.table.write().await;
        let table = &mut *guard;
        let session = table
            .by_state
            .get_mut(state)
            .filter(|s| !s.is_expired_at(Instant::now(), self.ttl))
            .ok_or(StoreError::SessionNotFound)?;

        if session.stage() == FlowStage::Exchanged {
            return Err(StoreError::FlowOutOfOrder { stage: FlowStage::Exchanged });
        }
        if let Some(code) = &session.code {
            return Ok((session.clone(), code.clone()));
        }

        let mut code = Self::generate_code();
        while table.state_by_code.contains_key(&code) {
            code = Self::generate_code();
        }

        session.code = Some(code.clone());
        table.state_by_code.insert(code.clone(), state.to_owned());
        Ok((session.clone(), code))
    }

    /// Look up a live session by state.
    pub async fn find_by_state(&self, state: &str) -> Option<AuthorizationSession> {
        let table = self.table.read().await;
        table.live(state, Instant::now(), self.ttl).cloned()
    }

    /// Look up a live session by code, only if the supplied client credentials
    /// and redirect URI belong to the application that owns the session.
    pub async fn find_by_code_and_client(
        &self,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        code: &str,
    ) -> Option<AuthorizationSession> {
        let table = self.table.read().await;
        self.bound_session(&table, client_id, client_secret, redirect_uri, code).cloned()
    }

    /// Atomically validate and consume an authorization code.
    ///
    /// Succeeds once per code: the session must match the client binding, carry
    /// an authenticated user, and not have been exchanged before.
    pub async fn redeem_code(
        &self,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        code: &str,
    ) -> StoreResult<AuthorizationSession> {
        let mut table = self.table.write().await;
        let state = self
            .bound_session(&table, client_id, client_secret, redirect_uri, code)
            .map(|s| s.state.clone())
            .ok_or(StoreError::SessionNotFound)?;

        let session = table.by_state.get_mut(&state).ok_or(StoreError::SessionNotFound)?;
        if session.exchanged {
            return Err(StoreError::AlreadyExchanged);
        }
        if session.email.is_none() {
            return Err(StoreError::NotAuthenticated);
        }
        session.exchanged = true;
        Ok(session.clone())
    }

    fn bound_session<'t>(
        &self,
        table: &'t SessionTable,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        code: &str,
    ) -> Option<&'t AuthorizationSession> {
        let state = table.state_by_code.get(code)?;
        let session = table.live(state, Instant::now(), self.ttl)?;
        let app = self.registry.find_by_id(&session.app_id)?;

        (app.client_id == client_id && app.matches_binding(client_secret, redirect_uri))
            .then_some(session)
    }

    /// Number of stored sessions, including expired ones not yet swept.
    pub async fn session_count(&self) -> usize {
        self.table.read().await.by_state.len()
    }

    /// Remove every session older than the TTL. Returns how many were removed.
    pub async fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now()).await
    }

    /// Remove every session that is expired at `now`.
    pub async fn evict_expired_at(&self, now: Instant) -> usize {
        let mut guard = self.table.write().await;
        let table = &mut *guard;
        let before = table.by_state.len();

        let ttl = self.ttl;
        let state_by_code = &mut table.state_by_code;
        table.by_state.retain(|_, session| {
            let keep = !session.is_expired_at(now, ttl);
            if !keep {
                if let Some(code) = &session.code {
                    state_by_code.remove(code);
                }
            }
            keep
        });

        before - table.by_state.len()
    }

    /// Start the background sweep that evicts expired sessions.
    pub fn start_cleanup_task(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = self.evict_expired().await;
                if removed > 0 {
                    tracing::debug!(count = removed, "Cleaned up expired authorization sessions");
                }
            }
        })
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("ttl", &self.ttl).finish()
    }
}
