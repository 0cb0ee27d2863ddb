//! # Session State
//!
//! Staff sign-ins, one [`SessionStore`] per visitor, backed by the auth
//! service.
//!
//! ## Sign-in Flow
//! ```text
//! POST /api/auth/sign-in
//!      │
//!      ▼
//! AuthService::sign_in ──── rejected ───► InvalidCredentials (store untouched)
//!      │
//!      ▼
//! visitor's SessionStore::establish ──► observers see SignedIn(user)
//! ```
//!
//! ## Authentication
//! Every request is judged on its own credentials: a bearer token if it
//! sent one, otherwise the token kept for its visitor cookie. The auth
//! service re-checks that token (signature, expiry, revocation) each time,
//! so signing out anywhere takes effect everywhere.

use std::sync::Arc;

use barkas_core::{Observers, Session, SessionEvent, SessionStore, Subscription, User};
use barkas_db::{AuthError, AuthService};
use chrono::Duration;
use tracing::{info, warn};

use super::visitors::VisitorMap;
use crate::error::ApiError;

/// A session change, tagged with the visitor it happened to.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionChange {
    pub visitor_id: String,
    pub event: SessionEvent,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    stores: VisitorMap<SessionStore>,
    events: Arc<Observers<SessionChange>>,
    auth: AuthService,
}

impl SessionState {
    pub fn new(auth: AuthService, idle: Duration) -> Self {
        SessionState {
            stores: VisitorMap::new(idle),
            events: Arc::new(Observers::new()),
            auth,
        }
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Signs in remotely and establishes the visitor's session.
    ///
    /// A previous session for the same visitor is replaced and its token
    /// revoked.
    pub async fn sign_in(
        &self,
        visitor: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let session = self.auth.sign_in(email, password).await?;

        let previous = self.stores.write(
            visitor,
            || self.new_store(visitor),
            |store| {
                let previous = store.access_token().map(str::to_string);
                store.establish(session.clone());
                previous
            },
        );

        if let Some(token) = previous {
            self.revoke(&token).await;
        }
        Ok(session)
    }

    /// Clears the visitor's session and revokes every token the request
    /// carried.
    ///
    /// Revocation failures are logged; the local session is gone either way.
    pub async fn sign_out(&self, visitor: Option<&str>, bearer: Option<&str>) {
        let previous = visitor.and_then(|v| self.stores.update(v, |store| store.clear()).flatten());

        if let Some(session) = &previous {
            self.revoke(&session.access_token).await;
            info!(user_id = %session.user.id, "Staff signed out");
        }

        if let Some(token) = bearer {
            let already = previous.as_ref().is_some_and(|s| s.access_token == token);
            if !already {
                self.revoke(token).await;
            }
        }
    }

    /// The live session behind this request's credentials.
    ///
    /// A bearer token wins over the visitor's stored token. When the stored
    /// token has expired or been revoked, the visitor's store is cleared.
    pub async fn authenticate(
        &self,
        visitor: Option<&str>,
        bearer: Option<&str>,
    ) -> Result<Session, ApiError> {
        if let Some(token) = bearer {
            return Ok(self.auth.get_session(token).await?);
        }

        let Some(visitor) = visitor else {
            return Err(ApiError::unauthorized());
        };
        let stored = self
            .stores
            .read(visitor, |store| store.and_then(|s| s.access_token().map(str::to_string)));
        let Some(token) = stored else {
            return Err(ApiError::unauthorized());
        };

        match self.auth.get_session(&token).await {
            Ok(session) => Ok(session),
            Err(e) => {
                if matches!(
                    e,
                    AuthError::SessionExpired | AuthError::SessionRevoked | AuthError::InvalidToken
                ) {
                    self.stores.update(visitor, |store| {
                        if store.access_token() == Some(token.as_str()) {
                            store.clear();
                        }
                    });
                }
                Err(e.into())
            }
        }
    }

    /// The signed-in user, provided the role may open the admin panel.
    pub async fn require_staff(
        &self,
        visitor: Option<&str>,
        bearer: Option<&str>,
    ) -> Result<User, ApiError> {
        let session = self.authenticate(visitor, bearer).await?;
        if !session.user.role.can_access_admin() {
            return Err(ApiError::forbidden());
        }
        Ok(session.user)
    }

    /// Replaces the visitor's session user after a profile edit.
    ///
    /// Visitors without a session are left alone.
    pub fn update_user(&self, visitor: &str, user: User) {
        self.stores.update(visitor, |store| store.update_user(user));
    }

    /// Listens to sign-ins, profile edits and sign-outs of every visitor.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionChange) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    fn new_store(&self, visitor: &str) -> SessionStore {
        let store = SessionStore::new();
        let events = Arc::clone(&self.events);
        let visitor_id = visitor.to_string();
        // Lives as long as the store.
        let _forward = store.subscribe(move |event| {
            events.notify(&SessionChange {
                visitor_id: visitor_id.clone(),
                event: event.clone(),
            });
        });
        store
    }

    async fn revoke(&self, token: &str) {
        if let Err(e) = self.auth.sign_out(token).await {
            warn!(error = %e, "Session revocation failed");
        }
    }
}
