//! # Session Store
//!
//! Holds the signed-in staff member (if any) and broadcasts changes.
//!
//! The store itself is pure: it never talks to the auth service. The app
//! layer calls the service and then hands the result to [`SessionStore`].
//!
//! ## Events
//! ```text
//!   establish(session)   ──► SessionEvent::SignedIn(user)
//!   update_user(user)    ──► SessionEvent::ProfileUpdated(user)
//!   clear()              ──► SessionEvent::SignedOut   (only if signed in)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::observe::{Observers, Subscription};
use crate::types::{Role, User};

/// An authenticated session issued by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Session {
    pub user: User,
    /// Bearer token; revoked on sign-out.
    #[serde(skip)]
    #[ts(skip)]
    pub access_token: String,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A change in authentication state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn(User),
    ProfileUpdated(User),
    SignedOut,
}

/// Current authentication state plus its observers.
#[derive(Debug, Default)]
pub struct SessionStore {
    session: Option<Session>,
    observers: Observers<SessionEvent>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn role(&self) -> Option<Role> {
        self.current_user().map(|u| u.role)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// False when signed out.
    pub fn can_access_admin(&self) -> bool {
        self.role().is_some_and(|r| r.can_access_admin())
    }

    pub fn can_view_all_activity(&self) -> bool {
        self.role().is_some_and(|r| r.can_view_all_activity())
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Replaces the current session (sign-in or restore).
    pub fn establish(&mut self, session: Session) {
        let user = session.user.clone();
        self.session = Some(session);
        self.observers.notify(&SessionEvent::SignedIn(user));
    }

    /// Refreshes the signed-in user after a profile edit.
    ///
    /// Ignored when nobody is signed in or `user` is someone else.
    pub fn update_user(&mut self, user: User) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.user.id != user.id {
            return;
        }

        session.user = user.clone();
        self.observers.notify(&SessionEvent::ProfileUpdated(user));
    }

    /// Drops the session. Returns it so the caller can revoke the token.
    pub fn clear(&mut self) -> Option<Session> {
        let previous = self.session.take();
        if previous.is_some() {
            self.observers.notify(&SessionEvent::SignedOut);
        }
        previous
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
