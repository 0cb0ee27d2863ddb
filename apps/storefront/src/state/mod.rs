//! # State Module
//!
//! Shared application state for the HTTP handlers.
//!
//! ## Why Multiple State Types?
//! Handlers extract only the sub-states they need through axum's `FromRef`,
//! so a catalog handler never touches the cart lock and a cart handler
//! never sees the auth service.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  AppState (Router::with_state)                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │            │                │                │               │          │
//! │            ▼                ▼                ▼               ▼          │
//! │  ┌────────────┐  ┌──────────────┐  ┌────────────────┐  ┌────────────┐  │
//! │  │  DbState   │  │  CartState   │  │  SessionState  │  │ConfigState │  │
//! │  │            │  │              │  │                │  │            │  │
//! │  │  Database  │  │  VisitorMap  │  │  VisitorMap<   │  │ Arc<App    │  │
//! │  │  (pool)    │  │   <Cart>     │  │  SessionStore> │  │  Config>   │  │
//! │  │            │  │              │  │  + AuthService │  │            │  │
//! │  └────────────┘  └──────────────┘  └────────────────┘  └────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • CartState / SessionState: std Mutex, never held across .await       │
//! │    keyed by the visitor id in the session cookie                       │
//! │  • ConfigState: Read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod config;
mod db;
mod session;
mod visitors;

use axum::extract::FromRef;

pub use cart::{CartEvent, CartState};
pub use config::ConfigState;
pub use db::DbState;
pub use session::{SessionChange, SessionState};

use barkas_db::{AuthConfig, Database};
use chrono::Duration;

use crate::config::AppConfig;

/// Router state. Each field is also extractable on its own.
#[derive(Debug, Clone, FromRef)]
pub struct AppState {
    pub db: DbState,
    pub cart: CartState,
    pub session: SessionState,
    pub config: ConfigState,
}

impl AppState {
    /// Builds the state with no visitors yet.
    pub fn new(db: Database, config: AppConfig) -> Self {
        let idle = Duration::seconds(config.server.visitor_idle_secs);
        let auth = db.auth(AuthConfig {
            jwt_secret: config.auth.jwt_secret.clone(),
            session_lifetime_secs: config.auth.session_lifetime_secs,
        });

        AppState {
            db: DbState::new(db),
            cart: CartState::new(idle),
            session: SessionState::new(auth, idle),
            config: ConfigState::new(config),
        }
    }
}
