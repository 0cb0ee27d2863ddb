//! # barkas-storefront
//!
//! JSON API for the BarkasBali88 second-hand goods shop: the public
//! storefront (catalog, cart, checkout) and the staff back office.
//!
//! ## Module Organization
//! - [`config`] - `AppConfig` from defaults, TOML file and `BARKAS_*` env
//! - [`error`] - `ApiError`, the single handler error type
//! - [`state`] - `AppState` and its sub-states
//! - [`routes`] - HTTP handlers

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use barkas_core::{SessionEvent, Subscription};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing::debug;

use config::AppConfig;
use state::AppState;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "barkas_session";

/// Cookie session layer holding each browser's visitor id.
///
/// Sessions live in memory, like the carts they point at, and end after
/// `server.visitor_idle_secs` without a request.
pub fn session_layer(config: &AppConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(config.server.visitor_idle_secs),
        ))
        .with_secure(config.server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Builds the full router with visitor sessions and request tracing.
pub fn build_router(state: AppState) -> Router {
    let sessions = session_layer(&state.config);

    Router::new()
        .merge(routes::catalog::router())
        .merge(routes::cart::router())
        .merge(routes::checkout::router())
        .merge(routes::auth::router())
        .nest("/api/admin", routes::admin::router())
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Logs every cart and session change at `debug`.
///
/// Keep the returned subscriptions alive for as long as logging is wanted.
pub fn subscribe_logging(state: &AppState) -> Vec<Subscription> {
    let cart = state.cart.subscribe(|change| {
        debug!(
            visitor_id = %change.visitor_id,
            lines = change.summary.line_count,
            items = change.summary.item_count,
            total = %change.summary.total,
            "Cart changed"
        );
    });

    let session = state.session.subscribe(|change| match &change.event {
        SessionEvent::SignedIn(user) => debug!(
            visitor_id = %change.visitor_id,
            user_id = %user.id,
            role = %user.role,
            "Session established"
        ),
        SessionEvent::ProfileUpdated(user) => debug!(
            visitor_id = %change.visitor_id,
            user_id = %user.id,
            "Session user updated"
        ),
        SessionEvent::SignedOut => debug!(visitor_id = %change.visitor_id, "Session cleared"),
    });

    vec![cart, session]
}
