//! # Admin Routes
//!
//! Back-office pages. Every handler takes a [`Staff`] extractor, so a
//! request without a signed-in staff member never reaches the handler.
//!
//! ## Access Check
//! ```text
//! request ──► Caller { visitor cookie, bearer token }
//!                     │
//!                     ▼
//!             SessionState::require_staff   (this request's token only)
//!                     │
//!                     ├── no token / expired / revoked ──► 401 UNAUTHORIZED
//!                     ├── role without admin access ─────► 403 FORBIDDEN
//!                     ▼
//!                 handler(Staff(user), ...)
//! ```

pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod reports;
pub mod settings;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::Router;
use barkas_core::User;

use super::visitor::Caller;
use crate::error::ApiError;
use crate::state::{AppState, SessionState};

/// Mounted under `/api/admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(dashboard::router())
        .merge(products::router())
        .merge(customers::router())
        .merge(orders::router())
        .merge(reports::router())
        .merge(settings::router())
}

/// The signed-in staff member making the request.
#[derive(Debug, Clone)]
pub struct Staff(pub User);

impl<S> FromRequestParts<S> for Staff
where
    SessionState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = SessionState::from_ref(state);
        let caller = Caller::from_request_parts(parts, state).await?;

        session
            .require_staff(caller.visitor(), caller.bearer())
            .await
            .map(Staff)
    }
}
