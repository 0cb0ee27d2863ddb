//! # Visitor Extractors
//!
//! Who is making the request, as far as the cookie session and the
//! `Authorization` header tell.
//!
//! ```text
//! Cookie: barkas_session=…   ──► tower-sessions ──► "visitor_id" ──► cart, sign-in
//! Authorization: Bearer …    ──► bearer token   ──────────────────► staff checks
//! ```
//!
//! [`Visitor`] hands out a visitor id on first use, so only handlers that
//! create per-visitor state take it. Everything else reads with [`Caller`],
//! which never sets a cookie.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use barkas_db::auth::extract_bearer_token;
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::ApiError;

/// Session key holding the visitor id.
pub const VISITOR_ID_KEY: &str = "visitor_id";

fn cookie_session(parts: &Parts) -> Result<Session, ApiError> {
    parts.extensions.get::<Session>().cloned().ok_or_else(|| {
        tracing::error!("Session layer missing from the router");
        ApiError::internal("Session unavailable")
    })
}

/// A visitor id, created and stored in the cookie session if absent.
#[derive(Debug, Clone)]
pub struct Visitor(pub String);

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = cookie_session(parts)?;

        if let Some(id) = session.get::<String>(VISITOR_ID_KEY).await? {
            return Ok(Visitor(id));
        }

        let id = Uuid::new_v4().to_string();
        session.insert(VISITOR_ID_KEY, &id).await?;
        tracing::debug!(visitor_id = %id, "New visitor");
        Ok(Visitor(id))
    }
}

/// The request's credentials, without creating anything.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    /// Visitor id from the cookie session, if the client has one.
    pub visitor: Option<String>,
    /// Token from `Authorization: Bearer <token>`.
    pub bearer: Option<String>,
}

impl Caller {
    pub fn visitor(&self) -> Option<&str> {
        self.visitor.as_deref()
    }

    pub fn bearer(&self) -> Option<&str> {
        self.bearer.as_deref()
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let visitor = match parts.extensions.get::<Session>() {
            Some(session) => session.get::<String>(VISITOR_ID_KEY).await?,
            None => None,
        };

        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .map(str::to_string);

        Ok(Caller { visitor, bearer })
    }
}
