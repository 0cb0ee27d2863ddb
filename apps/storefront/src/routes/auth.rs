//! # Auth Routes
//!
//! Staff sign-in for the admin panel. The session is kept for the
//! visitor's cookie; the returned access token may instead be sent as
//! `Authorization: Bearer <token>` by clients without cookies.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use barkas_core::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::visitor::{Caller, Visitor};
use crate::error::ApiError;
use crate::state::{AppState, SessionState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/sign-out", post(sign_out))
        .route("/api/auth/session", get(current_session))
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub user: User,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

async fn sign_in(
    State(session): State<SessionState>,
    Visitor(visitor): Visitor,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, ApiError> {
    let established = session.sign_in(&visitor, &req.email, &req.password).await?;

    Ok(Json(SignInResponse {
        user: established.user,
        access_token: established.access_token,
        expires_at: established.expires_at,
    }))
}

async fn sign_out(State(session): State<SessionState>, caller: Caller) -> StatusCode {
    session.sign_out(caller.visitor(), caller.bearer()).await;
    StatusCode::NO_CONTENT
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: Option<User>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// The signed-in user, or `null` when this caller has no live session.
async fn current_session(
    State(session): State<SessionState>,
    caller: Caller,
) -> Json<SessionResponse> {
    let current = session
        .authenticate(caller.visitor(), caller.bearer())
        .await
        .ok();

    Json(SessionResponse {
        expires_at: current.as_ref().map(|s| s.expires_at),
        user: current.map(|s| s.user),
    })
}
