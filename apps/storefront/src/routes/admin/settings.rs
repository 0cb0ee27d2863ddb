//! # Settings
//!
//! Profile editing and the activity feed. Admins and managers see every
//! entry; employees see only their own.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use barkas_core::validation::{validate_email, validate_required};
use barkas_core::{ActivityAction, ActivityLog, User, ACTIVITY_LOG_LIMIT};
use serde::Deserialize;
use serde_json::json;

use super::Staff;
use crate::routes::visitor::Caller;
use crate::error::ApiError;
use crate::routes::log_activity;
use crate::state::{AppState, DbState, SessionState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/activity", get(list_activity))
}

async fn get_profile(Staff(user): Staff) -> Json<User> {
    Json(user)
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub name: String,
    pub email: String,
}

async fn update_profile(
    Staff(user): Staff,
    caller: Caller,
    State(db): State<DbState>,
    State(session): State<SessionState>,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<User>, ApiError> {
    validate_required("name", &req.name)?;
    validate_email(&req.email)?;

    let updated = db
        .inner()
        .users()
        .update_profile(&user.id, &req.name, &req.email)
        .await?;

    let mut updated_fields = Vec::new();
    if updated.name != user.name {
        updated_fields.push("name");
    }
    if updated.email != user.email {
        updated_fields.push("email");
    }

    if let Some(visitor) = caller.visitor() {
        session.update_user(visitor, updated.clone());
    }
    log_activity(
        &db,
        &updated,
        ActivityAction::UpdateProfile,
        json!({ "updated_fields": updated_fields }),
    )
    .await;

    Ok(Json(updated))
}

async fn list_activity(
    Staff(user): Staff,
    State(db): State<DbState>,
) -> Result<Json<Vec<ActivityLog>>, ApiError> {
    let only_user = if user.role.can_view_all_activity() {
        None
    } else {
        Some(user.id.as_str())
    };

    let entries = db
        .inner()
        .activity()
        .list_recent(ACTIVITY_LOG_LIMIT, only_user)
        .await?;
    Ok(Json(entries))
}
