//! Dashboard cards and recent orders.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use barkas_core::DashboardStats;
use chrono::Utc;

use super::Staff;
use crate::error::ApiError;
use crate::state::{AppState, ConfigState, DbState};

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

async fn dashboard(
    _staff: Staff,
    State(db): State<DbState>,
    State(config): State<ConfigState>,
) -> Result<Json<DashboardStats>, ApiError> {
    let stats = db
        .inner()
        .reports()
        .dashboard(config.store.low_stock_threshold, Utc::now())
        .await?;
    Ok(Json(stats))
}
