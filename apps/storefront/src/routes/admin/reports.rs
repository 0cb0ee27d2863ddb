//! Sales report for a day range. Defaults to the current month so far.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use barkas_core::validation::parse_date;
use barkas_core::{DateRange, SalesReport};
use chrono::Utc;
use serde::Deserialize;

use super::Staff;
use crate::error::ApiError;
use crate::state::{AppState, DbState};

pub fn router() -> Router<AppState> {
    Router::new().route("/reports", get(sales_report))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportQuery {
    /// `YYYY-MM-DD`
    pub start: Option<String>,
    /// `YYYY-MM-DD`, inclusive
    pub end: Option<String>,
}

async fn sales_report(
    _staff: Staff,
    State(db): State<DbState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<SalesReport>, ApiError> {
    let default = DateRange::month_to_date(Utc::now().date_naive());

    let start = match query.start.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => parse_date("start", raw)?,
        None => default.start,
    };
    let end = match query.end.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => parse_date("end", raw)?,
        None => default.end,
    };

    let report = db.inner().reports().sales_report(DateRange::new(start, end)?).await?;
    Ok(Json(report))
}
