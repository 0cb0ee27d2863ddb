//! # Order Management
//!
//! ## Filters
//! `GET /orders?search=putu&status=pending&paymentStatus=dp_paid`
//! - `search`: customer name, phone or order id
//! - `status` / `paymentStatus`: exact; empty or `all` means no filter

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use barkas_core::catalog::filter_orders;
use barkas_core::{ActivityAction, Order, OrderStatus, OrderWithItems, PaymentStatus};
use serde::Deserialize;
use serde_json::json;

use super::Staff;
use crate::error::ApiError;
use crate::routes::log_activity;
use crate::state::{AppState, DbState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/status", put(update_status))
        .route("/orders/{id}/payment-status", put(update_payment_status))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderQuery {
    pub search: String,
    pub status: Option<String>,
    pub payment_status: Option<String>,
}

/// `None` for an absent, blank or `all` filter value.
fn parse_filter<T: FromStr>(value: Option<&str>) -> Result<Option<T>, T::Err> {
    match value.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(v) => v.parse().map(Some),
    }
}

async fn list_orders(
    _staff: Staff,
    State(db): State<DbState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<OrderWithItems>>, ApiError> {
    let status: Option<OrderStatus> = parse_filter(query.status.as_deref())?;
    let payment: Option<PaymentStatus> = parse_filter(query.payment_status.as_deref())?;

    let all = db.inner().orders().list_with_items().await?;
    Ok(Json(
        filter_orders(&all, &query.search, status, payment)
            .into_iter()
            .cloned()
            .collect(),
    ))
}

async fn get_order(
    _staff: Staff,
    State(db): State<DbState>,
    Path(id): Path<String>,
) -> Result<Json<OrderWithItems>, ApiError> {
    db.inner()
        .orders()
        .get_with_items(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Order", &id))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

async fn update_status(
    Staff(user): Staff,
    State(db): State<DbState>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let status: OrderStatus = req.status.parse()?;
    let order = db.inner().orders().update_order_status(&id, status).await?;

    log_activity(
        &db,
        &user,
        ActivityAction::UpdateOrderStatus,
        json!({ "order_id": order.id, "new_status": status.as_str() }),
    )
    .await;

    Ok(Json(order))
}

async fn update_payment_status(
    Staff(user): Staff,
    State(db): State<DbState>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let status: PaymentStatus = req.status.parse()?;
    let order = db.inner().orders().update_payment_status(&id, status).await?;

    log_activity(
        &db,
        &user,
        ActivityAction::UpdatePaymentStatus,
        json!({ "order_id": order.id, "new_status": status.as_str() }),
    )
    .await;

    Ok(Json(order))
}
