//! # Checkout Route
//!
//! ```text
//! POST /api/checkout { customerName, phone, customerAddress, ... }
//!      │
//!      ├── empty cart ──────────► 422 EMPTY_CART
//!      ▼
//! OrderRepository::place_order   (one transaction: order, items, stock)
//!      │
//!      ├── short stock ─────────► 409 INSUFFICIENT_STOCK, nothing written
//!      ▼
//! activity log (signed-in staff only), remove ordered lines, 201 + order
//! ```
//!
//! The order is attributed to the staff member behind this request's own
//! credentials, or to nobody for a shopper. Lines added to the cart while
//! the order was being placed stay in the cart.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use barkas_core::{ActivityAction, CartItem, CheckoutForm, CoreError, OrderWithItems};
use serde_json::json;
use tracing::info;

use super::log_activity;
use super::visitor::Caller;
use crate::error::ApiError;
use crate::state::{AppState, CartState, DbState, SessionState};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/checkout", post(checkout))
}

async fn checkout(
    State(db): State<DbState>,
    State(cart): State<CartState>,
    State(session): State<SessionState>,
    caller: Caller,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, Json<OrderWithItems>), ApiError> {
    let Some(visitor) = caller.visitor() else {
        return Err(CoreError::EmptyCart.into());
    };
    let items: Vec<CartItem> = cart.with_cart(visitor, |c| c.items().to_vec());
    if items.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    let user = session
        .authenticate(Some(visitor), caller.bearer())
        .await
        .ok()
        .map(|s| s.user);
    let placed = db
        .inner()
        .orders()
        .place_order(&form, &items, user.as_ref().map(|u| u.id.as_str()))
        .await?;

    if let Some(user) = &user {
        log_activity(
            &db,
            user,
            ActivityAction::CreateOrder,
            json!({
                "order_id": placed.order.id,
                "total": placed.order.total,
                "items_count": placed.items.len(),
            }),
        )
        .await;
    }

    cart.with_cart_mut(visitor, |c| c.remove_ordered(&items));
    info!(order_id = %placed.order.id, total = %placed.order.total(), "Checkout complete");

    Ok((StatusCode::CREATED, Json(placed)))
}
