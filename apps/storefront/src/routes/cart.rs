//! # Cart Routes
//!
//! Each visitor has its own cart. Reads never hand out a visitor id, so
//! `GET /api/cart` from a new client shows an empty cart and sets no cookie.
//!
//! ## Stock Guard
//! Adding checks the live stock: `in cart + requested <= stock`.
//! Changing a quantity checks the stock captured in the cart line.
//! Checkout checks again inside the order transaction.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use barkas_core::validation::validate_uuid;
use barkas_core::{Cart, CartItem, CartSummary, CoreError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::visitor::{Caller, Visitor};
use crate::error::ApiError;
use crate::state::{AppState, CartState, DbState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(get_cart).delete(clear_cart))
        .route("/api/cart/items", post(add_to_cart))
        .route(
            "/api/cart/items/{product_id}",
            put(update_cart_item).delete(remove_from_cart),
        )
}

/// Cart lines plus aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub summary: CartSummary,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            items: cart.items().to_vec(),
            summary: cart.summary(),
        }
    }
}

async fn get_cart(State(cart): State<CartState>, caller: Caller) -> Json<CartResponse> {
    let response = match caller.visitor() {
        Some(visitor) => cart.with_cart(visitor, |c| CartResponse::from(c)),
        None => CartResponse::from(&Cart::new()),
    };
    Json(response)
}

fn one() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default = "one")]
    pub quantity: i64,
}

/// Adds a product, or increases the quantity of a line already in the cart.
async fn add_to_cart(
    State(db): State<DbState>,
    State(cart): State<CartState>,
    Visitor(visitor): Visitor,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    debug!(product_id = %req.product_id, quantity = req.quantity, "add_to_cart");

    validate_uuid(&req.product_id)?;
    if req.quantity < 1 {
        return Err(ApiError::validation("Quantity must be at least 1"));
    }

    let product = db
        .inner()
        .products()
        .get_by_id(&req.product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &req.product_id))?;

    let response = cart.with_cart_mut(&visitor, |c| {
        let in_cart = c.get(&product.id).map_or(0, |line| line.quantity);
        match in_cart.checked_add(req.quantity) {
            Some(wanted) if wanted <= product.stock => {}
            _ => {
                return Err(CoreError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock,
                    requested: in_cart.saturating_add(req.quantity),
                })
            }
        }

        c.add_item(&product, req.quantity);
        Ok(CartResponse::from(&*c))
    })?;

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

/// Sets a line's quantity. Zero or less removes the line.
async fn update_cart_item(
    State(cart): State<CartState>,
    Visitor(visitor): Visitor,
    Path(product_id): Path<String>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let response = cart.with_cart_mut(&visitor, |c| {
        let Some(line) = c.get(&product_id) else {
            return Err(ApiError::not_found("Cart item", &product_id));
        };

        if req.quantity > line.product.stock {
            return Err(ApiError::from(CoreError::InsufficientStock {
                product: line.product.name.clone(),
                available: line.product.stock,
                requested: req.quantity,
            }));
        }

        c.update_quantity(&product_id, req.quantity);
        Ok(CartResponse::from(&*c))
    })?;

    Ok(Json(response))
}

async fn remove_from_cart(
    State(cart): State<CartState>,
    caller: Caller,
    Path(product_id): Path<String>,
) -> Json<CartResponse> {
    let Some(visitor) = caller.visitor() else {
        return Json(CartResponse::from(&Cart::new()));
    };
    Json(cart.with_cart_mut(visitor, |c| {
        c.remove_item(&product_id);
        CartResponse::from(&*c)
    }))
}

async fn clear_cart(State(cart): State<CartState>, caller: Caller) -> StatusCode {
    if let Some(visitor) = caller.visitor() {
        cart.with_cart_mut(visitor, |c| c.clear());
    }
    StatusCode::NO_CONTENT
}
