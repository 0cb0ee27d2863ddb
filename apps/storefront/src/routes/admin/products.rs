//! # Product Management
//!
//! CRUD over the catalog. Each write is recorded in the activity log as
//! `{product_id, product_name}`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use barkas_core::catalog::filter_admin_products;
use barkas_core::validation::validate_search_query;
use barkas_core::{ActivityAction, Product, ProductInput};
use serde::Deserialize;
use serde_json::json;

use super::Staff;
use crate::error::ApiError;
use crate::routes::log_activity;
use crate::state::{AppState, DbState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", put(update_product).delete(delete_product))
        .route("/products/{id}/stock", post(adjust_stock))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub search: String,
}

async fn list_products(
    _staff: Staff,
    State(db): State<DbState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let search = validate_search_query(&query.search)?;
    let all = db.inner().products().list().await?;
    Ok(Json(
        filter_admin_products(&all, &search)
            .into_iter()
            .cloned()
            .collect(),
    ))
}

async fn create_product(
    Staff(user): Staff,
    State(db): State<DbState>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = db.inner().products().insert(&input).await?;

    log_activity(
        &db,
        &user,
        ActivityAction::CreateProduct,
        json!({ "product_id": product.id, "product_name": product.name }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    Staff(user): Staff,
    State(db): State<DbState>,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>, ApiError> {
    let product = db.inner().products().update(&id, &input).await?;

    log_activity(
        &db,
        &user,
        ActivityAction::UpdateProduct,
        json!({ "product_id": product.id, "product_name": product.name }),
    )
    .await;

    Ok(Json(product))
}

async fn delete_product(
    Staff(user): Staff,
    State(db): State<DbState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let products = db.inner().products();
    let product = products
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;
    products.delete(&id).await?;

    log_activity(
        &db,
        &user,
        ActivityAction::DeleteProduct,
        json!({ "product_id": product.id, "product_name": product.name }),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    /// Positive to restock, negative to correct downwards.
    pub delta: i64,
}

async fn adjust_stock(
    Staff(user): Staff,
    State(db): State<DbState>,
    Path(id): Path<String>,
    Json(req): Json<StockAdjustment>,
) -> Result<Json<Product>, ApiError> {
    let product = db.inner().products().adjust_stock(&id, req.delta).await?;

    log_activity(
        &db,
        &user,
        ActivityAction::UpdateProduct,
        json!({
            "product_id": product.id,
            "product_name": product.name,
            "stock_delta": req.delta,
        }),
    )
    .await;

    Ok(Json(product))
}
