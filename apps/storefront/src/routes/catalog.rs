//! # Catalog Routes
//!
//! Public storefront pages: home, product list, product detail.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use barkas_core::catalog::{categories, filter_catalog};
use barkas_core::validation::validate_search_query;
use barkas_core::{Product, FEATURED_PRODUCTS_LIMIT, RELATED_PRODUCTS_LIMIT};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::{AppState, ConfigState, DbState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/home", get(home))
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product))
        .route("/api/categories", get(list_categories))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
}

/// Liveness plus a database round trip.
async fn health(State(db): State<DbState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        database: db.inner().health_check().await,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    pub store_name: String,
    pub featured: Vec<Product>,
    pub total_products: i64,
    pub total_categories: usize,
}

async fn home(
    State(db): State<DbState>,
    State(config): State<ConfigState>,
) -> Result<Json<HomeResponse>, ApiError> {
    let products = db.inner().products();
    let featured = products.list_featured(FEATURED_PRODUCTS_LIMIT).await?;
    let total_products = products.count().await?;
    let total_categories = products.categories().await?.len();

    Ok(Json(HomeResponse {
        store_name: config.store.name.clone(),
        featured,
        total_products,
        total_categories,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogQuery {
    pub search: String,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total: usize,
    /// Every category in the catalog, not just the filtered page.
    pub categories: Vec<String>,
}

async fn list_products(
    State(db): State<DbState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let search = validate_search_query(&query.search)?;
    let all = db.inner().products().list().await?;
    let products: Vec<Product> = filter_catalog(&all, &search, query.category.as_deref())
        .into_iter()
        .cloned()
        .collect();

    debug!(search = %search, matched = products.len(), "Catalog filtered");

    Ok(Json(ProductListResponse {
        total: products.len(),
        categories: categories(&all),
        products,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailResponse {
    pub product: Product,
    pub related: Vec<Product>,
}

async fn get_product(
    State(db): State<DbState>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetailResponse>, ApiError> {
    let products = db.inner().products();
    let product = products
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;
    let related = products.related(&product, RELATED_PRODUCTS_LIMIT).await?;

    Ok(Json(ProductDetailResponse { product, related }))
}

async fn list_categories(State(db): State<DbState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(db.inner().products().categories().await?))
}
