//! Customer management, logged like product management.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use barkas_core::catalog::filter_customers;
use barkas_core::validation::validate_search_query;
use barkas_core::{ActivityAction, Customer, CustomerInput};
use serde_json::json;

use super::products::SearchQuery;
use super::Staff;
use crate::error::ApiError;
use crate::routes::log_activity;
use crate::state::{AppState, DbState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/{id}", put(update_customer).delete(delete_customer))
}

async fn list_customers(
    _staff: Staff,
    State(db): State<DbState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let search = validate_search_query(&query.search)?;
    let all = db.inner().customers().list().await?;
    Ok(Json(
        filter_customers(&all, &search)
            .into_iter()
            .cloned()
            .collect(),
    ))
}

async fn create_customer(
    Staff(user): Staff,
    State(db): State<DbState>,
    Json(input): Json<CustomerInput>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let customer = db.inner().customers().insert(&input).await?;

    log_activity(
        &db,
        &user,
        ActivityAction::CreateCustomer,
        json!({ "customer_id": customer.id, "customer_name": customer.name }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(customer)))
}

async fn update_customer(
    Staff(user): Staff,
    State(db): State<DbState>,
    Path(id): Path<String>,
    Json(input): Json<CustomerInput>,
) -> Result<Json<Customer>, ApiError> {
    let customer = db.inner().customers().update(&id, &input).await?;

    log_activity(
        &db,
        &user,
        ActivityAction::UpdateCustomer,
        json!({ "customer_id": customer.id, "customer_name": customer.name }),
    )
    .await;

    Ok(Json(customer))
}

async fn delete_customer(
    Staff(user): Staff,
    State(db): State<DbState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let customers = db.inner().customers();
    let customer = customers
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", &id))?;
    customers.delete(&id).await?;

    log_activity(
        &db,
        &user,
        ActivityAction::DeleteCustomer,
        json!({ "customer_id": customer.id, "customer_name": customer.name }),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
