//! Customer routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use celltrack_core::{Customer, CustomerSummary, NewCustomer, SaleListing};
use celltrack_db::Page;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/{id}", get(customer_detail).patch(update_customer))
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    /// Matches name, email, phone or DNI.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
}

/// Customer page: contact data, totals and every purchase, newest first.
#[derive(Debug, Serialize)]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: CustomerSummary,
    pub purchases: Vec<SaleListing>,
}

async fn list_customers(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<CustomerQuery>,
) -> ApiResult<Json<Page<CustomerSummary>>> {
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let page = state
        .db
        .customers()
        .list(search, query.page.unwrap_or(1), state.config.page_size())
        .await?;
    Ok(Json(page))
}

async fn create_customer(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<NewCustomer>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.db.customers().insert(&body).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn customer_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CustomerDetail>> {
    let customer = state
        .db
        .customers()
        .summary(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Customer not found: {}", id)))?;
    let purchases = state.db.sales().list_by_customer(id).await?;

    Ok(Json(CustomerDetail {
        customer,
        purchases,
    }))
}

/// Replaces the contact data; send the whole form.
async fn update_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<NewCustomer>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().update(id, &body).await?))
}
