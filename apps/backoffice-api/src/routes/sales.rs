//! Sales routes.

use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use celltrack_core::{SaleListing, SaleRequest};
use celltrack_db::{Page, SaleDetail};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::routes::PageQuery;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sales", get(list_sales).post(record_sale))
        .route("/sales/period", get(sales_in_period))
        .route("/sales/{id}", get(sale_detail))
        .route("/sales/{id}/pickup", post(mark_picked_up))
}

/// `?from=&to=` as RFC 3339 timestamps; `to` is exclusive.
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

async fn list_sales(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<Page<SaleListing>>> {
    let page = state
        .db
        .sales()
        .list(query.page(), state.config.page_size())
        .await?;
    Ok(Json(page))
}

async fn sales_in_period(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> ApiResult<Json<Vec<SaleListing>>> {
    if query.to <= query.from {
        return Err(ApiError::bad_request("'to' must be after 'from'"));
    }
    let sales = state.db.sales().list_by_period(query.from, query.to).await?;
    Ok(Json(sales))
}

/// Runs the sale workflow: the phone, trade-in, payments and audit comments
/// are written together or not at all.
async fn record_sale(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(request): ApiJson<SaleRequest>,
) -> ApiResult<(StatusCode, Json<SaleDetail>)> {
    let sale = state.db.sales().record_sale(&request, user.actor()).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

async fn sale_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleDetail>> {
    state
        .db
        .sales()
        .get_detail(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Sale not found: {}", id)))
}

async fn mark_picked_up(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleListing>> {
    Ok(Json(state.db.sales().mark_picked_up(&id).await?))
}
