//! Dashboard and admin reports.

use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use celltrack_core::report::{Dashboard, LowStockModel, ReportBundle};
use celltrack_core::Role;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiQuery;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reports", get(report_bundle))
        .route("/reports/low-stock", get(low_stock))
}

#[derive(Debug, Default, Deserialize)]
pub struct LowStockQuery {
    /// Defaults to the configured threshold.
    #[serde(default)]
    pub threshold: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LowStockResponse {
    pub threshold: i64,
    pub models: Vec<LowStockModel>,
}

/// `GET /dashboard`, open to every signed-in user.
pub async fn dashboard(State(state): State<Arc<AppState>>) -> ApiResult<Json<Dashboard>> {
    Ok(Json(state.db.reports().dashboard(Utc::now()).await?))
}

async fn report_bundle(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<ReportBundle>> {
    user.ensure(Role::can_access_reports)?;
    Ok(Json(state.db.reports().bundle(Utc::now()).await?))
}

async fn low_stock(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<LowStockQuery>,
) -> ApiResult<Json<LowStockResponse>> {
    user.ensure(Role::can_access_reports)?;

    let threshold = query.threshold.unwrap_or(state.config.low_stock_threshold());
    if threshold < 0 {
        return Err(ApiError::bad_request("threshold cannot be negative"));
    }

    let models = state.db.reports().low_stock_models(threshold).await?;
    Ok(Json(LowStockResponse { threshold, models }))
}
