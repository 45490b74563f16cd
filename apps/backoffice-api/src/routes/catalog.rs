//! Brands and phone models.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;

use celltrack_core::{Brand, NewBrand, NewPhoneModel, PhoneModel};

use crate::error::ApiResult;
use crate::extract::{blank_as_none, ApiJson, ApiQuery};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/brands", get(list_brands).post(create_brand))
        .route("/brands/{id}", patch(update_brand))
        .route("/models", get(list_models).post(create_model))
        .route("/models/{id}", patch(update_model))
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub brand_id: Option<i64>,
    /// Hide inactive entries (forms); reports and admin screens list all.
    #[serde(default)]
    pub active_only: bool,
}

async fn list_brands(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<CatalogQuery>,
) -> ApiResult<Json<Vec<Brand>>> {
    Ok(Json(state.db.brands().list(query.active_only).await?))
}

async fn create_brand(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<NewBrand>,
) -> ApiResult<(StatusCode, Json<Brand>)> {
    let brand = state.db.brands().insert(&body).await?;
    Ok((StatusCode::CREATED, Json(brand)))
}

async fn update_brand(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<NewBrand>,
) -> ApiResult<Json<Brand>> {
    Ok(Json(state.db.brands().update(id, &body).await?))
}

async fn list_models(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<CatalogQuery>,
) -> ApiResult<Json<Vec<PhoneModel>>> {
    let models = state
        .db
        .phone_models()
        .list(query.brand_id, query.active_only)
        .await?;
    Ok(Json(models))
}

async fn create_model(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<NewPhoneModel>,
) -> ApiResult<(StatusCode, Json<PhoneModel>)> {
    let model = state.db.phone_models().insert(&body).await?;
    Ok((StatusCode::CREATED, Json(model)))
}

/// Replaces every editable field; send the whole form.
async fn update_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<NewPhoneModel>,
) -> ApiResult<Json<PhoneModel>> {
    Ok(Json(state.db.phone_models().update(id, &body).await?))
}
