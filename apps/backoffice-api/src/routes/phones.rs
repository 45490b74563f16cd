//! Inventory routes.
//!
//! ```text
//! GET    /phones                      ?search=&status=&condition=&page=
//! GET    /phones/new, /phones/used    same list, condition fixed
//! POST   /phones                      add to inventory
//! GET    /phones/{id}                 detail + comments + sale
//! PATCH  /phones/{id}                 edit (status unchanged)
//! DELETE /phones/{id}                 admin
//! POST   /phones/{id}/status          manual status change
//! POST   /phones/{id}/comments        add comment
//! GET    /phones/{id}/qr              QR label payload
//! GET    /phones/lookup/{identifier}  IMEI, id, QR payload or internal code
//! ```

use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use celltrack_core::{
    PhoneComment, PhoneCondition, PhoneDraft, PhoneListing, PhoneStatus, Role, SaleListing,
};
use celltrack_db::{Page, PhoneFilter};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{blank_as_none, ApiJson, ApiQuery};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/phones", get(list_phones).post(create_phone))
        .route("/phones/new", get(list_new_phones))
        .route("/phones/used", get(list_used_phones))
        .route("/phones/lookup/{identifier}", get(lookup_phone))
        .route(
            "/phones/{id}",
            get(phone_detail).patch(update_phone).delete(delete_phone),
        )
        .route("/phones/{id}/status", post(change_status))
        .route("/phones/{id}/comments", post(add_comment))
        .route("/phones/{id}/qr", get(phone_qr))
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct PhoneListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub status: Option<PhoneStatus>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub condition: Option<PhoneCondition>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub model_id: Option<i64>,
    #[serde(default)]
    pub page: Option<i64>,
}

impl PhoneListQuery {
    fn filter(&self) -> PhoneFilter {
        PhoneFilter {
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            status: self.status,
            condition: self.condition,
            model_id: self.model_id,
            include_sold: false,
        }
    }
}

/// Phone detail page.
#[derive(Debug, Serialize)]
pub struct PhoneDetail {
    #[serde(flatten)]
    pub phone: PhoneListing,
    pub status_label: &'static str,
    pub condition_label: &'static str,
    pub qr_payload: String,
    /// Newest first.
    pub comments: Vec<PhoneComment>,
    pub sale: Option<SaleListing>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: PhoneStatus,
}

#[derive(Debug, Deserialize)]
pub struct NewComment {
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct QrPayload {
    pub phone_id: String,
    pub payload: String,
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_phones(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PhoneListQuery>,
) -> ApiResult<Json<Page<PhoneListing>>> {
    list_with(&state, query.filter(), query.page).await
}

async fn list_new_phones(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PhoneListQuery>,
) -> ApiResult<Json<Page<PhoneListing>>> {
    list_with(&state, query.filter().condition(PhoneCondition::New), query.page).await
}

async fn list_used_phones(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PhoneListQuery>,
) -> ApiResult<Json<Page<PhoneListing>>> {
    list_with(&state, query.filter().condition(PhoneCondition::Used), query.page).await
}

async fn list_with(
    state: &AppState,
    filter: PhoneFilter,
    page: Option<i64>,
) -> ApiResult<Json<Page<PhoneListing>>> {
    let page = state
        .db
        .phones()
        .list(&filter, page.unwrap_or(1), state.config.page_size())
        .await?;
    Ok(Json(page))
}

async fn create_phone(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(draft): ApiJson<PhoneDraft>,
) -> ApiResult<(StatusCode, Json<PhoneListing>)> {
    let phone = state.db.phones().insert(&draft, user.actor()).await?;
    Ok((StatusCode::CREATED, Json(phone)))
}

async fn phone_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<PhoneDetail>> {
    let phone = find_phone(&state, &id).await?;
    let comments = state.db.comments().list_for_phone(&id).await?;
    let sale = state.db.sales().get_by_phone(&id).await?;

    Ok(Json(PhoneDetail {
        status_label: phone.phone.status.label(),
        condition_label: phone.phone.condition.label(),
        qr_payload: phone.qr_payload(),
        phone,
        comments,
        sale,
    }))
}

/// Replaces the editable fields; the status in the body is ignored.
async fn update_phone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(draft): ApiJson<PhoneDraft>,
) -> ApiResult<Json<PhoneListing>> {
    Ok(Json(state.db.phones().update(&id, &draft).await?))
}

async fn delete_phone(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.ensure(Role::can_delete_records)?;
    state.db.phones().delete(&id).await?;
    info!(id = %id, by = %user.username, "Phone removed from inventory");
    Ok(StatusCode::NO_CONTENT)
}

async fn change_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusChange>,
) -> ApiResult<Json<PhoneListing>> {
    let phone = state
        .db
        .phones()
        .update_status(&id, body.status, user.actor())
        .await?;
    Ok(Json(phone))
}

async fn add_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<NewComment>,
) -> ApiResult<(StatusCode, Json<PhoneComment>)> {
    let comment = state
        .db
        .comments()
        .add(&id, user.actor(), &body.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn phone_qr(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<QrPayload>> {
    let phone = find_phone(&state, &id).await?;
    Ok(Json(QrPayload {
        payload: phone.qr_payload(),
        phone_id: phone.phone.id,
    }))
}

async fn lookup_phone(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> ApiResult<Json<PhoneListing>> {
    state
        .db
        .phones()
        .lookup(&identifier)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No phone matches '{}'", identifier.trim())))
}

async fn find_phone(state: &AppState, id: &str) -> ApiResult<PhoneListing> {
    state
        .db
        .phones()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Phone not found: {}", id)))
}
