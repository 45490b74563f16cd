//! Staff accounts (admin only).

use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use celltrack_core::validation::validate_new_user;
use celltrack_core::{NewUser, Role, User};
use celltrack_db::password::hash_password;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users).post(register_user))
        .route("/users/{id}/deactivate", post(deactivate_user))
        .route("/users/{id}/activate", post(activate_user))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<User>>> {
    user.ensure(Role::can_manage_users)?;
    Ok(Json(state.db.users().list().await?))
}

async fn register_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(body): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    user.ensure(Role::can_manage_users)?;
    validate_new_user(&body)?;

    let hash = hash_password(&body.password)?;
    let created = state.db.users().insert(&body, &hash).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    user.ensure(Role::can_manage_users)?;
    if id == user.id {
        return Err(ApiError::unprocessable("You cannot deactivate your own account"));
    }
    Ok(Json(state.db.users().set_active(id, false).await?))
}

async fn activate_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    user.ensure(Role::can_manage_users)?;
    Ok(Json(state.db.users().set_active(id, true).await?))
}
