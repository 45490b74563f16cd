//! Login and session routes.

use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use celltrack_core::User;
use celltrack_db::password::verify_password;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}

/// `POST /auth/login`
///
/// Unknown usernames, wrong passwords and inactive accounts all answer the
/// same 401.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state.db.users().get_by_username(&body.username).await?;

    let user = match user {
        Some(user) if user.is_active && verify_password(&body.password, &user.password_hash) => user,
        _ => {
            warn!(username = %body.username.trim(), "Failed login attempt");
            return Err(ApiError::unauthorized("Invalid username or password"));
        }
    };

    let access_token = state.jwt.generate_access_token(&user)?;
    info!(user = %user.username, role = %user.role, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.jwt.lifetime_secs(),
        user,
    }))
}

/// `GET /auth/me`
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<User>> {
    let user = state
        .db
        .users()
        .get(current.id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", current.id)))?;
    Ok(Json(user))
}
