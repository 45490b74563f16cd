//! JWT authentication module.
//!
//! Issues access tokens at login and turns the `Authorization: Bearer` header
//! of every other request into a [`CurrentUser`].
//!
//! ```text
//! POST /auth/login ──► verify_password ──► JwtManager::generate_access_token
//!
//! GET /phones ──► require_auth ──► validate_token ──► users.get(sub)
//!                      │                                   │
//!                      │ 401 on bad token,                 ▼
//!                      │ unknown or inactive user    extensions: CurrentUser
//! ```

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use celltrack_core::{Role, User};
use celltrack_db::Actor;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub username: String,

    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: impl Into<String>, lifetime_secs: i64) -> Self {
        JwtManager {
            secret: secret.into(),
            lifetime_secs,
        }
    }

    /// Token lifetime in seconds, reported to clients at login.
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Generate an access token for a staff account.
    pub fn generate_access_token(&self, user: &User) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Request Principal
// =============================================================================

/// The authenticated staff member, placed in request extensions by
/// [`require_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl CurrentUser {
    /// Who to record as author of comments, phones and sales.
    pub fn actor(&self) -> Actor<'_> {
        Actor::new(self.id, &self.username)
    }

    /// Fails with 403 unless `allowed(role)` holds.
    pub fn ensure(&self, allowed: fn(&Role) -> bool) -> ApiResult<()> {
        if allowed(&self.role) {
            Ok(())
        } else {
            warn!(user = %self.username, role = %self.role, "Admin-only route refused");
            Err(ApiError::forbidden("This action requires an administrator"))
        }
    }
}

/// Middleware guarding every route except health and login.
///
/// The account is re-read on each request so deactivating a user locks them
/// out before their token expires.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

    let claims = state.jwt.validate_token(token).inspect_err(|e| {
        warn!(error = %e.message, "Rejected token");
    })?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| ApiError::unauthorized("Invalid token subject"))?;

    let user = match state.db.users().get(user_id).await? {
        Some(user) if user.is_active => user,
        _ => {
            warn!(user_id, "Token for unknown or inactive user");
            return Err(ApiError::unauthorized("Account is not active"));
        }
    };

    debug!(user = %user.username, path = %req.uri().path(), "Authenticated request");

    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        username: user.username,
        role: user.role,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: 7,
            username: "empleado1".to_string(),
            email: None,
            first_name: None,
            last_name: None,
            role,
            phone: None,
            is_active: true,
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret", 3600);

        let token = manager.generate_access_token(&user(Role::Employee)).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.user_id(), Some(7));
        assert_eq!(claims.username, "empleado1");
        assert_eq!(claims.role, Role::Employee);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = JwtManager::new("secret-a", 3600);
        let other = JwtManager::new("secret-b", 3600);

        let token = issuer.generate_access_token(&user(Role::Admin)).unwrap();
        let err = other.validate_token(&token).unwrap_err();
        assert_eq!(err.code, "unauthorized");
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Past the default 60s leeway
        let manager = JwtManager::new("test-secret", -3600);
        let token = manager.generate_access_token(&user(Role::Admin)).unwrap();
        assert!(manager.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
    }

    #[test]
    fn test_ensure_role() {
        let admin = CurrentUser {
            id: 1,
            username: "admin".into(),
            role: Role::Admin,
        };
        let employee = CurrentUser {
            id: 2,
            username: "empleado1".into(),
            role: Role::Employee,
        };

        assert!(admin.ensure(Role::can_access_reports).is_ok());
        let err = employee.ensure(Role::can_delete_records).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);
    }
}
