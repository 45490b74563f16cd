//! # Routes
//!
//! ## Route Map
//! ```text
//! public
//!   GET  /health                      liveness + database check
//!   POST /auth/login                  username/password → access token
//!
//! authenticated (Bearer token)
//!   GET  /auth/me
//!   GET  /dashboard
//!   /brands, /models                  catalog           (catalog.rs)
//!   /phones/...                       inventory         (phones.rs)
//!   /imei/{imei}, /search             lookups           (search.rs)
//!   /sales/...                        sale workflow     (sales.rs)
//!   /customers/...                    customers         (customers.rs)
//!
//! admin only (403 for employees)
//!   DELETE /phones/{id}, /reports/..., /users/...
//! ```

mod auth;
mod catalog;
mod customers;
mod phones;
mod reports;
mod sales;
mod search;
mod users;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::require_auth;
use crate::AppState;

/// Builds the complete router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/dashboard", get(reports::dashboard))
        .merge(catalog::router())
        .merge(phones::router())
        .merge(search::router())
        .merge(sales::router())
        .merge(customers::router())
        .merge(reports::router())
        .merge(users::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .with_state(state)
}

// =============================================================================
// Shared Query Types
// =============================================================================

/// `?page=N`, 1-based.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: bool,
    pub store: String,
    pub version: String,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = state.db.health_check().await;
    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            database,
            store: state.config.store.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
