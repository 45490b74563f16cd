//! # Celltrack Back-Office API
//!
//! JSON over HTTP for the shop's back office: inventory, sales, customers,
//! reports and staff accounts.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Back-Office API                                 │
//! │                                                                         │
//! │  public:     /health   /auth/login                                      │
//! │                                                                         │
//! │  ┌────────────────┐   ┌──────────────────────────────────────────────┐  │
//! │  │  require_auth  │──►│  /phones  /sales  /customers  /brands        │  │
//! │  │  (Bearer JWT)  │   │  /models  /search /imei  /dashboard /auth/me │  │
//! │  └────────────────┘   │                                              │  │
//! │                       │  admin: /reports  /users  DELETE /phones/{id}│  │
//! │                       └──────────────────────┬───────────────────────┘  │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                                   celltrack-db (SQLite)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]: defaults, then `celltrack.toml`, then `CELLTRACK_*`
//! environment variables.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use celltrack_db::Database;

// Re-exports
pub use auth::{CurrentUser, JwtManager};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::build_router;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Arc<Self> {
        let jwt = JwtManager::new(
            config.auth.jwt_secret.clone(),
            config.auth.token_lifetime_secs,
        );
        Arc::new(AppState { db, jwt, config })
    }
}
