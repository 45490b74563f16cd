//! # Repository Module
//!
//! Database repository implementations for Celltrack.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │  db.phones().list(&filter, page, 20)                            │
//! │       ▼                                                                 │
//! │  PhoneRepository                                                        │
//! │  ├── insert / update / delete                                           │
//! │  ├── get / get_by_imei / lookup                                         │
//! │  ├── list (search, status, condition, paginated)                        │
//! │  └── update_status (+ audit comment)                                    │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`BrandRepository`] / [`PhoneModelRepository`] - Catalog
//! - [`PhoneRepository`] - Inventory
//! - [`CustomerRepository`] - Customers and their purchase totals
//! - [`SaleRepository`] - The sale workflow, pickups, sale lists
//! - [`CommentRepository`] - Per-phone audit trail
//! - [`UserRepository`] - Staff accounts
//! - [`ReportRepository`] - Dashboard and admin reports

pub mod brand;
pub mod comment;
pub mod customer;
pub mod phone;
pub mod phone_model;
pub mod report;
pub mod sale;
pub mod user;

pub use brand::BrandRepository;
pub use comment::CommentRepository;
pub use customer::CustomerRepository;
pub use phone::{PhoneFilter, PhoneRepository};
pub use phone_model::PhoneModelRepository;
pub use report::ReportRepository;
pub use sale::{SaleDetail, SaleRepository};
pub use user::UserRepository;

use serde::Serialize;

// =============================================================================
// Shared Types
// =============================================================================

/// Who performed a write, for `sold_by`, `added_by` and audit comments.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub user_id: Option<i64>,
    pub username: &'a str,
}

impl<'a> Actor<'a> {
    pub fn new(user_id: i64, username: &'a str) -> Self {
        Actor {
            user_id: Some(user_id),
            username,
        }
    }

    /// Writes made by maintenance binaries rather than a logged-in user.
    pub fn system() -> Actor<'static> {
        Actor {
            user_id: None,
            username: "sistema",
        }
    }
}

/// One page of a list, 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };
        Page {
            items,
            page,
            per_page,
            total,
            total_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Normalizes a requested page number and size into `(page, per_page, offset)`.
pub(crate) fn page_window(page: i64, per_page: i64) -> (i64, i64, i64) {
    let page = page.max(1);
    let per_page = per_page.clamp(1, 100);
    (page, per_page, (page - 1) * per_page)
}

/// `%term%` for LIKE filters, with LIKE wildcards in the term escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

// =============================================================================
// Test Fixtures
// =============================================================================
