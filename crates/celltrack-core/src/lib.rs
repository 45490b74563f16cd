//! # celltrack-core: Pure Business Logic for Celltrack
//!
//! Everything the back office decides lives here as pure functions: whether
//! an IMEI is real, which phone-form fields are required, whether a sale and
//! its payment lines add up. No database, no network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Celltrack Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 backoffice-api (axum, JWT)                      │   │
//! │  │   /phones  /sales  /customers  /reports  /search  /users        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ celltrack-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌───────┐  │   │
//! │  │   │  types  │ │   imei   │ │validation│ │ payment  │ │ sale  │  │   │
//! │  │   │ Phone   │ │  Luhn    │ │ per-cond │ │ ARS/USD  │ │ plan  │  │   │
//! │  │   │ Sale    │ │  format  │ │  rules   │ │ install. │ │       │  │   │
//! │  │   └─────────┘ └──────────┘ └──────────┘ └──────────┘ └───────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 celltrack-db (Database Layer)                   │   │
//! │  │          SQLite, migrations, repositories, sale workflow        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities and enums (Phone, Sale, Customer, ...)
//! - [`money`] - Integer money and ARS/USD conversion
//! - [`imei`] - Luhn checksum and IMEI formatting
//! - [`validation`] - Form rules, including condition-dependent phone fields
//! - [`payment`] - Itemized payment breakdown and its settlement check
//! - [`sale`] - Sale planning and manual status-change rules
//! - [`search`] - Quick-search and QR payload parsing
//! - [`report`] - Report DTOs and month math
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use celltrack_core::imei::is_valid_imei;
//! use celltrack_core::money::Money;
//!
//! assert!(is_valid_imei("490154203237518"));
//!
//! let price = Money::from_units(120_000);
//! let trade_in = Money::from_units(30_000);
//! assert_eq!((price - trade_in).units(), 90_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod imei;
pub mod money;
pub mod payment;
pub mod report;
pub mod sale;
pub mod search;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Currency, Money};
pub use payment::{PaymentBreakdown, PaymentKind, PaymentLine, SalePayment};
pub use sale::{SalePlan, SaleRequest, TradeInPlan, TradeInRequest};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Rows per page on every paginated list.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Rows shown in the dashboard's "recent" panels.
pub const RECENT_ITEMS: i64 = 5;
