//! # Report Types
//!
//! Shapes of the dashboard and admin reports, plus the small amount of math
//! that does not belong in SQL. Revenue is the sum of sale prices (before
//! trade-in credit), matching how the shop reads its monthly numbers.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{PhoneListing, SaleListing};

/// Models at or below this many available units show up as low stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Rows in the top-N rankings.
pub const TOP_N: i64 = 10;

// =============================================================================
// DTOs
// =============================================================================

/// `(label, count)` pair used by the breakdown tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CountBy {
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryStats {
    pub total_phones: i64,
    pub by_status: Vec<CountBy>,
    pub by_condition: Vec<CountBy>,
    /// Top brands by units in inventory (any status).
    pub by_brand: Vec<CountBy>,
}

/// Count and revenue for one bucket (a month or a payment method).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RevenueBucket {
    pub key: String,
    pub count: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesStats {
    pub total_sales: i64,
    pub total_revenue_cents: i64,
    /// `YYYY-MM` buckets for the last twelve months, oldest first.
    pub monthly: Vec<RevenueBucket>,
    pub by_payment_method: Vec<RevenueBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyRevenue {
    pub current_month_cents: i64,
    pub previous_month_cents: i64,
    pub change_percent: f64,
}

impl MonthlyRevenue {
    pub fn new(current_month_cents: i64, previous_month_cents: i64) -> Self {
        MonthlyRevenue {
            current_month_cents,
            previous_month_cents,
            change_percent: change_percent(current_month_cents, previous_month_cents),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ModelSales {
    pub model_id: i64,
    pub brand_name: String,
    pub model_name: String,
    pub sales_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LowStockModel {
    pub model_id: i64,
    pub brand_name: String,
    pub model_name: String,
    pub available_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TopCustomer {
    pub customer_id: i64,
    pub name: String,
    pub purchase_count: i64,
    pub total_spent_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerStats {
    pub total_customers: i64,
    pub top_customers: Vec<TopCustomer>,
}

/// Everything the admin reports page shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportBundle {
    pub inventory: InventoryStats,
    pub sales: SalesStats,
    pub monthly_revenue: MonthlyRevenue,
    pub top_models: Vec<ModelSales>,
    pub customers: CustomerStats,
}

/// Home screen summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Dashboard {
    pub available: i64,
    pub reserved: i64,
    pub sold: i64,
    pub service: i64,
    pub in_transit: i64,
    pub warehouse: i64,
    pub month_sales: i64,
    pub month_revenue_cents: i64,
    pub recent_phones: Vec<PhoneListing>,
    pub recent_sales: Vec<SaleListing>,
}

// =============================================================================
// Math
// =============================================================================

/// Month-over-month change in percent, rounded to two decimals.
///
/// With no previous revenue the change reads 100% if anything was sold this
/// month and 0% otherwise.
///
/// ## Example
/// ```rust
/// use celltrack_core::report::change_percent;
///
/// assert_eq!(change_percent(150_00, 100_00), 50.0);
/// assert_eq!(change_percent(500_00, 0), 100.0);
/// ```
pub fn change_percent(current_cents: i64, previous_cents: i64) -> f64 {
    if previous_cents > 0 {
        let change = (current_cents - previous_cents) as f64 / previous_cents as f64 * 100.0;
        (change * 100.0).round() / 100.0
    } else if current_cents > 0 {
        100.0
    } else {
        0.0
    }
}

/// `[start, end)` of a calendar month in UTC. Invalid months yield `None`.
pub fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (ny, nm) = next_month(year, month);
    let end = NaiveDate::from_ymd_opt(ny, nm, 1)?;
    Some((
        Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0)?),
        Utc.from_utc_datetime(&end.and_hms_opt(0, 0, 0)?),
    ))
}

pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Start of the rolling twelve-month window used by the monthly series.
pub fn twelve_months_before(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(365)
}

/// `(year, month)` of a timestamp.
pub fn year_month(at: DateTime<Utc>) -> (i32, u32) {
    (at.year(), at.month())
}
