//! # Domain Types
//!
//! Entities and enums shared by the database layer and the API.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌───────────┐ 1    n ┌─────────────┐ 1    n ┌─────────────────────┐    │
//! │  │   Brand   │───────►│ PhoneModel  │───────►│       Phone         │    │
//! │  │ name uniq │        │ (brand,name)│        │ id (UUID)           │    │
//! │  └───────────┘        │ base_price  │        │ imei (Luhn, unique) │    │
//! │                       └─────────────┘        │ status / condition  │    │
//! │                                              │ acquired_from ──────┼─┐  │
//! │  ┌───────────┐                               └──────────┬──────────┘ │  │
//! │  │ Customer  │◄─────────────────────────────────────────┼────────────┘  │
//! │  │ name, dni │◄──────┐                                  │ 1:1           │
//! │  └───────────┘       │ n                                ▼               │
//! │                  ┌───┴────────────────┐ 1    n ┌─────────────────┐      │
//! │                  │       Sale         │───────►│  SalePayment    │      │
//! │                  │ id (UUID), method  │        │ kind, currency  │      │
//! │                  │ trade-in phone     │        └─────────────────┘      │
//! │                  └────────────────────┘                                 │
//! │                                                                         │
//! │  PhoneComment: free-text audit trail per phone (status changes, notes)  │
//! │  User:         staff account, role admin | employee                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Phones and sales use UUID v4 strings, since their ids end up printed in QR
//! payloads. Catalog records (brands, models, customers, users) use integer
//! ids assigned by SQLite.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::money::Money;

/// Implements `as_str`, `Display` and `FromStr` for a plain string-backed enum.
macro_rules! string_enum {
    ($ty:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            /// Stored/serialized representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $s),+
                }
            }

            /// Every variant, in declaration order.
            pub fn all() -> &'static [$ty] {
                &[$($ty::$variant),+]
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($s => Ok($ty::$variant),)+
                    other => Err(format!(
                        "unknown {}: '{}'",
                        stringify!($ty),
                        other
                    )),
                }
            }
        }
    };
}

// =============================================================================
// Phone Status
// =============================================================================

/// Where a phone is in its inventory lifecycle.
///
/// ## Transitions
/// ```text
///   warehouse ◄──► available ◄──► reserved
///        ▲            │  ▲           │
///        │            ▼  │           │
///   in_transit ◄──► service          │
///                     │              │
///     available / reserved ──(sale)──┴──► sold   (terminal)
/// ```
/// Staff move phones freely between the non-sold statuses. Only recording a
/// sale moves a phone into `sold`, and nothing moves it back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PhoneStatus {
    Available,
    Reserved,
    Sold,
    Service,
    InTransit,
    Warehouse,
}

string_enum!(PhoneStatus {
    Available => "available",
    Reserved => "reserved",
    Sold => "sold",
    Service => "service",
    InTransit => "in_transit",
    Warehouse => "warehouse",
});

impl PhoneStatus {
    /// Label shown on the shop floor.
    pub fn label(&self) -> &'static str {
        match self {
            PhoneStatus::Available => "Stock",
            PhoneStatus::Reserved => "Reservado",
            PhoneStatus::Sold => "Vendido",
            PhoneStatus::Service => "Servicio técnico",
            PhoneStatus::InTransit => "En camino",
            PhoneStatus::Warehouse => "Depósito",
        }
    }

    /// A phone can enter a sale only from these statuses.
    pub fn is_sellable(&self) -> bool {
        matches!(self, PhoneStatus::Available | PhoneStatus::Reserved)
    }
}

impl Default for PhoneStatus {
    fn default() -> Self {
        PhoneStatus::Available
    }
}

// =============================================================================
// Phone Condition
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PhoneCondition {
    New,
    Used,
    Refurbished,
    /// Received from a customer as part of a sale.
    TradeIn,
}

string_enum!(PhoneCondition {
    New => "new",
    Used => "used",
    Refurbished => "refurbished",
    TradeIn => "trade_in",
});

impl PhoneCondition {
    pub fn label(&self) -> &'static str {
        match self {
            PhoneCondition::New => "Nuevo",
            PhoneCondition::Used => "Usado",
            PhoneCondition::Refurbished => "Reacondicionado",
            PhoneCondition::TradeIn => "Parte de pago",
        }
    }

    /// Second-hand conditions record a battery health reading.
    pub fn requires_battery(&self) -> bool {
        !matches!(self, PhoneCondition::New)
    }

    /// Conditions a phone must have to be accepted against a sale.
    pub fn accepts_as_trade_in(&self) -> bool {
        matches!(self, PhoneCondition::Used | PhoneCondition::TradeIn)
    }
}

impl Default for PhoneCondition {
    fn default() -> Self {
        PhoneCondition::New
    }
}

// =============================================================================
// Acquisition Type
// =============================================================================

/// How the shop obtained a phone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionType {
    /// Not recorded.
    #[serde(rename = "none")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "none"))]
    Unspecified,
    /// Bought from a wholesaler.
    Wholesale,
    /// Taken from a customer as part payment.
    TradeIn,
}

string_enum!(AcquisitionType {
    Unspecified => "none",
    Wholesale => "wholesale",
    TradeIn => "trade_in",
});

impl Default for AcquisitionType {
    fn default() -> Self {
        AcquisitionType::Unspecified
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Headline payment method of a sale. `Mixed` means the itemized breakdown
/// combines several kinds or currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Financing,
    Mixed,
}

string_enum!(PaymentMethod {
    Cash => "cash",
    Card => "card",
    Transfer => "transfer",
    Financing => "financing",
    Mixed => "mixed",
});

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Efectivo",
            PaymentMethod::Card => "Tarjeta",
            PaymentMethod::Transfer => "Transferencia",
            PaymentMethod::Financing => "Financiación",
            PaymentMethod::Mixed => "Mixto",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Role
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Employee,
}

string_enum!(Role {
    Admin => "admin",
    Employee => "employee",
});

impl Role {
    #[inline]
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Deleting inventory records.
    pub fn can_delete_records(&self) -> bool {
        self.is_admin()
    }

    /// Revenue and customer reports.
    pub fn can_access_reports(&self) -> bool {
        self.is_admin()
    }

    /// Registering and listing staff accounts.
    pub fn can_manage_users(&self) -> bool {
        self.is_admin()
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Employee
    }
}

// =============================================================================
// Catalog: Brand & PhoneModel
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Brand {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A commercial model ("Galaxy S23") of a brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PhoneModel {
    pub id: i64,
    pub brand_id: i64,
    /// Joined from `brands` for display.
    pub brand_name: String,
    pub name: String,
    /// Suggested price for new inventory of this model.
    pub base_price_cents: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PhoneModel {
    /// "Samsung Galaxy S23"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand_name, self.name)
    }

    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }
}

// =============================================================================
// Phone
// =============================================================================

/// One physical handset in inventory, identified by IMEI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Phone {
    /// UUID v4.
    pub id: String,
    /// Shop-assigned sticker code, unique when present.
    pub internal_code: Option<String>,
    pub model_id: i64,
    /// 15 digits, Luhn-valid, unique across inventory.
    pub imei: String,
    pub status: PhoneStatus,
    pub condition: PhoneCondition,
    pub price_cents: i64,
    pub storage_capacity: Option<String>,
    pub color: Option<String>,
    /// Battery health 0-100.
    pub battery_percentage: Option<i64>,
    pub acquisition_type: AcquisitionType,
    /// Customer who traded the phone in.
    pub acquired_from: Option<i64>,
    pub notes: Option<String>,
    pub added_by: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Phone {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Only available or reserved phones can be sold.
    #[inline]
    pub fn can_be_sold(&self) -> bool {
        self.status.is_sellable()
    }
}

/// A phone joined with its model and brand names, as lists and detail
/// pages show it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PhoneListing {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub phone: Phone,
    pub brand_name: String,
    pub model_name: String,
}

impl PhoneListing {
    /// Payload printed in the phone's QR label:
    /// `PHONE:{id}:{imei}:{brand}:{model}`.
    pub fn qr_payload(&self) -> String {
        format!(
            "PHONE:{}:{}:{}:{}",
            self.phone.id, self.phone.imei, self.brand_name, self.model_name
        )
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand_name, self.model_name)
    }
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// National identity document number.
    pub dni: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Customer row with purchase aggregates, for lists and rankings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CustomerSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub customer: Customer,
    pub total_purchases: i64,
    pub total_spent_cents: i64,
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale of exactly one phone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    /// UUID v4.
    pub id: String,
    /// The phone sold; a phone appears in at most one sale.
    pub phone_id: String,
    pub customer_id: i64,
    pub sale_price_cents: i64,
    pub payment_method: PaymentMethod,
    pub is_picked_up: bool,
    /// Set the first time the sale is marked picked up, never overwritten.
    #[ts(as = "Option<String>")]
    pub pickup_date: Option<DateTime<Utc>>,
    pub has_trade_in: bool,
    pub trade_in_phone_id: Option<String>,
    pub trade_in_value_cents: Option<i64>,
    pub sold_by: Option<i64>,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    pub notes: Option<String>,
}

impl Sale {
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    /// Amount the customer pays after the trade-in credit.
    pub fn final_price(&self) -> Money {
        match (self.has_trade_in, self.trade_in_value_cents) {
            (true, Some(value)) => self.sale_price() - Money::from_cents(value),
            _ => self.sale_price(),
        }
    }
}

/// A sale joined with the names needed by lists, receipts and QR labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleListing {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub sale: Sale,
    pub customer_name: String,
    pub imei: String,
    pub brand_name: String,
    pub model_name: String,
    pub sold_by_username: Option<String>,
}

impl SaleListing {
    /// `SALE:{id}:{customer}:{price}:{YYYYMMDD}`
    pub fn qr_payload(&self) -> String {
        let price = self.sale.sale_price();
        format!(
            "SALE:{}:{}:{}.{:02}:{}",
            self.sale.id,
            self.customer_name,
            price.units(),
            price.cents_part(),
            self.sale.sale_date.format("%Y%m%d")
        )
    }
}

// =============================================================================
// Comments & Users
// =============================================================================

/// Audit trail entry attached to a phone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PhoneComment {
    pub id: i64,
    pub phone_id: String,
    pub user_id: Option<i64>,
    /// Joined from `users`; `None` once the author account is gone.
    pub author: Option<String>,
    pub comment: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Staff account.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub phone: Option<String>,
    pub is_active: bool,
    /// Argon2 PHC string; never serialized.
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub password_hash: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.username.clone(),
        }
    }
}

// =============================================================================
// Input Drafts
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBrand {
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPhoneModel {
    pub brand_id: i64,
    pub name: String,
    #[serde(default)]
    pub base_price_cents: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Phone form input, used both to add and to edit inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PhoneDraft {
    pub model_id: i64,
    pub imei: String,
    #[serde(default)]
    pub internal_code: Option<String>,
    #[serde(default)]
    pub status: PhoneStatus,
    #[serde(default)]
    pub condition: PhoneCondition,
    /// Defaults to the model's base price when omitted.
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub storage_capacity: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub battery_percentage: Option<i64>,
    #[serde(default)]
    pub acquisition_type: AcquisitionType,
    #[serde(default)]
    pub acquired_from: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub dni: Option<String>,
}

/// Staff registration form. The password is hashed before it reaches the
/// database layer.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn phone(status: PhoneStatus) -> Phone {
        let now = Utc::now();
        Phone {
            id: "7f1c5a9e-3b2d-4e8f-9a6b-1c2d3e4f5a6b".to_string(),
            internal_code: None,
            model_id: 1,
            imei: "490154203237518".to_string(),
            status,
            condition: PhoneCondition::New,
            price_cents: 80_000_00,
            storage_capacity: Some("128GB".to_string()),
            color: Some("Negro".to_string()),
            battery_percentage: Some(100),
            acquisition_type: AcquisitionType::Wholesale,
            acquired_from: None,
            notes: None,
            added_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sale(has_trade_in: bool, trade_in_value_cents: Option<i64>) -> Sale {
        Sale {
            id: "0b9f6f6a-8d3c-4c1e-b2a7-5e4d3c2b1a09".to_string(),
            phone_id: "p".to_string(),
            customer_id: 1,
            sale_price_cents: 120_000_00,
            payment_method: PaymentMethod::Cash,
            is_picked_up: false,
            pickup_date: None,
            has_trade_in,
            trade_in_phone_id: None,
            trade_in_value_cents,
            sold_by: None,
            sale_date: Utc.with_ymd_and_hms(2026, 3, 7, 15, 30, 0).unwrap(),
            notes: None,
        }
    }

    #[test]
    fn test_can_be_sold_only_from_available_or_reserved() {
        assert!(phone(PhoneStatus::Available).can_be_sold());
        assert!(phone(PhoneStatus::Reserved).can_be_sold());
        for status in [
            PhoneStatus::Sold,
            PhoneStatus::Service,
            PhoneStatus::InTransit,
            PhoneStatus::Warehouse,
        ] {
            assert!(!phone(status).can_be_sold(), "{status} should not be sellable");
        }
    }

    #[test]
    fn test_final_price_subtracts_trade_in() {
        assert_eq!(sale(false, None).final_price().cents(), 120_000_00);
        assert_eq!(
            sale(true, Some(30_000_00)).final_price().cents(),
            90_000_00
        );
        // Flag without a value leaves the price untouched.
        assert_eq!(sale(true, None).final_price().cents(), 120_000_00);
    }

    #[test]
    fn test_enum_string_roundtrip() {
        for status in PhoneStatus::all() {
            assert_eq!(status.as_str().parse::<PhoneStatus>().unwrap(), *status);
        }
        assert_eq!(
            "trade_in".parse::<PhoneCondition>().unwrap(),
            PhoneCondition::TradeIn
        );
        assert_eq!(
            "none".parse::<AcquisitionType>().unwrap(),
            AcquisitionType::Unspecified
        );
        assert!("broken".parse::<PhoneStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&PhoneStatus::InTransit).unwrap(),
            "\"in_transit\""
        );
        assert_eq!(
            serde_json::to_string(&AcquisitionType::Unspecified).unwrap(),
            "\"none\""
        );
    }

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.can_delete_records());
        assert!(Role::Admin.can_access_reports());
        assert!(!Role::Employee.can_delete_records());
        assert!(!Role::Employee.can_manage_users());
    }

    #[test]
    fn test_qr_payloads() {
        let listing = PhoneListing {
            phone: phone(PhoneStatus::Available),
            brand_name: "Samsung".to_string(),
            model_name: "Galaxy S23".to_string(),
        };
        assert_eq!(
            listing.qr_payload(),
            "PHONE:7f1c5a9e-3b2d-4e8f-9a6b-1c2d3e4f5a6b:490154203237518:Samsung:Galaxy S23"
        );

        let listing = SaleListing {
            sale: sale(false, None),
            customer_name: "Juan Pérez".to_string(),
            imei: "490154203237518".to_string(),
            brand_name: "Apple".to_string(),
            model_name: "iPhone 14".to_string(),
            sold_by_username: None,
        };
        assert_eq!(
            listing.qr_payload(),
            "SALE:0b9f6f6a-8d3c-4c1e-b2a7-5e4d3c2b1a09:Juan Pérez:120000.00:20260307"
        );
    }

    #[test]
    fn test_user_never_serializes_password_hash() {
        let user = User {
            id: 1,
            username: "admin".to_string(),
            email: None,
            first_name: Some("Ana".to_string()),
            last_name: None,
            role: Role::Admin,
            phone: None,
            is_active: true,
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert_eq!(user.full_name(), "Ana");
    }
}
