//! # Sale Planning
//!
//! Recording a sale is a chain of conditional writes: the phone becomes
//! `sold`, a trade-in may add a new phone to inventory, and the payment lines
//! are stored. This module makes every decision up front so the database
//! layer only has to apply a [`SalePlan`] inside one transaction.
//!
//! ## Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleRequest                                                            │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  1. phone sellable?  (available | reserved)  ── no ──► PhoneNotSellable │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  2. sale price  (defaults to phone price, ≥ 0)                          │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  3. trade-in?                                                           │
//! │      ├── existing phone: available, used | trade_in, not this phone     │
//! │      └── new phone: validated as condition trade_in, acquired from      │
//! │          the buying customer                                            │
//! │      value: 0 < value ≤ sale price                                      │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  4. payments vs final price (sale price − trade-in value)               │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  SalePlan ──► SaleRepository::record_sale (single transaction)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::payment::{split_legacy_notes, PaymentBreakdown, PaymentLine};
use crate::types::{AcquisitionType, PaymentMethod, Phone, PhoneCondition, PhoneDraft, PhoneStatus};
use crate::validation::{non_blank, validate_phone_draft, validate_price_cents};

// =============================================================================
// Requests
// =============================================================================

/// Trade-in part of a sale request. Exactly one of `phone_id` (a phone
/// already in inventory) or `new_phone` (a handset received at the counter)
/// must be given.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TradeInRequest {
    /// Credit given for the handset, in cents.
    pub value_cents: i64,
    #[serde(default)]
    pub phone_id: Option<String>,
    #[serde(default)]
    pub new_phone: Option<PhoneDraft>,
}

/// Input of the sale form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRequest {
    pub phone_id: String,
    pub customer_id: i64,
    /// Defaults to the phone's listed price.
    #[serde(default)]
    pub sale_price_cents: Option<i64>,
    /// Inferred from the payment lines when omitted.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub payments: Vec<PaymentLine>,
    #[serde(default)]
    pub is_picked_up: bool,
    #[serde(default)]
    pub trade_in: Option<TradeInRequest>,
    #[serde(default)]
    pub notes: Option<String>,
}

// =============================================================================
// Plan
// =============================================================================

/// What happens to the trade-in side of a sale.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeInPlan {
    None,
    /// Link a phone already in inventory.
    Existing { phone_id: String, value: Money },
    /// Add the received handset to inventory, then link it.
    New { draft: PhoneDraft, value: Money },
}

impl TradeInPlan {
    pub fn value(&self) -> Option<Money> {
        match self {
            TradeInPlan::None => None,
            TradeInPlan::Existing { value, .. } | TradeInPlan::New { value, .. } => Some(*value),
        }
    }
}

/// A fully checked sale, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct SalePlan {
    pub phone_id: String,
    pub customer_id: i64,
    pub sale_price: Money,
    pub final_price: Money,
    pub payment_method: PaymentMethod,
    pub payments: PaymentBreakdown,
    pub is_picked_up: bool,
    pub pickup_date: Option<DateTime<Utc>>,
    pub trade_in: TradeInPlan,
    pub notes: Option<String>,
    pub sale_date: DateTime<Utc>,
}

/// Checks a sale request against the phone being sold.
///
/// ## Arguments
/// * `phone` - The phone being sold, as currently stored
/// * `request` - The sale form
/// * `existing_trade_in` - The stored phone named by `trade_in.phone_id`,
///   looked up by the caller (`None` when the request names no such phone)
/// * `now` - Sale timestamp, also used as pickup date for same-day pickups
///
/// ## Returns
/// * `Ok(SalePlan)` - Every rule holds
/// * `Err(CoreError)` - The first rule that failed
pub fn plan_sale(
    phone: &Phone,
    request: &SaleRequest,
    existing_trade_in: Option<&Phone>,
    now: DateTime<Utc>,
) -> CoreResult<SalePlan> {
    if !phone.can_be_sold() {
        return Err(CoreError::PhoneNotSellable {
            imei: phone.imei.clone(),
            status: phone.status.to_string(),
        });
    }

    let sale_price = request.sale_price_cents.unwrap_or(phone.price_cents);
    validate_price_cents("sale_price_cents", sale_price)?;
    let sale_price = Money::from_cents(sale_price);

    let trade_in = match &request.trade_in {
        Some(t) => plan_trade_in(phone, request.customer_id, t, sale_price, existing_trade_in)?,
        None => TradeInPlan::None,
    };
    let final_price = sale_price - trade_in.value().unwrap_or_default();

    // Requests without explicit lines may still carry them in legacy notes.
    let (notes, payments) = if request.payments.is_empty() {
        match non_blank(request.notes.as_deref()) {
            Some(text) => {
                let (text, legacy) = split_legacy_notes(text)?;
                (text, legacy.unwrap_or_default())
            }
            None => (None, PaymentBreakdown::default()),
        }
    } else {
        (
            non_blank(request.notes.as_deref()).map(str::to_string),
            PaymentBreakdown::new(request.payments.clone()),
        )
    };

    let payment_method = request
        .payment_method
        .or_else(|| payments.infer_method())
        .unwrap_or(PaymentMethod::Cash);
    payments.validate(payment_method, final_price)?;

    Ok(SalePlan {
        phone_id: phone.id.clone(),
        customer_id: request.customer_id,
        sale_price,
        final_price,
        payment_method,
        payments: payments.normalized(),
        is_picked_up: request.is_picked_up,
        pickup_date: request.is_picked_up.then_some(now),
        trade_in,
        notes,
        sale_date: now,
    })
}

fn plan_trade_in(
    phone: &Phone,
    customer_id: i64,
    request: &TradeInRequest,
    sale_price: Money,
    existing: Option<&Phone>,
) -> CoreResult<TradeInPlan> {
    let value = Money::from_cents(request.value_cents);
    if !value.is_positive() {
        return Err(CoreError::trade_in("trade-in value must be positive"));
    }
    if value > sale_price {
        return Err(CoreError::trade_in(format!(
            "trade-in value {value} exceeds sale price {sale_price}"
        )));
    }

    match (&request.phone_id, &request.new_phone) {
        (Some(_), Some(_)) => Err(CoreError::trade_in(
            "give either an inventory phone or a new phone, not both",
        )),
        (None, None) => Err(CoreError::trade_in("no trade-in phone given")),
        (Some(id), None) => {
            let candidate = existing
                .filter(|p| &p.id == id)
                .ok_or_else(|| CoreError::trade_in(format!("phone {id} is not in inventory")))?;
            check_existing_trade_in(phone, candidate)?;
            Ok(TradeInPlan::Existing {
                phone_id: candidate.id.clone(),
                value,
            })
        }
        (None, Some(draft)) => {
            let draft = trade_in_draft(draft, customer_id);
            validate_phone_draft(&draft)?;
            if draft.imei.trim() == phone.imei {
                return Err(CoreError::trade_in(
                    "the trade-in phone cannot be the phone being sold",
                ));
            }
            Ok(TradeInPlan::New { draft, value })
        }
    }
}

/// Rules for accepting an inventory phone as a trade-in.
fn check_existing_trade_in(sold: &Phone, candidate: &Phone) -> CoreResult<()> {
    if candidate.id == sold.id {
        return Err(CoreError::trade_in(
            "the trade-in phone cannot be the phone being sold",
        ));
    }
    if candidate.status != PhoneStatus::Available {
        return Err(CoreError::trade_in(format!(
            "phone {} is {}, only available phones can be traded in",
            candidate.imei, candidate.status
        )));
    }
    if !candidate.condition.accepts_as_trade_in() {
        return Err(CoreError::trade_in(format!(
            "phone {} is {}, only used or trade-in phones can be traded in",
            candidate.imei, candidate.condition
        )));
    }
    Ok(())
}

/// Forces the fields a handset received at the counter always has.
fn trade_in_draft(draft: &PhoneDraft, customer_id: i64) -> PhoneDraft {
    PhoneDraft {
        imei: draft.imei.trim().to_string(),
        status: PhoneStatus::Available,
        condition: PhoneCondition::TradeIn,
        acquisition_type: AcquisitionType::TradeIn,
        acquired_from: Some(customer_id),
        ..draft.clone()
    }
}

// =============================================================================
// Manual Status Changes
// =============================================================================

/// Checks a status change made by staff outside the sale workflow.
///
/// Only recording a sale may move a phone into `sold`, and a sold phone
/// stays sold.
pub fn check_manual_status_change(from: PhoneStatus, to: PhoneStatus) -> CoreResult<()> {
    if from == PhoneStatus::Sold || to == PhoneStatus::Sold {
        return Err(CoreError::InvalidStatusTransition {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    Ok(())
}

/// Checks that a customer id refers to something before hitting the database.
pub fn validate_customer_ref(customer_id: i64) -> Result<(), ValidationError> {
    if customer_id <= 0 {
        return Err(ValidationError::required("customer_id"));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
