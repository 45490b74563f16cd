//! # Payment Breakdown
//!
//! A sale records a headline [`PaymentMethod`] plus an itemized list of
//! payment lines. Customers routinely split a phone across pesos, dollars and
//! card installments, so one sale can carry several lines.
//!
//! ## Settlement Check
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sale price $400.000      trade-in $100.000      amount due $300.000    │
//! │                                                                         │
//! │  line 1: cash     ARS  $90.000                    →  $90.000            │
//! │  line 2: cash     USD  US$100 @ $1.100            → $110.000            │
//! │  line 3: card     ARS  $100.000  (6 installments) → $100.000            │
//! │                                                   ──────────            │
//! │                                        ARS total    $300.000  ✓         │
//! │                                                                         │
//! │  |total - due| must be ≤ $1 (PAYMENT_TOLERANCE_CENTS)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Legacy Notes Encoding
//! Older records kept the breakdown inside the sale's free-text notes, after
//! a `[[PAYMENT_DETAIL]]` marker followed by a JSON array. [`split_legacy_notes`]
//! still reads that format so imported sales keep their detail; new sales
//! store lines in `sale_payments` and never write the marker.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Currency, Money};
use crate::types::PaymentMethod;

/// Rounding slack allowed when USD lines are converted to pesos.
pub const PAYMENT_TOLERANCE_CENTS: i64 = 100;

/// Card plans offered at the counter go up to 24 installments.
pub const MAX_INSTALLMENTS: i64 = 24;

/// Marker separating free-text notes from the legacy JSON payment detail.
pub const LEGACY_PAYMENT_MARKER: &str = "[[PAYMENT_DETAIL]]";

// =============================================================================
// Payment Kind
// =============================================================================

/// How a single payment line was tendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Cash,
    Card,
    Transfer,
    Financing,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Cash => "cash",
            PaymentKind::Card => "card",
            PaymentKind::Transfer => "transfer",
            PaymentKind::Financing => "financing",
        }
    }

    /// The single-kind payment method a line of this kind belongs to.
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentKind::Cash => PaymentMethod::Cash,
            PaymentKind::Card => PaymentMethod::Card,
            PaymentKind::Transfer => PaymentMethod::Transfer,
            PaymentKind::Financing => PaymentMethod::Financing,
        }
    }

    /// Inverse of [`PaymentKind::method`]; `Mixed` has no single kind.
    pub fn from_method(method: PaymentMethod) -> Option<PaymentKind> {
        match method {
            PaymentMethod::Cash => Some(PaymentKind::Cash),
            PaymentMethod::Card => Some(PaymentKind::Card),
            PaymentMethod::Transfer => Some(PaymentKind::Transfer),
            PaymentMethod::Financing => Some(PaymentKind::Financing),
            PaymentMethod::Mixed => None,
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cash" => Ok(PaymentKind::Cash),
            "card" => Ok(PaymentKind::Card),
            "transfer" => Ok(PaymentKind::Transfer),
            "financing" => Ok(PaymentKind::Financing),
            other => Err(format!("unknown payment kind: '{other}'")),
        }
    }
}

// =============================================================================
// Payment Line
// =============================================================================

/// One tendered amount within a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentLine {
    pub kind: PaymentKind,
    #[serde(default)]
    pub currency: Currency,
    /// Amount in the line's own currency, in cents.
    pub amount_cents: i64,
    /// Card installments (1 = single payment).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installments: Option<i64>,
    /// ARS cents per 1 USD, required for USD lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate_cents: Option<i64>,
}

impl PaymentLine {
    pub fn ars(kind: PaymentKind, amount_cents: i64) -> Self {
        PaymentLine {
            kind,
            currency: Currency::Ars,
            amount_cents,
            installments: None,
            exchange_rate_cents: None,
        }
    }

    pub fn usd_cash(amount_cents: i64, exchange_rate_cents: i64) -> Self {
        PaymentLine {
            kind: PaymentKind::Cash,
            currency: Currency::Usd,
            amount_cents,
            installments: None,
            exchange_rate_cents: Some(exchange_rate_cents),
        }
    }

    pub fn card(amount_cents: i64, installments: i64) -> Self {
        PaymentLine {
            kind: PaymentKind::Card,
            currency: Currency::Ars,
            amount_cents,
            installments: Some(installments),
            exchange_rate_cents: None,
        }
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Value of this line in pesos, `None` if the conversion overflows.
    pub fn ars_equivalent(&self) -> Option<Money> {
        match (self.currency, self.exchange_rate_cents) {
            (Currency::Usd, Some(rate)) => self.amount().convert_usd_to_ars(rate),
            _ => Some(self.amount()),
        }
    }

    /// Receipt line, e.g. `Tarjeta ARS $100.000,00 (6 cuotas)`.
    pub fn describe(&self) -> String {
        let mut out = format!(
            "{} {} {}",
            self.kind.method().label(),
            self.currency,
            self.amount().format(self.currency)
        );
        if let Some(n) = self.installments.filter(|n| *n > 1) {
            out.push_str(&format!(" ({n} cuotas)"));
        }
        if let (Currency::Usd, Some(rate)) = (self.currency, self.exchange_rate_cents) {
            out.push_str(&format!(
                " @ {}",
                Money::from_cents(rate).format(Currency::Ars)
            ));
        }
        out
    }

    fn validate(&self, index: usize) -> CoreResult<()> {
        let line = index + 1;

        if self.amount_cents <= 0 {
            return Err(CoreError::payment(format!(
                "line {line}: amount must be positive"
            )));
        }

        match (self.currency, self.exchange_rate_cents) {
            (Currency::Usd, None) => {
                return Err(CoreError::payment(format!(
                    "line {line}: USD payments need an exchange rate"
                )));
            }
            (Currency::Usd, Some(rate)) if rate <= 0 => {
                return Err(CoreError::payment(format!(
                    "line {line}: exchange rate must be positive"
                )));
            }
            (Currency::Ars, Some(_)) => {
                return Err(CoreError::payment(format!(
                    "line {line}: exchange rate only applies to USD payments"
                )));
            }
            _ => {}
        }

        match (self.kind, self.installments) {
            (PaymentKind::Card, Some(n)) if !(1..=MAX_INSTALLMENTS).contains(&n) => {
                Err(CoreError::payment(format!(
                    "line {line}: installments must be between 1 and {MAX_INSTALLMENTS}"
                )))
            }
            (PaymentKind::Card, _) | (_, None) => Ok(()),
            (_, Some(_)) => Err(CoreError::payment(format!(
                "line {line}: installments only apply to card payments"
            ))),
        }
    }
}

// =============================================================================
// Payment Breakdown
// =============================================================================

/// The itemized payment of a sale. Serializes as a bare array of lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentBreakdown {
    pub lines: Vec<PaymentLine>,
}

impl PaymentBreakdown {
    pub fn new(lines: Vec<PaymentLine>) -> Self {
        PaymentBreakdown { lines }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of every line converted to pesos.
    ///
    /// Fails instead of wrapping when a line or the running total leaves the
    /// `i64` range.
    pub fn total_ars(&self) -> CoreResult<Money> {
        self.lines.iter().try_fold(Money::zero(), |acc, line| {
            line.ars_equivalent()
                .and_then(|amount| acc.checked_add(amount))
                .ok_or_else(|| CoreError::payment("amount out of range"))
        })
    }

    /// Checks the breakdown against the sale's headline method and the amount
    /// the customer owes after any trade-in credit.
    ///
    /// ## Rules
    /// - every line is well formed (positive amount, USD lines carry a rate,
    ///   installments only on cards and within 1..=24)
    /// - single-kind methods: every line has that kind
    /// - `mixed`: at least two lines differing in kind or currency
    /// - non-empty breakdowns add up to `amount_due` within $1
    /// - an empty breakdown is only accepted for single-kind methods
    pub fn validate(&self, method: PaymentMethod, amount_due: Money) -> CoreResult<()> {
        for (i, line) in self.lines.iter().enumerate() {
            line.validate(i)?;
        }

        match PaymentKind::from_method(method) {
            Some(kind) => {
                if let Some(line) = self.lines.iter().find(|l| l.kind != kind) {
                    return Err(CoreError::payment(format!(
                        "{} line does not match payment method {}",
                        line.kind, method
                    )));
                }
            }
            None => {
                let distinct: HashSet<(PaymentKind, Currency)> =
                    self.lines.iter().map(|l| (l.kind, l.currency)).collect();
                if self.lines.len() < 2 || distinct.len() < 2 {
                    return Err(CoreError::payment(
                        "mixed payments need at least two different kinds or currencies",
                    ));
                }
            }
        }

        if self.is_empty() {
            return Ok(());
        }

        let total = self.total_ars()?;
        let off_by = total
            .checked_sub(amount_due)
            .map(|diff| diff.cents().unsigned_abs());
        if off_by.map_or(true, |cents| cents > PAYMENT_TOLERANCE_CENTS.unsigned_abs()) {
            return Err(CoreError::payment(format!(
                "payments add up to {} but {} is due",
                total.format(Currency::Ars),
                amount_due.format(Currency::Ars)
            )));
        }

        Ok(())
    }

    /// Fills defaults: card lines without installments become single payments.
    pub fn normalized(mut self) -> Self {
        for line in &mut self.lines {
            if line.kind == PaymentKind::Card && line.installments.is_none() {
                line.installments = Some(1);
            }
        }
        self
    }

    /// Picks the headline method that describes these lines.
    pub fn infer_method(&self) -> Option<PaymentMethod> {
        let first = self.lines.first()?;
        if self.lines.iter().all(|l| l.kind == first.kind) {
            Some(first.kind.method())
        } else {
            Some(PaymentMethod::Mixed)
        }
    }
}

// =============================================================================
// Stored Payment Row
// =============================================================================

/// A payment line as persisted in `sale_payments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalePayment {
    pub id: i64,
    pub sale_id: String,
    /// Order the line was entered in.
    pub position: i64,
    pub kind: PaymentKind,
    pub currency: Currency,
    pub amount_cents: i64,
    pub installments: Option<i64>,
    pub exchange_rate_cents: Option<i64>,
}

impl From<&SalePayment> for PaymentLine {
    fn from(row: &SalePayment) -> Self {
        PaymentLine {
            kind: row.kind,
            currency: row.currency,
            amount_cents: row.amount_cents,
            installments: row.installments,
            exchange_rate_cents: row.exchange_rate_cents,
        }
    }
}

// =============================================================================
// Legacy Notes
// =============================================================================

/// Splits notes written in the legacy format into free text and breakdown.
///
/// Text without the marker comes back untouched with no breakdown. A marker
/// followed by unparseable JSON is an error rather than silently dropped
/// payment detail.
pub fn split_legacy_notes(notes: &str) -> CoreResult<(Option<String>, Option<PaymentBreakdown>)> {
    let Some(idx) = notes.find(LEGACY_PAYMENT_MARKER) else {
        let text = notes.trim();
        return Ok(((!text.is_empty()).then(|| text.to_string()), None));
    };

    let text = notes[..idx].trim();
    let json = notes[idx + LEGACY_PAYMENT_MARKER.len()..].trim();
    let lines: Vec<PaymentLine> = serde_json::from_str(json)
        .map_err(|e| CoreError::payment(format!("unreadable payment detail in notes: {e}")))?;

    Ok((
        (!text.is_empty()).then(|| text.to_string()),
        Some(PaymentBreakdown::new(lines)),
    ))
}

// =============================================================================
// Unit Tests
// =============================================================================
