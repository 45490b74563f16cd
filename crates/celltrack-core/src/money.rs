//! # Money Module
//!
//! `Money` holds an amount in the smallest unit of a currency (centavos for
//! ARS, cents for USD). The shop prices everything in pesos; dollars only
//! appear as payment lines and are converted with an explicit exchange rate.
//!
//! ## Currency Conversion
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  USD payment line                                                       │
//! │    amount: 100_00 (US$100.00)                                           │
//! │    rate:   1_050_00 (ARS cents per 1 USD = $1050.00)                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Money::convert_usd_to_ars                                              │
//! │    100_00 × 1_050_00 / 100 = 105_000_00  ($105,000.00)                  │
//! │                                                                         │
//! │  Integer math only, rounded half away from zero to the nearest centavo  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use celltrack_core::money::Money;
//!
//! let price = Money::from_cents(80_000_00); // $80,000.00
//! let trade_in = Money::from_cents(20_000_00);
//! assert_eq!((price - trade_in).cents(), 60_000_00);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

// =============================================================================
// Currency
// =============================================================================

/// Currencies accepted at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Argentine pesos, the store's pricing currency.
    Ars,
    /// US dollars, accepted in cash and converted at the day's rate.
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Ars => "ARS",
            Currency::Usd => "USD",
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Currency::Ars => "$",
            Currency::Usd => "US$",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Ars
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ARS" => Ok(Currency::Ars),
            "USD" => Ok(Currency::Usd),
            other => Err(format!("unknown currency: {other}")),
        }
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// - **i64 (signed)**: differences such as month-over-month deltas can go negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use celltrack_core::money::Money;
    ///
    /// let price = Money::from_cents(120_000_00);
    /// assert_eq!(price.cents(), 12_000_000);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole units (pesos or dollars).
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units * 100)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Converts a USD amount to ARS using `rate_cents` (ARS cents per 1 USD).
    ///
    /// Returns `None` when the peso amount does not fit in an `i64`.
    ///
    /// ## Example
    /// ```rust
    /// use celltrack_core::money::Money;
    ///
    /// let usd = Money::from_units(100);                  // US$100.00
    /// let ars = usd.convert_usd_to_ars(1_050_00).unwrap(); // at $1050.00
    /// assert_eq!(ars.cents(), 105_000_00);
    /// ```
    pub fn convert_usd_to_ars(&self, rate_cents: i64) -> Option<Money> {
        let product = i128::from(self.0) * i128::from(rate_cents);
        let rounded = if product >= 0 {
            (product + 50) / 100
        } else {
            (product - 50) / 100
        };
        i64::try_from(rounded).ok().map(Money)
    }

    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    #[inline]
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Formats the amount with the currency symbol and thousands separators
    /// the way receipts print it (`$80.000,00`, `US$100,00`).
    pub fn format(&self, currency: Currency) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let units = self.units().abs().to_string();
        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, ch) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        format!(
            "{}{}{},{:02}",
            sign,
            currency.symbol(),
            grouped,
            self.cents_part()
        )
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain debug-style rendering (`$80000.00`); use [`Money::format`] for receipts.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.units().abs(), self.cents_part())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
