//! # Error Types
//!
//! Domain-specific error types for celltrack-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  celltrack-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  celltrack-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  backoffice-api errors                                                  │
//! │  └── ApiError         - JSON body + HTTP status the client sees         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised while planning sales and status changes.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The phone is not in a sellable status.
    ///
    /// ## When This Occurs
    /// ```text
    /// Phone status: sold / service / in_transit / warehouse
    ///      │
    ///      ▼
    /// plan_sale(...)
    ///      │
    ///      ▼
    /// PhoneNotSellable { imei, status: "sold" }
    /// ```
    #[error("Phone {imei} cannot be sold while {status}")]
    PhoneNotSellable { imei: String, status: String },

    /// A manual status change that only the sale workflow may perform.
    #[error("Cannot change phone status from {from} to {to} manually")]
    InvalidStatusTransition { from: String, to: String },

    /// The phone offered as a trade-in does not qualify.
    #[error("Invalid trade-in: {reason}")]
    InvalidTradeIn { reason: String },

    /// The payment breakdown does not add up or is malformed.
    #[error("Invalid payment: {reason}")]
    InvalidPayment { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn trade_in(reason: impl Into<String>) -> Self {
        CoreError::InvalidTradeIn {
            reason: reason.into(),
        }
    }

    pub fn payment(reason: impl Into<String>) -> Self {
        CoreError::InvalidPayment {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, bad IMEI checksum).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Field must be left empty for the given context.
    #[error("{field} is not allowed {context}")]
    NotAllowed { field: String, context: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotOneOf { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field, used by the API to point forms at it.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::Negative { field }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::NotOneOf { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::PhoneNotSellable {
            imei: "490154203237518".to_string(),
            status: "sold".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Phone 490154203237518 cannot be sold while sold"
        );

        let err = CoreError::trade_in("phone is not used");
        assert_eq!(err.to_string(), "Invalid trade-in: phone is not used");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("imei");
        assert_eq!(err.to_string(), "imei is required");

        let err = ValidationError::NotAllowed {
            field: "acquired_from".to_string(),
            context: "for new phones".to_string(),
        };
        assert_eq!(err.to_string(), "acquired_from is not allowed for new phones");
        assert_eq!(err.field(), "acquired_from");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("price").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
