//! # Validation Module
//!
//! Form validation rules for the back office.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler                                                  │
//! │  └── Type validation (JSON deserialization, enum spelling)              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Lengths, formats, IMEI checksum                                    │
//! │  └── Fields required or forbidden depending on phone condition          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── UNIQUE (imei, internal_code, brand name, brand+model name)         │
//! │  └── Foreign keys                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conditional Phone Fields
//! ```text
//! condition      battery     acquired_from   acquisition_type
//! ───────────    ────────    ─────────────   ────────────────
//! new            optional    forbidden       none | wholesale
//! used           required    iff trade_in    any
//! refurbished    required    iff trade_in    any
//! trade_in       required    required        trade_in
//! ```

use crate::error::ValidationError;
use crate::imei::{is_valid_imei, IMEI_LENGTH};
use crate::types::{
    AcquisitionType, NewBrand, NewCustomer, NewPhoneModel, NewUser, PhoneCondition, PhoneDraft,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const MAX_BRAND_NAME: usize = 50;
pub const MAX_MODEL_NAME: usize = 100;
pub const MAX_CUSTOMER_NAME: usize = 100;
pub const MAX_INTERNAL_CODE: usize = 30;
pub const MAX_STORAGE_CAPACITY: usize = 10;
pub const MAX_COLOR: usize = 30;
pub const MAX_CONTACT_PHONE: usize = 20;
pub const MAX_DNI: usize = 20;
pub const MAX_PERSON_NAME: usize = 30;
pub const MIN_PASSWORD: usize = 8;
pub const MAX_COMMENT: usize = 2000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required text field and its maximum length (in characters).
///
/// ## Example
/// ```rust
/// use celltrack_core::validation::validate_required_text;
///
/// assert!(validate_required_text("name", "Samsung", 50).is_ok());
/// assert!(validate_required_text("name", "   ", 50).is_err());
/// ```
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    validate_max_len(field, value, max)
}

/// Validates an optional text field's maximum length.
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) => validate_max_len(field, v.trim(), max),
        None => Ok(()),
    }
}

fn validate_max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates an IMEI: 15 digits with a valid Luhn check digit.
///
/// ## Example
/// ```rust
/// use celltrack_core::validation::validate_imei;
///
/// assert!(validate_imei("490154203237518").is_ok());
/// assert!(validate_imei("490154203237519").is_err());
/// ```
pub fn validate_imei(imei: &str) -> ValidationResult<()> {
    let imei = imei.trim();

    if imei.is_empty() {
        return Err(ValidationError::required("imei"));
    }

    if imei.len() != IMEI_LENGTH || !imei.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::invalid_format(
            "imei",
            "must be exactly 15 digits",
        ));
    }

    if !is_valid_imei(imei) {
        return Err(ValidationError::invalid_format(
            "imei",
            "check digit does not match",
        ));
    }

    Ok(())
}

/// Loose email check: one `@`, something before it, a dot in the domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::invalid_format(
            "email",
            "must be a valid email address",
        ));
    }
    Ok(())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a UUID string (phone and sale ids).
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required("id"));
    }

    uuid::Uuid::parse_str(id.trim())
        .map_err(|_| ValidationError::invalid_format("id", "must be a valid UUID"))?;

    Ok(())
}

/// Validates a staff username: 3-150 characters of letters, digits and `@.+-_`.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::required("username"));
    }
    if username.chars().count() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    validate_max_len("username", username, 150)?;

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        return Err(ValidationError::invalid_format(
            "username",
            "may contain only letters, numbers and @/./+/-/_",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD,
        });
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid_format(
            "password",
            "cannot be entirely numeric",
        ));
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in cents. Zero is allowed (giveaways, warranty swaps).
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

pub fn validate_battery(percentage: i64) -> ValidationResult<()> {
    if !(0..=100).contains(&percentage) {
        return Err(ValidationError::OutOfRange {
            field: "battery_percentage".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

// =============================================================================
// Form Validators
// =============================================================================

pub fn validate_brand(brand: &NewBrand) -> ValidationResult<()> {
    validate_required_text("name", &brand.name, MAX_BRAND_NAME)
}

pub fn validate_phone_model(model: &NewPhoneModel) -> ValidationResult<()> {
    validate_required_text("name", &model.name, MAX_MODEL_NAME)?;
    validate_price_cents("base_price_cents", model.base_price_cents)
}

pub fn validate_customer(customer: &NewCustomer) -> ValidationResult<()> {
    validate_required_text("name", &customer.name, MAX_CUSTOMER_NAME)?;
    if let Some(email) = non_blank(customer.email.as_deref()) {
        validate_email(email)?;
    }
    validate_optional_text("phone", customer.phone.as_deref(), MAX_CONTACT_PHONE)?;
    validate_optional_text("dni", customer.dni.as_deref(), MAX_DNI)
}

/// Validates a staff registration form.
pub fn validate_new_user(user: &NewUser) -> ValidationResult<()> {
    validate_username(&user.username)?;
    validate_password(&user.password)?;

    match non_blank(user.email.as_deref()) {
        Some(email) => validate_email(email)?,
        None => return Err(ValidationError::required("email")),
    }
    validate_required_text(
        "first_name",
        user.first_name.as_deref().unwrap_or_default(),
        MAX_PERSON_NAME,
    )?;
    validate_required_text(
        "last_name",
        user.last_name.as_deref().unwrap_or_default(),
        MAX_PERSON_NAME,
    )?;
    validate_optional_text("phone", user.phone.as_deref(), MAX_CONTACT_PHONE)
}

/// Validates the phone form, including the fields that depend on condition.
///
/// The price may be omitted here: callers fill it in from the model's base
/// price before saving.
///
/// ## Example
/// ```rust
/// use celltrack_core::types::{PhoneCondition, PhoneDraft};
/// use celltrack_core::validation::validate_phone_draft;
///
/// let mut draft = PhoneDraft {
///     model_id: 1,
///     imei: "490154203237518".to_string(),
///     condition: PhoneCondition::Used,
///     ..Default::default()
/// };
/// // Used phones need a battery reading.
/// assert!(validate_phone_draft(&draft).is_err());
///
/// draft.battery_percentage = Some(87);
/// assert!(validate_phone_draft(&draft).is_ok());
/// ```
pub fn validate_phone_draft(draft: &PhoneDraft) -> ValidationResult<()> {
    validate_imei(&draft.imei)?;
    validate_optional_text(
        "internal_code",
        draft.internal_code.as_deref(),
        MAX_INTERNAL_CODE,
    )?;
    validate_optional_text(
        "storage_capacity",
        draft.storage_capacity.as_deref(),
        MAX_STORAGE_CAPACITY,
    )?;
    validate_optional_text("color", draft.color.as_deref(), MAX_COLOR)?;

    if let Some(price) = draft.price_cents {
        validate_price_cents("price_cents", price)?;
    }

    match draft.battery_percentage {
        Some(battery) => validate_battery(battery)?,
        None if draft.condition.requires_battery() => {
            return Err(ValidationError::required("battery_percentage"));
        }
        None => {}
    }

    let is_trade_in_acquisition = draft.acquisition_type == AcquisitionType::TradeIn;

    match draft.condition {
        PhoneCondition::New => {
            if draft.acquired_from.is_some() {
                return Err(ValidationError::NotAllowed {
                    field: "acquired_from".to_string(),
                    context: "for new phones".to_string(),
                });
            }
            if is_trade_in_acquisition {
                return Err(ValidationError::NotAllowed {
                    field: "acquisition_type".to_string(),
                    context: "as trade_in for new phones".to_string(),
                });
            }
        }
        PhoneCondition::TradeIn => {
            if draft.acquired_from.is_none() {
                return Err(ValidationError::required("acquired_from"));
            }
            if !is_trade_in_acquisition {
                return Err(ValidationError::NotOneOf {
                    field: "acquisition_type".to_string(),
                    allowed: vec![AcquisitionType::TradeIn.to_string()],
                });
            }
        }
        PhoneCondition::Used | PhoneCondition::Refurbished => {}
    }

    // The customer link only makes sense for trade-in acquisitions.
    match (is_trade_in_acquisition, draft.acquired_from.is_some()) {
        (true, false) => Err(ValidationError::required("acquired_from")),
        (false, true) => Err(ValidationError::NotAllowed {
            field: "acquired_from".to_string(),
            context: "unless acquisition_type is trade_in".to_string(),
        }),
        _ => Ok(()),
    }
}

pub fn validate_comment(comment: &str) -> ValidationResult<()> {
    validate_required_text("comment", comment, MAX_COMMENT)
}

/// Treats empty or whitespace-only strings as absent.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================
