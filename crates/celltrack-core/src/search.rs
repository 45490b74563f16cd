//! # Quick Search
//!
//! The search box accepts whatever the counter has at hand: a typed IMEI, a
//! phone or sale id, a scanned QR label, or free text.
//!
//! ```text
//! "490154203237518"                          → Imei
//! "7f1c5a9e-3b2d-4e8f-9a6b-1c2d3e4f5a6b"     → Uuid
//! "PHONE:<uuid>:<imei>:Samsung:Galaxy S23"   → QrPhone
//! "SALE:<uuid>:Juan:120000.00:20260307"      → QrSale
//! "galaxy negro"                             → Text
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::imei::{is_valid_imei, normalize_imei, IMEI_LENGTH};

/// Classified search input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchQuery {
    /// Fifteen digits. `valid` reports the Luhn check so the UI can warn
    /// about mistyped IMEIs.
    Imei { imei: String, valid: bool },
    Uuid { id: String },
    QrPhone { id: String, imei: Option<String> },
    QrSale { id: String },
    Text { text: String },
}

/// Classifies raw search input.
///
/// ## Example
/// ```rust
/// use celltrack_core::search::{parse_search_query, SearchQuery};
///
/// assert_eq!(
///     parse_search_query("49 015420 323751 8"),
///     SearchQuery::Imei { imei: "490154203237518".to_string(), valid: true }
/// );
/// ```
pub fn parse_search_query(input: &str) -> SearchQuery {
    let input = input.trim();

    if let Some(rest) = input.strip_prefix("PHONE:") {
        let mut parts = rest.split(':');
        if let Some(id) = parts.next().filter(|id| is_uuid(id)) {
            let imei = parts
                .next()
                .filter(|imei| !imei.is_empty())
                .map(str::to_string);
            return SearchQuery::QrPhone {
                id: id.to_string(),
                imei,
            };
        }
    }

    if let Some(rest) = input.strip_prefix("SALE:") {
        if let Some(id) = rest.split(':').next().filter(|id| is_uuid(id)) {
            return SearchQuery::QrSale { id: id.to_string() };
        }
    }

    let digits = normalize_imei(input);
    if digits.len() == IMEI_LENGTH && digits.bytes().all(|b| b.is_ascii_digit()) {
        let valid = is_valid_imei(&digits);
        return SearchQuery::Imei {
            imei: digits,
            valid,
        };
    }

    if is_uuid(input) {
        return SearchQuery::Uuid {
            id: input.to_lowercase(),
        };
    }

    SearchQuery::Text {
        text: input.to_string(),
    }
}

fn is_uuid(s: &str) -> bool {
    uuid::Uuid::parse_str(s).is_ok()
}
