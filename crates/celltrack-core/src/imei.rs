//! # IMEI Utilities
//!
//! Every handset is tracked by its 15-digit IMEI. The last digit is a Luhn
//! check digit over the first fourteen.
//!
//! ```text
//! 49 015420 323751 8
//! ├┘ ├────┘ ├────┘ └─ check digit (Luhn)
//! └── TAC ──┘ └── serial number
//!   (8 digits)   (6 digits)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Number of digits in an IMEI.
pub const IMEI_LENGTH: usize = 15;

/// Breakdown of a valid IMEI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ImeiInfo {
    pub imei: String,
    /// Type Allocation Code: identifies manufacturer and model.
    pub tac: String,
    pub serial: String,
    pub check_digit: String,
    pub formatted: String,
}

/// Returns true when `imei` is exactly 15 ASCII digits with a valid Luhn
/// checksum.
///
/// ## Example
/// ```rust
/// use celltrack_core::imei::is_valid_imei;
///
/// assert!(is_valid_imei("490154203237518"));
/// assert!(!is_valid_imei("490154203237519"));
/// ```
pub fn is_valid_imei(imei: &str) -> bool {
    if imei.len() != IMEI_LENGTH || !imei.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    luhn_sum(imei.bytes().map(|b| b - b'0')) % 10 == 0
}

/// Computes the check digit that completes a 14-digit IMEI body.
///
/// Returns `None` if `body` is not 14 ASCII digits.
pub fn luhn_check_digit(body: &str) -> Option<u8> {
    if body.len() != IMEI_LENGTH - 1 || !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Append a zero check digit and see how far the sum is from a multiple of 10.
    let sum = luhn_sum(body.bytes().map(|b| b - b'0').chain(std::iter::once(0)));
    Some(((10 - sum % 10) % 10) as u8)
}

/// Luhn sum over digits in reading order: every second digit counting from
/// the left (index 1, 3, ...) is doubled, and 9 is subtracted if that
/// exceeds 9.
fn luhn_sum(digits: impl Iterator<Item = u8>) -> u32 {
    digits
        .enumerate()
        .map(|(i, d)| {
            let d = d as u32;
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum()
}

/// Formats an IMEI as `AA BBBBBB CCCCCC D`; other lengths pass through.
pub fn format_imei(imei: &str) -> String {
    if imei.len() != IMEI_LENGTH || !imei.is_ascii() {
        return imei.to_string();
    }
    format!(
        "{} {} {} {}",
        &imei[0..2],
        &imei[2..8],
        &imei[8..14],
        &imei[14..]
    )
}

/// Splits a valid IMEI into its parts. Invalid input yields `None`.
pub fn imei_info(imei: &str) -> Option<ImeiInfo> {
    if !is_valid_imei(imei) {
        return None;
    }
    Some(ImeiInfo {
        imei: imei.to_string(),
        tac: imei[0..8].to_string(),
        serial: imei[8..14].to_string(),
        check_digit: imei[14..].to_string(),
        formatted: format_imei(imei),
    })
}

/// Strips the spaces and dashes people type or scanners add.
pub fn normalize_imei(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_valid_imeis() {
        assert!(is_valid_imei("490154203237518"));
        assert!(is_valid_imei("356938035643809"));
        assert!(is_valid_imei("352099001761481"));
    }

    #[test]
    fn test_rejects_bad_checksum_length_and_chars() {
        assert!(!is_valid_imei("490154203237517"));
        assert!(!is_valid_imei("49015420323751"));
        assert!(!is_valid_imei("4901542032375180"));
        assert!(!is_valid_imei("49015420323751A"));
        assert!(!is_valid_imei(""));
    }

    #[test]
    fn test_check_digit_completes_body() {
        assert_eq!(luhn_check_digit("49015420323751"), Some(8));
        assert_eq!(luhn_check_digit("35693803564380"), Some(9));
        assert_eq!(luhn_check_digit("1234"), None);

        let body = "35209900176148";
        let digit = luhn_check_digit(body).unwrap();
        assert!(is_valid_imei(&format!("{body}{digit}")));
    }

    #[test]
    fn test_format_and_info() {
        assert_eq!(format_imei("490154203237518"), "49 015420 323751 8");
        assert_eq!(format_imei("12345"), "12345");

        let info = imei_info("490154203237518").unwrap();
        assert_eq!(info.tac, "49015420");
        assert_eq!(info.serial, "323751");
        assert_eq!(info.check_digit, "8");
        assert!(imei_info("490154203237510").is_none());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_imei("49 015420-323751 8"), "490154203237518");
    }
}
