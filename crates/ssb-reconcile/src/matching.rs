//! The one string comparison every text join goes through.
//!
//! Zone -> Product (designation), ConsumptionRecord -> Product/Zone, reset
//! selection and designation uniqueness all use [`records_match`].

/// Normalized join key: trimmed, lowercased.
pub fn match_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Case-insensitive, whitespace-trimmed equality.
pub fn records_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
