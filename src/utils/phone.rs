// src/utils/phone.rs

use std::sync::LazyLock;

use regex::Regex;

/// Eleven digits with a leading zero, matching the `VARCHAR(11)` phone column.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^0[0-9]{10}$").unwrap());

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// `validator` hook for phone fields.
pub fn validate_phone(phone: &str) -> Result<(), validator::ValidationError> {
    if !is_valid_phone(phone) {
        let mut err = validator::ValidationError::new("invalid_phone");
        err.message = Some("Phone must be 11 digits starting with 0.".into());
        return Err(err);
    }
    Ok(())
}
