//! Field validation utilities shared by configuration and tool arguments.

use chrono::{NaiveDate, NaiveTime};

/// Maximum length of an identifier-like argument (hotel codes, reservation ids).
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Validate that a string is not empty.
pub fn validate_non_empty(s: &str, field: &str) -> crate::types::Result<()> {
    if s.is_empty() {
        return Err(crate::types::Error::invalid_argument(format!(
            "{} cannot be empty",
            field
        )));
    }
    Ok(())
}

/// Validate that a value is positive.
pub fn validate_positive(n: u32, field: &str) -> crate::types::Result<()> {
    if n == 0 {
        return Err(crate::types::Error::invalid_argument(format!(
            "{} must be positive",
            field
        )));
    }
    Ok(())
}

/// Validate an identifier: non-empty, no whitespace or `/`, bounded length.
pub fn validate_identifier(s: &str, field: &str) -> crate::types::Result<()> {
    validate_non_empty(s, field)?;
    if s.len() > MAX_IDENTIFIER_LEN {
        return Err(crate::types::Error::invalid_argument(format!(
            "{} cannot exceed {} characters",
            field, MAX_IDENTIFIER_LEN
        )));
    }
    if s.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(crate::types::Error::invalid_argument(format!(
            "{} must not contain whitespace or '/'",
            field
        )));
    }
    Ok(())
}

/// Validate a calendar date in `YYYY-MM-DD` form.
pub fn validate_iso_date(s: &str, field: &str) -> crate::types::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        crate::types::Error::invalid_argument(format!(
            "{} must be a date in YYYY-MM-DD format, got '{}'",
            field, s
        ))
    })
}

/// Validate a 24-hour clock time in `HH:MM` form.
pub fn validate_clock_time(s: &str, field: &str) -> crate::types::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| {
        crate::types::Error::invalid_argument(format!(
            "{} must be a time in HH:MM format, got '{}'",
            field, s
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_rules() {
        assert!(validate_identifier("SAND01", "hotelId").is_ok());
        assert!(validate_identifier("", "hotelId").is_err());
        assert!(validate_identifier("a b", "hotelId").is_err());
        assert!(validate_identifier("a/b", "hotelId").is_err());
        assert!(validate_identifier(&"x".repeat(65), "hotelId").is_err());
    }

    #[test]
    fn test_iso_date() {
        assert!(validate_iso_date("2025-02-28", "arrivalDate").is_ok());
        assert!(validate_iso_date("2025-02-30", "arrivalDate").is_err());
        assert!(validate_iso_date("02/28/2025", "arrivalDate").is_err());
    }

    #[test]
    fn test_clock_time() {
        assert!(validate_clock_time("19:30", "reservationTime").is_ok());
        assert!(validate_clock_time("00:00", "reservationTime").is_ok());
        assert!(validate_clock_time("24:10", "reservationTime").is_err());
        assert!(validate_clock_time("7pm", "reservationTime").is_err());
    }
}
