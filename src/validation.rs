// ✅ Field validation rules for ledger input
//
// Every rule reports the offending field so callers can point at it.

use crate::error::{LedgerError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// `YYYY-MM-DD` shape only. No calendar check: `2024-13-40` passes.
/// ASCII digits on purpose, `\d` would also accept other scripts.
static PURCHASE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("static date pattern"));

pub fn require_non_empty(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(LedgerError::validation(field, "must not be empty"));
    }
    Ok(())
}

pub fn require_positive_amount(field: &'static str, cents: i64) -> Result<()> {
    if cents <= 0 {
        return Err(LedgerError::validation(
            field,
            format!("must be a positive amount of cents, got {}", cents),
        ));
    }
    Ok(())
}

pub fn require_purchase_date(field: &'static str, value: &str) -> Result<()> {
    if !PURCHASE_DATE.is_match(value) {
        return Err(LedgerError::validation(
            field,
            format!("expected YYYY-MM-DD, got {:?}", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert!(require_non_empty("name", "Ana").is_ok());
        assert!(require_non_empty("name", " ").is_ok());
        assert!(require_non_empty("name", "").unwrap_err().is_validation());
    }

    #[test]
    fn test_positive_amount() {
        assert!(require_positive_amount("amount", 1).is_ok());
        assert!(require_positive_amount("amount", 0).is_err());
        assert!(require_positive_amount("amount", -100).is_err());
    }

    #[test]
    fn test_purchase_date_pattern() {
        assert!(require_purchase_date("purchaseDate", "2024-01-01").is_ok());
        // shape only, calendar validity is not checked
        assert!(require_purchase_date("purchaseDate", "2024-13-40").is_ok());

        for bad in ["2024/01/01", "24-01-01", "2024-1-01", "2024-01-01T00:00", "", "invalid-date"] {
            let err = require_purchase_date("purchaseDate", bad).unwrap_err();
            match err {
                LedgerError::Validation { field, .. } => assert_eq!(field, "purchaseDate"),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_purchase_date_rejects_non_ascii_digits() {
        // Arabic-Indic digits
        assert!(require_purchase_date("purchaseDate", "٢٠٢٤-٠١-٠١").is_err());
    }
}
