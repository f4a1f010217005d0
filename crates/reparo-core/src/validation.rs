//! # Input Validation
//!
//! Business rule validation as pure functions. Orchestrators call these
//! before opening a transaction, so bad input never costs a rollback.
//!
//! ## Philosophy
//! Validation here covers *shape* (required fields, bounds). The deeper
//! invariants that need database state (stock sufficiency, transition
//! legality) are enforced inside the transaction instead.

use crate::error::{ValidationError, ValidationResult};
use crate::{MAX_LINE_ITEMS, MAX_LINE_QTY};

/// Maximum length for free-text name fields.
pub const MAX_NAME_LEN: usize = 200;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates that a required text field is present and non-blank.
///
/// Whitespace-only values count as missing; callers get back the trimmed
/// value so the same string is what gets stored.
pub fn required_text(field: &str, value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(trimmed.to_string())
}

/// Validates that a monetary amount is non-negative.
pub fn non_negative(field: &str, cents: i64) -> ValidationResult<i64> {
    if cents < 0 {
        return Err(ValidationError::NegativeAmount {
            field: field.to_string(),
        });
    }
    Ok(cents)
}

/// Validates that an amount is strictly positive.
///
/// Used for debt payments and manual ledger entries, where zero is as
/// meaningless as negative.
pub fn positive(field: &str, cents: i64) -> ValidationResult<i64> {
    if cents <= 0 {
        return Err(ValidationError::NegativeAmount {
            field: field.to_string(),
        });
    }
    Ok(cents)
}

/// Validates a line quantity (1..=[`MAX_LINE_QTY`]).
pub fn line_qty(qty: i64) -> ValidationResult<i64> {
    if qty < 1 || qty > MAX_LINE_QTY {
        return Err(ValidationError::InvalidQuantity { qty });
    }
    Ok(qty)
}

/// Validates a line-item collection: non-empty and bounded.
///
/// Applies to sales, purchases and returns alike. An order with no lines
/// has no stock or ledger effect, so accepting one would only create a
/// header that every downstream invariant ignores.
pub fn line_items<T>(items: &[T]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::EmptyLineItems);
    }
    if items.len() > MAX_LINE_ITEMS {
        return Err(ValidationError::TooManyLineItems { max: MAX_LINE_ITEMS });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text_trims() {
        assert_eq!(required_text("name", "  Budi  ").unwrap(), "Budi");
    }

    #[test]
    fn test_required_text_rejects_blank() {
        assert!(required_text("name", "").is_err());
        assert!(required_text("name", "   ").is_err());
    }

    #[test]
    fn test_required_text_rejects_too_long() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            required_text("name", &long),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative("amount", 0).unwrap(), 0);
        assert_eq!(non_negative("amount", 500).unwrap(), 500);
        assert!(non_negative("amount", -1).is_err());
    }

    #[test]
    fn test_positive_rejects_zero() {
        assert!(positive("amount", 0).is_err());
        assert_eq!(positive("amount", 1).unwrap(), 1);
    }

    #[test]
    fn test_line_qty_bounds() {
        assert!(line_qty(0).is_err());
        assert!(line_qty(-3).is_err());
        assert_eq!(line_qty(1).unwrap(), 1);
        assert_eq!(line_qty(MAX_LINE_QTY).unwrap(), MAX_LINE_QTY);
        assert!(line_qty(MAX_LINE_QTY + 1).is_err());
    }

    #[test]
    fn test_line_items_empty_rejected() {
        let empty: Vec<i32> = vec![];
        assert!(matches!(
            line_items(&empty),
            Err(ValidationError::EmptyLineItems)
        ));
        assert!(line_items(&[1, 2, 3]).is_ok());
    }

    #[test]
    fn test_line_items_cap() {
        let many: Vec<i32> = vec![0; MAX_LINE_ITEMS + 1];
        assert!(matches!(
            line_items(&many),
            Err(ValidationError::TooManyLineItems { .. })
        ));
    }
}
