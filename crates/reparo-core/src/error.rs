//! # Error Types
//!
//! Domain-specific error types for reparo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  reparo-core errors (this file)                                     │
//! │  ├── ValidationError   - Input / invariant validation failures      │
//! │  └── InvalidTransition - Rejected service status changes            │
//! │                                                                     │
//! │  reparo-db errors (separate crate)                                  │
//! │  └── DbError           - Storage operation failures                 │
//! │                                                                     │
//! │  reparo-engine errors                                               │
//! │  └── EngineError       - The taxonomy callers see                   │
//! │                                                                     │
//! │  Flow: ValidationError / DbError → EngineError → caller             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item id, quantity, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::types::ServiceStatus;

// =============================================================================
// Validation Error
// =============================================================================

/// Input and invariant validation errors.
///
/// These cover both malformed input (missing fields, empty line-item
/// collections) and domain invariants checked during orchestration
/// (a negative stock delta driving an item below zero).
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// A sale/purchase/return was submitted without any line items.
    #[error("at least one line item is required")]
    EmptyLineItems,

    /// Too many line items in one submission.
    #[error("at most {max} line items are allowed")]
    TooManyLineItems { max: usize },

    /// Line quantity is out of range (must be 1..=MAX_LINE_QTY).
    #[error("quantity {qty} is out of range")]
    InvalidQuantity { qty: i64 },

    /// Value must be non-negative.
    #[error("{field} must not be negative")]
    NegativeAmount { field: String },

    /// A debt payment larger than what is still owed.
    #[error("payment exceeds remaining debt of {remaining} cents")]
    ExcessivePayment { remaining: i64 },

    /// An edit attempted on a service order in a terminal state.
    ///
    /// Completed orders have already produced their settlement entries;
    /// editing them would desynchronize the ledger.
    #[error("service order is {status:?} and can no longer be edited")]
    OrderClosed { status: ServiceStatus },

    /// Applying a negative stock delta would leave the item below zero.
    ///
    /// ## When This Occurs
    /// - Selling or consuming more units than are in stock
    /// - Deleting a purchase whose units were already sold on
    #[error("insufficient stock for item {item}: {available} available, {requested} requested")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },
}

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Invalid Transition
// =============================================================================

/// A service status change that the lifecycle state machine rejects.
///
/// Produced by [`crate::lifecycle`]; surfaced unchanged by the engine.
#[derive(Debug, Error)]
#[error("invalid status transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: ServiceStatus,
    pub to: ServiceStatus,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "customer_name".to_string(),
        };
        assert_eq!(err.to_string(), "customer_name is required");

        let err = ValidationError::InsufficientStock {
            item: "abc".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for item abc: 3 available, 5 requested"
        );
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = InvalidTransition {
            from: ServiceStatus::Completed,
            to: ServiceStatus::Diagnosing,
        };
        assert!(err.to_string().contains("Completed"));
        assert!(err.to_string().contains("Diagnosing"));
    }
}
