//! # Engine Error Taxonomy
//!
//! The errors operations return. Callers can rely on the variant to pick
//! a response: `Validation` and `InvalidTransition` are the caller's
//! fault, `NotFound` is a 404-shaped miss, `Storage` is ours.

use thiserror::Error;

use reparo_core::{InvalidTransition, ValidationError};
use reparo_db::DbError;

/// Errors produced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input or invariant validation failed (includes insufficient stock).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A service status change the state machine rejects.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    /// The entity an operation targets does not exist for this tenant.
    ///
    /// A wrong-owner access surfaces as this, not as a permission error:
    /// other tenants' data does not exist as far as a caller can tell.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The storage layer failed.
    #[error("storage error: {0}")]
    Storage(DbError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Storage misses become `NotFound`; everything else is `Storage`.
///
/// Repositories report zero-rows-affected and failed lookups as
/// `DbError::NotFound`, which is a caller-facing condition rather than an
/// infrastructure failure, so it gets its own variant here.
impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            other => EngineError::Storage(other),
        }
    }
}

/// Raw sqlx errors reach orchestrators at the commit boundary
/// (`tx.commit().await?`); they take the same classification path as any
/// other storage failure.
impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::from(DbError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_mapping() {
        let err: EngineError = DbError::not_found("Sale", "abc").into();
        assert!(matches!(err, EngineError::NotFound { .. }));
        assert_eq!(err.to_string(), "Sale not found: abc");
    }

    #[test]
    fn test_other_db_errors_are_storage() {
        let err: EngineError = DbError::QueryFailed("boom".into()).into();
        assert!(matches!(err, EngineError::Storage(_)));
    }

    #[test]
    fn test_sqlx_errors_convert_at_commit_boundary() {
        // Exercises the same `?` conversion every tx.commit() site relies on.
        fn commit_shaped(result: Result<(), sqlx::Error>) -> EngineResult<()> {
            result?;
            Ok(())
        }

        let err = commit_shaped(Err(sqlx::Error::PoolClosed)).unwrap_err();
        assert!(matches!(err, EngineError::Storage(_)));
    }

    #[test]
    fn test_validation_passthrough() {
        let err: EngineError = ValidationError::EmptyLineItems.into();
        assert_eq!(err.to_string(), "at least one line item is required");
    }
}
