//! Engine-wide error taxonomy.
//!
//! Each module keeps its own error enum. [`EngineError`] wraps them for the
//! engine's public operations and classifies them into an [`ErrorKind`] that
//! drives status codes and retry decisions.

use girder_shared::AppError;
use thiserror::Error;

use crate::inventory::StockError;
use crate::ledger::LedgerError;
use crate::numbering::NumberingError;
use crate::payables::AllocationError;
use crate::store::StoreError;
use crate::workflow::WorkflowError;

/// Error category shared by all engine errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input or a broken business precondition.
    Validation,
    /// Debits and credits do not match.
    UnbalancedVoucher,
    /// The action is not allowed in the entity's current state.
    StateTransition,
    /// A stock issue exceeds the on-hand quantity.
    InsufficientStock,
    /// An allocation exceeds what is owed or paid.
    AllocationExceedsOutstanding,
    /// A voucher number could not be allocated.
    NumberingConflict,
    /// The actor's role does not allow the action.
    PermissionDenied,
    /// The entity does not exist in the actor's company.
    NotFound,
    /// Infrastructure failure in the store.
    Store,
}

impl ErrorKind {
    /// Returns the HTTP status code for this category.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::PermissionDenied => 403,
            Self::NotFound => 404,
            Self::NumberingConflict | Self::StateTransition => 409,
            Self::UnbalancedVoucher
            | Self::InsufficientStock
            | Self::AllocationExceedsOutstanding => 422,
            Self::Store => 500,
        }
    }
}

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Ledger validation or lookup failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Workflow or permission failure.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Voucher numbering failure.
    #[error(transparent)]
    Numbering(#[from] NumberingError),

    /// Stock costing failure.
    #[error(transparent)]
    Stock(#[from] StockError),

    /// Payment allocation failure.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Ledger(e) => e.kind(),
            Self::Workflow(e) => e.kind(),
            Self::Numbering(e) => e.kind(),
            Self::Stock(e) => e.kind(),
            Self::Allocation(e) => e.kind(),
            Self::Store(e) => e.kind(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::Workflow(e) => e.error_code(),
            Self::Numbering(e) => e.error_code(),
            Self::Stock(e) => e.error_code(),
            Self::Allocation(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Store(e) if e.is_retryable() => 409,
            _ => self.kind().status_code(),
        }
    }

    /// Returns true if the caller may retry the operation unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Numbering(_) => true,
            Self::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::PermissionDenied => Self::Forbidden(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::NumberingConflict => Self::Conflict(message),
            ErrorKind::UnbalancedVoucher
            | ErrorKind::StateTransition
            | ErrorKind::InsufficientStock
            | ErrorKind::AllocationExceedsOutstanding => Self::BusinessRule(message),
            ErrorKind::Store if err.is_retryable() => Self::Conflict(message),
            ErrorKind::Store => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Capability, Resource, Role};
    use girder_shared::types::StockItemId;
    use rust_decimal_macros::dec;

    #[test]
    fn test_kind_and_status() {
        let err: EngineError = LedgerError::Unbalanced {
            debit: dec!(1),
            credit: dec!(2),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::UnbalancedVoucher);
        assert_eq!(err.status_code(), 422);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_numbering_conflict_is_retryable() {
        let err: EngineError = NumberingError::Exhausted {
            attempts: 3,
            voucher_no: "V-202601-00003".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NumberingConflict);
        assert_eq!(err.status_code(), 409);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_lock_timeout_is_retryable_conflict() {
        let err: EngineError = StoreError::LockTimeout.into();
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), 409);
        let app: AppError = err.into();
        assert!(matches!(app, AppError::Conflict(_)));
        assert!(app.is_retryable());
    }

    #[test]
    fn test_backend_failure_maps_to_database() {
        let err: EngineError = StoreError::Backend("connection refused".to_string()).into();
        assert_eq!(err.status_code(), 500);
        let app: AppError = err.into();
        assert!(matches!(app, AppError::Database(_)));
    }

    #[test]
    fn test_app_error_mapping() {
        let denied: AppError = EngineError::from(WorkflowError::PermissionDenied {
            role: Role::Viewer,
            resource: Resource::Stock,
            capability: Capability::Write,
        })
        .into();
        assert_eq!(denied.status_code(), 403);

        let short: AppError = EngineError::from(StockError::InsufficientStock {
            item: StockItemId::new(),
            requested: dec!(2),
            on_hand: dec!(1),
        })
        .into();
        assert!(matches!(short, AppError::BusinessRule(_)));

        let invalid: AppError = EngineError::from(StockError::ZeroQuantity).into();
        assert_eq!(invalid.status_code(), 400);
    }
}
