//! Application-wide error types.
//!
//! Engine errors are folded into these categories at the caller boundary so
//! that permission failures, validation failures, and retryable conflicts
//! each map to a distinct status.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Error categories exposed to callers of the engine.
#[derive(Debug, Error)]
pub enum AppError {
    /// The actor's role lacks the capability.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Voucher, account, item or vendor missing in the company.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input: unbalanced lines, bad quantities, inactive accounts.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Valid input the current books refuse, such as an over-issue.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Lost a race for a number or a lock. Safe to retry.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP-style status for this category.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::BusinessRule(_) => 422,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller may retry the operation unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
