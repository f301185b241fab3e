//! Ledger error types for validation and document errors.

use girder_shared::types::{AccountId, VendorId, VoucherId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::workflow::VoucherStatus;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Balance Errors ==========
    /// A voucher needs at least a debit line and a credit line.
    #[error("Voucher must have at least 2 lines, got {count}")]
    InsufficientLines {
        /// Number of lines supplied.
        count: usize,
    },

    /// Debits and credits differ by more than the tolerance.
    #[error("Voucher is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit.
        debit: Decimal,
        /// Total credit.
        credit: Decimal,
    },

    /// A line carries a negative amount.
    #[error("Line {line} has a negative amount")]
    NegativeAmount {
        /// Zero-based line index.
        line: usize,
    },

    /// A line carries both a debit and a credit.
    #[error("Line {line} has both a debit and a credit")]
    DebitAndCredit {
        /// Zero-based line index.
        line: usize,
    },

    /// A line carries neither a debit nor a credit.
    #[error("Line {line} has neither a debit nor a credit")]
    EmptyLine {
        /// Zero-based line index.
        line: usize,
    },

    /// A line amount has more than 4 decimal places.
    #[error("Line {line} amount {value} has more than 4 decimal places")]
    ExcessPrecision {
        /// Zero-based line index.
        line: usize,
        /// The offending amount.
        value: Decimal,
    },

    /// A line amount is too large to store.
    #[error("Line {line} amount {value} is out of range")]
    AmountOutOfRange {
        /// Zero-based line index.
        line: usize,
        /// The offending amount.
        value: Decimal,
    },

    /// Voucher totals overflowed.
    #[error("Voucher totals are out of range")]
    AmountOverflow,

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Account is a grouping header.
    #[error("Account {0} is a grouping header and cannot receive postings")]
    AccountNotPostable(AccountId),

    /// Account is referenced by a posted line.
    #[error("Account {0} is referenced by posted lines and cannot be changed")]
    AccountImmutable(AccountId),

    /// Account code already used in the company.
    #[error("Account code {0} already exists")]
    DuplicateAccountCode(String),

    /// Vendor payable account must be a liability.
    #[error("Account {0} is not a liability account")]
    NotPayableAccount(AccountId),

    // ========== Document Errors ==========
    /// Voucher not found.
    #[error("Voucher {0} not found")]
    VoucherNotFound(VoucherId),

    /// Vendor not found.
    #[error("Vendor {0} not found")]
    VendorNotFound(VendorId),

    /// Vendor is inactive.
    #[error("Vendor {0} is inactive")]
    VendorInactive(VendorId),

    /// Voucher content can only change while in draft.
    #[error("Voucher in status {status} cannot be edited")]
    NotEditable {
        /// Current status.
        status: VoucherStatus,
    },

    /// Purchase lines on a non-purchase voucher.
    #[error("Purchase lines are only allowed on purchase vouchers")]
    UnexpectedPurchaseLines,

    /// Invalid purchase line.
    #[error("Purchase line {line}: {reason}")]
    InvalidPurchaseLine {
        /// Zero-based line index.
        line: usize,
        /// Why the line was rejected.
        reason: String,
    },
}

impl LedgerError {
    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unbalanced { .. } => ErrorKind::UnbalancedVoucher,
            Self::AccountNotFound(_) | Self::VoucherNotFound(_) | Self::VendorNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::NotEditable { .. } => ErrorKind::StateTransition,
            _ => ErrorKind::Validation,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines { .. } => "INSUFFICIENT_LINES",
            Self::Unbalanced { .. } => "UNBALANCED_VOUCHER",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::DebitAndCredit { .. } => "DEBIT_AND_CREDIT",
            Self::EmptyLine { .. } => "EMPTY_LINE",
            Self::ExcessPrecision { .. } => "EXCESS_PRECISION",
            Self::AmountOutOfRange { .. } => "AMOUNT_OUT_OF_RANGE",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::AccountNotPostable(_) => "ACCOUNT_NOT_POSTABLE",
            Self::AccountImmutable(_) => "ACCOUNT_IMMUTABLE",
            Self::DuplicateAccountCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::NotPayableAccount(_) => "NOT_PAYABLE_ACCOUNT",
            Self::VoucherNotFound(_) => "VOUCHER_NOT_FOUND",
            Self::VendorNotFound(_) => "VENDOR_NOT_FOUND",
            Self::VendorInactive(_) => "VENDOR_INACTIVE",
            Self::NotEditable { .. } => "VOUCHER_NOT_EDITABLE",
            Self::UnexpectedPurchaseLines => "UNEXPECTED_PURCHASE_LINES",
            Self::InvalidPurchaseLine { .. } => "INVALID_PURCHASE_LINE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbalanced_error() {
        let err = LedgerError::Unbalanced {
            debit: Decimal::new(10000, 2),
            credit: Decimal::new(9000, 2),
        };
        assert_eq!(err.kind(), ErrorKind::UnbalancedVoucher);
        assert_eq!(err.error_code(), "UNBALANCED_VOUCHER");
        assert!(err.to_string().contains("100.00"));
        assert!(err.to_string().contains("90.00"));
    }

    #[test]
    fn test_line_shape_errors_are_validation() {
        for err in [
            LedgerError::InsufficientLines { count: 1 },
            LedgerError::NegativeAmount { line: 0 },
            LedgerError::DebitAndCredit { line: 1 },
            LedgerError::EmptyLine { line: 2 },
        ] {
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn test_not_found_errors() {
        assert_eq!(
            LedgerError::VoucherNotFound(VoucherId::new()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            LedgerError::AccountNotFound(AccountId::new()).error_code(),
            "ACCOUNT_NOT_FOUND"
        );
    }

    #[test]
    fn test_not_editable_is_state_error() {
        let err = LedgerError::NotEditable {
            status: VoucherStatus::Posted,
        };
        assert_eq!(err.kind(), ErrorKind::StateTransition);
        assert!(err.to_string().contains("posted"));
    }
}
