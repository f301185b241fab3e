//! Allocation error types.

use girder_shared::types::{LedgerLineId, VoucherId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur while allocating payments.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// Allocations must be positive.
    #[error("Allocation against line {0} must be greater than zero")]
    NonPositiveAmount(LedgerLineId),

    /// More than 4 decimal places.
    #[error("Allocation of {amount} against line {line} has more than 4 decimal places")]
    ExcessPrecision {
        /// Line.
        line: LedgerLineId,
        /// Requested amount.
        amount: Decimal,
    },

    /// Too large to store.
    #[error("Allocation of {amount} against line {line} is out of range")]
    AmountOutOfRange {
        /// Line.
        line: LedgerLineId,
        /// Requested amount.
        amount: Decimal,
    },

    /// Allocation totals overflowed.
    #[error("Allocation totals are out of range")]
    AmountOverflow,

    /// The line is not an open payable of the vendor.
    #[error("Line {0} is not an open item of this vendor")]
    NotOpenItem(LedgerLineId),

    /// More than the line still owes.
    #[error("Allocation of {requested} against line {line} exceeds outstanding {outstanding}")]
    ExceedsOutstanding {
        /// Line.
        line: LedgerLineId,
        /// Requested total against the line.
        requested: Decimal,
        /// Outstanding before the request.
        outstanding: Decimal,
    },

    /// More than the payment pays the vendor.
    #[error("Allocated {allocated} exceeds the {paid} paid to the vendor")]
    ExceedsPayment {
        /// Total allocated from the payment.
        allocated: Decimal,
        /// Debit to the vendor's payable account.
        paid: Decimal,
    },

    /// Allocations come from payment vouchers only.
    #[error("Voucher {0} is not a payment voucher")]
    NotPaymentVoucher(VoucherId),

    /// The payment voucher names no vendor.
    #[error("Payment voucher {0} has no vendor")]
    VendorRequired(VoucherId),

    /// The payment voucher was reversed.
    #[error("Payment voucher {0} has been reversed")]
    PaymentReversed(VoucherId),

    /// Payments are still allocated against the voucher's payable lines.
    #[error("Voucher {0} has live payment allocations")]
    LiveAllocations(VoucherId),
}

impl AllocationError {
    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ExceedsOutstanding { .. } | Self::ExceedsPayment { .. } => {
                ErrorKind::AllocationExceedsOutstanding
            }
            Self::PaymentReversed(_) | Self::LiveAllocations(_) => ErrorKind::StateTransition,
            _ => ErrorKind::Validation,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_) => "NON_POSITIVE_ALLOCATION",
            Self::ExcessPrecision { .. } => "EXCESS_PRECISION",
            Self::AmountOutOfRange { .. } => "AMOUNT_OUT_OF_RANGE",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::NotOpenItem(_) => "NOT_OPEN_ITEM",
            Self::ExceedsOutstanding { .. } => "ALLOCATION_EXCEEDS_OUTSTANDING",
            Self::ExceedsPayment { .. } => "ALLOCATION_EXCEEDS_PAYMENT",
            Self::NotPaymentVoucher(_) => "NOT_PAYMENT_VOUCHER",
            Self::VendorRequired(_) => "VENDOR_REQUIRED",
            Self::PaymentReversed(_) => "PAYMENT_REVERSED",
            Self::LiveAllocations(_) => "LIVE_ALLOCATIONS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_exceeds_outstanding_error() {
        let err = AllocationError::ExceedsOutstanding {
            line: LedgerLineId::new(),
            requested: dec!(301),
            outstanding: dec!(300),
        };
        assert_eq!(err.kind(), ErrorKind::AllocationExceedsOutstanding);
        assert_eq!(err.error_code(), "ALLOCATION_EXCEEDS_OUTSTANDING");
        assert!(err.to_string().contains("301"));
    }

    #[test]
    fn test_live_allocations_is_state_error() {
        let err = AllocationError::LiveAllocations(VoucherId::new());
        assert_eq!(err.kind(), ErrorKind::StateTransition);
    }

    #[test]
    fn test_not_open_item_is_validation() {
        assert_eq!(
            AllocationError::NotOpenItem(LedgerLineId::new()).kind(),
            ErrorKind::Validation
        );
    }
}
