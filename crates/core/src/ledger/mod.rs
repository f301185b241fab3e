//! Double-entry bookkeeping logic.
//!
//! This module implements the ledger side of the engine:
//! - Account, voucher and ledger line types
//! - The balance validator (debit/credit exclusivity and balance)
//! - Error types for ledger operations

pub mod error;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use error::LedgerError;
pub use types::{
    Account, AccountType, AccountUpdate, DraftLines, LedgerLine, LineAmounts, LineInput,
    LineTags, NewAccount, NewVoucher, PaymentMethod, Voucher, VoucherDocument, VoucherTotals,
    VoucherType,
};
pub use validation::{validate_balance, validate_line, validate_line_shapes};
