//! Payables domain types.

use chrono::{DateTime, NaiveDate, Utc};
use girder_shared::types::{
    AccountId, AllocationId, CompanyId, LedgerLineId, UserId, VendorId, VoucherId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    /// Vendor ID.
    pub id: VendorId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Display name.
    pub name: String,
    /// Liability account the vendor's bills are credited to.
    pub payable_account_id: AccountId,
    /// Whether the vendor can be used on new documents.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a vendor.
#[derive(Debug, Clone)]
pub struct NewVendor {
    /// Display name.
    pub name: String,
    /// Payable (liability) account.
    pub payable_account_id: AccountId,
}

/// Part of a payment settled against one vendor open item. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorAllocation {
    /// Allocation ID.
    pub id: AllocationId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Vendor paid.
    pub vendor_id: VendorId,
    /// The payment voucher.
    pub payment_voucher_id: VoucherId,
    /// The credit line being settled.
    pub source_line_id: LedgerLineId,
    /// Amount settled.
    pub amount: Decimal,
    /// Recorder.
    pub created_by: UserId,
    /// Recording timestamp.
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// The credit line to settle.
    pub source_line_id: LedgerLineId,
    /// Amount to settle.
    pub amount: Decimal,
}

impl AllocationRequest {
    /// Settle `amount` of `source_line_id`.
    #[must_use]
    pub fn new(source_line_id: LedgerLineId, amount: Decimal) -> Self {
        Self {
            source_line_id,
            amount,
        }
    }
}

/// A posted credit to a vendor's payable account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayableLine {
    /// The ledger line.
    pub line_id: LedgerLineId,
    /// Its voucher.
    pub voucher_id: VoucherId,
    /// Voucher number.
    pub voucher_no: String,
    /// Voucher date.
    pub voucher_date: NaiveDate,
    /// Zero-based position within the voucher.
    pub position: u32,
    /// Credit amount.
    pub amount: Decimal,
}

/// A payable line with money still owed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenItem {
    /// The ledger line.
    pub line_id: LedgerLineId,
    /// Its voucher.
    pub voucher_id: VoucherId,
    /// Voucher number.
    pub voucher_no: String,
    /// Voucher date.
    pub voucher_date: NaiveDate,
    /// Credit amount.
    pub original_amount: Decimal,
    /// Settled by live allocations.
    pub allocated: Decimal,
    /// Still owed.
    pub outstanding: Decimal,
}
