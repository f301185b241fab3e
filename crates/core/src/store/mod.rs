//! Persistence ports.
//!
//! The engine never talks to a database directly. It opens a [`UnitOfWork`]
//! through a [`Store`], reads and locks rows through the repository traits,
//! and commits or rolls back. Every unit of work is scoped to one company.
//!
//! Implementations must provide:
//! - atomic commit of everything written through one unit of work
//! - row locks held until commit for the `lock_*` methods
//! - unique constraints on voucher numbers and account codes, reported as
//!   [`StoreError::UniqueViolation`] with the constraint names below

pub mod memory;

use async_trait::async_trait;
use girder_shared::types::{
    AccountId, CompanyId, StockItemId, StockMovementId, VendorId, VoucherId,
};
use thiserror::Error;

use crate::error::ErrorKind;
use crate::inventory::{StockBalance, StockItem, StockMovement};
use crate::ledger::{Account, LedgerLine, Voucher};
use crate::numbering::PeriodKey;
use crate::payables::{PayableLine, Vendor, VendorAllocation};
use crate::purchase::PurchaseLine;

pub use memory::MemoryStore;

/// Unique constraint on `(company_id, voucher_no)`.
pub const VOUCHER_NO_CONSTRAINT: &str = "vouchers_company_voucher_no_key";

/// Unique constraint on `(company_id, code)` of accounts.
pub const ACCOUNT_CODE_CONSTRAINT: &str = "accounts_company_code_key";

/// Errors reported by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation {
        /// Constraint name.
        constraint: String,
    },

    /// Waiting for a row lock timed out.
    #[error("Timed out waiting for a row lock")]
    LockTimeout,

    /// The database aborted the transaction to keep it serializable.
    #[error("Transaction could not be serialized")]
    SerializationFailure,

    /// Any other backend failure.
    #[error("Store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns true if the violated constraint is `constraint`.
    #[must_use]
    pub fn is_unique_violation_of(&self, constraint: &str) -> bool {
        matches!(self, Self::UniqueViolation { constraint: c } if c == constraint)
    }

    /// Returns true if repeating the unit of work may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout | Self::SerializationFailure)
    }

    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Store
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UniqueViolation { .. } => "UNIQUE_VIOLATION",
            Self::LockTimeout => "LOCK_TIMEOUT",
            Self::SerializationFailure => "SERIALIZATION_FAILURE",
            Self::Backend(_) => "STORE_ERROR",
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Accounts, vouchers, lines and numbering counters.
#[async_trait]
pub trait LedgerRepository: Send {
    /// Fetch an account.
    async fn find_account(&mut self, id: AccountId) -> StoreResult<Option<Account>>;

    /// Insert an account.
    async fn insert_account(&mut self, account: &Account) -> StoreResult<()>;

    /// Overwrite an account.
    async fn update_account(&mut self, account: &Account) -> StoreResult<()>;

    /// Returns true if a posted or reversed voucher has a line on the account.
    async fn account_has_posted_lines(&mut self, id: AccountId) -> StoreResult<bool>;

    /// Advance the voucher counter of `period` past `floor` and return the new value.
    ///
    /// The counter row stays locked until the unit of work ends.
    async fn next_voucher_sequence(&mut self, period: PeriodKey, floor: u32) -> StoreResult<u32>;

    /// Insert a voucher with its lines.
    async fn insert_voucher(
        &mut self,
        voucher: &Voucher,
        lines: &[LedgerLine],
        purchase_lines: &[PurchaseLine],
    ) -> StoreResult<()>;

    /// Fetch a voucher without locking it.
    async fn find_voucher(&mut self, id: VoucherId) -> StoreResult<Option<Voucher>>;

    /// Fetch and row-lock a voucher.
    async fn lock_voucher(&mut self, id: VoucherId) -> StoreResult<Option<Voucher>>;

    /// Overwrite a voucher header.
    async fn update_voucher(&mut self, voucher: &Voucher) -> StoreResult<()>;

    /// Ledger lines of a voucher in position order.
    async fn voucher_lines(&mut self, id: VoucherId) -> StoreResult<Vec<LedgerLine>>;

    /// Purchase lines of a voucher in position order.
    async fn purchase_lines(&mut self, id: VoucherId) -> StoreResult<Vec<PurchaseLine>>;

    /// Replace all lines of a voucher.
    async fn replace_lines(
        &mut self,
        id: VoucherId,
        lines: &[LedgerLine],
        purchase_lines: &[PurchaseLine],
    ) -> StoreResult<()>;
}

/// Stock items, balances and movements.
#[async_trait]
pub trait StockRepository: Send {
    /// Fetch a stock item.
    async fn find_stock_item(&mut self, id: StockItemId) -> StoreResult<Option<StockItem>>;

    /// Insert a stock item.
    async fn insert_stock_item(&mut self, item: &StockItem) -> StoreResult<()>;

    /// All stock items of the company.
    async fn list_stock_items(&mut self) -> StoreResult<Vec<StockItem>>;

    /// Fetch a balance without locking it.
    async fn find_stock_balance(&mut self, item: StockItemId) -> StoreResult<Option<StockBalance>>;

    /// Row-lock the balance of `item`, creating an empty row first if needed.
    async fn lock_stock_balance(&mut self, item: StockItemId) -> StoreResult<StockBalance>;

    /// Write a balance row.
    async fn save_stock_balance(&mut self, balance: &StockBalance) -> StoreResult<()>;

    /// Append a movement.
    async fn insert_movement(&mut self, movement: &StockMovement) -> StoreResult<()>;

    /// Fetch a movement.
    async fn find_movement(&mut self, id: StockMovementId) -> StoreResult<Option<StockMovement>>;

    /// The movement compensating `id`, if any.
    async fn find_reversal_of(&mut self, id: StockMovementId) -> StoreResult<Option<StockMovement>>;

    /// Movements linked to a voucher.
    async fn movements_for_voucher(&mut self, id: VoucherId) -> StoreResult<Vec<StockMovement>>;

    /// Movements of an item in recording order.
    async fn movements_for_item(&mut self, item: StockItemId) -> StoreResult<Vec<StockMovement>>;
}

/// Vendors and payment allocations.
#[async_trait]
pub trait PayablesRepository: Send {
    /// Fetch a vendor.
    async fn find_vendor(&mut self, id: VendorId) -> StoreResult<Option<Vendor>>;

    /// Insert a vendor.
    async fn insert_vendor(&mut self, vendor: &Vendor) -> StoreResult<()>;

    /// Fetch and row-lock a vendor. Serializes allocation checks per vendor.
    async fn lock_vendor(&mut self, id: VendorId) -> StoreResult<Option<Vendor>>;

    /// Posted credits to the vendor's payable account tagged with the vendor.
    async fn posted_payable_lines(&mut self, vendor: &Vendor) -> StoreResult<Vec<PayableLine>>;

    /// Allocations to the vendor whose payment voucher is not reversed.
    async fn live_allocations(&mut self, vendor: VendorId) -> StoreResult<Vec<VendorAllocation>>;

    /// Allocations made by a payment voucher.
    async fn allocations_for_payment(
        &mut self,
        payment: VoucherId,
    ) -> StoreResult<Vec<VendorAllocation>>;

    /// Live allocations settling lines of `voucher`.
    async fn live_allocations_against(
        &mut self,
        voucher: VoucherId,
    ) -> StoreResult<Vec<VendorAllocation>>;

    /// Insert an allocation.
    async fn insert_allocation(&mut self, allocation: &VendorAllocation) -> StoreResult<()>;
}

/// One atomic, company-scoped unit of work.
#[async_trait]
pub trait UnitOfWork: LedgerRepository + StockRepository + PayablesRepository + Send {
    /// The company every read and write is scoped to.
    fn company_id(&self) -> CompanyId;

    /// Make every write visible and release all locks.
    async fn commit(self) -> StoreResult<()>;

    /// Discard every write and release all locks.
    async fn rollback(self) -> StoreResult<()>;
}

/// Opens units of work.
#[async_trait]
pub trait Store: Send + Sync {
    /// The unit of work type.
    type Tx: UnitOfWork;

    /// Begin a unit of work scoped to `company_id`.
    async fn begin(&self, company_id: CompanyId) -> StoreResult<Self::Tx>;
}
