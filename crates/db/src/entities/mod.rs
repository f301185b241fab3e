//! `SeaORM` entities for the ledger and inventory schema.
//!
//! Closed enums are stored as lowercase text and parsed back into the domain
//! types by the store.

pub mod accounts;
pub mod audit_log;
pub mod ledger_lines;
pub mod purchase_lines;
pub mod stock_balances;
pub mod stock_items;
pub mod stock_movements;
pub mod vendor_allocations;
pub mod vendors;
pub mod voucher_counters;
pub mod vouchers;

pub mod prelude {
    //! Entity aliases.

    pub use super::accounts::Entity as Accounts;
    pub use super::audit_log::Entity as AuditLog;
    pub use super::ledger_lines::Entity as LedgerLines;
    pub use super::purchase_lines::Entity as PurchaseLines;
    pub use super::stock_balances::Entity as StockBalances;
    pub use super::stock_items::Entity as StockItems;
    pub use super::stock_movements::Entity as StockMovements;
    pub use super::vendor_allocations::Entity as VendorAllocations;
    pub use super::vendors::Entity as Vendors;
    pub use super::voucher_counters::Entity as VoucherCounters;
    pub use super::vouchers::Entity as Vouchers;
}
