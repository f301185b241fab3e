//! Core business logic for Girder.
//!
//! This crate contains the ledger and inventory valuation engine with ZERO web
//! or database dependencies. Persistence is reached through the ports in
//! [`store`]; the PostgreSQL adapter lives in `girder-db`.
//!
//! # Modules
//!
//! - `ledger` - Accounts, vouchers, ledger lines and the balance validator
//! - `workflow` - Voucher lifecycle, posting policy, reversal and roles
//! - `numbering` - Per-period voucher numbers
//! - `inventory` - Weighted-average stock costing
//! - `purchase` - Purchase lines and their stock receipts
//! - `payables` - Vendor open items and payment allocation
//! - `audit` - Audit records and sinks
//! - `store` - Persistence ports and the in-memory store
//! - `engine` - Transactional orchestration of all of the above

pub mod audit;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod numbering;
pub mod payables;
pub mod purchase;
pub mod store;
pub mod workflow;

pub use engine::{EngineResult, EngineSettings, LedgerEngine};
pub use error::{EngineError, ErrorKind};
