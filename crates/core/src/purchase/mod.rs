//! Purchases and their bridge into stock.

pub mod bridge;
pub mod types;

pub use bridge::{PlannedReceipt, PlannedReceiptReversal, PurchaseBridge};
pub use types::{PurchaseLine, PurchaseLineInput, PurchaseLineKind};
