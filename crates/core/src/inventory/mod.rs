//! Inventory valuation.
//!
//! Stock items, append-only movements, per-item balances and the
//! weighted-average costing rules that connect them.

pub mod costing;
pub mod error;
pub mod types;

#[cfg(test)]
mod costing_props;

pub use costing::{CostingEngine, TransferLegs};
pub use error::StockError;
pub use types::{
    LowStockItem, MovementKind, MovementOutcome, MovementRequest, MovementTags, MovementType,
    NewStockItem, StockBalance, StockItem, StockMovement, StockPosition, StockReconciliation,
};
