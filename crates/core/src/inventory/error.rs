//! Stock error types.

use girder_shared::types::{StockItemId, StockMovementId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::inventory::types::{MovementKind, MovementType};

/// Errors that can occur during stock operations.
#[derive(Debug, Error)]
pub enum StockError {
    // ========== Input Errors ==========
    /// IN, OUT and TRANSFER need a positive quantity.
    #[error("Quantity must be greater than zero")]
    ZeroQuantity,

    /// Quantities are never negative.
    #[error("Quantity cannot be negative: {0}")]
    NegativeQuantity(Decimal),

    /// Unit costs are never negative.
    #[error("Unit cost cannot be negative: {0}")]
    NegativeUnitCost(Decimal),

    /// More fractional digits than the store keeps.
    #[error("{field} {value} has more than {scale} decimal places")]
    ExcessPrecision {
        /// Which input.
        field: &'static str,
        /// The offending value.
        value: Decimal,
        /// Allowed scale.
        scale: u32,
    },

    /// Too large to store.
    #[error("{field} {value} is out of range")]
    OutOfRange {
        /// Which input or result.
        field: &'static str,
        /// The offending value.
        value: Decimal,
    },

    /// Stock value arithmetic overflowed.
    #[error("Stock value is out of range")]
    ValueOverflow,

    /// IN movements must say what the goods cost.
    #[error("Unit cost is required for stock receipts")]
    MissingUnitCost,

    /// Kind does not match direction.
    #[error("Movement kind {kind} cannot be used with {movement_type} movements")]
    KindMismatch {
        /// Requested kind.
        kind: MovementKind,
        /// Requested direction.
        movement_type: MovementType,
    },

    /// ADJUST to the current on-hand quantity changes nothing.
    #[error("Adjustment target {target} equals the current on-hand quantity")]
    NoOpAdjustment {
        /// Requested target.
        target: Decimal,
    },

    /// Transfers need distinct source and destination projects.
    #[error("Transfer needs distinct source and destination projects")]
    InvalidTransferProjects,

    // ========== Balance Errors ==========
    /// Not enough on hand.
    #[error("Insufficient stock for item {item}: requested {requested}, on hand {on_hand}")]
    InsufficientStock {
        /// Item.
        item: StockItemId,
        /// Quantity requested.
        requested: Decimal,
        /// Quantity on hand.
        on_hand: Decimal,
    },

    // ========== Lookup Errors ==========
    /// Stock item not found.
    #[error("Stock item {0} not found")]
    ItemNotFound(StockItemId),

    /// Stock item is inactive.
    #[error("Stock item {0} is inactive")]
    ItemInactive(StockItemId),

    /// Movement not found.
    #[error("Stock movement {0} not found")]
    MovementNotFound(StockMovementId),

    // ========== Reversal Errors ==========
    /// The movement cannot be reversed on its own.
    #[error("Stock movement {id} cannot be reversed: {reason}")]
    NotReversible {
        /// Movement.
        id: StockMovementId,
        /// Why not.
        reason: &'static str,
    },

    /// The movement already has a compensating movement.
    #[error("Stock movement {0} has already been reversed")]
    AlreadyReversed(StockMovementId),
}

impl StockError {
    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            Self::ItemNotFound(_) | Self::MovementNotFound(_) => ErrorKind::NotFound,
            Self::NotReversible { .. } | Self::AlreadyReversed(_) => ErrorKind::StateTransition,
            _ => ErrorKind::Validation,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroQuantity => "ZERO_QUANTITY",
            Self::NegativeQuantity(_) => "NEGATIVE_QUANTITY",
            Self::NegativeUnitCost(_) => "NEGATIVE_UNIT_COST",
            Self::ExcessPrecision { .. } => "EXCESS_PRECISION",
            Self::OutOfRange { .. } => "STOCK_OUT_OF_RANGE",
            Self::ValueOverflow => "STOCK_VALUE_OVERFLOW",
            Self::MissingUnitCost => "MISSING_UNIT_COST",
            Self::KindMismatch { .. } => "MOVEMENT_KIND_MISMATCH",
            Self::NoOpAdjustment { .. } => "NO_OP_ADJUSTMENT",
            Self::InvalidTransferProjects => "INVALID_TRANSFER_PROJECTS",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::ItemNotFound(_) => "STOCK_ITEM_NOT_FOUND",
            Self::ItemInactive(_) => "STOCK_ITEM_INACTIVE",
            Self::MovementNotFound(_) => "STOCK_MOVEMENT_NOT_FOUND",
            Self::NotReversible { .. } => "MOVEMENT_NOT_REVERSIBLE",
            Self::AlreadyReversed(_) => "MOVEMENT_ALREADY_REVERSED",
        }
    }
}
