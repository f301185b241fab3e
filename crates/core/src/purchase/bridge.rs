//! Purchase to stock bridge.
//!
//! Posting a purchase voucher receives its material lines into stock inside the
//! posting unit of work; reversing it issues the same quantities back out at
//! the cost they were received at. This module plans those movements; the
//! engine applies them.

use girder_shared::types::{
    COST_SCALE, PurchaseLineId, QUANTITY_SCALE, StockItemId, StockMovementId,
};
use rust_decimal::Decimal;

use crate::inventory::{
    CostingEngine, MovementKind, MovementTags, MovementType, StockError, StockMovement,
};
use crate::ledger::{LedgerError, Voucher};
use crate::purchase::types::{PurchaseLine, PurchaseLineInput, PurchaseLineKind};

/// A stock receipt to apply when a purchase posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedReceipt {
    /// Source purchase line.
    pub purchase_line_id: PurchaseLineId,
    /// Item received.
    pub stock_item_id: StockItemId,
    /// Quantity received.
    pub qty: Decimal,
    /// Cost per unit.
    pub unit_cost: Decimal,
    /// Project, vendor and voucher linkage.
    pub tags: MovementTags,
}

/// A compensating issue to apply when a purchase is reversed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedReceiptReversal {
    /// The receipt being compensated.
    pub receipt_id: StockMovementId,
    /// Item.
    pub stock_item_id: StockItemId,
    /// Quantity originally received.
    pub qty: Decimal,
    /// Cost the receipt was valued at.
    pub historical_cost: Decimal,
    /// Purchase line the receipt came from.
    pub purchase_line_id: Option<PurchaseLineId>,
}

/// Stateless planner for purchase stock movements.
pub struct PurchaseBridge;

impl PurchaseBridge {
    /// Validates purchase lines before they are stored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPurchaseLine` for negative, over-precise or unstorable
    /// amounts and material lines without a stock item.
    pub fn validate_lines(lines: &[PurchaseLineInput]) -> Result<(), LedgerError> {
        for (index, line) in lines.iter().enumerate() {
            let invalid = |reason: &str| LedgerError::InvalidPurchaseLine {
                line: index,
                reason: reason.to_string(),
            };

            if line.quantity < Decimal::ZERO {
                return Err(invalid("quantity cannot be negative"));
            }
            if line.unit_rate < Decimal::ZERO {
                return Err(invalid("unit rate cannot be negative"));
            }
            CostingEngine::check_scale("quantity", line.quantity, QUANTITY_SCALE)
                .and_then(|()| CostingEngine::check_scale("unit rate", line.unit_rate, COST_SCALE))
                .map_err(|err| invalid(&err.to_string()))?;
            if line.kind == PurchaseLineKind::Material
                && line.quantity > Decimal::ZERO
                && line.stock_item_id.is_none()
            {
                return Err(invalid("material lines need a stock item"));
            }
        }
        Ok(())
    }

    /// The receipts posting `voucher` must apply: one per stock-receiving line.
    #[must_use]
    pub fn plan_receipts(voucher: &Voucher, lines: &[PurchaseLine]) -> Vec<PlannedReceipt> {
        lines
            .iter()
            .filter(|line| line.receives_stock())
            .filter_map(|line| {
                line.stock_item_id.map(|stock_item_id| PlannedReceipt {
                    purchase_line_id: line.id,
                    stock_item_id,
                    qty: line.quantity,
                    unit_cost: line.unit_rate,
                    tags: MovementTags {
                        project_id: voucher.project_id,
                        vendor_id: voucher.vendor_id,
                        voucher_id: Some(voucher.id),
                        purchase_line_id: Some(line.id),
                        note: line.description.clone(),
                    },
                })
            })
            .collect()
    }

    /// The compensating issues for the receipts `voucher` created.
    ///
    /// # Errors
    ///
    /// Returns `MissingUnitCost` for a receipt recorded without a cost.
    pub fn plan_reversals(
        voucher: &Voucher,
        movements: &[StockMovement],
    ) -> Result<Vec<PlannedReceiptReversal>, StockError> {
        movements
            .iter()
            .filter(|m| {
                m.movement_type == MovementType::In
                    && m.kind == MovementKind::Purchase
                    && m.tags.voucher_id == Some(voucher.id)
                    && m.reverses_movement_id.is_none()
            })
            .map(|m| {
                Ok(PlannedReceiptReversal {
                    receipt_id: m.id,
                    stock_item_id: m.stock_item_id,
                    qty: m.qty,
                    historical_cost: m.unit_cost.ok_or(StockError::MissingUnitCost)?,
                    purchase_line_id: m.tags.purchase_line_id,
                })
            })
            .collect()
    }
}
