//! Weighted-average stock costing.
//!
//! Pure functions from a [`StockPosition`] and a movement to the next position.
//! Quantities and costs are kept at 4 decimal places with banker's rounding.

use girder_shared::types::{
    COST_SCALE, QUANTITY_SCALE, StockItemId, fits_scale, round_cost, round_quantity,
    within_storage,
};
use rust_decimal::Decimal;

use super::error::StockError;
use super::types::{MovementType, StockMovement, StockPosition};

/// The two positions a transfer passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferLegs {
    /// Cost both legs are valued at.
    pub unit_cost: Decimal,
    /// Position after the OUT leg.
    pub after_out: StockPosition,
    /// Position after the IN leg.
    pub after_in: StockPosition,
}

/// Stateless weighted-average costing engine.
pub struct CostingEngine;

impl CostingEngine {
    /// Rejects values carrying more fractional digits than `scale` or too large to store.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` or `ExcessPrecision`.
    pub fn check_scale(field: &'static str, value: Decimal, scale: u32) -> Result<(), StockError> {
        if !within_storage(value) {
            return Err(StockError::OutOfRange { field, value });
        }
        if !fits_scale(value, scale) {
            return Err(StockError::ExcessPrecision {
                field,
                value,
                scale,
            });
        }
        Ok(())
    }

    /// Validates a movement quantity for IN, OUT and TRANSFER.
    ///
    /// # Errors
    ///
    /// Returns `ZeroQuantity`, `NegativeQuantity` or `ExcessPrecision`.
    pub fn check_quantity(qty: Decimal) -> Result<(), StockError> {
        if qty.is_zero() {
            return Err(StockError::ZeroQuantity);
        }
        if qty < Decimal::ZERO {
            return Err(StockError::NegativeQuantity(qty));
        }
        Self::check_scale("quantity", qty, QUANTITY_SCALE)
    }

    /// Validates a unit cost.
    ///
    /// # Errors
    ///
    /// Returns `NegativeUnitCost` or `ExcessPrecision`.
    pub fn check_unit_cost(unit_cost: Decimal) -> Result<(), StockError> {
        if unit_cost < Decimal::ZERO {
            return Err(StockError::NegativeUnitCost(unit_cost));
        }
        Self::check_scale("unit cost", unit_cost, COST_SCALE)
    }

    /// Receive `qty` units at `unit_cost`.
    ///
    /// `C1 = (Q0·C0 + qty·unit_cost) / Q1`.
    ///
    /// # Errors
    ///
    /// Returns an input error for a non-positive quantity or negative cost,
    /// and `OutOfRange` or `ValueOverflow` when the result cannot be stored.
    pub fn receive(
        position: StockPosition,
        qty: Decimal,
        unit_cost: Decimal,
    ) -> Result<StockPosition, StockError> {
        Self::check_quantity(qty)?;
        Self::check_unit_cost(unit_cost)?;

        let new_qty = Self::on_hand(position.qty.checked_add(qty))?;
        let new_cost = if new_qty > Decimal::ZERO {
            let value = position
                .value()
                .zip(qty.checked_mul(unit_cost))
                .and_then(|(held, received)| held.checked_add(received))
                .and_then(|total| total.checked_div(new_qty))
                .ok_or(StockError::ValueOverflow)?;
            round_cost(value)
        } else {
            Decimal::ZERO
        };
        Ok(StockPosition::new(new_qty, new_cost))
    }

    /// Issue `qty` units at the current average cost.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientStock` when `qty` exceeds the on-hand quantity.
    pub fn issue(
        item: StockItemId,
        position: StockPosition,
        qty: Decimal,
    ) -> Result<StockPosition, StockError> {
        Self::check_quantity(qty)?;
        Self::ensure_available(item, position, qty)?;
        Ok(StockPosition::new(
            round_quantity(position.qty - qty),
            position.avg_cost,
        ))
    }

    /// Set the on-hand quantity to `target`, revaluing when `unit_cost` is given.
    ///
    /// # Errors
    ///
    /// Returns an input error for a negative target or cost.
    pub fn adjust(
        position: StockPosition,
        target: Decimal,
        unit_cost: Option<Decimal>,
    ) -> Result<StockPosition, StockError> {
        if target < Decimal::ZERO {
            return Err(StockError::NegativeQuantity(target));
        }
        Self::check_scale("quantity", target, QUANTITY_SCALE)?;
        if let Some(cost) = unit_cost {
            Self::check_unit_cost(cost)?;
        }
        Ok(StockPosition::new(
            round_quantity(target),
            unit_cost.map_or(position.avg_cost, round_cost),
        ))
    }

    /// Take back `qty` units received at `historical_cost`.
    ///
    /// Removes exactly the value the receipt added, so a receipt followed by
    /// its reversal restores the prior average. The average is clamped at zero
    /// when later issues have already consumed the value.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientStock` when fewer than `qty` units remain and
    /// `ValueOverflow` when the value cannot be computed.
    pub fn reverse_receipt(
        item: StockItemId,
        position: StockPosition,
        qty: Decimal,
        historical_cost: Decimal,
    ) -> Result<StockPosition, StockError> {
        Self::check_quantity(qty)?;
        Self::check_unit_cost(historical_cost)?;
        Self::ensure_available(item, position, qty)?;

        let new_qty = round_quantity(position.qty - qty);
        let new_cost = if new_qty > Decimal::ZERO {
            let value = position
                .value()
                .zip(qty.checked_mul(historical_cost))
                .and_then(|(held, removed)| held.checked_sub(removed))
                .and_then(|remaining| remaining.checked_div(new_qty))
                .ok_or(StockError::ValueOverflow)?;
            round_cost(value).max(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };
        Ok(StockPosition::new(new_qty, new_cost))
    }

    /// Move `qty` units between projects at the current average.
    ///
    /// The OUT leg and the IN leg carry the same cost, so the item's value is
    /// unchanged once both legs apply.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientStock` when `qty` exceeds the on-hand quantity.
    pub fn transfer(
        item: StockItemId,
        position: StockPosition,
        qty: Decimal,
    ) -> Result<TransferLegs, StockError> {
        let after_out = Self::issue(item, position, qty)?;
        let after_in = Self::receive(after_out, qty, position.avg_cost)?;
        Ok(TransferLegs {
            unit_cost: position.avg_cost,
            after_out,
            after_in,
        })
    }

    /// Apply one recorded movement to `position`.
    ///
    /// # Errors
    ///
    /// Returns the costing error the movement would raise today.
    pub fn apply_recorded(
        position: StockPosition,
        movement: &StockMovement,
    ) -> Result<StockPosition, StockError> {
        match movement.movement_type {
            MovementType::In => {
                let cost = movement.unit_cost.ok_or(StockError::MissingUnitCost)?;
                Self::receive(position, movement.qty, cost)
            }
            MovementType::Out if movement.is_receipt_reversal() => {
                let cost = movement.unit_cost.ok_or(StockError::MissingUnitCost)?;
                Self::reverse_receipt(movement.stock_item_id, position, movement.qty, cost)
            }
            MovementType::Out => Self::issue(movement.stock_item_id, position, movement.qty),
            MovementType::Adjust => Self::adjust(position, movement.qty, movement.unit_cost),
            MovementType::Transfer => {
                Self::transfer(movement.stock_item_id, position, movement.qty)
                    .map(|legs| legs.after_in)
            }
        }
    }

    /// Re-derive a balance from movement history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns the first movement that no longer applies.
    pub fn replay<'a>(
        movements: impl IntoIterator<Item = &'a StockMovement>,
    ) -> Result<StockPosition, StockError> {
        movements
            .into_iter()
            .try_fold(StockPosition::default(), |position, movement| {
                Self::apply_recorded(position, movement)
            })
    }

    fn on_hand(qty: Option<Decimal>) -> Result<Decimal, StockError> {
        let qty = qty.map(round_quantity).ok_or(StockError::ValueOverflow)?;
        if !within_storage(qty) {
            return Err(StockError::OutOfRange {
                field: "on-hand quantity",
                value: qty,
            });
        }
        Ok(qty)
    }

    fn ensure_available(
        item: StockItemId,
        position: StockPosition,
        qty: Decimal,
    ) -> Result<(), StockError> {
        if qty > position.qty {
            return Err(StockError::InsufficientStock {
                item,
                requested: qty,
                on_hand: position.qty,
            });
        }
        Ok(())
    }
}
