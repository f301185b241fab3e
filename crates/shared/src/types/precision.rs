//! Decimal precision rules for quantities, costs, and balances.
//!
//! CRITICAL: Never use floating-point for money or stock valuation.
//! Quantities and unit costs are held at a fixed scale of four fractional
//! digits and rounded with Banker's Rounding (`MidpointNearestEven`) so that
//! repeated weighted-average recomputation does not drift.

use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits kept for stock quantities.
pub const QUANTITY_SCALE: u32 = 4;

/// Fractional digits kept for unit costs.
pub const COST_SCALE: u32 = 4;

/// Fractional digits kept for ledger and allocation amounts.
pub const MONEY_SCALE: u32 = 4;

/// Exclusive upper bound on any stored quantity, cost or amount.
///
/// Columns are `NUMERIC(19,4)`: fifteen integer digits.
pub const AMOUNT_LIMIT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Largest debit/credit difference still treated as balanced (0.01).
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Rounds a quantity to [`QUANTITY_SCALE`].
#[must_use]
pub fn round_quantity(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Rounds a unit cost to [`COST_SCALE`].
#[must_use]
pub fn round_cost(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(COST_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Returns true if `value` carries no more than `scale` significant fractional digits.
///
/// Trailing zeros do not count.
#[must_use]
pub fn fits_scale(value: Decimal, scale: u32) -> bool {
    value.normalize().scale() <= scale
}

/// Returns true if `value` fits the storage columns.
#[must_use]
pub fn within_storage(value: Decimal) -> bool {
    value.abs() < AMOUNT_LIMIT
}

/// Returns true if two amounts differ by no more than [`BALANCE_TOLERANCE`].
#[must_use]
pub fn within_tolerance(left: Decimal, right: Decimal) -> bool {
    (left - right).abs() <= BALANCE_TOLERANCE
}
