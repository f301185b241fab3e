//! Property-based tests for weighted-average costing.
//!
//! Stock never goes negative, an IN at the current average followed by an equal
//! OUT restores the position, and transfers conserve value.

use girder_shared::types::StockItemId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::costing::CostingEngine;
use super::error::StockError;
use super::types::StockPosition;

/// Quantities from 0.0001 to 10,000.
fn quantity() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

/// Costs from 0 to 10,000.
fn unit_cost() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

fn position() -> impl Strategy<Value = StockPosition> {
    (0i64..100_000_000i64, unit_cost())
        .prop_map(|(qty, cost)| StockPosition::new(Decimal::new(qty, 4), cost))
}

#[derive(Debug, Clone)]
enum Op {
    In(Decimal, Decimal),
    Out(Decimal),
    Adjust(Decimal, Option<Decimal>),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (quantity(), unit_cost()).prop_map(|(q, c)| Op::In(q, c)),
        quantity().prop_map(Op::Out),
        (quantity(), prop::option::of(unit_cost())).prop_map(|(q, c)| Op::Adjust(q, c)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// No sequence of movements produces a negative quantity or cost, and a
    /// rejected movement is only ever an over-issue.
    #[test]
    fn prop_stock_never_negative(ops in prop::collection::vec(op(), 1..30)) {
        let item = StockItemId::new();
        let mut pos = StockPosition::default();
        for op in ops {
            let next = match op {
                Op::In(q, c) => CostingEngine::receive(pos, q, c),
                Op::Out(q) => CostingEngine::issue(item, pos, q),
                Op::Adjust(q, c) => CostingEngine::adjust(pos, q, c),
            };
            match next {
                Ok(next) => pos = next,
                Err(StockError::InsufficientStock { requested, on_hand, .. }) => {
                    prop_assert!(requested > on_hand);
                }
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
            prop_assert!(pos.qty >= Decimal::ZERO);
            prop_assert!(pos.avg_cost >= Decimal::ZERO);
        }
    }

    /// IN at the current average then an equal OUT restores (Q0, C0).
    #[test]
    fn prop_in_then_out_at_average_restores(pos in position(), qty in quantity()) {
        let item = StockItemId::new();
        let received = CostingEngine::receive(pos, qty, pos.avg_cost).unwrap();
        prop_assert_eq!(received.avg_cost, pos.avg_cost);
        let issued = CostingEngine::issue(item, received, qty).unwrap();
        prop_assert_eq!(issued, pos);
    }

    /// Reversing a receipt restores the quantity exactly and the value within
    /// rounding.
    #[test]
    fn prop_receipt_reversal_restores(pos in position(), qty in quantity(), cost in unit_cost()) {
        let item = StockItemId::new();
        let received = CostingEngine::receive(pos, qty, cost).unwrap();
        let reversed = CostingEngine::reverse_receipt(item, received, qty, cost).unwrap();

        prop_assert_eq!(reversed.qty, pos.qty);
        let drift = (reversed.value().unwrap() - pos.value().unwrap()).abs();
        let bound = (received.qty + pos.qty) * Decimal::new(1, 4);
        prop_assert!(drift <= bound, "drift {} beyond {}", drift, bound);
    }

    /// A transfer leaves quantity, cost and value unchanged.
    #[test]
    fn prop_transfer_conserves_value(pos in position(), qty in quantity()) {
        let item = StockItemId::new();
        match CostingEngine::transfer(item, pos, qty) {
            Ok(legs) => {
                prop_assert_eq!(legs.after_in, pos);
                prop_assert_eq!(legs.unit_cost, pos.avg_cost);
            }
            Err(StockError::InsufficientStock { .. }) => prop_assert!(qty > pos.qty),
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }
}
