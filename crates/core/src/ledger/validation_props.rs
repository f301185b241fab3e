//! Property-based tests for voucher balance validation.
//!
//! Balance invariant: a voucher validates only if debits equal credits within 0.01.
//! Exclusivity invariant: every accepted line has exactly one non-zero side.

use girder_shared::types::AccountId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::LineInput;
use super::validation::validate_balance;

/// Strategy to generate a valid positive amount (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn debit(amount: Decimal) -> LineInput {
    LineInput::debit(AccountId::new(), amount)
}

fn credit(amount: Decimal) -> LineInput {
    LineInput::credit(AccountId::new(), amount)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Splitting one debit across several credits always balances.
    #[test]
    fn prop_split_credits_balance(parts in prop::collection::vec(positive_amount(), 1..8)) {
        let total: Decimal = parts.iter().copied().sum();
        let mut lines = vec![debit(total)];
        lines.extend(parts.into_iter().map(credit));

        let totals = validate_balance(&lines).unwrap();
        prop_assert_eq!(totals.total_debit, total);
        prop_assert_eq!(totals.total_credit, total);
    }

    /// Any accepted set balances within the tolerance.
    #[test]
    fn prop_accepted_sets_balance(
        debits in prop::collection::vec(positive_amount(), 1..5),
        credits in prop::collection::vec(positive_amount(), 1..5),
    ) {
        let mut lines: Vec<LineInput> = debits.into_iter().map(debit).collect();
        lines.extend(credits.into_iter().map(credit));

        let debit_sum: Decimal = lines.iter().map(|l| l.debit).sum();
        let credit_sum: Decimal = lines.iter().map(|l| l.credit).sum();

        match validate_balance(&lines) {
            Ok(_) => prop_assert!((debit_sum - credit_sum).abs() <= Decimal::new(1, 2)),
            Err(LedgerError::Unbalanced { .. }) => {
                prop_assert!((debit_sum - credit_sum).abs() > Decimal::new(1, 2));
            }
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    /// A line with both sides set is never accepted, wherever it sits.
    #[test]
    fn prop_two_sided_line_rejected(
        amount in positive_amount(),
        other in positive_amount(),
        position in 0usize..3,
    ) {
        let mut lines = vec![debit(amount), credit(amount)];
        let mut bad = debit(other);
        bad.credit = other;
        lines.insert(position, bad);

        let result = validate_balance(&lines);
        prop_assert!(
            matches!(result, Err(LedgerError::DebitAndCredit { line }) if line == position),
            "expected DebitAndCredit at {}",
            position
        );
    }

    /// Shifting one side past the tolerance is always rejected.
    #[test]
    fn prop_off_by_more_than_a_cent_rejected(amount in positive_amount(), cents in 2i64..10_000) {
        let lines = vec![debit(amount + Decimal::new(cents, 2)), credit(amount)];
        let is_unbalanced = matches!(validate_balance(&lines), Err(LedgerError::Unbalanced { .. }));
        prop_assert!(is_unbalanced);
    }
}
