//! Balance validation for voucher lines.

use girder_shared::types::{MONEY_SCALE, fits_scale, within_storage, within_tolerance};
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{LineAmounts, VoucherTotals};

/// Checks the shape of a single line: non-negative, exactly one side non-zero,
/// and both sides storable at 4 decimal places.
///
/// # Errors
///
/// Returns `NegativeAmount`, `AmountOutOfRange`, `ExcessPrecision`,
/// `DebitAndCredit` or `EmptyLine` tagged with `index`.
pub fn validate_line<L: LineAmounts>(index: usize, line: &L) -> Result<(), LedgerError> {
    let debit = line.debit_amount();
    let credit = line.credit_amount();

    if debit < Decimal::ZERO || credit < Decimal::ZERO {
        return Err(LedgerError::NegativeAmount { line: index });
    }
    for value in [debit, credit] {
        if !within_storage(value) {
            return Err(LedgerError::AmountOutOfRange { line: index, value });
        }
        if !fits_scale(value, MONEY_SCALE) {
            return Err(LedgerError::ExcessPrecision { line: index, value });
        }
    }
    if debit > Decimal::ZERO && credit > Decimal::ZERO {
        return Err(LedgerError::DebitAndCredit { line: index });
    }
    if debit.is_zero() && credit.is_zero() {
        return Err(LedgerError::EmptyLine { line: index });
    }
    Ok(())
}

/// Checks every line's shape without requiring the set to balance.
///
/// Drafts may be saved unbalanced; they are balanced-checked on submit and post.
///
/// # Errors
///
/// Returns the first line shape error.
pub fn validate_line_shapes<L: LineAmounts>(lines: &[L]) -> Result<(), LedgerError> {
    lines
        .iter()
        .enumerate()
        .try_for_each(|(index, line)| validate_line(index, line))
}

/// Validates a complete set of voucher lines.
///
/// A set is valid when it has at least two lines, every line passes
/// [`validate_line`], and total debits equal total credits within 0.01.
///
/// # Errors
///
/// Returns the first violation found, line shape errors before the balance check.
pub fn validate_balance<L: LineAmounts>(lines: &[L]) -> Result<VoucherTotals, LedgerError> {
    if lines.len() < 2 {
        return Err(LedgerError::InsufficientLines { count: lines.len() });
    }

    let mut totals = VoucherTotals {
        total_debit: Decimal::ZERO,
        total_credit: Decimal::ZERO,
    };

    for (index, line) in lines.iter().enumerate() {
        validate_line(index, line)?;
        totals.total_debit = totals
            .total_debit
            .checked_add(line.debit_amount())
            .ok_or(LedgerError::AmountOverflow)?;
        totals.total_credit = totals
            .total_credit
            .checked_add(line.credit_amount())
            .ok_or(LedgerError::AmountOverflow)?;
    }

    if !within_tolerance(totals.total_debit, totals.total_credit) {
        return Err(LedgerError::Unbalanced {
            debit: totals.total_debit,
            credit: totals.total_credit,
        });
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::LineInput;
    use girder_shared::types::AccountId;
    use rust_decimal_macros::dec;

    fn line(debit: Decimal, credit: Decimal) -> LineInput {
        LineInput {
            debit,
            credit,
            ..LineInput::debit(AccountId::new(), Decimal::ZERO)
        }
    }

    #[test]
    fn test_balanced_lines_pass() {
        let lines = vec![line(dec!(100), dec!(0)), line(dec!(0), dec!(100))];
        let totals = validate_balance(&lines).unwrap();
        assert_eq!(totals.total_debit, dec!(100));
        assert_eq!(totals.total_credit, dec!(100));
        assert_eq!(totals.difference(), dec!(0));
    }

    #[test]
    fn test_difference_within_tolerance_passes() {
        let lines = vec![line(dec!(100.01), dec!(0)), line(dec!(0), dec!(100))];
        assert!(validate_balance(&lines).is_ok());
    }

    #[test]
    fn test_difference_beyond_tolerance_fails() {
        let lines = vec![line(dec!(100.02), dec!(0)), line(dec!(0), dec!(100))];
        assert!(matches!(
            validate_balance(&lines),
            Err(LedgerError::Unbalanced { .. })
        ));
    }

    #[test]
    fn test_single_line_rejected() {
        let lines = vec![line(dec!(100), dec!(0))];
        assert!(matches!(
            validate_balance(&lines),
            Err(LedgerError::InsufficientLines { count: 1 })
        ));
    }

    #[test]
    fn test_empty_set_rejected() {
        let lines: Vec<LineInput> = Vec::new();
        assert!(matches!(
            validate_balance(&lines),
            Err(LedgerError::InsufficientLines { count: 0 })
        ));
    }

    #[test]
    fn test_both_sides_rejected() {
        let lines = vec![
            line(dec!(50), dec!(50)),
            line(dec!(100), dec!(0)),
            line(dec!(0), dec!(100)),
        ];
        assert!(matches!(
            validate_balance(&lines),
            Err(LedgerError::DebitAndCredit { line: 0 })
        ));
    }

    #[test]
    fn test_zero_line_rejected() {
        let lines = vec![
            line(dec!(100), dec!(0)),
            line(dec!(0), dec!(100)),
            line(dec!(0), dec!(0)),
        ];
        assert!(matches!(
            validate_balance(&lines),
            Err(LedgerError::EmptyLine { line: 2 })
        ));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let lines = vec![line(dec!(-100), dec!(0)), line(dec!(0), dec!(-100))];
        assert!(matches!(
            validate_balance(&lines),
            Err(LedgerError::NegativeAmount { line: 0 })
        ));
    }

    #[test]
    fn test_line_shapes_allow_unbalanced_drafts() {
        let lines = vec![line(dec!(100), dec!(0))];
        assert!(validate_line_shapes(&lines).is_ok());
    }

    #[test]
    fn test_line_shapes_reject_both_sides() {
        let lines = vec![line(dec!(1), dec!(1))];
        assert!(matches!(
            validate_line_shapes(&lines),
            Err(LedgerError::DebitAndCredit { line: 0 })
        ));
    }

    #[test]
    fn test_amounts_beyond_storage_rejected() {
        let lines = vec![
            line(Decimal::MAX, dec!(0)),
            line(Decimal::MAX, dec!(0)),
            line(dec!(0), Decimal::MAX),
            line(dec!(0), Decimal::MAX),
        ];
        assert!(matches!(
            validate_balance(&lines),
            Err(LedgerError::AmountOutOfRange { line: 0, .. })
        ));
    }

    #[test]
    fn test_large_storable_amounts_balance() {
        let big = dec!(999999999999999.9999);
        let lines = vec![
            line(big, dec!(0)),
            line(big, dec!(0)),
            line(dec!(0), big),
            line(dec!(0), big),
        ];
        let totals = validate_balance(&lines).unwrap();
        assert_eq!(totals.total_debit, big * dec!(2));
    }

    #[test]
    fn test_fifth_decimal_place_rejected() {
        let lines = vec![line(dec!(100.00001), dec!(0)), line(dec!(0), dec!(100.00001))];
        assert!(matches!(
            validate_balance(&lines),
            Err(LedgerError::ExcessPrecision { line: 0, .. })
        ));

        let padded = vec![line(dec!(100.500000), dec!(0)), line(dec!(0), dec!(100.5))];
        assert!(validate_balance(&padded).is_ok());
    }
}
