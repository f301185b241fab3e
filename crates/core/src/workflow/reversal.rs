//! Reversal of posted vouchers.
//!
//! A reversal never edits the original. It produces a new voucher whose lines
//! move the same accounts with debit and credit swapped, carrying the same tags.

use chrono::{DateTime, NaiveDate, Utc};
use girder_shared::types::{LedgerLineId, UserId, VoucherId};

use crate::ledger::{LedgerLine, Voucher};
use crate::workflow::types::VoucherStatus;

/// Everything needed to build the reversing voucher.
#[derive(Debug, Clone)]
pub struct ReversalInput<'a> {
    /// The posted voucher being reversed.
    pub original: &'a Voucher,
    /// Its ledger lines.
    pub original_lines: &'a [LedgerLine],
    /// Number allocated to the reversing voucher.
    pub voucher_no: String,
    /// Date of the reversing voucher.
    pub reversal_date: NaiveDate,
    /// The user reversing.
    pub reversed_by: UserId,
    /// Reversal timestamp.
    pub reversed_at: DateTime<Utc>,
}

/// The reversing voucher and its lines, already in posted state.
#[derive(Debug, Clone)]
pub struct ReversalOutput {
    /// The reversing voucher header.
    pub voucher: Voucher,
    /// Lines with debit and credit swapped.
    pub lines: Vec<LedgerLine>,
}

/// Stateless service for building reversing vouchers.
pub struct ReversalService;

impl ReversalService {
    /// Build the reversing voucher for `input.original`.
    #[must_use]
    pub fn create_reversal(input: ReversalInput<'_>) -> ReversalOutput {
        let voucher_id = VoucherId::new();
        let original = input.original;

        let voucher = Voucher {
            id: voucher_id,
            company_id: original.company_id,
            voucher_no: input.voucher_no,
            voucher_date: input.reversal_date,
            voucher_type: original.voucher_type,
            status: VoucherStatus::Posted,
            project_id: original.project_id,
            vendor_id: original.vendor_id,
            narration: Some(Self::reversal_narration(original)),
            created_by: input.reversed_by,
            created_at: input.reversed_at,
            submitted_by: Some(input.reversed_by),
            submitted_at: Some(input.reversed_at),
            approved_by: Some(input.reversed_by),
            approved_at: Some(input.reversed_at),
            posted_by: Some(input.reversed_by),
            posted_at: Some(input.reversed_at),
            reversed_by_voucher_id: None,
            reverses_voucher_id: Some(original.id),
            updated_at: input.reversed_at,
        };

        let lines = Self::reverse_lines(voucher_id, input.original_lines);

        ReversalOutput { voucher, lines }
    }

    /// Swap debit and credit on every line, keeping accounts, tags and order.
    #[must_use]
    pub fn reverse_lines(voucher_id: VoucherId, lines: &[LedgerLine]) -> Vec<LedgerLine> {
        lines
            .iter()
            .map(|line| LedgerLine {
                id: LedgerLineId::new(),
                voucher_id,
                account_id: line.account_id,
                debit: line.credit,
                credit: line.debit,
                tags: line.tags,
                narration: line.narration.clone(),
                position: line.position,
            })
            .collect()
    }

    /// Narration for the reversing voucher.
    #[must_use]
    pub fn reversal_narration(original: &Voucher) -> String {
        format!("Reversal of {}", original.voucher_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LineInput, LineTags, VoucherType, validate_balance};
    use girder_shared::types::{AccountId, CompanyId, ProjectId};
    use rust_decimal_macros::dec;

    fn posted_voucher() -> (Voucher, Vec<LedgerLine>) {
        let id = VoucherId::new();
        let now = Utc::now();
        let user = UserId::new();
        let voucher = Voucher {
            id,
            company_id: CompanyId::new(),
            voucher_no: "V-202601-00001".to_string(),
            voucher_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            voucher_type: VoucherType::Journal,
            status: VoucherStatus::Posted,
            project_id: None,
            vendor_id: None,
            narration: Some("Accrual".to_string()),
            created_by: user,
            created_at: now,
            submitted_by: Some(user),
            submitted_at: Some(now),
            approved_by: Some(user),
            approved_at: Some(now),
            posted_by: Some(user),
            posted_at: Some(now),
            reversed_by_voucher_id: None,
            reverses_voucher_id: None,
            updated_at: now,
        };
        let tags = LineTags {
            project_id: Some(ProjectId::new()),
            ..LineTags::default()
        };
        let lines = vec![
            LineInput::debit(AccountId::new(), dec!(250.00))
                .with_tags(tags)
                .into_line(id, 0),
            LineInput::credit(AccountId::new(), dec!(200.00)).into_line(id, 1),
            LineInput::credit(AccountId::new(), dec!(50.00)).into_line(id, 2),
        ];
        (voucher, lines)
    }

    #[test]
    fn test_reversal_swaps_sides() {
        let (original, lines) = posted_voucher();
        let output = ReversalService::create_reversal(ReversalInput {
            original: &original,
            original_lines: &lines,
            voucher_no: "V-202602-00001".to_string(),
            reversal_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            reversed_by: UserId::new(),
            reversed_at: Utc::now(),
        });

        assert_eq!(output.lines.len(), 3);
        for (orig, rev) in lines.iter().zip(&output.lines) {
            assert_eq!(rev.account_id, orig.account_id);
            assert_eq!(rev.debit, orig.credit);
            assert_eq!(rev.credit, orig.debit);
            assert_eq!(rev.tags, orig.tags);
            assert_eq!(rev.voucher_id, output.voucher.id);
            assert_ne!(rev.id, orig.id);
        }
        assert!(validate_balance(&output.lines).is_ok());
    }

    #[test]
    fn test_reversal_header_links_original() {
        let (original, lines) = posted_voucher();
        let user = UserId::new();
        let output = ReversalService::create_reversal(ReversalInput {
            original: &original,
            original_lines: &lines,
            voucher_no: "V-202601-00002".to_string(),
            reversal_date: original.voucher_date,
            reversed_by: user,
            reversed_at: Utc::now(),
        });

        assert_eq!(output.voucher.status, VoucherStatus::Posted);
        assert_eq!(output.voucher.reverses_voucher_id, Some(original.id));
        assert_eq!(output.voucher.posted_by, Some(user));
        assert_eq!(output.voucher.voucher_type, original.voucher_type);
        assert_eq!(
            output.voucher.narration.as_deref(),
            Some("Reversal of V-202601-00001")
        );
    }

    #[test]
    fn test_double_reversal_restores_lines() {
        let (original, lines) = posted_voucher();
        let once = ReversalService::reverse_lines(VoucherId::new(), &lines);
        let twice = ReversalService::reverse_lines(original.id, &once);
        for (orig, back) in lines.iter().zip(&twice) {
            assert_eq!(orig.debit, back.debit);
            assert_eq!(orig.credit, back.credit);
            assert_eq!(orig.account_id, back.account_id);
        }
    }
}
