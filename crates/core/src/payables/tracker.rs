//! Open items and allocation checks.
//!
//! Outstanding per line is its original credit less the live allocations
//! against it. The store hands in only live allocations: those whose payment
//! voucher has not been reversed.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use girder_shared::types::{LedgerLineId, MONEY_SCALE, fits_scale, within_storage};
use rust_decimal::Decimal;

use super::error::AllocationError;
use super::types::{AllocationRequest, OpenItem, PayableLine, Vendor, VendorAllocation};
use crate::ledger::LedgerLine;
use crate::numbering::VoucherNumbering;

/// Stateless payables calculator.
pub struct PayablesTracker;

impl PayablesTracker {
    /// Lines with a positive outstanding amount, oldest first.
    ///
    /// Oldest means voucher date, then voucher sequence, then line position.
    #[must_use]
    pub fn open_items(lines: &[PayableLine], allocations: &[VendorAllocation]) -> Vec<OpenItem> {
        let allocated = Self::allocated_by_line(allocations);

        let mut ordered: Vec<&PayableLine> = lines.iter().collect();
        ordered.sort_by(|a, b| Self::age_order(a, b));

        ordered
            .into_iter()
            .filter_map(|line| {
                let settled = allocated.get(&line.line_id).copied().unwrap_or_default();
                let outstanding = line.amount.saturating_sub(settled);
                (outstanding > Decimal::ZERO).then(|| OpenItem {
                    line_id: line.line_id,
                    voucher_id: line.voucher_id,
                    voucher_no: line.voucher_no.clone(),
                    voucher_date: line.voucher_date,
                    original_amount: line.amount,
                    allocated: settled,
                    outstanding,
                })
            })
            .collect()
    }

    fn age_order(a: &PayableLine, b: &PayableLine) -> Ordering {
        a.voucher_date
            .cmp(&b.voucher_date)
            .then_with(|| {
                VoucherNumbering::sequence_of(&a.voucher_no)
                    .cmp(&VoucherNumbering::sequence_of(&b.voucher_no))
            })
            .then_with(|| a.voucher_no.cmp(&b.voucher_no))
            .then_with(|| a.position.cmp(&b.position))
    }

    /// Checks requests against current open items.
    ///
    /// Requests against the same line are summed before comparing.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount`, `AmountOutOfRange`, `ExcessPrecision`,
    /// `NotOpenItem` or `ExceedsOutstanding`.
    pub fn check_requests(
        open_items: &[OpenItem],
        requests: &[AllocationRequest],
    ) -> Result<(), AllocationError> {
        let outstanding: HashMap<LedgerLineId, Decimal> = open_items
            .iter()
            .map(|item| (item.line_id, item.outstanding))
            .collect();
        let mut requested: HashMap<LedgerLineId, Decimal> = HashMap::new();

        for request in requests {
            Self::check_amount(request)?;
            let available = outstanding
                .get(&request.source_line_id)
                .copied()
                .ok_or(AllocationError::NotOpenItem(request.source_line_id))?;

            let total = requested.entry(request.source_line_id).or_default();
            *total = total
                .checked_add(request.amount)
                .ok_or(AllocationError::AmountOverflow)?;
            if *total > available {
                return Err(AllocationError::ExceedsOutstanding {
                    line: request.source_line_id,
                    requested: *total,
                    outstanding: available,
                });
            }
        }
        Ok(())
    }

    /// A single request must be positive and storable.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount`, `AmountOutOfRange` or `ExcessPrecision`.
    pub fn check_amount(request: &AllocationRequest) -> Result<(), AllocationError> {
        let line = request.source_line_id;
        let amount = request.amount;
        if amount <= Decimal::ZERO {
            return Err(AllocationError::NonPositiveAmount(line));
        }
        if !within_storage(amount) {
            return Err(AllocationError::AmountOutOfRange { line, amount });
        }
        if !fits_scale(amount, MONEY_SCALE) {
            return Err(AllocationError::ExcessPrecision { line, amount });
        }
        Ok(())
    }

    /// What a payment pays the vendor: its debits to the vendor's payable account.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow`.
    pub fn amount_paid(
        vendor: &Vendor,
        payment_lines: &[LedgerLine],
    ) -> Result<Decimal, AllocationError> {
        Self::sum(
            payment_lines
                .iter()
                .filter(|line| {
                    line.account_id == vendor.payable_account_id
                        && line.tags.vendor_id.is_none_or(|id| id == vendor.id)
                })
                .map(|line| line.debit),
        )
    }

    /// Checks that the payment covers everything allocated from it.
    ///
    /// # Errors
    ///
    /// Returns `ExceedsPayment` or `AmountOverflow`.
    pub fn check_payment_covers(
        vendor: &Vendor,
        payment_lines: &[LedgerLine],
        allocated: Decimal,
    ) -> Result<(), AllocationError> {
        let paid = Self::amount_paid(vendor, payment_lines)?;
        if allocated > paid {
            return Err(AllocationError::ExceedsPayment { allocated, paid });
        }
        Ok(())
    }

    /// Checks that every allocated source line is still a posted payable of the vendor.
    ///
    /// # Errors
    ///
    /// Returns `NotOpenItem` for the first source line that is not.
    pub fn check_sources_posted(
        payable_lines: &[PayableLine],
        allocations: &[VendorAllocation],
    ) -> Result<(), AllocationError> {
        let posted: HashSet<LedgerLineId> = payable_lines.iter().map(|l| l.line_id).collect();
        match allocations
            .iter()
            .find(|allocation| !posted.contains(&allocation.source_line_id))
        {
            Some(allocation) => Err(AllocationError::NotOpenItem(allocation.source_line_id)),
            None => Ok(()),
        }
    }

    /// Total allocated amount.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow`.
    pub fn total(allocations: &[VendorAllocation]) -> Result<Decimal, AllocationError> {
        Self::sum(allocations.iter().map(|a| a.amount))
    }

    /// Sum of `amounts`.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow`.
    pub fn sum(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal, AllocationError> {
        amounts
            .into_iter()
            .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
            .ok_or(AllocationError::AmountOverflow)
    }

    // Live allocations never exceed their source lines.
    fn allocated_by_line(allocations: &[VendorAllocation]) -> HashMap<LedgerLineId, Decimal> {
        let mut totals: HashMap<LedgerLineId, Decimal> = HashMap::new();
        for allocation in allocations {
            let total = totals.entry(allocation.source_line_id).or_default();
            *total = total.saturating_add(allocation.amount);
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LineInput, LineTags};
    use chrono::{NaiveDate, Utc};
    use girder_shared::types::{
        AccountId, AllocationId, CompanyId, UserId, VendorId, VoucherId,
    };
    use rust_decimal_macros::dec;

    fn payable(amount: Decimal, day: u32, no: &str) -> PayableLine {
        PayableLine {
            line_id: LedgerLineId::new(),
            voucher_id: VoucherId::new(),
            voucher_no: no.to_string(),
            voucher_date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            position: 0,
            amount,
        }
    }

    fn allocation(line: LedgerLineId, amount: Decimal) -> VendorAllocation {
        VendorAllocation {
            id: AllocationId::new(),
            company_id: CompanyId::new(),
            vendor_id: VendorId::new(),
            payment_voucher_id: VoucherId::new(),
            source_line_id: line,
            amount,
            created_by: UserId::new(),
            created_at: Utc::now(),
        }
    }

    fn vendor() -> Vendor {
        Vendor {
            id: VendorId::new(),
            company_id: CompanyId::new(),
            name: "Acme Aggregates".to_string(),
            payable_account_id: AccountId::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_open_items_subtract_allocations() {
        let bill = payable(dec!(500), 5, "V-202601-00002");
        let items = PayablesTracker::open_items(
            std::slice::from_ref(&bill),
            &[allocation(bill.line_id, dec!(200))],
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].original_amount, dec!(500));
        assert_eq!(items[0].allocated, dec!(200));
        assert_eq!(items[0].outstanding, dec!(300));
    }

    #[test]
    fn test_settled_lines_are_not_open() {
        let bill = payable(dec!(500), 5, "V-202601-00002");
        let items = PayablesTracker::open_items(
            std::slice::from_ref(&bill),
            &[
                allocation(bill.line_id, dec!(200)),
                allocation(bill.line_id, dec!(300)),
            ],
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_open_items_sorted_oldest_first() {
        let lines = vec![
            payable(dec!(1), 20, "V-202601-00009"),
            payable(dec!(1), 3, "V-202601-00001"),
            payable(dec!(1), 20, "V-202601-00008"),
        ];
        let items = PayablesTracker::open_items(&lines, &[]);
        let numbers: Vec<&str> = items.iter().map(|i| i.voucher_no.as_str()).collect();
        assert_eq!(
            numbers,
            vec!["V-202601-00001", "V-202601-00008", "V-202601-00009"]
        );
    }

    #[test]
    fn test_allocation_ceiling() {
        let bill = payable(dec!(500), 5, "V-202601-00002");
        let items = PayablesTracker::open_items(
            std::slice::from_ref(&bill),
            &[allocation(bill.line_id, dec!(200))],
        );

        let over = PayablesTracker::check_requests(
            &items,
            &[AllocationRequest::new(bill.line_id, dec!(301))],
        );
        assert!(matches!(
            over,
            Err(AllocationError::ExceedsOutstanding { requested, outstanding, .. })
                if requested == dec!(301) && outstanding == dec!(300)
        ));

        assert!(PayablesTracker::check_requests(
            &items,
            &[AllocationRequest::new(bill.line_id, dec!(300))],
        )
        .is_ok());
    }

    #[test]
    fn test_requests_against_same_line_are_summed() {
        let bill = payable(dec!(100), 5, "V-202601-00002");
        let items = PayablesTracker::open_items(std::slice::from_ref(&bill), &[]);
        let result = PayablesTracker::check_requests(
            &items,
            &[
                AllocationRequest::new(bill.line_id, dec!(60)),
                AllocationRequest::new(bill.line_id, dec!(41)),
            ],
        );
        assert!(matches!(
            result,
            Err(AllocationError::ExceedsOutstanding { requested, .. }) if requested == dec!(101)
        ));
    }

    #[test]
    fn test_unknown_and_non_positive_requests() {
        let items = PayablesTracker::open_items(&[payable(dec!(1), 1, "V-1")], &[]);
        let stranger = LedgerLineId::new();
        assert!(matches!(
            PayablesTracker::check_requests(&items, &[AllocationRequest::new(stranger, dec!(1))]),
            Err(AllocationError::NotOpenItem(id)) if id == stranger
        ));
        assert!(matches!(
            PayablesTracker::check_requests(
                &items,
                &[AllocationRequest::new(items[0].line_id, dec!(0))]
            ),
            Err(AllocationError::NonPositiveAmount(_))
        ));
    }

    #[test]
    fn test_amount_paid_counts_payable_debits_only() {
        let vendor = vendor();
        let voucher_id = VoucherId::new();
        let bank = AccountId::new();
        let other_vendor = LineTags {
            vendor_id: Some(VendorId::new()),
            ..LineTags::default()
        };
        let lines = vec![
            LineInput::debit(vendor.payable_account_id, dec!(300)).into_line(voucher_id, 0),
            LineInput::debit(vendor.payable_account_id, dec!(50))
                .with_tags(other_vendor)
                .into_line(voucher_id, 1),
            LineInput::credit(bank, dec!(350)).into_line(voucher_id, 2),
        ];
        assert_eq!(
            PayablesTracker::amount_paid(&vendor, &lines).unwrap(),
            dec!(300)
        );
        assert!(PayablesTracker::check_payment_covers(&vendor, &lines, dec!(300)).is_ok());
        assert!(matches!(
            PayablesTracker::check_payment_covers(&vendor, &lines, dec!(300.01)),
            Err(AllocationError::ExceedsPayment { .. })
        ));
    }

    #[test]
    fn test_sources_must_be_posted() {
        let bill = payable(dec!(100), 1, "V-1");
        let ok = allocation(bill.line_id, dec!(10));
        let stale = allocation(LedgerLineId::new(), dec!(10));
        assert!(PayablesTracker::check_sources_posted(std::slice::from_ref(&bill), &[ok]).is_ok());
        assert!(matches!(
            PayablesTracker::check_sources_posted(&[bill], &[stale]),
            Err(AllocationError::NotOpenItem(_))
        ));
    }

    #[test]
    fn test_open_items_order_by_sequence_past_five_digits() {
        let lines = vec![
            payable(dec!(1), 20, "V-202601-100000"),
            payable(dec!(1), 20, "V-202601-99999"),
        ];
        let items = PayablesTracker::open_items(&lines, &[]);
        let numbers: Vec<&str> = items.iter().map(|i| i.voucher_no.as_str()).collect();
        assert_eq!(numbers, vec!["V-202601-99999", "V-202601-100000"]);
    }

    #[test]
    fn test_open_items_within_a_voucher_follow_line_position() {
        let first = payable(dec!(1), 4, "V-202601-00004");
        let second = PayableLine {
            line_id: LedgerLineId::new(),
            position: 3,
            ..first.clone()
        };
        let items = PayablesTracker::open_items(&[second.clone(), first.clone()], &[]);
        assert_eq!(items[0].line_id, first.line_id);
        assert_eq!(items[1].line_id, second.line_id);
    }

    #[test]
    fn test_requests_need_storable_amounts() {
        let bill = payable(dec!(100), 5, "V-202601-00002");
        let items = PayablesTracker::open_items(std::slice::from_ref(&bill), &[]);

        assert!(matches!(
            PayablesTracker::check_requests(
                &items,
                &[AllocationRequest::new(bill.line_id, dec!(0.00004))]
            ),
            Err(AllocationError::ExcessPrecision { .. })
        ));
        assert!(matches!(
            PayablesTracker::check_requests(
                &items,
                &[AllocationRequest::new(bill.line_id, Decimal::MAX)]
            ),
            Err(AllocationError::AmountOutOfRange { .. })
        ));
        assert!(
            PayablesTracker::check_requests(
                &items,
                &[AllocationRequest::new(bill.line_id, dec!(99.9999))]
            )
            .is_ok()
        );
    }

    #[test]
    fn test_sum_reports_overflow() {
        assert!(matches!(
            PayablesTracker::sum([Decimal::MAX, Decimal::MAX]),
            Err(AllocationError::AmountOverflow)
        ));
        assert_eq!(PayablesTracker::sum([dec!(1.5), dec!(2.5)]).unwrap(), dec!(4));
    }
}
