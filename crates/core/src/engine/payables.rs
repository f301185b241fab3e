//! Open items and payment allocation.

use chrono::Utc;
use girder_shared::types::{AllocationId, VendorId, VoucherId};
use tracing::info;

use super::{EngineResult, LedgerEngine};
use crate::audit::AuditRecord;
use crate::ledger::{LedgerError, LedgerLine, Voucher, VoucherType};
use crate::payables::{
    AllocationError, AllocationRequest, OpenItem, PayablesTracker, Vendor, VendorAllocation,
};
use crate::store::{LedgerRepository, PayablesRepository, Store, UnitOfWork};
use crate::workflow::{Actor, Capability, Resource, VoucherStatus};

impl<S: Store> LedgerEngine<S> {
    /// Posted bills of a vendor that still have something outstanding, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `VendorNotFound`.
    pub async fn open_items(
        &self,
        actor: &Actor,
        vendor_id: VendorId,
    ) -> EngineResult<Vec<OpenItem>> {
        self.authorize(actor, Resource::Payables, Capability::Read)?;

        let mut tx = self.begin(actor).await?;
        let result = Self::open_items_in(&mut tx, vendor_id).await;
        Self::finish(tx, result).await
    }

    async fn open_items_in(tx: &mut S::Tx, vendor_id: VendorId) -> EngineResult<Vec<OpenItem>> {
        let vendor = tx
            .find_vendor(vendor_id)
            .await?
            .ok_or(LedgerError::VendorNotFound(vendor_id))?;
        let lines = tx.posted_payable_lines(&vendor).await?;
        let allocations = tx.live_allocations(vendor_id).await?;
        Ok(PayablesTracker::open_items(&lines, &allocations))
    }

    /// Allocate a payment voucher against the vendor's open items.
    ///
    /// Every request is checked against outstanding amounts read under the
    /// vendor's row lock, in the same unit of work as the insert, so two
    /// concurrent allocations can never settle the same amount twice.
    ///
    /// # Errors
    ///
    /// Returns `ExceedsOutstanding` when a request is larger than what is
    /// still owed on its line, and `ExceedsPayment` when the payment does not
    /// cover the total allocated from it.
    pub async fn allocate_payment(
        &self,
        actor: &Actor,
        payment_voucher_id: VoucherId,
        requests: Vec<AllocationRequest>,
    ) -> EngineResult<Vec<VendorAllocation>> {
        self.authorize(actor, Resource::Payables, Capability::Write)?;

        let mut tx = self.begin(actor).await?;
        let result =
            Self::allocate_payment_in(&mut tx, actor, payment_voucher_id, &requests).await;
        let allocations = Self::finish(tx, result).await?;

        info!(
            payment_voucher_id = %payment_voucher_id,
            allocations = allocations.len(),
            "Payment allocated"
        );
        self.audit
            .record_all(allocation_audit(actor, &allocations))
            .await;
        Ok(allocations)
    }

    async fn allocate_payment_in(
        tx: &mut S::Tx,
        actor: &Actor,
        payment_voucher_id: VoucherId,
        requests: &[AllocationRequest],
    ) -> EngineResult<Vec<VendorAllocation>> {
        let payment = tx
            .lock_voucher(payment_voucher_id)
            .await?
            .ok_or(LedgerError::VoucherNotFound(payment_voucher_id))?;
        let lines = tx.voucher_lines(payment_voucher_id).await?;
        record_allocations(tx, actor, &payment, &lines, requests).await
    }
}

/// Check `requests` against the vendor's open items and write them.
pub(super) async fn record_allocations<T: UnitOfWork>(
    tx: &mut T,
    actor: &Actor,
    payment: &Voucher,
    payment_lines: &[LedgerLine],
    requests: &[AllocationRequest],
) -> EngineResult<Vec<VendorAllocation>> {
    let vendor = lock_payment_vendor(tx, payment).await?;
    if payment.status == VoucherStatus::Reversed {
        return Err(AllocationError::PaymentReversed(payment.id).into());
    }

    let payable = tx.posted_payable_lines(&vendor).await?;
    let live = tx.live_allocations(vendor.id).await?;
    let open = PayablesTracker::open_items(&payable, &live);
    PayablesTracker::check_requests(&open, requests)?;

    let existing = tx.allocations_for_payment(payment.id).await?;
    let requested = PayablesTracker::sum(requests.iter().map(|request| request.amount))?;
    let allocated = PayablesTracker::total(&existing)?
        .checked_add(requested)
        .ok_or(AllocationError::AmountOverflow)?;
    PayablesTracker::check_payment_covers(&vendor, payment_lines, allocated)?;

    let now = Utc::now();
    let mut allocations = Vec::with_capacity(requests.len());
    for request in requests {
        let allocation = VendorAllocation {
            id: AllocationId::new(),
            company_id: payment.company_id,
            vendor_id: vendor.id,
            payment_voucher_id: payment.id,
            source_line_id: request.source_line_id,
            amount: request.amount,
            created_by: actor.user_id,
            created_at: now,
        };
        tx.insert_allocation(&allocation).await?;
        allocations.push(allocation);
    }
    Ok(allocations)
}

/// Re-check the allocations already recorded against a payment.
///
/// The payment must still cover them. With `require_posted_sources`, every
/// allocated line must also still be a posted bill of the vendor.
pub(super) async fn verify_payment_allocations<T: UnitOfWork>(
    tx: &mut T,
    payment: &Voucher,
    payment_lines: &[LedgerLine],
    require_posted_sources: bool,
) -> EngineResult<()> {
    let allocations = tx.allocations_for_payment(payment.id).await?;
    if allocations.is_empty() {
        return Ok(());
    }

    let vendor = lock_payment_vendor(tx, payment).await?;
    if require_posted_sources {
        let payable = tx.posted_payable_lines(&vendor).await?;
        PayablesTracker::check_sources_posted(&payable, &allocations)?;
    }
    PayablesTracker::check_payment_covers(
        &vendor,
        payment_lines,
        PayablesTracker::total(&allocations)?,
    )?;
    Ok(())
}

/// Audit records for freshly written allocations.
pub(super) fn allocation_audit(
    actor: &Actor,
    allocations: &[VendorAllocation],
) -> Vec<AuditRecord> {
    allocations
        .iter()
        .map(|allocation| {
            AuditRecord::new(
                actor.company_id,
                "vendor_allocation",
                allocation.id.into_inner(),
                "create",
                actor.user_id,
            )
            .with_states(None::<&VendorAllocation>, Some(allocation))
        })
        .collect()
}

async fn lock_payment_vendor<T: UnitOfWork>(
    tx: &mut T,
    payment: &Voucher,
) -> EngineResult<Vendor> {
    if payment.voucher_type != VoucherType::Payment {
        return Err(AllocationError::NotPaymentVoucher(payment.id).into());
    }
    let vendor_id = payment
        .vendor_id
        .ok_or(AllocationError::VendorRequired(payment.id))?;
    tx.lock_vendor(vendor_id)
        .await?
        .ok_or_else(|| LedgerError::VendorNotFound(vendor_id).into())
}
