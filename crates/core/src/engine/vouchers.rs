//! Voucher creation, draft maintenance and lifecycle transitions.

use chrono::{NaiveDate, Utc};
use girder_shared::types::VoucherId;
use tracing::{debug, info};

use super::payables::{allocation_audit, record_allocations, verify_payment_allocations};
use super::stock::{movement_audit, receive_purchase, reverse_purchase_receipt};
use super::{
    EngineResult, LedgerEngine, active_item, active_vendor, allocate_number,
    check_postable_accounts, collision_floor, number_collision, position,
};
use crate::audit::AuditRecord;
use crate::inventory::{MovementTags, StockMovement};
use crate::ledger::{
    DraftLines, LedgerError, LedgerLine, LineInput, NewVoucher, Voucher, VoucherDocument,
    VoucherType, validate_balance, validate_line_shapes,
};
use crate::numbering::NumberingError;
use crate::payables::{AllocationError, VendorAllocation};
use crate::purchase::{PurchaseBridge, PurchaseLine, PurchaseLineInput};
use crate::store::{LedgerRepository, PayablesRepository, StockRepository, Store, UnitOfWork};
use crate::workflow::{
    Actor, Capability, ReversalInput, ReversalService, Resource, Transition, VoucherAction,
    VoucherStateMachine, VoucherStatus, WorkflowError,
};

/// Everything a reversal wrote.
struct Reversal {
    before: Voucher,
    after: Voucher,
    document: VoucherDocument,
    movements: Vec<StockMovement>,
}

impl<S: Store> LedgerEngine<S> {
    /// Create a draft voucher with a freshly allocated number.
    ///
    /// Lines must be well formed but need not balance until submission.
    /// Purchase lines are only accepted on purchase vouchers and allocations
    /// only on payment vouchers; allocations are checked and written in the
    /// same unit of work as the voucher.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed content, and
    /// `NumberingConflict` once the configured attempts are used up.
    pub async fn create_voucher(
        &self,
        actor: &Actor,
        input: NewVoucher,
    ) -> EngineResult<VoucherDocument> {
        self.authorize(actor, Resource::Voucher, Capability::Write)?;
        if !input.allocations.is_empty() {
            self.authorize(actor, Resource::Payables, Capability::Write)?;
        }
        check_draft_content(input.voucher_type, &input.lines, &input.purchase_lines)?;

        let voucher_id = VoucherId::new();
        let attempts = self.settings.numbering_max_attempts;
        let mut floor = 0;
        let mut last_no = String::new();

        for attempt in 1..=attempts {
            let mut tx = self.begin(actor).await?;
            let result = self
                .create_voucher_in(&mut tx, actor, voucher_id, &input, floor)
                .await;
            match Self::finish(tx, result).await {
                Ok((document, allocations)) => {
                    info!(
                        voucher_id = %voucher_id,
                        voucher_no = %document.voucher.voucher_no,
                        voucher_type = %document.voucher.voucher_type,
                        "Voucher created"
                    );
                    let mut records = vec![
                        AuditRecord::new(
                            actor.company_id,
                            "voucher",
                            voucher_id.into_inner(),
                            "create",
                            actor.user_id,
                        )
                        .with_states(None::<&VoucherDocument>, Some(&document)),
                    ];
                    records.extend(allocation_audit(actor, &allocations));
                    self.audit.record_all(records).await;
                    return Ok(document);
                }
                Err(err) => {
                    let (sequence, voucher_no) = collision_floor(err)?;
                    debug!(
                        voucher_no = %voucher_no,
                        attempt,
                        "Voucher number already taken, retrying"
                    );
                    floor = sequence;
                    last_no = voucher_no;
                }
            }
        }

        Err(NumberingError::Exhausted {
            attempts,
            voucher_no: last_no,
        }
        .into())
    }

    async fn create_voucher_in(
        &self,
        tx: &mut S::Tx,
        actor: &Actor,
        voucher_id: VoucherId,
        input: &NewVoucher,
        floor: u32,
    ) -> EngineResult<(VoucherDocument, Vec<VendorAllocation>)> {
        let (voucher_no, sequence) =
            allocate_number(tx, &self.settings, input.voucher_date, floor).await?;

        check_postable_accounts(tx, &input.lines).await?;
        if let Some(vendor_id) = input.vendor_id {
            active_vendor(tx, vendor_id).await?;
        }
        check_purchase_items(tx, &input.purchase_lines).await?;

        let now = Utc::now();
        let voucher = Voucher {
            id: voucher_id,
            company_id: actor.company_id,
            voucher_no: voucher_no.clone(),
            voucher_date: input.voucher_date,
            voucher_type: input.voucher_type,
            status: VoucherStatus::Draft,
            project_id: input.project_id,
            vendor_id: input.vendor_id,
            narration: input.narration.clone(),
            created_by: actor.user_id,
            created_at: now,
            submitted_by: None,
            submitted_at: None,
            approved_by: None,
            approved_at: None,
            posted_by: None,
            posted_at: None,
            reversed_by_voucher_id: None,
            reverses_voucher_id: None,
            updated_at: now,
        };
        let lines = to_ledger_lines(voucher_id, &input.lines);
        let purchase_lines = to_purchase_lines(voucher_id, &input.purchase_lines);

        tx.insert_voucher(&voucher, &lines, &purchase_lines)
            .await
            .map_err(|err| number_collision(err, &voucher_no, sequence))?;

        let allocations = if input.allocations.is_empty() {
            Vec::new()
        } else {
            record_allocations(tx, actor, &voucher, &lines, &input.allocations).await?
        };

        Ok((
            VoucherDocument {
                voucher,
                lines,
                purchase_lines,
            },
            allocations,
        ))
    }

    /// A voucher with its lines.
    ///
    /// # Errors
    ///
    /// Returns `VoucherNotFound`.
    pub async fn get_voucher(
        &self,
        actor: &Actor,
        id: VoucherId,
    ) -> EngineResult<VoucherDocument> {
        self.authorize(actor, Resource::Voucher, Capability::Read)?;

        let mut tx = self.begin(actor).await?;
        let result = load_document(&mut tx, id).await;
        Self::finish(tx, result).await
    }

    /// Replace the lines of a draft voucher.
    ///
    /// # Errors
    ///
    /// Returns `NotEditable` unless the voucher is in draft.
    pub async fn replace_lines(
        &self,
        actor: &Actor,
        id: VoucherId,
        draft: DraftLines,
    ) -> EngineResult<VoucherDocument> {
        self.authorize(actor, Resource::Voucher, Capability::Write)?;

        let mut tx = self.begin(actor).await?;
        let result = Self::replace_lines_in(&mut tx, id, &draft).await;
        let (before, after) = Self::finish(tx, result).await?;

        info!(voucher_id = %id, lines = after.lines.len(), "Voucher lines replaced");
        self.audit
            .record(
                AuditRecord::new(
                    actor.company_id,
                    "voucher",
                    id.into_inner(),
                    "update_lines",
                    actor.user_id,
                )
                .with_states(Some(&before), Some(&after)),
            )
            .await;
        Ok(after)
    }

    async fn replace_lines_in(
        tx: &mut S::Tx,
        id: VoucherId,
        draft: &DraftLines,
    ) -> EngineResult<(VoucherDocument, VoucherDocument)> {
        let mut voucher = tx
            .lock_voucher(id)
            .await?
            .ok_or(LedgerError::VoucherNotFound(id))?;
        if !voucher.status.is_editable() {
            return Err(LedgerError::NotEditable {
                status: voucher.status,
            }
            .into());
        }
        check_draft_content(voucher.voucher_type, &draft.lines, &draft.purchase_lines)?;
        check_postable_accounts(tx, &draft.lines).await?;
        check_purchase_items(tx, &draft.purchase_lines).await?;

        let before = VoucherDocument {
            voucher: voucher.clone(),
            lines: tx.voucher_lines(id).await?,
            purchase_lines: tx.purchase_lines(id).await?,
        };

        let lines = to_ledger_lines(id, &draft.lines);
        let purchase_lines = to_purchase_lines(id, &draft.purchase_lines);
        if voucher.voucher_type == VoucherType::Payment {
            verify_payment_allocations(tx, &voucher, &lines, false).await?;
        }

        tx.replace_lines(id, &lines, &purchase_lines).await?;
        voucher.updated_at = Utc::now();
        tx.update_voucher(&voucher).await?;

        Ok((
            before,
            VoucherDocument {
                voucher,
                lines,
                purchase_lines,
            },
        ))
    }

    /// DRAFT → SUBMITTED. The voucher must balance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` or a balance error.
    pub async fn submit(&self, actor: &Actor, id: VoucherId) -> EngineResult<Voucher> {
        self.authorize(actor, Resource::Voucher, VoucherAction::Submit.required_capability())?;

        let mut tx = self.begin(actor).await?;
        let result = Self::submit_in(&mut tx, actor, id).await;
        let (before, after) = Self::finish(tx, result).await?;

        self.after_transition(actor, VoucherAction::Submit, &before, &after, Vec::new())
            .await;
        Ok(after)
    }

    async fn submit_in(
        tx: &mut S::Tx,
        actor: &Actor,
        id: VoucherId,
    ) -> EngineResult<(Voucher, Voucher)> {
        let before = lock_existing(tx, id).await?;
        let transition = VoucherStateMachine::submit(before.status, actor.user_id)?;
        validate_balance(&tx.voucher_lines(id).await?)?;

        let after = stamped(&before, &transition);
        tx.update_voucher(&after).await?;
        Ok((before, after))
    }

    /// SUBMITTED → APPROVED.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` or `PermissionDenied`.
    pub async fn approve(&self, actor: &Actor, id: VoucherId) -> EngineResult<Voucher> {
        self.authorize(actor, Resource::Voucher, VoucherAction::Approve.required_capability())?;

        let mut tx = self.begin(actor).await?;
        let result = Self::approve_in(&mut tx, actor, id).await;
        let (before, after) = Self::finish(tx, result).await?;

        self.after_transition(actor, VoucherAction::Approve, &before, &after, Vec::new())
            .await;
        Ok(after)
    }

    async fn approve_in(
        tx: &mut S::Tx,
        actor: &Actor,
        id: VoucherId,
    ) -> EngineResult<(Voucher, Voucher)> {
        let before = lock_existing(tx, id).await?;
        let transition = VoucherStateMachine::approve(before.status, actor.user_id)?;

        let after = stamped(&before, &transition);
        tx.update_voucher(&after).await?;
        Ok((before, after))
    }

    /// Post a voucher to the ledger.
    ///
    /// Re-validates balance and accounts. A purchase receives its material
    /// lines into stock and a payment re-checks its allocations, all in the
    /// same unit of work: if any step fails nothing is posted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition`, a balance error, or the first stock or
    /// allocation error.
    pub async fn post(&self, actor: &Actor, id: VoucherId) -> EngineResult<Voucher> {
        self.authorize(actor, Resource::Voucher, VoucherAction::Post.required_capability())?;

        let mut tx = self.begin(actor).await?;
        let result = self.post_in(&mut tx, actor, id).await;
        let (before, after, movements) = Self::finish(tx, result).await?;

        self.after_transition(actor, VoucherAction::Post, &before, &after, movements)
            .await;
        Ok(after)
    }

    async fn post_in(
        &self,
        tx: &mut S::Tx,
        actor: &Actor,
        id: VoucherId,
    ) -> EngineResult<(Voucher, Voucher, Vec<StockMovement>)> {
        let before = lock_existing(tx, id).await?;
        let transition = VoucherStateMachine::post(
            before.status,
            before.voucher_type,
            &self.settings.posting,
            actor.user_id,
        )?;

        let lines = tx.voucher_lines(id).await?;
        validate_balance(&lines)?;
        check_postable_accounts(tx, &lines).await?;

        let mut movements = Vec::new();
        match before.voucher_type {
            VoucherType::Purchase => {
                let purchase_lines = tx.purchase_lines(id).await?;
                for receipt in PurchaseBridge::plan_receipts(&before, &purchase_lines) {
                    movements
                        .push(receive_purchase(tx, actor, &receipt, before.voucher_date).await?);
                }
            }
            VoucherType::Payment => {
                verify_payment_allocations(tx, &before, &lines, true).await?;
            }
            VoucherType::Receipt | VoucherType::Journal | VoucherType::Contra => {}
        }

        let after = stamped(&before, &transition);
        tx.update_voucher(&after).await?;
        Ok((before, after, movements))
    }

    /// Reverse a posted voucher.
    ///
    /// Creates a new posted voucher with debit and credit swapped on every
    /// line, dated `reversal_date` or today, and marks the original reversed.
    /// A purchase also issues its receipts back out at their historical cost.
    /// Returns the reversing voucher.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyReversed` on repeat, `LiveAllocations` while payments
    /// are allocated against the voucher, and `NumberingConflict` once the
    /// configured attempts are used up.
    pub async fn reverse(
        &self,
        actor: &Actor,
        id: VoucherId,
        reversal_date: Option<NaiveDate>,
    ) -> EngineResult<VoucherDocument> {
        self.authorize(actor, Resource::Voucher, VoucherAction::Reverse.required_capability())?;

        let date = reversal_date.unwrap_or_else(|| Utc::now().date_naive());
        let attempts = self.settings.numbering_max_attempts;
        let mut floor = 0;
        let mut last_no = String::new();

        for attempt in 1..=attempts {
            let mut tx = self.begin(actor).await?;
            let result = self.reverse_in(&mut tx, actor, id, date, floor).await;
            match Self::finish(tx, result).await {
                Ok(reversal) => {
                    let Reversal {
                        before,
                        after,
                        document,
                        movements,
                    } = reversal;
                    let mut records = movement_audit(actor, &movements, "reverse");
                    records.push(
                        AuditRecord::new(
                            actor.company_id,
                            "voucher",
                            document.voucher.id.into_inner(),
                            "create",
                            actor.user_id,
                        )
                        .with_states(None::<&VoucherDocument>, Some(&document)),
                    );
                    self.after_transition(
                        actor,
                        VoucherAction::Reverse,
                        &before,
                        &after,
                        Vec::new(),
                    )
                    .await;
                    self.audit.record_all(records).await;
                    return Ok(document);
                }
                Err(err) => {
                    let (sequence, voucher_no) = collision_floor(err)?;
                    debug!(
                        voucher_no = %voucher_no,
                        attempt,
                        "Reversal number already taken, retrying"
                    );
                    floor = sequence;
                    last_no = voucher_no;
                }
            }
        }

        Err(NumberingError::Exhausted {
            attempts,
            voucher_no: last_no,
        }
        .into())
    }

    async fn reverse_in(
        &self,
        tx: &mut S::Tx,
        actor: &Actor,
        id: VoucherId,
        date: NaiveDate,
        floor: u32,
    ) -> EngineResult<Reversal> {
        let before = lock_existing(tx, id).await?;
        let transition = VoucherStateMachine::reverse(id, before.status, actor.user_id)?;
        if before.reverses_voucher_id.is_some() {
            return Err(WorkflowError::ReversingVoucher(id).into());
        }
        if !tx.live_allocations_against(id).await?.is_empty() {
            return Err(AllocationError::LiveAllocations(id).into());
        }

        let original_lines = tx.voucher_lines(id).await?;
        let (voucher_no, sequence) = allocate_number(tx, &self.settings, date, floor).await?;
        let output = ReversalService::create_reversal(ReversalInput {
            original: &before,
            original_lines: &original_lines,
            voucher_no: voucher_no.clone(),
            reversal_date: date,
            reversed_by: actor.user_id,
            reversed_at: transition.at,
        });
        tx.insert_voucher(&output.voucher, &output.lines, &[])
            .await
            .map_err(|err| number_collision(err, &voucher_no, sequence))?;

        let mut movements = Vec::new();
        if before.voucher_type == VoucherType::Purchase {
            let receipts = tx.movements_for_voucher(id).await?;
            for planned in PurchaseBridge::plan_reversals(&before, &receipts)? {
                let tags = MovementTags {
                    project_id: before.project_id,
                    vendor_id: before.vendor_id,
                    voucher_id: Some(output.voucher.id),
                    purchase_line_id: planned.purchase_line_id,
                    note: None,
                };
                movements.push(reverse_purchase_receipt(tx, actor, &planned, tags, date).await?);
            }
        }

        let mut after = stamped(&before, &transition);
        after.reversed_by_voucher_id = Some(output.voucher.id);
        tx.update_voucher(&after).await?;

        Ok(Reversal {
            before,
            after,
            document: VoucherDocument {
                voucher: output.voucher,
                lines: output.lines,
                purchase_lines: Vec::new(),
            },
            movements,
        })
    }

    async fn after_transition(
        &self,
        actor: &Actor,
        action: VoucherAction,
        before: &Voucher,
        after: &Voucher,
        movements: Vec<StockMovement>,
    ) {
        info!(
            voucher_id = %after.id,
            voucher_no = %after.voucher_no,
            action = %action,
            from = %before.status,
            to = %after.status,
            movements = movements.len(),
            "Voucher transition applied"
        );
        let mut records = vec![
            AuditRecord::new(
                actor.company_id,
                "voucher",
                after.id.into_inner(),
                action.as_str(),
                actor.user_id,
            )
            .with_states(Some(before), Some(after)),
        ];
        records.extend(movement_audit(actor, &movements, "receive"));
        self.audit.record_all(records).await;
    }
}

/// Stateless checks on draft content.
fn check_draft_content(
    voucher_type: VoucherType,
    lines: &[LineInput],
    purchase_lines: &[PurchaseLineInput],
) -> EngineResult<()> {
    validate_line_shapes(lines)?;
    if !purchase_lines.is_empty() && voucher_type != VoucherType::Purchase {
        return Err(LedgerError::UnexpectedPurchaseLines.into());
    }
    PurchaseBridge::validate_lines(purchase_lines)?;
    Ok(())
}

async fn check_purchase_items<T: UnitOfWork>(
    tx: &mut T,
    purchase_lines: &[PurchaseLineInput],
) -> EngineResult<()> {
    for line in purchase_lines {
        if let Some(item_id) = line.stock_item_id {
            active_item(tx, item_id).await?;
        }
    }
    Ok(())
}

async fn lock_existing<T: UnitOfWork>(tx: &mut T, id: VoucherId) -> EngineResult<Voucher> {
    tx.lock_voucher(id)
        .await?
        .ok_or_else(|| LedgerError::VoucherNotFound(id).into())
}

async fn load_document<T: UnitOfWork>(
    tx: &mut T,
    id: VoucherId,
) -> EngineResult<VoucherDocument> {
    let voucher = tx
        .find_voucher(id)
        .await?
        .ok_or(LedgerError::VoucherNotFound(id))?;
    Ok(VoucherDocument {
        voucher,
        lines: tx.voucher_lines(id).await?,
        purchase_lines: tx.purchase_lines(id).await?,
    })
}

/// The voucher after `transition`, with the matching actor and timestamp set.
fn stamped(voucher: &Voucher, transition: &Transition) -> Voucher {
    let mut next = voucher.clone();
    next.status = transition.to;
    next.updated_at = transition.at;
    match transition.action {
        VoucherAction::Submit => {
            next.submitted_by = Some(transition.actor);
            next.submitted_at = Some(transition.at);
        }
        VoucherAction::Approve => {
            next.approved_by = Some(transition.actor);
            next.approved_at = Some(transition.at);
        }
        VoucherAction::Post => {
            next.posted_by = Some(transition.actor);
            next.posted_at = Some(transition.at);
        }
        VoucherAction::Reverse => {}
    }
    next
}

fn to_ledger_lines(voucher_id: VoucherId, inputs: &[LineInput]) -> Vec<LedgerLine> {
    inputs
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, line)| line.into_line(voucher_id, position(index)))
        .collect()
}

fn to_purchase_lines(voucher_id: VoucherId, inputs: &[PurchaseLineInput]) -> Vec<PurchaseLine> {
    inputs
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, line)| line.into_line(voucher_id, position(index)))
        .collect()
}
