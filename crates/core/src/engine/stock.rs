//! Stock movements, reversals and stock queries.

use chrono::{NaiveDate, Utc};
use girder_shared::types::{StockItemId, StockMovementId};
use rust_decimal::Decimal;
use tracing::info;

use super::{EngineResult, LedgerEngine, active_item};
use crate::audit::AuditRecord;
use crate::inventory::{
    CostingEngine, LowStockItem, MovementKind, MovementOutcome, MovementRequest, MovementTags,
    MovementType, StockBalance, StockError, StockMovement, StockPosition, StockReconciliation,
};
use crate::purchase::{PlannedReceipt, PlannedReceiptReversal};
use crate::store::{StockRepository, Store, UnitOfWork};
use crate::workflow::{Actor, Capability, Resource};

impl<S: Store> LedgerEngine<S> {
    /// Apply an IN, OUT, ADJUST or TRANSFER movement.
    ///
    /// ADJUST needs approval capability and records the actor as approver.
    /// TRANSFER is written as an OUT leg at the source project and an IN leg
    /// at the destination, both at the current average cost.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientStock` for an over-issue, an input error for a
    /// malformed request, and `PermissionDenied` when the role falls short.
    pub async fn apply_movement(
        &self,
        actor: &Actor,
        request: MovementRequest,
    ) -> EngineResult<MovementOutcome> {
        let capability = match request.movement_type {
            MovementType::Adjust => Capability::Approve,
            _ => Capability::Write,
        };
        self.authorize(actor, Resource::Stock, capability)?;

        let mut tx = self.begin(actor).await?;
        let result = Self::apply_movement_in(&mut tx, actor, &request).await;
        let outcome = Self::finish(tx, result).await?;

        let position = outcome.balance.position;
        info!(
            stock_item_id = %request.stock_item_id,
            movement_type = %request.movement_type,
            qty = %request.qty,
            on_hand = %position.qty,
            avg_cost = %position.avg_cost,
            "Stock movement recorded"
        );
        self.audit
            .record_all(movement_audit(actor, &outcome.movements, request.movement_type.as_str()))
            .await;
        Ok(outcome)
    }

    async fn apply_movement_in(
        tx: &mut S::Tx,
        actor: &Actor,
        request: &MovementRequest,
    ) -> EngineResult<MovementOutcome> {
        let item_id = request.stock_item_id;
        active_item(tx, item_id).await?;

        let kind = request.effective_kind();
        if !kind.fits(request.movement_type) {
            return Err(StockError::KindMismatch {
                kind,
                movement_type: request.movement_type,
            }
            .into());
        }

        let balance = tx.lock_stock_balance(item_id).await?;
        let position = balance.position;
        let base = movement_base(actor, item_id, request.movement_date);

        let movements = match request.movement_type {
            MovementType::In => {
                let unit_cost = request.unit_cost.ok_or(StockError::MissingUnitCost)?;
                let after = CostingEngine::receive(position, request.qty, unit_cost)?;
                vec![StockMovement {
                    movement_type: MovementType::In,
                    kind,
                    qty: request.qty,
                    unit_cost: Some(unit_cost),
                    tags: request.tags.clone(),
                    balance_after: after,
                    ..base
                }]
            }
            MovementType::Out => {
                let after = CostingEngine::issue(item_id, position, request.qty)?;
                vec![StockMovement {
                    movement_type: MovementType::Out,
                    kind,
                    qty: request.qty,
                    unit_cost: Some(position.avg_cost),
                    tags: request.tags.clone(),
                    balance_after: after,
                    ..base
                }]
            }
            MovementType::Adjust => {
                let revalues = request
                    .unit_cost
                    .is_some_and(|cost| cost != position.avg_cost);
                if request.qty == position.qty && !revalues {
                    return Err(StockError::NoOpAdjustment {
                        target: request.qty,
                    }
                    .into());
                }
                let after = CostingEngine::adjust(position, request.qty, request.unit_cost)?;
                vec![StockMovement {
                    movement_type: MovementType::Adjust,
                    kind,
                    qty: request.qty,
                    unit_cost: request.unit_cost,
                    tags: request.tags.clone(),
                    approved_by: Some(actor.user_id),
                    approved_at: Some(base.created_at),
                    balance_after: after,
                    ..base
                }]
            }
            MovementType::Transfer => transfer_legs(request, position, base)?,
        };

        let balance = write_movements(tx, balance, &movements).await?;
        Ok(MovementOutcome { movements, balance })
    }

    /// Compensate a manual IN or OUT movement.
    ///
    /// An IN is taken back out at the cost it was received at; an OUT is
    /// returned at the cost it was issued at. Each movement can be reversed once.
    ///
    /// # Errors
    ///
    /// Returns `NotReversible` for voucher-linked movements, transfer legs,
    /// adjustments and compensating movements, and `AlreadyReversed` on repeat.
    pub async fn reverse_movement(
        &self,
        actor: &Actor,
        movement_id: StockMovementId,
        movement_date: Option<NaiveDate>,
    ) -> EngineResult<MovementOutcome> {
        self.authorize(actor, Resource::Stock, Capability::Reverse)?;

        let mut tx = self.begin(actor).await?;
        let result = Self::reverse_movement_in(&mut tx, actor, movement_id, movement_date).await;
        let outcome = Self::finish(tx, result).await?;

        info!(
            movement_id = %movement_id,
            on_hand = %outcome.balance.position.qty,
            avg_cost = %outcome.balance.position.avg_cost,
            "Stock movement reversed"
        );
        self.audit
            .record_all(movement_audit(actor, &outcome.movements, "reverse"))
            .await;
        Ok(outcome)
    }

    async fn reverse_movement_in(
        tx: &mut S::Tx,
        actor: &Actor,
        movement_id: StockMovementId,
        movement_date: Option<NaiveDate>,
    ) -> EngineResult<MovementOutcome> {
        let original = tx
            .find_movement(movement_id)
            .await?
            .ok_or(StockError::MovementNotFound(movement_id))?;

        let not_reversible = |reason: &'static str| StockError::NotReversible {
            id: movement_id,
            reason,
        };
        if original.tags.voucher_id.is_some() {
            return Err(not_reversible("reverse the voucher it belongs to").into());
        }
        if original.reverses_movement_id.is_some() {
            return Err(not_reversible("it is itself a reversal").into());
        }
        if original.transfer_group.is_some() {
            return Err(not_reversible("transfer legs are not reversed on their own").into());
        }
        if original.movement_type == MovementType::Adjust {
            return Err(not_reversible("record a new count instead").into());
        }
        if tx.find_reversal_of(movement_id).await?.is_some() {
            return Err(StockError::AlreadyReversed(movement_id).into());
        }

        let item_id = original.stock_item_id;
        let balance = tx.lock_stock_balance(item_id).await?;
        let position = balance.position;
        let unit_cost = original.unit_cost.ok_or(StockError::MissingUnitCost)?;
        let date = movement_date.unwrap_or_else(|| Utc::now().date_naive());
        let base = movement_base(actor, item_id, date);

        let compensating = if original.movement_type == MovementType::In {
            StockMovement {
                movement_type: MovementType::Out,
                kind: MovementKind::Return,
                qty: original.qty,
                unit_cost: Some(unit_cost),
                tags: original.tags.clone(),
                reverses_movement_id: Some(original.id),
                balance_after: CostingEngine::reverse_receipt(
                    item_id,
                    position,
                    original.qty,
                    unit_cost,
                )?,
                ..base
            }
        } else {
            StockMovement {
                movement_type: MovementType::In,
                kind: MovementKind::Return,
                qty: original.qty,
                unit_cost: Some(unit_cost),
                tags: original.tags.clone(),
                reverses_movement_id: Some(original.id),
                balance_after: CostingEngine::receive(position, original.qty, unit_cost)?,
                ..base
            }
        };

        let movements = vec![compensating];
        let balance = write_movements(tx, balance, &movements).await?;
        Ok(MovementOutcome { movements, balance })
    }

    /// Current balance of an item; empty if it never moved.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound`.
    pub async fn stock_balance(
        &self,
        actor: &Actor,
        item_id: StockItemId,
    ) -> EngineResult<StockBalance> {
        self.authorize(actor, Resource::Stock, Capability::Read)?;

        let mut tx = self.begin(actor).await?;
        let result = Self::stock_balance_in(&mut tx, actor, item_id).await;
        Self::finish(tx, result).await
    }

    async fn stock_balance_in(
        tx: &mut S::Tx,
        actor: &Actor,
        item_id: StockItemId,
    ) -> EngineResult<StockBalance> {
        tx.find_stock_item(item_id)
            .await?
            .ok_or(StockError::ItemNotFound(item_id))?;
        Ok(tx
            .find_stock_balance(item_id)
            .await?
            .unwrap_or_else(|| StockBalance::empty(actor.company_id, item_id)))
    }

    /// Movement history of an item, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound`.
    pub async fn item_movements(
        &self,
        actor: &Actor,
        item_id: StockItemId,
    ) -> EngineResult<Vec<StockMovement>> {
        self.authorize(actor, Resource::Stock, Capability::Read)?;

        let mut tx = self.begin(actor).await?;
        let result = Self::item_movements_in(&mut tx, item_id).await;
        Self::finish(tx, result).await
    }

    async fn item_movements_in(
        tx: &mut S::Tx,
        item_id: StockItemId,
    ) -> EngineResult<Vec<StockMovement>> {
        tx.find_stock_item(item_id)
            .await?
            .ok_or(StockError::ItemNotFound(item_id))?;
        Ok(tx.movements_for_item(item_id).await?)
    }

    /// Active items whose on-hand quantity is at or below their reorder level.
    ///
    /// # Errors
    ///
    /// Returns store errors only.
    pub async fn low_stock_items(&self, actor: &Actor) -> EngineResult<Vec<LowStockItem>> {
        self.authorize(actor, Resource::Stock, Capability::Read)?;

        let mut tx = self.begin(actor).await?;
        let result = Self::low_stock_items_in(&mut tx).await;
        Self::finish(tx, result).await
    }

    async fn low_stock_items_in(tx: &mut S::Tx) -> EngineResult<Vec<LowStockItem>> {
        let mut low = Vec::new();
        for item in tx.list_stock_items().await? {
            if !item.is_active {
                continue;
            }
            let on_hand = tx
                .find_stock_balance(item.id)
                .await?
                .map_or(Decimal::ZERO, |balance| balance.position.qty);
            if on_hand <= item.reorder_level {
                low.push(LowStockItem { item, on_hand });
            }
        }
        Ok(low)
    }

    /// Compare the stored balance with the replay of the item's movements.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound`, or the costing error of the first movement
    /// that no longer applies.
    pub async fn reconcile_stock_balance(
        &self,
        actor: &Actor,
        item_id: StockItemId,
    ) -> EngineResult<StockReconciliation> {
        self.authorize(actor, Resource::Stock, Capability::Read)?;

        let mut tx = self.begin(actor).await?;
        let result = Self::reconcile_in(&mut tx, actor, item_id).await;
        Self::finish(tx, result).await
    }

    async fn reconcile_in(
        tx: &mut S::Tx,
        actor: &Actor,
        item_id: StockItemId,
    ) -> EngineResult<StockReconciliation> {
        let stored = Self::stock_balance_in(tx, actor, item_id).await?.position;
        let movements = tx.movements_for_item(item_id).await?;
        let replayed = CostingEngine::replay(&movements)?;
        Ok(StockReconciliation { stored, replayed })
    }
}

/// Receive a posted purchase line into stock.
pub(super) async fn receive_purchase<T: UnitOfWork>(
    tx: &mut T,
    actor: &Actor,
    receipt: &PlannedReceipt,
    movement_date: NaiveDate,
) -> EngineResult<StockMovement> {
    active_item(tx, receipt.stock_item_id).await?;

    let balance = tx.lock_stock_balance(receipt.stock_item_id).await?;
    let after = CostingEngine::receive(balance.position, receipt.qty, receipt.unit_cost)?;
    let movement = StockMovement {
        movement_type: MovementType::In,
        kind: MovementKind::Purchase,
        qty: receipt.qty,
        unit_cost: Some(receipt.unit_cost),
        tags: receipt.tags.clone(),
        balance_after: after,
        ..movement_base(actor, receipt.stock_item_id, movement_date)
    };
    write_movements(tx, balance, std::slice::from_ref(&movement)).await?;
    Ok(movement)
}

/// Issue a reversed purchase receipt back out at its historical cost.
pub(super) async fn reverse_purchase_receipt<T: UnitOfWork>(
    tx: &mut T,
    actor: &Actor,
    planned: &PlannedReceiptReversal,
    tags: MovementTags,
    movement_date: NaiveDate,
) -> EngineResult<StockMovement> {
    let balance = tx.lock_stock_balance(planned.stock_item_id).await?;
    let after = CostingEngine::reverse_receipt(
        planned.stock_item_id,
        balance.position,
        planned.qty,
        planned.historical_cost,
    )?;
    let movement = StockMovement {
        movement_type: MovementType::Out,
        kind: MovementKind::PurchaseReversal,
        qty: planned.qty,
        unit_cost: Some(planned.historical_cost),
        tags,
        reverses_movement_id: Some(planned.receipt_id),
        balance_after: after,
        ..movement_base(actor, planned.stock_item_id, movement_date)
    };
    write_movements(tx, balance, std::slice::from_ref(&movement)).await?;
    Ok(movement)
}

/// Audit records for freshly written movements.
pub(super) fn movement_audit(
    actor: &Actor,
    movements: &[StockMovement],
    action: &str,
) -> Vec<AuditRecord> {
    movements
        .iter()
        .map(|movement| {
            AuditRecord::new(
                actor.company_id,
                "stock_movement",
                movement.id.into_inner(),
                action,
                actor.user_id,
            )
            .with_states(None::<&StockMovement>, Some(movement))
        })
        .collect()
}

/// A blank movement recorded by `actor` now; callers fill in the rest.
fn movement_base(
    actor: &Actor,
    stock_item_id: StockItemId,
    movement_date: NaiveDate,
) -> StockMovement {
    StockMovement {
        id: StockMovementId::new(),
        company_id: actor.company_id,
        stock_item_id,
        movement_type: MovementType::In,
        kind: MovementKind::Purchase,
        qty: Decimal::ZERO,
        unit_cost: None,
        movement_date,
        tags: MovementTags::default(),
        transfer_group: None,
        reverses_movement_id: None,
        approved_by: None,
        approved_at: None,
        created_by: actor.user_id,
        created_at: Utc::now(),
        balance_after: StockPosition::default(),
    }
}

fn transfer_legs(
    request: &MovementRequest,
    position: StockPosition,
    base: StockMovement,
) -> EngineResult<Vec<StockMovement>> {
    let (Some(from), Some(to)) = (request.tags.project_id, request.destination_project_id) else {
        return Err(StockError::InvalidTransferProjects.into());
    };
    if from == to {
        return Err(StockError::InvalidTransferProjects.into());
    }

    let legs = CostingEngine::transfer(request.stock_item_id, position, request.qty)?;
    let group = Some(base.id);

    let out_leg = StockMovement {
        movement_type: MovementType::Out,
        kind: MovementKind::Transfer,
        qty: request.qty,
        unit_cost: Some(legs.unit_cost),
        tags: request.tags.clone(),
        transfer_group: group,
        balance_after: legs.after_out,
        ..base.clone()
    };
    let in_leg = StockMovement {
        id: StockMovementId::new(),
        movement_type: MovementType::In,
        kind: MovementKind::Transfer,
        qty: request.qty,
        unit_cost: Some(legs.unit_cost),
        tags: MovementTags {
            project_id: Some(to),
            ..request.tags.clone()
        },
        transfer_group: group,
        balance_after: legs.after_in,
        ..base
    };
    Ok(vec![out_leg, in_leg])
}

/// Append `movements` in order and store the position after the last one.
async fn write_movements<T: UnitOfWork>(
    tx: &mut T,
    mut balance: StockBalance,
    movements: &[StockMovement],
) -> EngineResult<StockBalance> {
    for movement in movements {
        tx.insert_movement(movement).await?;
    }
    if let Some(last) = movements.last() {
        balance.position = last.balance_after;
    }
    balance.updated_at = Utc::now();
    tx.save_stock_balance(&balance).await?;
    Ok(balance)
}
