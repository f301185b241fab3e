//! The ledger and inventory engine.
//!
//! [`LedgerEngine`] is the only entry point that mutates state. Every public
//! operation follows the same shape:
//!
//! 1. check the actor's capability against the [`AccessPolicy`]
//! 2. open one company-scoped unit of work
//! 3. lock what it changes, validate, and write
//! 4. commit on success, roll back on any error
//! 5. append audit records once the commit has gone through
//!
//! The pure rules live in the domain modules; this module only sequences
//! them against the store.

mod payables;
mod settings;
mod setup;
mod stock;
mod vouchers;


use std::sync::Arc;

use chrono::NaiveDate;
use girder_shared::types::{AccountId, StockItemId, VendorId};
use tracing::warn;

use crate::audit::{AuditSink, AuditTrail, TracingAuditSink};
use crate::error::EngineError;
use crate::inventory::{StockError, StockItem};
use crate::ledger::{LedgerError, LedgerLine, LineInput};
use crate::numbering::{NumberingError, PeriodKey};
use crate::payables::Vendor;
use crate::store::{
    LedgerRepository, PayablesRepository, StockRepository, Store, StoreError, UnitOfWork,
    VOUCHER_NO_CONSTRAINT,
};
use crate::workflow::{AccessPolicy, Actor, Capability, Resource, RoleMatrix};

pub use settings::{DEFAULT_AUDIT_MAX_ATTEMPTS, DEFAULT_NUMBERING_MAX_ATTEMPTS, EngineSettings};

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Transactional engine over a [`Store`].
pub struct LedgerEngine<S: Store> {
    store: S,
    policy: Arc<dyn AccessPolicy>,
    audit: AuditTrail,
    settings: EngineSettings,
}

impl<S: Store> std::fmt::Debug for LedgerEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<S: Store> LedgerEngine<S> {
    /// An engine with default settings, the default role matrix and a tracing audit sink.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_settings(store, EngineSettings::default())
    }

    /// An engine with explicit settings.
    #[must_use]
    pub fn with_settings(store: S, settings: EngineSettings) -> Self {
        Self {
            store,
            policy: Arc::new(RoleMatrix),
            audit: AuditTrail::new(Arc::new(TracingAuditSink), settings.audit_max_attempts),
            settings,
        }
    }

    /// Replaces the access policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = AuditTrail::new(sink, self.settings.audit_max_attempts);
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn authorize(
        &self,
        actor: &Actor,
        resource: Resource,
        capability: Capability,
    ) -> EngineResult<()> {
        actor.require(self.policy.as_ref(), resource, capability)?;
        Ok(())
    }

    async fn begin(&self, actor: &Actor) -> EngineResult<S::Tx> {
        Ok(self.store.begin(actor.company_id).await?)
    }

    /// Commits on success and rolls back on failure.
    async fn finish<T>(tx: S::Tx, result: EngineResult<T>) -> EngineResult<T> {
        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// Allocates the next voucher number for `date`, starting above `floor`.
async fn allocate_number<T: UnitOfWork>(
    tx: &mut T,
    settings: &EngineSettings,
    date: NaiveDate,
    floor: u32,
) -> EngineResult<(String, u32)> {
    let period = PeriodKey::from_date(date);
    let sequence = tx.next_voucher_sequence(period, floor).await?;
    Ok((settings.numbering.format(period, sequence), sequence))
}

/// Maps a voucher-number unique violation to a numbering collision.
fn number_collision(err: StoreError, voucher_no: &str, sequence: u32) -> EngineError {
    if err.is_unique_violation_of(VOUCHER_NO_CONSTRAINT) {
        NumberingError::Collision {
            voucher_no: voucher_no.to_string(),
            sequence,
        }
        .into()
    } else {
        err.into()
    }
}

/// Splits a collision out of `err` so the caller can retry above its sequence.
fn collision_floor(err: EngineError) -> Result<(u32, String), EngineError> {
    match err {
        EngineError::Numbering(NumberingError::Collision {
            voucher_no,
            sequence,
        }) => Ok((sequence, voucher_no)),
        other => Err(other),
    }
}

/// Every line must hit an existing, active posting account.
async fn check_postable_accounts<T, L>(tx: &mut T, lines: &[L]) -> EngineResult<()>
where
    T: UnitOfWork,
    L: AccountRef + Sync,
{
    let mut seen: Vec<AccountId> = Vec::with_capacity(lines.len());
    for line in lines {
        let id = line.account_ref();
        if seen.contains(&id) {
            continue;
        }
        let account = tx
            .find_account(id)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))?;
        if !account.is_active {
            return Err(LedgerError::AccountInactive(id).into());
        }
        if !account.accepts_postings() {
            return Err(LedgerError::AccountNotPostable(id).into());
        }
        seen.push(id);
    }
    Ok(())
}

/// Lines that reference an account.
trait AccountRef {
    fn account_ref(&self) -> AccountId;
}

impl AccountRef for LineInput {
    fn account_ref(&self) -> AccountId {
        self.account_id
    }
}

impl AccountRef for LedgerLine {
    fn account_ref(&self) -> AccountId {
        self.account_id
    }
}

async fn active_vendor<T: UnitOfWork>(tx: &mut T, id: VendorId) -> EngineResult<Vendor> {
    let vendor = tx
        .find_vendor(id)
        .await?
        .ok_or(LedgerError::VendorNotFound(id))?;
    if !vendor.is_active {
        return Err(LedgerError::VendorInactive(id).into());
    }
    Ok(vendor)
}

async fn active_item<T: UnitOfWork>(tx: &mut T, id: StockItemId) -> EngineResult<StockItem> {
    let item = tx
        .find_stock_item(id)
        .await?
        .ok_or(StockError::ItemNotFound(id))?;
    if !item.is_active {
        return Err(StockError::ItemInactive(id).into());
    }
    Ok(item)
}

/// Zero-based index to a stored line position.
fn position(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}
