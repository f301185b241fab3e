//! Master data: accounts, vendors and stock items.

use chrono::Utc;
use girder_shared::types::{AccountId, QUANTITY_SCALE, StockItemId, VendorId};
use rust_decimal::Decimal;
use tracing::info;

use super::{EngineResult, LedgerEngine};
use crate::audit::AuditRecord;
use crate::inventory::{CostingEngine, NewStockItem, StockError, StockItem};
use crate::ledger::{Account, AccountType, AccountUpdate, LedgerError, NewAccount};
use crate::payables::{NewVendor, Vendor};
use crate::store::{
    ACCOUNT_CODE_CONSTRAINT, LedgerRepository, PayablesRepository, StockRepository, Store,
};
use crate::workflow::{Actor, Capability, Resource};

impl<S: Store> LedgerEngine<S> {
    /// Create an account in the actor's company.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAccountCode` if the code is taken.
    pub async fn create_account(&self, actor: &Actor, input: NewAccount) -> EngineResult<Account> {
        self.authorize(actor, Resource::MasterData, Capability::Write)?;

        let account = Account {
            id: AccountId::new(),
            company_id: actor.company_id,
            code: input.code.trim().to_string(),
            name: input.name,
            account_type: input.account_type,
            is_system: input.is_system,
            is_active: true,
            created_at: Utc::now(),
        };

        let mut tx = self.begin(actor).await?;
        let result: EngineResult<()> =
            tx.insert_account(&account).await.map_err(|err| {
                if err.is_unique_violation_of(ACCOUNT_CODE_CONSTRAINT) {
                    LedgerError::DuplicateAccountCode(account.code.clone()).into()
                } else {
                    err.into()
                }
            });
        Self::finish(tx, result).await?;

        info!(account_id = %account.id, code = %account.code, "Account created");
        self.audit
            .record(
                AuditRecord::new(
                    actor.company_id,
                    "account",
                    account.id.into_inner(),
                    "create",
                    actor.user_id,
                )
                .with_states(None::<&Account>, Some(&account)),
            )
            .await;
        Ok(account)
    }

    /// Rename, retype or (de)activate an account.
    ///
    /// Once a posted line references the account only `is_active` may change.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `AccountImmutable`.
    pub async fn update_account(
        &self,
        actor: &Actor,
        id: AccountId,
        update: AccountUpdate,
    ) -> EngineResult<Account> {
        self.authorize(actor, Resource::MasterData, Capability::Write)?;

        let mut tx = self.begin(actor).await?;
        let result = Self::update_account_in(&mut tx, id, update).await;
        let (before, after) = Self::finish(tx, result).await?;

        info!(account_id = %id, "Account updated");
        self.audit
            .record(
                AuditRecord::new(
                    actor.company_id,
                    "account",
                    id.into_inner(),
                    "update",
                    actor.user_id,
                )
                .with_states(Some(&before), Some(&after)),
            )
            .await;
        Ok(after)
    }

    async fn update_account_in(
        tx: &mut S::Tx,
        id: AccountId,
        update: AccountUpdate,
    ) -> EngineResult<(Account, Account)> {
        let before = tx
            .find_account(id)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))?;

        let renames = update.name.as_ref().is_some_and(|name| *name != before.name);
        let retypes = update
            .account_type
            .is_some_and(|account_type| account_type != before.account_type);
        if (renames || retypes) && tx.account_has_posted_lines(id).await? {
            return Err(LedgerError::AccountImmutable(id).into());
        }

        let mut after = before.clone();
        if let Some(name) = update.name {
            after.name = name;
        }
        if let Some(account_type) = update.account_type {
            after.account_type = account_type;
        }
        if let Some(is_active) = update.is_active {
            after.is_active = is_active;
        }
        tx.update_account(&after).await?;
        Ok((before, after))
    }

    /// Create a vendor whose bills are credited to a liability account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `NotPayableAccount`.
    pub async fn create_vendor(&self, actor: &Actor, input: NewVendor) -> EngineResult<Vendor> {
        self.authorize(actor, Resource::MasterData, Capability::Write)?;

        let vendor = Vendor {
            id: VendorId::new(),
            company_id: actor.company_id,
            name: input.name,
            payable_account_id: input.payable_account_id,
            is_active: true,
            created_at: Utc::now(),
        };

        let mut tx = self.begin(actor).await?;
        let result = Self::create_vendor_in(&mut tx, &vendor).await;
        Self::finish(tx, result).await?;

        info!(vendor_id = %vendor.id, "Vendor created");
        self.audit
            .record(
                AuditRecord::new(
                    actor.company_id,
                    "vendor",
                    vendor.id.into_inner(),
                    "create",
                    actor.user_id,
                )
                .with_states(None::<&Vendor>, Some(&vendor)),
            )
            .await;
        Ok(vendor)
    }

    async fn create_vendor_in(tx: &mut S::Tx, vendor: &Vendor) -> EngineResult<()> {
        let account_id = vendor.payable_account_id;
        let account = tx
            .find_account(account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        if account.account_type != AccountType::Liability || !account.accepts_postings() {
            return Err(LedgerError::NotPayableAccount(account_id).into());
        }
        tx.insert_vendor(vendor).await?;
        Ok(())
    }

    /// Create a stock item.
    ///
    /// # Errors
    ///
    /// Returns an input error for a negative or over-precise reorder level.
    pub async fn create_stock_item(
        &self,
        actor: &Actor,
        input: NewStockItem,
    ) -> EngineResult<StockItem> {
        self.authorize(actor, Resource::MasterData, Capability::Write)?;

        if input.reorder_level < Decimal::ZERO {
            return Err(StockError::NegativeQuantity(input.reorder_level).into());
        }
        CostingEngine::check_scale("reorder level", input.reorder_level, QUANTITY_SCALE)?;

        let item = StockItem {
            id: StockItemId::new(),
            company_id: actor.company_id,
            name: input.name,
            unit: input.unit,
            reorder_level: input.reorder_level,
            is_active: true,
            created_at: Utc::now(),
        };

        let mut tx = self.begin(actor).await?;
        let result: EngineResult<()> = tx.insert_stock_item(&item).await.map_err(Into::into);
        Self::finish(tx, result).await?;

        info!(stock_item_id = %item.id, name = %item.name, "Stock item created");
        self.audit
            .record(
                AuditRecord::new(
                    actor.company_id,
                    "stock_item",
                    item.id.into_inner(),
                    "create",
                    actor.user_id,
                )
                .with_states(None::<&StockItem>, Some(&item)),
            )
            .await;
        Ok(item)
    }
}
