//! In-memory store.
//!
//! Units of work are fully serialized: `begin` takes the store mutex and holds
//! it until commit or rollback, and writes go to a private copy of the state
//! that replaces the shared state on commit. That gives the same guarantees the
//! PostgreSQL store gets from row locks, at the cost of no parallelism.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex};

use async_trait::async_trait;
use girder_shared::types::{
    AccountId, CompanyId, StockItemId, StockMovementId, VendorId, VoucherId,
};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    ACCOUNT_CODE_CONSTRAINT, LedgerRepository, PayablesRepository, StockRepository, Store,
    StoreError, StoreResult, UnitOfWork, VOUCHER_NO_CONSTRAINT,
};
use crate::inventory::{StockBalance, StockItem, StockMovement};
use crate::ledger::{Account, LedgerLine, Voucher};
use crate::numbering::PeriodKey;
use crate::payables::{PayableLine, Vendor, VendorAllocation};
use crate::purchase::PurchaseLine;
use crate::workflow::VoucherStatus;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    accounts: HashMap<AccountId, Account>,
    vouchers: HashMap<VoucherId, Voucher>,
    lines: HashMap<VoucherId, Vec<LedgerLine>>,
    purchase_lines: HashMap<VoucherId, Vec<PurchaseLine>>,
    counters: HashMap<(CompanyId, PeriodKey), u32>,
    stock_items: HashMap<StockItemId, StockItem>,
    balances: HashMap<(CompanyId, StockItemId), StockBalance>,
    movements: Vec<StockMovement>,
    vendors: HashMap<VendorId, Vendor>,
    allocations: Vec<VendorAllocation>,
}

#[derive(Debug, Default)]
struct Faults {
    movement_inserts_left: Option<usize>,
}

/// Serializing in-memory [`Store`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<SyncMutex<Faults>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every stock movement insert fail once `successful` more have gone through.
    pub fn fail_movement_inserts_after(&self, successful: usize) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.movement_inserts_left = Some(successful);
        }
    }

    /// Remove injected failures.
    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.movement_inserts_left = None;
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self, company_id: CompanyId) -> StoreResult<MemoryTx> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx {
            guard,
            working,
            company_id,
            faults: Arc::clone(&self.faults),
        })
    }
}

/// Unit of work of a [`MemoryStore`].
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    company_id: CompanyId,
    faults: Arc<SyncMutex<Faults>>,
}

impl std::fmt::Debug for MemoryTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTx")
            .field("company_id", &self.company_id)
            .finish_non_exhaustive()
    }
}

impl MemoryTx {
    fn owns_voucher(&self, id: VoucherId) -> Option<&Voucher> {
        self.working
            .vouchers
            .get(&id)
            .filter(|v| v.company_id == self.company_id)
    }

    fn is_live_payment(&self, payment: VoucherId) -> bool {
        self.working
            .vouchers
            .get(&payment)
            .is_some_and(|v| v.status != VoucherStatus::Reversed)
    }
}

#[async_trait]
impl LedgerRepository for MemoryTx {
    async fn find_account(&mut self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self
            .working
            .accounts
            .get(&id)
            .filter(|a| a.company_id == self.company_id)
            .cloned())
    }

    async fn insert_account(&mut self, account: &Account) -> StoreResult<()> {
        let duplicate = self
            .working
            .accounts
            .values()
            .any(|a| a.company_id == account.company_id && a.code == account.code);
        if duplicate {
            return Err(StoreError::UniqueViolation {
                constraint: ACCOUNT_CODE_CONSTRAINT.to_string(),
            });
        }
        self.working.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update_account(&mut self, account: &Account) -> StoreResult<()> {
        self.working.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn account_has_posted_lines(&mut self, id: AccountId) -> StoreResult<bool> {
        let state = &self.working;
        Ok(state.lines.iter().any(|(voucher_id, lines)| {
            state
                .vouchers
                .get(voucher_id)
                .is_some_and(|v| v.status.is_immutable())
                && lines.iter().any(|l| l.account_id == id)
        }))
    }

    async fn next_voucher_sequence(&mut self, period: PeriodKey, floor: u32) -> StoreResult<u32> {
        let counter = self
            .working
            .counters
            .entry((self.company_id, period))
            .or_insert(0);
        *counter = (*counter).max(floor) + 1;
        Ok(*counter)
    }

    async fn insert_voucher(
        &mut self,
        voucher: &Voucher,
        lines: &[LedgerLine],
        purchase_lines: &[PurchaseLine],
    ) -> StoreResult<()> {
        let duplicate = self.working.vouchers.values().any(|v| {
            v.company_id == voucher.company_id && v.voucher_no == voucher.voucher_no
        });
        if duplicate {
            return Err(StoreError::UniqueViolation {
                constraint: VOUCHER_NO_CONSTRAINT.to_string(),
            });
        }
        self.working.vouchers.insert(voucher.id, voucher.clone());
        self.working.lines.insert(voucher.id, lines.to_vec());
        self.working
            .purchase_lines
            .insert(voucher.id, purchase_lines.to_vec());
        Ok(())
    }

    async fn find_voucher(&mut self, id: VoucherId) -> StoreResult<Option<Voucher>> {
        Ok(self.owns_voucher(id).cloned())
    }

    async fn lock_voucher(&mut self, id: VoucherId) -> StoreResult<Option<Voucher>> {
        Ok(self.owns_voucher(id).cloned())
    }

    async fn update_voucher(&mut self, voucher: &Voucher) -> StoreResult<()> {
        self.working.vouchers.insert(voucher.id, voucher.clone());
        Ok(())
    }

    async fn voucher_lines(&mut self, id: VoucherId) -> StoreResult<Vec<LedgerLine>> {
        if self.owns_voucher(id).is_none() {
            return Ok(Vec::new());
        }
        let mut lines = self.working.lines.get(&id).cloned().unwrap_or_default();
        lines.sort_by_key(|l| l.position);
        Ok(lines)
    }

    async fn purchase_lines(&mut self, id: VoucherId) -> StoreResult<Vec<PurchaseLine>> {
        if self.owns_voucher(id).is_none() {
            return Ok(Vec::new());
        }
        let mut lines = self
            .working
            .purchase_lines
            .get(&id)
            .cloned()
            .unwrap_or_default();
        lines.sort_by_key(|l| l.position);
        Ok(lines)
    }

    async fn replace_lines(
        &mut self,
        id: VoucherId,
        lines: &[LedgerLine],
        purchase_lines: &[PurchaseLine],
    ) -> StoreResult<()> {
        self.working.lines.insert(id, lines.to_vec());
        self.working.purchase_lines.insert(id, purchase_lines.to_vec());
        Ok(())
    }
}

#[async_trait]
impl StockRepository for MemoryTx {
    async fn find_stock_item(&mut self, id: StockItemId) -> StoreResult<Option<StockItem>> {
        Ok(self
            .working
            .stock_items
            .get(&id)
            .filter(|i| i.company_id == self.company_id)
            .cloned())
    }

    async fn insert_stock_item(&mut self, item: &StockItem) -> StoreResult<()> {
        self.working.stock_items.insert(item.id, item.clone());
        Ok(())
    }

    async fn list_stock_items(&mut self) -> StoreResult<Vec<StockItem>> {
        let mut items: Vec<StockItem> = self
            .working
            .stock_items
            .values()
            .filter(|i| i.company_id == self.company_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn find_stock_balance(&mut self, item: StockItemId) -> StoreResult<Option<StockBalance>> {
        Ok(self
            .working
            .balances
            .get(&(self.company_id, item))
            .cloned())
    }

    async fn lock_stock_balance(&mut self, item: StockItemId) -> StoreResult<StockBalance> {
        let company_id = self.company_id;
        Ok(self
            .working
            .balances
            .entry((company_id, item))
            .or_insert_with(|| StockBalance::empty(company_id, item))
            .clone())
    }

    async fn save_stock_balance(&mut self, balance: &StockBalance) -> StoreResult<()> {
        self.working
            .balances
            .insert((balance.company_id, balance.stock_item_id), balance.clone());
        Ok(())
    }

    async fn insert_movement(&mut self, movement: &StockMovement) -> StoreResult<()> {
        {
            let mut faults = self
                .faults
                .lock()
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            match faults.movement_inserts_left {
                Some(0) => {
                    return Err(StoreError::Backend(
                        "injected stock movement failure".to_string(),
                    ));
                }
                Some(ref mut left) => *left -= 1,
                None => {}
            }
        }
        self.working.movements.push(movement.clone());
        Ok(())
    }

    async fn find_movement(&mut self, id: StockMovementId) -> StoreResult<Option<StockMovement>> {
        Ok(self
            .working
            .movements
            .iter()
            .find(|m| m.id == id && m.company_id == self.company_id)
            .cloned())
    }

    async fn find_reversal_of(
        &mut self,
        id: StockMovementId,
    ) -> StoreResult<Option<StockMovement>> {
        Ok(self
            .working
            .movements
            .iter()
            .find(|m| m.reverses_movement_id == Some(id) && m.company_id == self.company_id)
            .cloned())
    }

    async fn movements_for_voucher(&mut self, id: VoucherId) -> StoreResult<Vec<StockMovement>> {
        Ok(self
            .working
            .movements
            .iter()
            .filter(|m| m.tags.voucher_id == Some(id) && m.company_id == self.company_id)
            .cloned()
            .collect())
    }

    async fn movements_for_item(&mut self, item: StockItemId) -> StoreResult<Vec<StockMovement>> {
        Ok(self
            .working
            .movements
            .iter()
            .filter(|m| m.stock_item_id == item && m.company_id == self.company_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PayablesRepository for MemoryTx {
    async fn find_vendor(&mut self, id: VendorId) -> StoreResult<Option<Vendor>> {
        Ok(self
            .working
            .vendors
            .get(&id)
            .filter(|v| v.company_id == self.company_id)
            .cloned())
    }

    async fn insert_vendor(&mut self, vendor: &Vendor) -> StoreResult<()> {
        self.working.vendors.insert(vendor.id, vendor.clone());
        Ok(())
    }

    async fn lock_vendor(&mut self, id: VendorId) -> StoreResult<Option<Vendor>> {
        self.find_vendor(id).await
    }

    async fn posted_payable_lines(&mut self, vendor: &Vendor) -> StoreResult<Vec<PayableLine>> {
        let state = &self.working;
        let mut payable = Vec::new();
        for voucher in state.vouchers.values().filter(|v| {
            v.company_id == vendor.company_id
                && v.status == VoucherStatus::Posted
                && v.reverses_voucher_id.is_none()
        }) {
            let Some(lines) = state.lines.get(&voucher.id) else {
                continue;
            };
            payable.extend(
                lines
                    .iter()
                    .filter(|l| {
                        l.account_id == vendor.payable_account_id
                            && l.credit > Decimal::ZERO
                            && l.tags.vendor_id == Some(vendor.id)
                    })
                    .map(|l| PayableLine {
                        line_id: l.id,
                        voucher_id: voucher.id,
                        voucher_no: voucher.voucher_no.clone(),
                        voucher_date: voucher.voucher_date,
                        position: l.position,
                        amount: l.credit,
                    }),
            );
        }
        Ok(payable)
    }

    async fn live_allocations(&mut self, vendor: VendorId) -> StoreResult<Vec<VendorAllocation>> {
        Ok(self
            .working
            .allocations
            .iter()
            .filter(|a| {
                a.vendor_id == vendor
                    && a.company_id == self.company_id
                    && self.is_live_payment(a.payment_voucher_id)
            })
            .cloned()
            .collect())
    }

    async fn allocations_for_payment(
        &mut self,
        payment: VoucherId,
    ) -> StoreResult<Vec<VendorAllocation>> {
        Ok(self
            .working
            .allocations
            .iter()
            .filter(|a| a.payment_voucher_id == payment && a.company_id == self.company_id)
            .cloned()
            .collect())
    }

    async fn live_allocations_against(
        &mut self,
        voucher: VoucherId,
    ) -> StoreResult<Vec<VendorAllocation>> {
        let Some(lines) = self.working.lines.get(&voucher) else {
            return Ok(Vec::new());
        };
        Ok(self
            .working
            .allocations
            .iter()
            .filter(|a| {
                a.company_id == self.company_id
                    && lines.iter().any(|l| l.id == a.source_line_id)
                    && self.is_live_payment(a.payment_voucher_id)
            })
            .cloned()
            .collect())
    }

    async fn insert_allocation(&mut self, allocation: &VendorAllocation) -> StoreResult<()> {
        self.working.allocations.push(allocation.clone());
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryTx {
    fn company_id(&self) -> CompanyId {
        self.company_id
    }

    async fn commit(mut self) -> StoreResult<()> {
        *self.guard = std::mem::take(&mut self.working);
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AccountType;
    use chrono::{NaiveDate, Utc};

    fn account(company_id: CompanyId, code: &str) -> Account {
        Account {
            id: AccountId::new(),
            company_id,
            code: code.to_string(),
            name: format!("Account {code}"),
            account_type: AccountType::Asset,
            is_system: true,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = MemoryStore::new();
        let company = CompanyId::new();
        let cash = account(company, "1010");

        let mut tx = store.begin(company).await.unwrap();
        tx.insert_account(&cash).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin(company).await.unwrap();
        assert_eq!(tx.find_account(cash.id).await.unwrap(), Some(cash));
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = MemoryStore::new();
        let company = CompanyId::new();
        let cash = account(company, "1010");

        let mut tx = store.begin(company).await.unwrap();
        tx.insert_account(&cash).await.unwrap();
        tx.rollback().await.unwrap();

        let mut tx = store.begin(company).await.unwrap();
        assert_eq!(tx.find_account(cash.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_dropped_tx_discards_writes() {
        let store = MemoryStore::new();
        let company = CompanyId::new();
        let cash = account(company, "1010");

        {
            let mut tx = store.begin(company).await.unwrap();
            tx.insert_account(&cash).await.unwrap();
        }

        let mut tx = store.begin(company).await.unwrap();
        assert_eq!(tx.find_account(cash.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reads_are_company_scoped() {
        let store = MemoryStore::new();
        let company = CompanyId::new();
        let cash = account(company, "1010");

        let mut tx = store.begin(company).await.unwrap();
        tx.insert_account(&cash).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin(CompanyId::new()).await.unwrap();
        assert_eq!(tx.find_account(cash.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_account_code_rejected() {
        let store = MemoryStore::new();
        let company = CompanyId::new();

        let mut tx = store.begin(company).await.unwrap();
        tx.insert_account(&account(company, "1010")).await.unwrap();
        let err = tx.insert_account(&account(company, "1010")).await.unwrap_err();
        assert!(err.is_unique_violation_of(ACCOUNT_CODE_CONSTRAINT));

        // Same code in another company is fine.
        tx.insert_account(&account(CompanyId::new(), "1010"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_counter_respects_floor() {
        let store = MemoryStore::new();
        let company = CompanyId::new();
        let period = PeriodKey::from_date(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());

        let mut tx = store.begin(company).await.unwrap();
        assert_eq!(tx.next_voucher_sequence(period, 0).await.unwrap(), 1);
        assert_eq!(tx.next_voucher_sequence(period, 0).await.unwrap(), 2);
        assert_eq!(tx.next_voucher_sequence(period, 7).await.unwrap(), 8);
        assert_eq!(tx.next_voucher_sequence(period, 3).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_lock_stock_balance_creates_empty_row() {
        let store = MemoryStore::new();
        let company = CompanyId::new();
        let item = StockItemId::new();

        let mut tx = store.begin(company).await.unwrap();
        assert!(tx.find_stock_balance(item).await.unwrap().is_none());
        let balance = tx.lock_stock_balance(item).await.unwrap();
        assert_eq!(balance.position.qty, Decimal::ZERO);
        assert!(tx.find_stock_balance(item).await.unwrap().is_some());
    }
}
