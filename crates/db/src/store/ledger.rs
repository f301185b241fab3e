use async_trait::async_trait;
use girder_core::ledger::{Account, LedgerLine, Voucher};
use girder_core::numbering::PeriodKey;
use girder_core::purchase::PurchaseLine;
use girder_core::store::{LedgerRepository, StoreError, StoreResult};
use girder_core::workflow::VoucherStatus;
use girder_shared::types::{AccountId, VoucherId};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Statement,
};

use super::{PgTx, convert, store_error};
use crate::entities::{accounts, ledger_lines, purchase_lines, vouchers};

/// Raises the period counter past both its current value and the caller's floor.
const NEXT_SEQUENCE_SQL: &str = r"
INSERT INTO voucher_counters (company_id, year, month, last_value)
VALUES ($1, $2, $3, $4 + 1)
ON CONFLICT (company_id, year, month)
DO UPDATE SET last_value = GREATEST(voucher_counters.last_value, $4) + 1
RETURNING last_value
";

fn out_of_range(what: &str) -> StoreError {
    StoreError::Backend(format!("{what} out of range"))
}

impl PgTx {
    async fn insert_lines(
        &self,
        lines: &[LedgerLine],
        purchases: &[PurchaseLine],
    ) -> StoreResult<()> {
        let company_id = self.company_id;
        if !lines.is_empty() {
            ledger_lines::Entity::insert_many(
                lines
                    .iter()
                    .map(|line| convert::ledger_line_model(company_id, line)),
            )
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        }
        if !purchases.is_empty() {
            purchase_lines::Entity::insert_many(
                purchases
                    .iter()
                    .map(|line| convert::purchase_line_model(company_id, line)),
            )
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerRepository for PgTx {
    async fn find_account(&mut self, id: AccountId) -> StoreResult<Option<Account>> {
        accounts::Entity::find_by_id(id.into_inner())
            .filter(accounts::Column::CompanyId.eq(self.company()))
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(convert::account)
            .transpose()
    }

    async fn insert_account(&mut self, account: &Account) -> StoreResult<()> {
        accounts::Entity::insert(convert::account_model(account))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn update_account(&mut self, account: &Account) -> StoreResult<()> {
        accounts::Entity::update(convert::account_model(account))
            .filter(accounts::Column::CompanyId.eq(self.company()))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn account_has_posted_lines(&mut self, id: AccountId) -> StoreResult<bool> {
        let count = ledger_lines::Entity::find()
            .inner_join(vouchers::Entity)
            .filter(ledger_lines::Column::CompanyId.eq(self.company()))
            .filter(ledger_lines::Column::AccountId.eq(id.into_inner()))
            .filter(vouchers::Column::Status.is_in([
                VoucherStatus::Posted.as_str(),
                VoucherStatus::Reversed.as_str(),
            ]))
            .count(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(count > 0)
    }

    async fn next_voucher_sequence(&mut self, period: PeriodKey, floor: u32) -> StoreResult<u32> {
        let month = i32::try_from(period.month()).map_err(|_| out_of_range("month"))?;
        let floor = i32::try_from(floor).map_err(|_| out_of_range("sequence floor"))?;
        let statement = Statement::from_sql_and_values(
            DbBackend::Postgres,
            NEXT_SEQUENCE_SQL,
            [
                self.company().into(),
                period.year().into(),
                month.into(),
                floor.into(),
            ],
        );
        let row = self
            .txn
            .query_one(statement)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::Backend("voucher counter returned no row".to_string()))?;
        let last_value: i32 = row.try_get("", "last_value").map_err(store_error)?;
        u32::try_from(last_value).map_err(|_| out_of_range("voucher sequence"))
    }

    async fn insert_voucher(
        &mut self,
        voucher: &Voucher,
        lines: &[LedgerLine],
        purchases: &[PurchaseLine],
    ) -> StoreResult<()> {
        vouchers::Entity::insert(convert::voucher_model(voucher))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        self.insert_lines(lines, purchases).await
    }

    async fn find_voucher(&mut self, id: VoucherId) -> StoreResult<Option<Voucher>> {
        vouchers::Entity::find_by_id(id.into_inner())
            .filter(vouchers::Column::CompanyId.eq(self.company()))
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(convert::voucher)
            .transpose()
    }

    async fn lock_voucher(&mut self, id: VoucherId) -> StoreResult<Option<Voucher>> {
        vouchers::Entity::find_by_id(id.into_inner())
            .filter(vouchers::Column::CompanyId.eq(self.company()))
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(convert::voucher)
            .transpose()
    }

    async fn update_voucher(&mut self, voucher: &Voucher) -> StoreResult<()> {
        vouchers::Entity::update(convert::voucher_model(voucher))
            .filter(vouchers::Column::CompanyId.eq(self.company()))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn voucher_lines(&mut self, id: VoucherId) -> StoreResult<Vec<LedgerLine>> {
        ledger_lines::Entity::find()
            .filter(ledger_lines::Column::CompanyId.eq(self.company()))
            .filter(ledger_lines::Column::VoucherId.eq(id.into_inner()))
            .order_by_asc(ledger_lines::Column::Position)
            .all(&self.txn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(convert::ledger_line)
            .collect()
    }

    async fn purchase_lines(&mut self, id: VoucherId) -> StoreResult<Vec<PurchaseLine>> {
        purchase_lines::Entity::find()
            .filter(purchase_lines::Column::CompanyId.eq(self.company()))
            .filter(purchase_lines::Column::VoucherId.eq(id.into_inner()))
            .order_by_asc(purchase_lines::Column::Position)
            .all(&self.txn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(convert::purchase_line)
            .collect()
    }

    async fn replace_lines(
        &mut self,
        id: VoucherId,
        lines: &[LedgerLine],
        purchases: &[PurchaseLine],
    ) -> StoreResult<()> {
        ledger_lines::Entity::delete_many()
            .filter(ledger_lines::Column::CompanyId.eq(self.company()))
            .filter(ledger_lines::Column::VoucherId.eq(id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        purchase_lines::Entity::delete_many()
            .filter(purchase_lines::Column::CompanyId.eq(self.company()))
            .filter(purchase_lines::Column::VoucherId.eq(id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        self.insert_lines(lines, purchases).await
    }
}
