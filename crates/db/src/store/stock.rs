use async_trait::async_trait;
use girder_core::inventory::{StockBalance, StockItem, StockMovement};
use girder_core::store::{StockRepository, StoreError, StoreResult};
use girder_shared::types::{StockItemId, StockMovementId, VoucherId};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Statement,
};

use super::{PgTx, convert, store_error};
use crate::entities::{stock_balances, stock_items, stock_movements};

/// Creates the empty balance row so there is always something to lock.
const ENSURE_BALANCE_SQL: &str = r"
INSERT INTO stock_balances (company_id, stock_item_id, qty, avg_cost, updated_at)
VALUES ($1, $2, 0, 0, NOW())
ON CONFLICT (company_id, stock_item_id) DO NOTHING
";

#[async_trait]
impl StockRepository for PgTx {
    async fn find_stock_item(&mut self, id: StockItemId) -> StoreResult<Option<StockItem>> {
        Ok(stock_items::Entity::find_by_id(id.into_inner())
            .filter(stock_items::Column::CompanyId.eq(self.company()))
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(convert::stock_item))
    }

    async fn insert_stock_item(&mut self, item: &StockItem) -> StoreResult<()> {
        stock_items::Entity::insert(convert::stock_item_model(item))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn list_stock_items(&mut self) -> StoreResult<Vec<StockItem>> {
        Ok(stock_items::Entity::find()
            .filter(stock_items::Column::CompanyId.eq(self.company()))
            .order_by_asc(stock_items::Column::Name)
            .all(&self.txn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(convert::stock_item)
            .collect())
    }

    async fn find_stock_balance(&mut self, item: StockItemId) -> StoreResult<Option<StockBalance>> {
        Ok(
            stock_balances::Entity::find_by_id((self.company(), item.into_inner()))
                .one(&self.txn)
                .await
                .map_err(store_error)?
                .map(convert::stock_balance),
        )
    }

    async fn lock_stock_balance(&mut self, item: StockItemId) -> StoreResult<StockBalance> {
        self.txn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                ENSURE_BALANCE_SQL,
                [self.company().into(), item.into_inner().into()],
            ))
            .await
            .map_err(store_error)?;

        stock_balances::Entity::find_by_id((self.company(), item.into_inner()))
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(convert::stock_balance)
            .ok_or_else(|| StoreError::Backend(format!("stock balance for {item} vanished")))
    }

    async fn save_stock_balance(&mut self, balance: &StockBalance) -> StoreResult<()> {
        stock_balances::Entity::insert(convert::stock_balance_model(balance))
            .on_conflict(
                OnConflict::columns([
                    stock_balances::Column::CompanyId,
                    stock_balances::Column::StockItemId,
                ])
                .update_columns([
                    stock_balances::Column::Qty,
                    stock_balances::Column::AvgCost,
                    stock_balances::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn insert_movement(&mut self, movement: &StockMovement) -> StoreResult<()> {
        stock_movements::Entity::insert(convert::stock_movement_model(movement))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn find_movement(&mut self, id: StockMovementId) -> StoreResult<Option<StockMovement>> {
        stock_movements::Entity::find_by_id(id.into_inner())
            .filter(stock_movements::Column::CompanyId.eq(self.company()))
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(convert::stock_movement)
            .transpose()
    }

    async fn find_reversal_of(
        &mut self,
        id: StockMovementId,
    ) -> StoreResult<Option<StockMovement>> {
        stock_movements::Entity::find()
            .filter(stock_movements::Column::CompanyId.eq(self.company()))
            .filter(stock_movements::Column::ReversesMovementId.eq(id.into_inner()))
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(convert::stock_movement)
            .transpose()
    }

    async fn movements_for_voucher(&mut self, id: VoucherId) -> StoreResult<Vec<StockMovement>> {
        stock_movements::Entity::find()
            .filter(stock_movements::Column::CompanyId.eq(self.company()))
            .filter(stock_movements::Column::VoucherId.eq(id.into_inner()))
            .order_by_asc(stock_movements::Column::Seq)
            .all(&self.txn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(convert::stock_movement)
            .collect()
    }

    async fn movements_for_item(&mut self, item: StockItemId) -> StoreResult<Vec<StockMovement>> {
        stock_movements::Entity::find()
            .filter(stock_movements::Column::CompanyId.eq(self.company()))
            .filter(stock_movements::Column::StockItemId.eq(item.into_inner()))
            .order_by_asc(stock_movements::Column::Seq)
            .all(&self.txn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(convert::stock_movement)
            .collect()
    }
}
