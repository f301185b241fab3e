use async_trait::async_trait;
use girder_core::payables::{PayableLine, Vendor, VendorAllocation};
use girder_core::store::{PayablesRepository, StoreResult};
use girder_core::workflow::VoucherStatus;
use girder_shared::types::{LedgerLineId, VendorId, VoucherId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Query;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use super::{PgTx, convert, store_error};
use crate::entities::{ledger_lines, vendor_allocations, vendors, vouchers};

#[async_trait]
impl PayablesRepository for PgTx {
    async fn find_vendor(&mut self, id: VendorId) -> StoreResult<Option<Vendor>> {
        Ok(vendors::Entity::find_by_id(id.into_inner())
            .filter(vendors::Column::CompanyId.eq(self.company()))
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(convert::vendor))
    }

    async fn insert_vendor(&mut self, vendor: &Vendor) -> StoreResult<()> {
        vendors::Entity::insert(convert::vendor_model(vendor))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn lock_vendor(&mut self, id: VendorId) -> StoreResult<Option<Vendor>> {
        Ok(vendors::Entity::find_by_id(id.into_inner())
            .filter(vendors::Column::CompanyId.eq(self.company()))
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(convert::vendor))
    }

    async fn posted_payable_lines(&mut self, vendor: &Vendor) -> StoreResult<Vec<PayableLine>> {
        let rows = ledger_lines::Entity::find()
            .find_also_related(vouchers::Entity)
            .filter(ledger_lines::Column::CompanyId.eq(self.company()))
            .filter(ledger_lines::Column::AccountId.eq(vendor.payable_account_id.into_inner()))
            .filter(ledger_lines::Column::VendorId.eq(vendor.id.into_inner()))
            .filter(ledger_lines::Column::Credit.gt(Decimal::ZERO))
            .filter(vouchers::Column::Status.eq(VoucherStatus::Posted.as_str()))
            .filter(vouchers::Column::ReversesVoucherId.is_null())
            .order_by_asc(vouchers::Column::VoucherDate)
            .order_by_asc(vouchers::Column::VoucherNo)
            .order_by_asc(ledger_lines::Column::Position)
            .all(&self.txn)
            .await
            .map_err(store_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|(line, voucher)| {
                voucher.map(|voucher| PayableLine {
                    line_id: LedgerLineId::from_uuid(line.id),
                    voucher_id: VoucherId::from_uuid(voucher.id),
                    voucher_no: voucher.voucher_no,
                    voucher_date: voucher.voucher_date,
                    position: convert::position_from_db(line.position),
                    amount: line.credit,
                })
            })
            .collect())
    }

    async fn live_allocations(&mut self, vendor: VendorId) -> StoreResult<Vec<VendorAllocation>> {
        Ok(vendor_allocations::Entity::find()
            .inner_join(vouchers::Entity)
            .filter(vendor_allocations::Column::CompanyId.eq(self.company()))
            .filter(vendor_allocations::Column::VendorId.eq(vendor.into_inner()))
            .filter(vouchers::Column::Status.ne(VoucherStatus::Reversed.as_str()))
            .order_by_asc(vendor_allocations::Column::CreatedAt)
            .all(&self.txn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(convert::allocation)
            .collect())
    }

    async fn allocations_for_payment(
        &mut self,
        payment: VoucherId,
    ) -> StoreResult<Vec<VendorAllocation>> {
        Ok(vendor_allocations::Entity::find()
            .filter(vendor_allocations::Column::CompanyId.eq(self.company()))
            .filter(vendor_allocations::Column::PaymentVoucherId.eq(payment.into_inner()))
            .order_by_asc(vendor_allocations::Column::CreatedAt)
            .all(&self.txn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(convert::allocation)
            .collect())
    }

    async fn live_allocations_against(
        &mut self,
        voucher: VoucherId,
    ) -> StoreResult<Vec<VendorAllocation>> {
        let source_lines = Query::select()
            .column(ledger_lines::Column::Id)
            .from(ledger_lines::Entity)
            .and_where(ledger_lines::Column::VoucherId.eq(voucher.into_inner()))
            .to_owned();

        Ok(vendor_allocations::Entity::find()
            .inner_join(vouchers::Entity)
            .filter(vendor_allocations::Column::CompanyId.eq(self.company()))
            .filter(vendor_allocations::Column::SourceLineId.in_subquery(source_lines))
            .filter(vouchers::Column::Status.ne(VoucherStatus::Reversed.as_str()))
            .order_by_asc(vendor_allocations::Column::CreatedAt)
            .all(&self.txn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(convert::allocation)
            .collect())
    }

    async fn insert_allocation(&mut self, allocation: &VendorAllocation) -> StoreResult<()> {
        vendor_allocations::Entity::insert(convert::allocation_model(allocation))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
