//! Row ↔ domain conversions.
//!
//! Text columns holding closed enums are parsed here; an unknown value means
//! the row was written by something other than this store and is reported as
//! a backend error.

use girder_core::inventory::{
    MovementKind, MovementTags, MovementType, StockBalance, StockItem, StockMovement,
    StockPosition,
};
use girder_core::ledger::{
    Account, AccountType, LedgerLine, LineTags, PaymentMethod, Voucher, VoucherType,
};
use girder_core::payables::{Vendor, VendorAllocation};
use girder_core::purchase::{PurchaseLine, PurchaseLineKind};
use girder_core::store::{StoreError, StoreResult};
use girder_core::workflow::VoucherStatus;
use girder_shared::types::{
    AccountId, AllocationId, CompanyId, LedgerLineId, ProjectId, PurchaseLineId, StockItemId,
    StockMovementId, UserId, VendorId, VoucherId,
};
use sea_orm::ActiveValue::{NotSet, Set};

use crate::entities::{
    accounts, ledger_lines, purchase_lines, stock_balances, stock_items, stock_movements,
    vendor_allocations, vendors, vouchers,
};

fn parse<T>(column: &str, value: &str, parser: impl Fn(&str) -> Option<T>) -> StoreResult<T> {
    parser(value).ok_or_else(|| StoreError::Backend(format!("unknown {column} '{value}'")))
}

pub(crate) fn position_from_db(position: i32) -> u32 {
    u32::try_from(position).unwrap_or_default()
}

fn position_to_db(position: u32) -> i32 {
    i32::try_from(position).unwrap_or(i32::MAX)
}

// ========== Accounts & vendors ==========

pub(crate) fn account(model: accounts::Model) -> StoreResult<Account> {
    Ok(Account {
        id: AccountId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        account_type: parse("account type", &model.account_type, AccountType::parse)?,
        code: model.code,
        name: model.name,
        is_system: model.is_system,
        is_active: model.is_active,
        created_at: model.created_at,
    })
}

pub(crate) fn account_model(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        company_id: Set(account.company_id.into_inner()),
        code: Set(account.code.clone()),
        name: Set(account.name.clone()),
        account_type: Set(account.account_type.as_str().to_string()),
        is_system: Set(account.is_system),
        is_active: Set(account.is_active),
        created_at: Set(account.created_at),
    }
}

pub(crate) fn vendor(model: vendors::Model) -> Vendor {
    Vendor {
        id: VendorId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        name: model.name,
        payable_account_id: AccountId::from_uuid(model.payable_account_id),
        is_active: model.is_active,
        created_at: model.created_at,
    }
}

pub(crate) fn vendor_model(vendor: &Vendor) -> vendors::ActiveModel {
    vendors::ActiveModel {
        id: Set(vendor.id.into_inner()),
        company_id: Set(vendor.company_id.into_inner()),
        name: Set(vendor.name.clone()),
        payable_account_id: Set(vendor.payable_account_id.into_inner()),
        is_active: Set(vendor.is_active),
        created_at: Set(vendor.created_at),
    }
}

// ========== Vouchers ==========

pub(crate) fn voucher(model: vouchers::Model) -> StoreResult<Voucher> {
    Ok(Voucher {
        id: VoucherId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        voucher_type: parse("voucher type", &model.voucher_type, VoucherType::parse)?,
        status: parse("voucher status", &model.status, VoucherStatus::parse)?,
        voucher_no: model.voucher_no,
        voucher_date: model.voucher_date,
        project_id: model.project_id.map(ProjectId::from_uuid),
        vendor_id: model.vendor_id.map(VendorId::from_uuid),
        narration: model.narration,
        created_by: UserId::from_uuid(model.created_by),
        created_at: model.created_at,
        submitted_by: model.submitted_by.map(UserId::from_uuid),
        submitted_at: model.submitted_at,
        approved_by: model.approved_by.map(UserId::from_uuid),
        approved_at: model.approved_at,
        posted_by: model.posted_by.map(UserId::from_uuid),
        posted_at: model.posted_at,
        reversed_by_voucher_id: model.reversed_by_voucher_id.map(VoucherId::from_uuid),
        reverses_voucher_id: model.reverses_voucher_id.map(VoucherId::from_uuid),
        updated_at: model.updated_at,
    })
}

pub(crate) fn voucher_model(voucher: &Voucher) -> vouchers::ActiveModel {
    vouchers::ActiveModel {
        id: Set(voucher.id.into_inner()),
        company_id: Set(voucher.company_id.into_inner()),
        voucher_no: Set(voucher.voucher_no.clone()),
        voucher_date: Set(voucher.voucher_date),
        voucher_type: Set(voucher.voucher_type.as_str().to_string()),
        status: Set(voucher.status.as_str().to_string()),
        project_id: Set(voucher.project_id.map(ProjectId::into_inner)),
        vendor_id: Set(voucher.vendor_id.map(VendorId::into_inner)),
        narration: Set(voucher.narration.clone()),
        created_by: Set(voucher.created_by.into_inner()),
        created_at: Set(voucher.created_at),
        submitted_by: Set(voucher.submitted_by.map(UserId::into_inner)),
        submitted_at: Set(voucher.submitted_at),
        approved_by: Set(voucher.approved_by.map(UserId::into_inner)),
        approved_at: Set(voucher.approved_at),
        posted_by: Set(voucher.posted_by.map(UserId::into_inner)),
        posted_at: Set(voucher.posted_at),
        reversed_by_voucher_id: Set(voucher.reversed_by_voucher_id.map(VoucherId::into_inner)),
        reverses_voucher_id: Set(voucher.reverses_voucher_id.map(VoucherId::into_inner)),
        updated_at: Set(voucher.updated_at),
    }
}

pub(crate) fn ledger_line(model: ledger_lines::Model) -> StoreResult<LedgerLine> {
    let payment_method = model
        .payment_method
        .as_deref()
        .map(|method| parse("payment method", method, PaymentMethod::parse))
        .transpose()?;
    Ok(LedgerLine {
        id: LedgerLineId::from_uuid(model.id),
        voucher_id: VoucherId::from_uuid(model.voucher_id),
        account_id: AccountId::from_uuid(model.account_id),
        debit: model.debit,
        credit: model.credit,
        tags: LineTags {
            project_id: model.project_id.map(ProjectId::from_uuid),
            vendor_id: model.vendor_id.map(VendorId::from_uuid),
            payment_method,
        },
        narration: model.narration,
        position: position_from_db(model.position),
    })
}

pub(crate) fn ledger_line_model(
    company_id: CompanyId,
    line: &LedgerLine,
) -> ledger_lines::ActiveModel {
    ledger_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        company_id: Set(company_id.into_inner()),
        voucher_id: Set(line.voucher_id.into_inner()),
        account_id: Set(line.account_id.into_inner()),
        debit: Set(line.debit),
        credit: Set(line.credit),
        project_id: Set(line.tags.project_id.map(ProjectId::into_inner)),
        vendor_id: Set(line.tags.vendor_id.map(VendorId::into_inner)),
        payment_method: Set(line.tags.payment_method.map(|m| m.as_str().to_string())),
        narration: Set(line.narration.clone()),
        position: Set(position_to_db(line.position)),
    }
}

pub(crate) fn purchase_line(model: purchase_lines::Model) -> StoreResult<PurchaseLine> {
    Ok(PurchaseLine {
        id: PurchaseLineId::from_uuid(model.id),
        voucher_id: VoucherId::from_uuid(model.voucher_id),
        kind: parse("purchase line kind", &model.kind, PurchaseLineKind::parse)?,
        stock_item_id: model.stock_item_id.map(StockItemId::from_uuid),
        quantity: model.quantity,
        unit_rate: model.unit_rate,
        description: model.description,
        position: position_from_db(model.position),
    })
}

pub(crate) fn purchase_line_model(
    company_id: CompanyId,
    line: &PurchaseLine,
) -> purchase_lines::ActiveModel {
    purchase_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        company_id: Set(company_id.into_inner()),
        voucher_id: Set(line.voucher_id.into_inner()),
        kind: Set(line.kind.as_str().to_string()),
        stock_item_id: Set(line.stock_item_id.map(StockItemId::into_inner)),
        quantity: Set(line.quantity),
        unit_rate: Set(line.unit_rate),
        description: Set(line.description.clone()),
        position: Set(position_to_db(line.position)),
    }
}

// ========== Stock ==========

pub(crate) fn stock_item(model: stock_items::Model) -> StockItem {
    StockItem {
        id: StockItemId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        name: model.name,
        unit: model.unit,
        reorder_level: model.reorder_level,
        is_active: model.is_active,
        created_at: model.created_at,
    }
}

pub(crate) fn stock_item_model(item: &StockItem) -> stock_items::ActiveModel {
    stock_items::ActiveModel {
        id: Set(item.id.into_inner()),
        company_id: Set(item.company_id.into_inner()),
        name: Set(item.name.clone()),
        unit: Set(item.unit.clone()),
        reorder_level: Set(item.reorder_level),
        is_active: Set(item.is_active),
        created_at: Set(item.created_at),
    }
}

pub(crate) fn stock_balance(model: stock_balances::Model) -> StockBalance {
    StockBalance {
        company_id: CompanyId::from_uuid(model.company_id),
        stock_item_id: StockItemId::from_uuid(model.stock_item_id),
        position: StockPosition::new(model.qty, model.avg_cost),
        updated_at: model.updated_at,
    }
}

pub(crate) fn stock_balance_model(balance: &StockBalance) -> stock_balances::ActiveModel {
    stock_balances::ActiveModel {
        company_id: Set(balance.company_id.into_inner()),
        stock_item_id: Set(balance.stock_item_id.into_inner()),
        qty: Set(balance.position.qty),
        avg_cost: Set(balance.position.avg_cost),
        updated_at: Set(balance.updated_at),
    }
}

pub(crate) fn stock_movement(model: stock_movements::Model) -> StoreResult<StockMovement> {
    Ok(StockMovement {
        id: StockMovementId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        stock_item_id: StockItemId::from_uuid(model.stock_item_id),
        movement_type: parse("movement type", &model.movement_type, MovementType::parse)?,
        kind: parse("movement kind", &model.kind, MovementKind::parse)?,
        qty: model.qty,
        unit_cost: model.unit_cost,
        movement_date: model.movement_date,
        tags: MovementTags {
            project_id: model.project_id.map(ProjectId::from_uuid),
            vendor_id: model.vendor_id.map(VendorId::from_uuid),
            voucher_id: model.voucher_id.map(VoucherId::from_uuid),
            purchase_line_id: model.purchase_line_id.map(PurchaseLineId::from_uuid),
            note: model.note,
        },
        transfer_group: model.transfer_group.map(StockMovementId::from_uuid),
        reverses_movement_id: model.reverses_movement_id.map(StockMovementId::from_uuid),
        approved_by: model.approved_by.map(UserId::from_uuid),
        approved_at: model.approved_at,
        created_by: UserId::from_uuid(model.created_by),
        created_at: model.created_at,
        balance_after: StockPosition::new(model.balance_qty, model.balance_avg_cost),
    })
}

pub(crate) fn stock_movement_model(movement: &StockMovement) -> stock_movements::ActiveModel {
    stock_movements::ActiveModel {
        id: Set(movement.id.into_inner()),
        seq: NotSet,
        company_id: Set(movement.company_id.into_inner()),
        stock_item_id: Set(movement.stock_item_id.into_inner()),
        movement_type: Set(movement.movement_type.as_str().to_string()),
        kind: Set(movement.kind.as_str().to_string()),
        qty: Set(movement.qty),
        unit_cost: Set(movement.unit_cost),
        movement_date: Set(movement.movement_date),
        project_id: Set(movement.tags.project_id.map(ProjectId::into_inner)),
        vendor_id: Set(movement.tags.vendor_id.map(VendorId::into_inner)),
        voucher_id: Set(movement.tags.voucher_id.map(VoucherId::into_inner)),
        purchase_line_id: Set(movement.tags.purchase_line_id.map(PurchaseLineId::into_inner)),
        note: Set(movement.tags.note.clone()),
        transfer_group: Set(movement.transfer_group.map(StockMovementId::into_inner)),
        reverses_movement_id: Set(movement.reverses_movement_id.map(StockMovementId::into_inner)),
        approved_by: Set(movement.approved_by.map(UserId::into_inner)),
        approved_at: Set(movement.approved_at),
        created_by: Set(movement.created_by.into_inner()),
        created_at: Set(movement.created_at),
        balance_qty: Set(movement.balance_after.qty),
        balance_avg_cost: Set(movement.balance_after.avg_cost),
    }
}

// ========== Payables ==========

pub(crate) fn allocation(model: vendor_allocations::Model) -> VendorAllocation {
    VendorAllocation {
        id: AllocationId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        vendor_id: VendorId::from_uuid(model.vendor_id),
        payment_voucher_id: VoucherId::from_uuid(model.payment_voucher_id),
        source_line_id: LedgerLineId::from_uuid(model.source_line_id),
        amount: model.amount,
        created_by: UserId::from_uuid(model.created_by),
        created_at: model.created_at,
    }
}

pub(crate) fn allocation_model(allocation: &VendorAllocation) -> vendor_allocations::ActiveModel {
    vendor_allocations::ActiveModel {
        id: Set(allocation.id.into_inner()),
        company_id: Set(allocation.company_id.into_inner()),
        vendor_id: Set(allocation.vendor_id.into_inner()),
        payment_voucher_id: Set(allocation.payment_voucher_id.into_inner()),
        source_line_id: Set(allocation.source_line_id.into_inner()),
        amount: Set(allocation.amount),
        created_by: Set(allocation.created_by.into_inner()),
        created_at: Set(allocation.created_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn voucher_row(status: &str) -> vouchers::Model {
        let now = Utc::now();
        vouchers::Model {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            voucher_no: "V-202501-00001".to_string(),
            voucher_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            voucher_type: "purchase".to_string(),
            status: status.to_string(),
            project_id: None,
            vendor_id: Some(Uuid::new_v4()),
            narration: None,
            created_by: Uuid::new_v4(),
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
        }
    }

    #[test]
    fn test_voucher_row_parses_closed_enums() {
        let parsed = voucher(voucher_row("approved")).unwrap();
        assert_eq!(parsed.status, VoucherStatus::Approved);
        assert_eq!(parsed.voucher_type, VoucherType::Purchase);
    }

    #[test]
    fn test_unknown_status_is_a_backend_error() {
        let err = voucher(voucher_row("archived")).unwrap_err();
        assert!(matches!(err, StoreError::Backend(msg) if msg.contains("archived")));
    }

    #[test]
    fn test_ledger_line_keeps_tags() {
        let vendor = Uuid::new_v4();
        let row = ledger_lines::Model {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            voucher_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            debit: dec!(0),
            credit: dec!(125.5),
            project_id: None,
            vendor_id: Some(vendor),
            payment_method: Some("bank_transfer".to_string()),
            narration: None,
            position: 1,
        };

        let line = ledger_line(row).unwrap();

        assert_eq!(line.tags.vendor_id, Some(VendorId::from_uuid(vendor)));
        assert_eq!(line.tags.payment_method, Some(PaymentMethod::BankTransfer));
        assert_eq!(line.credit, dec!(125.5));
        assert_eq!(line.position, 1);
    }

    #[test]
    fn test_negative_position_reads_as_zero() {
        assert_eq!(position_from_db(-3), 0);
        assert_eq!(position_to_db(u32::MAX), i32::MAX);
    }
}
