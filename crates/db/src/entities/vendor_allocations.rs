//! `SeaORM` Entity for vendor_allocations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "vendor_allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub vendor_id: Uuid,
    pub payment_voucher_id: Uuid,
    pub source_line_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub created_by: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vendors::Entity",
        from = "Column::VendorId",
        to = "super::vendors::Column::Id"
    )]
    Vendors,
    #[sea_orm(
        belongs_to = "super::ledger_lines::Entity",
        from = "Column::SourceLineId",
        to = "super::ledger_lines::Column::Id"
    )]
    SourceLine,
    #[sea_orm(
        belongs_to = "super::vouchers::Entity",
        from = "Column::PaymentVoucherId",
        to = "super::vouchers::Column::Id"
    )]
    PaymentVoucher,
}

impl Related<super::vendors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendors.def()
    }
}

impl Related<super::ledger_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SourceLine.def()
    }
}

impl Related<super::vouchers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentVoucher.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
