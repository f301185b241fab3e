//! `SeaORM` Entity for vendors table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "vendors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub payable_account_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::PayableAccountId",
        to = "super::accounts::Column::Id"
    )]
    PayableAccount,
    #[sea_orm(has_many = "super::vendor_allocations::Entity")]
    VendorAllocations,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayableAccount.def()
    }
}

impl Related<super::vendor_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VendorAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
