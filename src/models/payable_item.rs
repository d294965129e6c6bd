use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payable_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub payable_id: i32,
    pub production_entry_id: i32,
    pub value: Decimal,
    pub observation: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payable::Entity",
        from = "Column::PayableId",
        to = "super::payable::Column::Id"
    )]
    Payable,
    #[sea_orm(
        belongs_to = "super::production_entry::Entity",
        from = "Column::ProductionEntryId",
        to = "super::production_entry::Column::Id"
    )]
    ProductionEntry,
}

impl Related<super::payable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payable.def()
    }
}

impl Related<super::production_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
