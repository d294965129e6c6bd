use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Unit of measure a catalog service is priced in.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum ServiceUnit {
    #[sea_orm(string_value = "UN")]
    #[serde(rename = "UN")]
    #[strum(serialize = "UN")]
    Unit,
    #[sea_orm(string_value = "M2")]
    #[serde(rename = "M2")]
    #[strum(serialize = "M2")]
    SquareMeter,
    #[sea_orm(string_value = "ML")]
    #[serde(rename = "ML")]
    #[strum(serialize = "ML")]
    LinearMeter,
    #[sea_orm(string_value = "H")]
    #[serde(rename = "H")]
    #[strum(serialize = "H")]
    Hour,
    #[sea_orm(string_value = "DIA")]
    #[serde(rename = "DIA")]
    #[strum(serialize = "DIA")]
    Day,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_catalog")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub unit: ServiceUnit,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
