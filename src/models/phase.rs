use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

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
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "DONE")]
    Done,
    #[sea_orm(string_value = "CANCELED")]
    Canceled,
}

impl PhaseStatus {
    pub fn can_transition_to(self, to: PhaseStatus) -> bool {
        use PhaseStatus::*;
        matches!(
            (self, to),
            (Pending, InProgress) | (InProgress, Done) | (Pending, Canceled) | (InProgress, Canceled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PhaseStatus::Done | PhaseStatus::Canceled)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "phases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub job_site_id: i32,
    pub quote_id: i32,
    pub name: String,
    pub sort_order: i32,
    pub status: PhaseStatus,
    pub phase_amount: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quote::Entity",
        from = "Column::QuoteId",
        to = "super::quote::Column::Id"
    )]
    Quote,
    #[sea_orm(has_many = "super::phase_service_line::Entity")]
    ServiceLines,
    #[sea_orm(has_many = "super::receivable::Entity")]
    Receivables,
}

impl Related<super::quote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quote.def()
    }
}

impl Related<super::phase_service_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceLines.def()
    }
}

impl Related<super::receivable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receivables.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::PhaseStatus::*;

    #[test]
    fn phases_move_forward_only() {
        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Done));
        assert!(!Pending.can_transition_to(Done));
        assert!(!Done.can_transition_to(InProgress));
    }

    #[test]
    fn done_phases_cannot_be_canceled() {
        assert!(!Done.can_transition_to(Canceled));
        assert!(InProgress.can_transition_to(Canceled));
    }
}
