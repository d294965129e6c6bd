use chrono::{DateTime, NaiveDate, Utc};
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
pub enum ReceivableStatus {
    #[sea_orm(string_value = "OPEN")]
    Open,
    #[sea_orm(string_value = "OVERDUE")]
    Overdue,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "CANCELED")]
    Canceled,
}

impl ReceivableStatus {
    pub fn can_transition_to(self, to: ReceivableStatus) -> bool {
        use ReceivableStatus::*;
        matches!(
            (self, to),
            (Open, Overdue) | (Open, Paid) | (Open, Canceled) | (Overdue, Paid) | (Overdue, Canceled)
        )
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receivables")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub phase_id: i32,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub status: ReceivableStatus,
    pub paid_date: Option<NaiveDate>,
    pub observation: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::phase::Entity",
        from = "Column::PhaseId",
        to = "super::phase::Column::Id"
    )]
    Phase,
}

impl Related<super::phase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Phase.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::ReceivableStatus::*;

    #[test]
    fn overdue_receivables_can_still_be_paid() {
        assert!(Open.can_transition_to(Overdue));
        assert!(Overdue.can_transition_to(Paid));
        assert!(!Overdue.can_transition_to(Open));
    }

    #[test]
    fn settled_receivables_are_terminal() {
        for to in [Open, Overdue, Paid, Canceled] {
            assert!(!Paid.can_transition_to(to));
            assert!(!Canceled.can_transition_to(to));
        }
    }
}
