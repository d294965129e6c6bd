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
pub enum QuoteStatus {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "ISSUED")]
    Issued,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "CANCELED")]
    Canceled,
}

impl QuoteStatus {
    /// Whether the quote lifecycle allows moving from `self` to `to`.
    pub fn can_transition_to(self, to: QuoteStatus) -> bool {
        use QuoteStatus::*;
        matches!(
            (self, to),
            (Draft, Issued)
                | (Draft, Approved)
                | (Issued, Approved)
                | (Issued, Rejected)
                | (Draft, Canceled)
                | (Issued, Canceled)
                | (Rejected, Canceled)
                | (Approved, Canceled)
        )
    }

    /// Pricing (discount, lines) may only change before a decision is made.
    pub fn is_editable(self) -> bool {
        matches!(self, QuoteStatus::Draft | QuoteStatus::Issued)
    }

    /// Statuses counted as awaiting the client's decision.
    pub fn pending() -> [QuoteStatus; 2] {
        [QuoteStatus::Draft, QuoteStatus::Issued]
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quotes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub job_site_id: i32,
    pub version: i32,
    pub status: QuoteStatus,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    pub valid_until: Option<NaiveDate>,
    pub approved_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub document_ref: Option<String>,
    pub document_issued_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::job_site::Entity",
        from = "Column::JobSiteId",
        to = "super::job_site::Column::Id"
    )]
    JobSite,
    #[sea_orm(has_many = "super::phase::Entity")]
    Phases,
}

impl Related<super::job_site::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobSite.def()
    }
}

impl Related<super::phase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Phases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::QuoteStatus::*;

    #[test]
    fn approval_is_reachable_from_draft_and_issued() {
        assert!(Draft.can_transition_to(Approved));
        assert!(Issued.can_transition_to(Approved));
        assert!(!Rejected.can_transition_to(Approved));
    }

    #[test]
    fn canceled_is_terminal() {
        for to in [Draft, Issued, Approved, Rejected, Canceled] {
            assert!(!Canceled.can_transition_to(to));
        }
    }

    #[test]
    fn rejection_requires_an_issued_quote() {
        assert!(Issued.can_transition_to(Rejected));
        assert!(!Draft.can_transition_to(Rejected));
    }

    #[test]
    fn only_open_quotes_are_editable() {
        assert!(Draft.is_editable());
        assert!(Issued.is_editable());
        assert!(!Approved.is_editable());
        assert!(!Canceled.is_editable());
    }
}
