use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set,
};
use sea_orm::sea_query::JoinType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        phase, quote,
        receivable::{self, ReceivableStatus},
    },
    money::{self, DiscountShare},
    services::audit::{AuditEntry, AuditTrail},
};

const ENTITY: &str = "receivables";

/// Money owed by clients, one row per billed phase
#[derive(Clone)]
pub struct ReceivableService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    audit: Arc<AuditTrail>,
}

impl ReceivableService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        audit: Arc<AuditTrail>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            audit,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_receivable(&self, receivable_id: i32) -> Result<receivable::Model, ServiceError> {
        receivable::Entity::find_by_id(receivable_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Receivable {} not found", receivable_id)))
    }

    #[instrument(skip(self))]
    pub async fn create_receivable(
        &self,
        input: CreateReceivableInput,
    ) -> Result<receivable::Model, ServiceError> {
        input.validate()?;
        phase::Entity::find_by_id(input.phase_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Phase {} not found", input.phase_id)))?;

        let created = receivable::ActiveModel {
            phase_id: Set(input.phase_id),
            amount: Set(money::round_money(input.amount)),
            due_date: Set(input.due_date),
            status: Set(ReceivableStatus::Open),
            observation: Set(input.observation),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        self.audit
            .record(AuditEntry::insert(ENTITY, created.id, &created))
            .await;
        info!(receivable_id = created.id, phase_id = created.phase_id, amount = %created.amount, "Created receivable");
        Ok(created)
    }

    /// Applies a status change; paying stamps `paid_date` (given, else today).
    #[instrument(skip(self))]
    pub async fn set_receivable_status(
        &self,
        receivable_id: i32,
        new_status: ReceivableStatus,
        paid_date: Option<NaiveDate>,
    ) -> Result<receivable::Model, ServiceError> {
        let current = self.get_receivable(receivable_id).await?;
        let old_status = current.status;
        if !old_status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Receivable {} cannot move from {} to {}",
                receivable_id, old_status, new_status
            )));
        }

        let mut active: receivable::ActiveModel = current.into();
        active.status = Set(new_status);
        if new_status == ReceivableStatus::Paid {
            active.paid_date = Set(Some(paid_date.unwrap_or_else(|| Utc::now().date_naive())));
        }
        let updated = active.update(&*self.db_pool).await?;

        self.audit
            .record(AuditEntry::status_change(ENTITY, receivable_id, old_status, new_status))
            .await;
        self.event_sender
            .send_or_log(Event::ReceivableStatusChanged {
                receivable_id,
                new_status,
            })
            .await;
        Ok(updated)
    }

    /// Marks every OPEN receivable due before `as_of` as OVERDUE.
    #[instrument(skip(self))]
    pub async fn flag_overdue_receivables(
        &self,
        as_of: NaiveDate,
    ) -> Result<Vec<receivable::Model>, ServiceError> {
        let late = receivable::Entity::find()
            .filter(receivable::Column::Status.eq(ReceivableStatus::Open))
            .filter(receivable::Column::DueDate.lt(as_of))
            .order_by_asc(receivable::Column::DueDate)
            .all(&*self.db_pool)
            .await?;

        let mut flagged = Vec::with_capacity(late.len());
        for receivable in late {
            let id = receivable.id;
            let mut active: receivable::ActiveModel = receivable.into();
            active.status = Set(ReceivableStatus::Overdue);
            flagged.push(active.update(&*self.db_pool).await?);
            self.audit
                .record(AuditEntry::status_change(
                    ENTITY,
                    id,
                    ReceivableStatus::Open,
                    ReceivableStatus::Overdue,
                ))
                .await;
        }

        info!(count = flagged.len(), %as_of, "Flagged overdue receivables");
        Ok(flagged)
    }

    #[instrument(skip(self))]
    pub async fn update_receivable(
        &self,
        receivable_id: i32,
        input: UpdateReceivableInput,
    ) -> Result<receivable::Model, ServiceError> {
        input.validate()?;
        let before = self.get_receivable(receivable_id).await?;
        let mut active: receivable::ActiveModel = before.clone().into();

        if let Some(amount) = input.amount {
            active.amount = Set(money::round_money(amount));
        }
        if let Some(due_date) = input.due_date {
            active.due_date = Set(due_date);
        }
        if let Some(observation) = input.observation {
            active.observation = Set(Some(observation));
        }

        let updated = active.update(&*self.db_pool).await?;
        self.audit
            .record(AuditEntry::update(ENTITY, receivable_id, &before, &updated))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_receivable(&self, receivable_id: i32) -> Result<(), ServiceError> {
        let receivable = self.get_receivable(receivable_id).await?;
        receivable.clone().delete(&*self.db_pool).await?;
        self.audit
            .record(AuditEntry::delete(ENTITY, receivable_id, &receivable))
            .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_receivables(
        &self,
        filter: ReceivableFilter,
    ) -> Result<Vec<receivable::Model>, ServiceError> {
        let mut query = receivable::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(receivable::Column::Status.eq(status));
        }
        if let Some(phase_id) = filter.phase_id {
            query = query.filter(receivable::Column::PhaseId.eq(phase_id));
        }
        if let Some(from) = filter.due_from {
            query = query.filter(receivable::Column::DueDate.gte(from));
        }
        if let Some(to) = filter.due_to {
            query = query.filter(receivable::Column::DueDate.lte(to));
        }

        let receivables = query
            .order_by_asc(receivable::Column::DueDate)
            .order_by_asc(receivable::Column::Id)
            .all(&*self.db_pool)
            .await?;
        Ok(receivables)
    }

    /// Receivables of every phase of a quote.
    #[instrument(skip(self))]
    pub async fn receivables_for_quote(
        &self,
        quote_id: i32,
    ) -> Result<Vec<receivable::Model>, ServiceError> {
        let receivables = receivable::Entity::find()
            .join(JoinType::InnerJoin, receivable::Relation::Phase.def())
            .filter(phase::Column::QuoteId.eq(quote_id))
            .order_by_asc(receivable::Column::DueDate)
            .order_by_asc(receivable::Column::Id)
            .all(&*self.db_pool)
            .await?;
        Ok(receivables)
    }

    /// Splits the quote discount over the phases that have not been billed yet.
    #[instrument(skip(self))]
    pub async fn discount_proration_for_quote(
        &self,
        quote_id: i32,
    ) -> Result<Vec<DiscountShare>, ServiceError> {
        let quote = quote::Entity::find_by_id(quote_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Quote {} not found", quote_id)))?;

        let phases = phase::Entity::find()
            .filter(phase::Column::QuoteId.eq(quote_id))
            .order_by_asc(phase::Column::SortOrder)
            .order_by_asc(phase::Column::Id)
            .all(&*self.db_pool)
            .await?;
        let billed: HashSet<i32> = self
            .receivables_for_quote(quote_id)
            .await?
            .into_iter()
            .map(|r| r.phase_id)
            .collect();

        let unbilled: Vec<(i32, i32)> = phases
            .iter()
            .filter(|p| !billed.contains(&p.id))
            .map(|p| (p.id, p.sort_order))
            .collect();
        Ok(money::prorate_discount(quote.discount_amount, &unbilled))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateReceivableInput {
    pub phase_id: i32,
    #[validate(custom = "crate::services::non_negative")]
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub observation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateReceivableInput {
    #[validate(custom = "crate::services::non_negative")]
    pub amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub observation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceivableFilter {
    pub status: Option<ReceivableStatus>,
    pub phase_id: Option<i32>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
}
