use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    db::{self, DbPool},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        payable::{self, PayableKind, PayableStatus},
        payable_item, phase, production_entry, worker,
    },
    money,
    services::{
        audit::{AuditEntry, AuditTrail},
        Outcome,
    },
};

const PAYABLES: &str = "payables";
const ITEMS: &str = "payable_items";

/// Sets the payable amount to the sum of its items, when it has any.
async fn refresh_amount<C: ConnectionTrait>(
    conn: &C,
    payable: payable::Model,
) -> Result<payable::Model, ServiceError> {
    let items = payable_item::Entity::find()
        .filter(payable_item::Column::PayableId.eq(payable.id))
        .all(conn)
        .await?;
    if items.is_empty() {
        return Ok(payable);
    }

    let amount = money::round_money(items.iter().map(|item| item.value).sum());
    if amount == payable.amount {
        return Ok(payable);
    }
    let mut active: payable::ActiveModel = payable.into();
    active.amount = Set(amount);
    Ok(active.update(conn).await?)
}

/// Money owed to workers: weekly pay, extras and per-phase contracts
#[derive(Clone)]
pub struct PayableService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    audit: Arc<AuditTrail>,
}

impl PayableService {
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
    pub async fn get_payable(&self, payable_id: i32) -> Result<payable::Model, ServiceError> {
        payable::Entity::find_by_id(payable_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payable {} not found", payable_id)))
    }

    /// Creates a payable. WEEKLY payables pull in one item per production
    /// entry of the reference window; items that fail to insert become warnings.
    #[instrument(skip(self))]
    pub async fn create_payable(
        &self,
        input: CreatePayableInput,
    ) -> Result<Outcome<payable::Model>, ServiceError> {
        input.validate()?;
        if input.reference_start > input.reference_end {
            return Err(ServiceError::ValidationError(format!(
                "reference_start {} is after reference_end {}",
                input.reference_start, input.reference_end
            )));
        }
        if input.kind == PayableKind::PerPhase
            && (input.phase_id.is_none() || input.worker_id.is_none())
        {
            return Err(ServiceError::ValidationError(
                "per-phase payables need both a phase and a worker".to_string(),
            ));
        }
        if let Some(phase_id) = input.phase_id {
            phase::Entity::find_by_id(phase_id)
                .one(&*self.db_pool)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Phase {} not found", phase_id)))?;
        }
        if let Some(worker_id) = input.worker_id {
            worker::Entity::find_by_id(worker_id)
                .one(&*self.db_pool)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Worker {} not found", worker_id)))?;
        }

        let created = payable::ActiveModel {
            kind: Set(input.kind),
            reference_start: Set(input.reference_start),
            reference_end: Set(input.reference_end),
            phase_id: Set(input.phase_id),
            worker_id: Set(input.worker_id),
            amount: Set(money::round_money(input.amount.unwrap_or_default())),
            status: Set(PayableStatus::Pending),
            observation: Set(input.observation),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;
        self.audit
            .record(AuditEntry::insert(PAYABLES, created.id, &created))
            .await;

        let (payable, items, warnings) = if created.kind == PayableKind::Weekly {
            self.populate_weekly_items(created).await?
        } else {
            (created, 0, Vec::new())
        };

        self.event_sender
            .send_or_log(Event::PayableCreated {
                payable_id: payable.id,
                items,
                failed_items: warnings.len(),
            })
            .await;
        info!(payable_id = payable.id, kind = %payable.kind, items, failed = warnings.len(), "Created payable");
        Ok(Outcome::with_warnings(payable, warnings))
    }

    async fn populate_weekly_items(
        &self,
        payable: payable::Model,
    ) -> Result<(payable::Model, usize, Vec<String>), ServiceError> {
        let entries = production_entry::Entity::find()
            .filter(production_entry::Column::Date.gte(payable.reference_start))
            .filter(production_entry::Column::Date.lte(payable.reference_end))
            .order_by_asc(production_entry::Column::Date)
            .order_by_asc(production_entry::Column::Id)
            .all(&*self.db_pool)
            .await?;

        let mut inserted = 0usize;
        let mut warnings = Vec::new();
        for entry in entries {
            let result = payable_item::ActiveModel {
                payable_id: Set(payable.id),
                production_entry_id: Set(entry.id),
                value: Set(entry.final_value),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&*self.db_pool)
            .await;

            match result {
                Ok(item) => {
                    inserted += 1;
                    self.audit.record(AuditEntry::insert(ITEMS, item.id, &item)).await;
                }
                Err(e) => {
                    warn!(payable_id = payable.id, entry_id = entry.id, error = %e, "Failed to add payable item");
                    warnings.push(format!(
                        "production entry {} was not added: {}",
                        entry.id, e
                    ));
                }
            }
        }

        let payable = match refresh_amount(&*self.db_pool, payable.clone()).await {
            Ok(updated) => updated,
            Err(e) => {
                warn!(payable_id = payable.id, error = %e, "Failed to refresh payable amount");
                warnings.push(format!("amount of payable {} was not refreshed: {}", payable.id, e));
                payable
            }
        };
        Ok((payable, inserted, warnings))
    }

    /// PENDING → PAID (stamps `paid_date` if absent) or PENDING → CANCELED.
    #[instrument(skip(self))]
    pub async fn set_payable_status(
        &self,
        payable_id: i32,
        new_status: PayableStatus,
        paid_date: Option<NaiveDate>,
    ) -> Result<payable::Model, ServiceError> {
        let current = self.get_payable(payable_id).await?;
        let old_status = current.status;
        if !old_status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Payable {} cannot move from {} to {}",
                payable_id, old_status, new_status
            )));
        }

        let stamped = paid_date
            .or(current.paid_date)
            .unwrap_or_else(|| Utc::now().date_naive());
        let mut active: payable::ActiveModel = current.into();
        active.status = Set(new_status);
        if new_status == PayableStatus::Paid {
            active.paid_date = Set(Some(stamped));
        }
        let updated = active.update(&*self.db_pool).await?;

        self.audit
            .record(AuditEntry::status_change(PAYABLES, payable_id, old_status, new_status))
            .await;
        self.event_sender
            .send_or_log(Event::PayableStatusChanged {
                payable_id,
                new_status,
            })
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn update_payable(
        &self,
        payable_id: i32,
        input: UpdatePayableInput,
    ) -> Result<payable::Model, ServiceError> {
        input.validate()?;
        let before = self.get_payable(payable_id).await?;
        let reference_start = input.reference_start.unwrap_or(before.reference_start);
        let reference_end = input.reference_end.unwrap_or(before.reference_end);
        if reference_start > reference_end {
            return Err(ServiceError::ValidationError(format!(
                "reference_start {} is after reference_end {}",
                reference_start, reference_end
            )));
        }

        let mut active: payable::ActiveModel = before.clone().into();
        active.reference_start = Set(reference_start);
        active.reference_end = Set(reference_end);
        if let Some(amount) = input.amount {
            active.amount = Set(money::round_money(amount));
        }
        if let Some(observation) = input.observation {
            active.observation = Set(Some(observation));
        }
        let updated = active.update(&*self.db_pool).await?;
        let updated = refresh_amount(&*self.db_pool, updated).await?;

        self.audit
            .record(AuditEntry::update(PAYABLES, payable_id, &before, &updated))
            .await;
        Ok(updated)
    }

    /// Deletes a payable together with its items.
    #[instrument(skip(self))]
    pub async fn delete_payable(&self, payable_id: i32) -> Result<(), ServiceError> {
        let payable = self.get_payable(payable_id).await?;
        payable.clone().delete(&*self.db_pool).await?;
        self.audit
            .record(AuditEntry::delete(PAYABLES, payable_id, &payable))
            .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_payables(
        &self,
        filter: PayableFilter,
    ) -> Result<Vec<payable::Model>, ServiceError> {
        let mut query = payable::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(payable::Column::Status.eq(status));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(payable::Column::Kind.eq(kind));
        }
        if let Some(worker_id) = filter.worker_id {
            query = query.filter(payable::Column::WorkerId.eq(worker_id));
        }

        let payables = query
            .order_by_desc(payable::Column::ReferenceStart)
            .order_by_desc(payable::Column::Id)
            .all(&*self.db_pool)
            .await?;
        Ok(payables)
    }

    #[instrument(skip(self))]
    pub async fn list_payable_items(
        &self,
        payable_id: i32,
    ) -> Result<Vec<payable_item::Model>, ServiceError> {
        let items = payable_item::Entity::find()
            .filter(payable_item::Column::PayableId.eq(payable_id))
            .order_by_asc(payable_item::Column::Id)
            .all(&*self.db_pool)
            .await?;
        Ok(items)
    }

    /// Adds an item to a pending payable and re-sums the payable amount.
    #[instrument(skip(self))]
    pub async fn add_payable_item(
        &self,
        input: AddPayableItemInput,
    ) -> Result<payable_item::Model, ServiceError> {
        input.validate()?;
        let payable = self.get_payable(input.payable_id).await?;
        if payable.status != PayableStatus::Pending {
            return Err(ServiceError::PreconditionFailed(format!(
                "Payable {} is {}",
                payable.id, payable.status
            )));
        }
        production_entry::Entity::find_by_id(input.production_entry_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Production entry {} not found",
                    input.production_entry_id
                ))
            })?;

        let item = db::with_transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let item = payable_item::ActiveModel {
                    payable_id: Set(payable.id),
                    production_entry_id: Set(input.production_entry_id),
                    value: Set(money::round_money(input.value)),
                    observation: Set(input.observation),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
                refresh_amount(txn, payable).await?;
                Ok(item)
            })
        })
        .await?;

        self.audit.record(AuditEntry::insert(ITEMS, item.id, &item)).await;
        Ok(item)
    }

    #[instrument(skip(self))]
    pub async fn delete_payable_item(&self, item_id: i32) -> Result<payable::Model, ServiceError> {
        let item = payable_item::Entity::find_by_id(item_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payable item {} not found", item_id)))?;
        let payable = self.get_payable(item.payable_id).await?;

        let removed = item.clone();
        let payable = db::with_transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                removed.delete(txn).await?;
                refresh_amount(txn, payable).await
            })
        })
        .await?;

        self.audit.record(AuditEntry::delete(ITEMS, item_id, &item)).await;
        Ok(payable)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreatePayableInput {
    pub kind: PayableKind,
    pub reference_start: NaiveDate,
    pub reference_end: NaiveDate,
    pub phase_id: Option<i32>,
    pub worker_id: Option<i32>,
    #[validate(custom = "crate::services::non_negative")]
    pub amount: Option<Decimal>,
    pub observation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdatePayableInput {
    pub reference_start: Option<NaiveDate>,
    pub reference_end: Option<NaiveDate>,
    #[validate(custom = "crate::services::non_negative")]
    pub amount: Option<Decimal>,
    pub observation: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AddPayableItemInput {
    pub payable_id: i32,
    pub production_entry_id: i32,
    #[validate(custom = "crate::services::non_negative")]
    pub value: Decimal,
    pub observation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayableFilter {
    pub status: Option<PayableStatus>,
    pub kind: Option<PayableKind>,
    pub worker_id: Option<i32>,
}
