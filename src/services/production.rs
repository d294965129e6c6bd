use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    config::DayTypeMultipliers,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        phase,
        production_entry::{self, DayType},
        quote::{self, QuoteStatus},
        worker,
    },
    money,
    services::audit::{AuditEntry, AuditTrail},
};

const ENTITY: &str = "production_entries";

/// Computed money columns of a production entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductionValues {
    pub gross_value: Decimal,
    pub final_value: Decimal,
}

impl ProductionValues {
    pub fn compute(
        multipliers: &DayTypeMultipliers,
        day_type: DayType,
        base_value: Decimal,
        discount_value: Decimal,
    ) -> Self {
        let gross_value = money::gross_value(base_value, multipliers.for_day(day_type));
        Self {
            gross_value,
            final_value: money::final_amount(gross_value, discount_value),
        }
    }
}

/// Daily production ("apontamentos") recorded against approved quotes
#[derive(Clone)]
pub struct ProductionService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    audit: Arc<AuditTrail>,
    multipliers: DayTypeMultipliers,
}

impl ProductionService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        audit: Arc<AuditTrail>,
        multipliers: DayTypeMultipliers,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            audit,
            multipliers,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_production_entry(
        &self,
        entry_id: i32,
    ) -> Result<production_entry::Model, ServiceError> {
        production_entry::Entity::find_by_id(entry_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Production entry {} not found", entry_id)))
    }

    /// Checks that the quote is approved, belongs to the job site and owns the phase.
    async fn check_references(
        &self,
        job_site_id: i32,
        quote_id: i32,
        phase_id: i32,
    ) -> Result<(), ServiceError> {
        let quote = quote::Entity::find_by_id(quote_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Quote {} not found", quote_id)))?;
        if quote.status != QuoteStatus::Approved {
            return Err(ServiceError::PreconditionFailed(format!(
                "Quote {} is {}; production can only be recorded on approved quotes",
                quote_id, quote.status
            )));
        }
        if quote.job_site_id != job_site_id {
            return Err(ServiceError::ValidationError(format!(
                "Quote {} does not belong to job site {}",
                quote_id, job_site_id
            )));
        }

        let phase = phase::Entity::find_by_id(phase_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Phase {} not found", phase_id)))?;
        if phase.quote_id != quote_id {
            return Err(ServiceError::ValidationError(format!(
                "Phase {} does not belong to quote {}",
                phase_id, quote_id
            )));
        }
        Ok(())
    }

    async fn ensure_worker_exists(&self, worker_id: i32) -> Result<(), ServiceError> {
        worker::Entity::find_by_id(worker_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Worker {} not found", worker_id)))?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn create_production_entry(
        &self,
        input: CreateProductionEntryInput,
    ) -> Result<production_entry::Model, ServiceError> {
        input.validate()?;
        self.check_references(input.job_site_id, input.quote_id, input.phase_id)
            .await?;
        self.ensure_worker_exists(input.worker_id).await?;

        let day_type = input.day_type.unwrap_or(DayType::Normal);
        let base_value = money::round_money(input.base_value);
        let discount_value = money::round_money(input.discount_value);
        let values =
            ProductionValues::compute(&self.multipliers, day_type, base_value, discount_value);

        let created = production_entry::ActiveModel {
            job_site_id: Set(input.job_site_id),
            quote_id: Set(input.quote_id),
            phase_id: Set(input.phase_id),
            worker_id: Set(input.worker_id),
            date: Set(input.date),
            day_type: Set(day_type),
            base_value: Set(base_value),
            discount_value: Set(discount_value),
            gross_value: Set(values.gross_value),
            final_value: Set(values.final_value),
            observation: Set(input.observation),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        self.audit
            .record(AuditEntry::insert(ENTITY, created.id, &created))
            .await;
        self.event_sender
            .send_or_log(Event::ProductionRecorded {
                entry_id: created.id,
                quote_id: created.quote_id,
                final_value: created.final_value,
            })
            .await;
        info!(entry_id = created.id, quote_id = created.quote_id, final_value = %created.final_value, "Recorded production");
        Ok(created)
    }

    /// Patches an entry; the approval check runs against the resulting quote.
    #[instrument(skip(self))]
    pub async fn update_production_entry(
        &self,
        entry_id: i32,
        input: UpdateProductionEntryInput,
    ) -> Result<production_entry::Model, ServiceError> {
        input.validate()?;
        let before = self.get_production_entry(entry_id).await?;

        let job_site_id = input.job_site_id.unwrap_or(before.job_site_id);
        let quote_id = input.quote_id.unwrap_or(before.quote_id);
        let phase_id = input.phase_id.unwrap_or(before.phase_id);
        self.check_references(job_site_id, quote_id, phase_id).await?;
        if let Some(worker_id) = input.worker_id {
            self.ensure_worker_exists(worker_id).await?;
        }

        let day_type = input.day_type.unwrap_or(before.day_type);
        let base_value = money::round_money(input.base_value.unwrap_or(before.base_value));
        let discount_value =
            money::round_money(input.discount_value.unwrap_or(before.discount_value));
        let values =
            ProductionValues::compute(&self.multipliers, day_type, base_value, discount_value);

        let mut active: production_entry::ActiveModel = before.clone().into();
        active.job_site_id = Set(job_site_id);
        active.quote_id = Set(quote_id);
        active.phase_id = Set(phase_id);
        if let Some(worker_id) = input.worker_id {
            active.worker_id = Set(worker_id);
        }
        if let Some(date) = input.date {
            active.date = Set(date);
        }
        if let Some(observation) = input.observation {
            active.observation = Set(Some(observation));
        }
        active.day_type = Set(day_type);
        active.base_value = Set(base_value);
        active.discount_value = Set(discount_value);
        active.gross_value = Set(values.gross_value);
        active.final_value = Set(values.final_value);

        let updated = active.update(&*self.db_pool).await?;
        self.audit
            .record(AuditEntry::update(ENTITY, entry_id, &before, &updated))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_production_entry(&self, entry_id: i32) -> Result<(), ServiceError> {
        let entry = self.get_production_entry(entry_id).await?;
        entry.clone().delete(&*self.db_pool).await?;
        self.audit
            .record(AuditEntry::delete(ENTITY, entry_id, &entry))
            .await;
        Ok(())
    }

    /// Entries matching the filter, most recent first.
    #[instrument(skip(self))]
    pub async fn list_production_entries(
        &self,
        filter: ProductionFilter,
    ) -> Result<Vec<production_entry::Model>, ServiceError> {
        let mut query = production_entry::Entity::find();
        if let Some(job_site_id) = filter.job_site_id {
            query = query.filter(production_entry::Column::JobSiteId.eq(job_site_id));
        }
        if let Some(quote_id) = filter.quote_id {
            query = query.filter(production_entry::Column::QuoteId.eq(quote_id));
        }
        if let Some(worker_id) = filter.worker_id {
            query = query.filter(production_entry::Column::WorkerId.eq(worker_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(production_entry::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(production_entry::Column::Date.lte(to));
        }

        let entries = query
            .order_by_desc(production_entry::Column::Date)
            .order_by_desc(production_entry::Column::Id)
            .all(&*self.db_pool)
            .await?;
        Ok(entries)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateProductionEntryInput {
    pub job_site_id: i32,
    pub quote_id: i32,
    pub phase_id: i32,
    pub worker_id: i32,
    pub date: NaiveDate,
    pub day_type: Option<DayType>,
    #[validate(custom = "crate::services::non_negative")]
    pub base_value: Decimal,
    #[serde(default)]
    #[validate(custom = "crate::services::non_negative")]
    pub discount_value: Decimal,
    pub observation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateProductionEntryInput {
    pub job_site_id: Option<i32>,
    pub quote_id: Option<i32>,
    pub phase_id: Option<i32>,
    pub worker_id: Option<i32>,
    pub date: Option<NaiveDate>,
    pub day_type: Option<DayType>,
    #[validate(custom = "crate::services::non_negative")]
    pub base_value: Option<Decimal>,
    #[validate(custom = "crate::services::non_negative")]
    pub discount_value: Option<Decimal>,
    pub observation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductionFilter {
    pub job_site_id: Option<i32>,
    pub quote_id: Option<i32>,
    pub worker_id: Option<i32>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_multipliers_keep_base_value() {
        let values = ProductionValues::compute(
            &DayTypeMultipliers::default(),
            DayType::Sunday,
            dec!(180),
            dec!(30),
        );
        assert_eq!(values.gross_value, dec!(180));
        assert_eq!(values.final_value, dec!(150));
    }

    #[test]
    fn weekend_multiplier_applies_before_discount() {
        let multipliers = DayTypeMultipliers {
            saturday: dec!(1.5),
            ..DayTypeMultipliers::default()
        };
        let values = ProductionValues::compute(&multipliers, DayType::Saturday, dec!(100), dec!(20));
        assert_eq!(values.gross_value, dec!(150));
        assert_eq!(values.final_value, dec!(130));
    }

    #[test]
    fn oversized_discount_floors_at_zero() {
        let values = ProductionValues::compute(
            &DayTypeMultipliers::default(),
            DayType::Normal,
            dec!(50),
            dec!(80),
        );
        assert_eq!(values.final_value, dec!(0));
    }
}
