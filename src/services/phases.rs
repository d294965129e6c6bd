use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    db::{self, DbPool},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        phase::{self, PhaseStatus},
        phase_service_line, production_entry, quote,
        receivable::{self, ReceivableStatus},
        service_catalog,
    },
    money,
    services::{
        audit::{AuditEntry, AuditTrail},
        quotes::{self, QuoteService},
        Outcome,
    },
};

const PHASES: &str = "phases";
const LINES: &str = "phase_service_lines";

/// Standard painting job, in execution order.
pub const DEFAULT_PHASES: [&str; 7] = [
    "Preparation",
    "Protection",
    "Filler/Sanding",
    "Paint coat 1",
    "Paint coat 2",
    "Finishing",
    "Cleanup/Handover",
];

/// Result of a phase status change; `receivable` is set when completion opened one.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseStatusUpdate {
    pub phase: phase::Model,
    pub receivable: Option<receivable::Model>,
}

/// Ordered phases of a quote and their priced service lines
#[derive(Clone)]
pub struct PhaseService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    audit: Arc<AuditTrail>,
    quotes: Arc<QuoteService>,
}

impl PhaseService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        audit: Arc<AuditTrail>,
        quotes: Arc<QuoteService>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            audit,
            quotes,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_phase(&self, phase_id: i32) -> Result<phase::Model, ServiceError> {
        phase::Entity::find_by_id(phase_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Phase {} not found", phase_id)))
    }

    async fn editable_quote_of(&self, quote_id: i32) -> Result<quote::Model, ServiceError> {
        let quote = self.quotes.get_quote(quote_id).await?;
        quotes::ensure_editable(&quote)?;
        Ok(quote)
    }

    #[instrument(skip(self))]
    pub async fn add_phase(&self, input: CreatePhaseInput) -> Result<phase::Model, ServiceError> {
        input.validate()?;
        let quote = self.editable_quote_of(input.quote_id).await?;
        if quote.job_site_id != input.job_site_id {
            return Err(ServiceError::ValidationError(format!(
                "Quote {} does not belong to job site {}",
                quote.id, input.job_site_id
            )));
        }
        let status = input.status.unwrap_or(PhaseStatus::Pending);
        if status.is_terminal() {
            return Err(ServiceError::ValidationError(format!(
                "A new phase cannot start as {}",
                status
            )));
        }
        quotes::invalidate_document(&*self.db_pool, quote.id).await?;

        let created = phase::ActiveModel {
            job_site_id: Set(input.job_site_id),
            quote_id: Set(input.quote_id),
            name: Set(input.name.trim().to_string()),
            sort_order: Set(input.sort_order),
            status: Set(status),
            phase_amount: Set(Decimal::ZERO),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        self.audit
            .record(AuditEntry::insert(PHASES, created.id, &created))
            .await;
        info!(phase_id = created.id, quote_id = quote.id, "Added phase");
        Ok(created)
    }

    /// Seeds the standard painting phases on a quote.
    #[instrument(skip(self))]
    pub async fn create_default_phases(
        &self,
        quote_id: i32,
    ) -> Result<Vec<phase::Model>, ServiceError> {
        let quote = self.editable_quote_of(quote_id).await?;
        let job_site_id = quote.job_site_id;

        let created = db::with_transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let mut created = Vec::with_capacity(DEFAULT_PHASES.len());
                for (idx, name) in DEFAULT_PHASES.iter().enumerate() {
                    let phase = phase::ActiveModel {
                        job_site_id: Set(job_site_id),
                        quote_id: Set(quote_id),
                        name: Set((*name).to_string()),
                        sort_order: Set(idx as i32 + 1),
                        status: Set(PhaseStatus::Pending),
                        phase_amount: Set(Decimal::ZERO),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;
                    created.push(phase);
                }
                quotes::invalidate_document(txn, quote_id).await?;
                Ok(created)
            })
        })
        .await?;

        for phase in &created {
            self.audit
                .record(AuditEntry::insert(PHASES, phase.id, phase))
                .await;
        }
        info!(quote_id, count = created.len(), "Created default phases");
        Ok(created)
    }

    /// Patches name and order; a status in the patch goes through [`Self::set_phase_status`].
    #[instrument(skip(self))]
    pub async fn update_phase(
        &self,
        phase_id: i32,
        input: UpdatePhaseInput,
    ) -> Result<Outcome<PhaseStatusUpdate>, ServiceError> {
        input.validate()?;
        let before = self.get_phase(phase_id).await?;

        let mut current = before.clone();
        if input.name.is_some() || input.sort_order.is_some() {
            self.editable_quote_of(before.quote_id).await?;
            let mut active: phase::ActiveModel = before.clone().into();
            if let Some(name) = input.name {
                active.name = Set(name.trim().to_string());
            }
            if let Some(order) = input.sort_order {
                active.sort_order = Set(order);
            }
            current = active.update(&*self.db_pool).await?;
            self.audit
                .record(AuditEntry::update(PHASES, phase_id, &before, &current))
                .await;
        }

        let result = match input.status {
            Some(status) => self.set_phase_status(phase_id, status).await?,
            None => PhaseStatusUpdate {
                phase: current,
                receivable: None,
            },
        };

        let warnings = self
            .quotes
            .invalidate_document_best_effort(before.quote_id)
            .await
            .into_iter()
            .collect();
        Ok(Outcome::with_warnings(result, warnings))
    }

    /// Deletes a phase with its lines and refreshes the quote totals.
    #[instrument(skip(self))]
    pub async fn delete_phase(&self, phase_id: i32) -> Result<Outcome<phase::Model>, ServiceError> {
        let phase = self.get_phase(phase_id).await?;
        self.editable_quote_of(phase.quote_id).await?;

        let receivables = receivable::Entity::find()
            .filter(receivable::Column::PhaseId.eq(phase_id))
            .count(&*self.db_pool)
            .await?;
        let entries = production_entry::Entity::find()
            .filter(production_entry::Column::PhaseId.eq(phase_id))
            .count(&*self.db_pool)
            .await?;
        if receivables > 0 || entries > 0 {
            return Err(ServiceError::PreconditionFailed(format!(
                "Phase {} has {} receivable(s) and {} production entr(ies)",
                phase_id, receivables, entries
            )));
        }

        let quote_id = phase.quote_id;
        quotes::invalidate_document(&*self.db_pool, quote_id).await?;
        phase.clone().delete(&*self.db_pool).await?;
        self.audit
            .record(AuditEntry::delete(PHASES, phase_id, &phase))
            .await;

        let warnings = self.quotes.recompute_best_effort(quote_id).await.into_iter().collect();
        info!(phase_id, quote_id, "Deleted phase");
        Ok(Outcome::with_warnings(phase, warnings))
    }

    /// Moves a phase through its lifecycle.
    ///
    /// Completing a phase that has no receivable yet opens one for the phase
    /// amount, due today. Setting the current status again is a no-op.
    #[instrument(skip(self))]
    pub async fn set_phase_status(
        &self,
        phase_id: i32,
        new_status: PhaseStatus,
    ) -> Result<PhaseStatusUpdate, ServiceError> {
        let current = self.get_phase(phase_id).await?;
        let old_status = current.status;
        if old_status == new_status {
            return Ok(PhaseStatusUpdate {
                phase: current,
                receivable: None,
            });
        }
        if !old_status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Phase {} cannot move from {} to {}",
                phase_id, old_status, new_status
            )));
        }

        let (phase, spawned) = db::with_transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let mut active: phase::ActiveModel = current.into();
                active.status = Set(new_status);
                let phase = active.update(txn).await?;

                if new_status != PhaseStatus::Done {
                    return Ok((phase, None));
                }

                let existing = receivable::Entity::find()
                    .filter(receivable::Column::PhaseId.eq(phase_id))
                    .count(txn)
                    .await?;
                if existing > 0 {
                    return Ok((phase, None));
                }

                let receivable = receivable::ActiveModel {
                    phase_id: Set(phase_id),
                    amount: Set(phase.phase_amount),
                    due_date: Set(Utc::now().date_naive()),
                    status: Set(ReceivableStatus::Open),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
                Ok((phase, Some(receivable)))
            })
        })
        .await?;

        self.audit
            .record(AuditEntry::status_change(PHASES, phase_id, old_status, new_status))
            .await;
        self.event_sender
            .send_or_log(Event::PhaseStatusChanged {
                phase_id,
                old_status,
                new_status,
            })
            .await;

        if let Some(receivable) = &spawned {
            self.audit
                .record(AuditEntry::insert("receivables", receivable.id, receivable))
                .await;
            self.event_sender
                .send_or_log(Event::ReceivableSpawned {
                    receivable_id: receivable.id,
                    phase_id,
                    amount: receivable.amount,
                })
                .await;
        }

        Ok(PhaseStatusUpdate {
            phase,
            receivable: spawned,
        })
    }

    /// Phases of a quote by display order.
    #[instrument(skip(self))]
    pub async fn list_phases(&self, quote_id: i32) -> Result<Vec<phase::Model>, ServiceError> {
        let phases = phase::Entity::find()
            .filter(phase::Column::QuoteId.eq(quote_id))
            .order_by_asc(phase::Column::SortOrder)
            .order_by_asc(phase::Column::Id)
            .all(&*self.db_pool)
            .await?;
        Ok(phases)
    }

    #[instrument(skip(self))]
    pub async fn list_service_lines(
        &self,
        phase_id: i32,
    ) -> Result<Vec<phase_service_line::Model>, ServiceError> {
        let lines = phase_service_line::Entity::find()
            .filter(phase_service_line::Column::PhaseId.eq(phase_id))
            .order_by_asc(phase_service_line::Column::Id)
            .all(&*self.db_pool)
            .await?;
        Ok(lines)
    }

    async fn get_line(&self, line_id: i32) -> Result<phase_service_line::Model, ServiceError> {
        phase_service_line::Entity::find_by_id(line_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Service line {} not found", line_id)))
    }

    async fn ensure_service_exists(&self, service_id: i32) -> Result<(), ServiceError> {
        service_catalog::Entity::find_by_id(service_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Service {} not found", service_id)))?;
        Ok(())
    }

    async fn ensure_not_on_phase(
        &self,
        phase_id: i32,
        service_id: i32,
    ) -> Result<(), ServiceError> {
        let existing = phase_service_line::Entity::find()
            .filter(phase_service_line::Column::PhaseId.eq(phase_id))
            .filter(phase_service_line::Column::ServiceId.eq(service_id))
            .count(&*self.db_pool)
            .await?;
        if existing > 0 {
            return Err(duplicate_line(phase_id, service_id));
        }
        Ok(())
    }

    /// Prices a catalog service on a phase.
    #[instrument(skip(self))]
    pub async fn add_service_line(
        &self,
        input: AddServiceLineInput,
    ) -> Result<Outcome<phase_service_line::Model>, ServiceError> {
        input.validate()?;
        let phase = self.get_phase(input.phase_id).await?;
        self.editable_quote_of(phase.quote_id).await?;
        self.ensure_service_exists(input.service_id).await?;
        self.ensure_not_on_phase(phase.id, input.service_id).await?;

        let unit_price = money::round_money(input.unit_price);
        let created = phase_service_line::ActiveModel {
            phase_id: Set(phase.id),
            service_id: Set(input.service_id),
            quantity: Set(input.quantity),
            unit_price: Set(unit_price),
            line_total: Set(money::line_total(input.quantity, unit_price)),
            observation: Set(input.observation),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| ServiceError::from_unique_violation(e, duplicate_message(phase.id, input.service_id)))?;

        self.audit
            .record(AuditEntry::insert(LINES, created.id, &created))
            .await;
        let warnings = self.after_line_change(phase.quote_id).await;
        info!(line_id = created.id, phase_id = phase.id, "Added service line");
        Ok(Outcome::with_warnings(created, warnings))
    }

    #[instrument(skip(self))]
    pub async fn update_service_line(
        &self,
        line_id: i32,
        input: UpdateServiceLineInput,
    ) -> Result<Outcome<phase_service_line::Model>, ServiceError> {
        input.validate()?;
        let before = self.get_line(line_id).await?;
        let phase = self.get_phase(before.phase_id).await?;
        self.editable_quote_of(phase.quote_id).await?;

        let mut active: phase_service_line::ActiveModel = before.clone().into();
        if let Some(service_id) = input.service_id.filter(|id| *id != before.service_id) {
            self.ensure_service_exists(service_id).await?;
            self.ensure_not_on_phase(phase.id, service_id).await?;
            active.service_id = Set(service_id);
        }
        let quantity = input.quantity.unwrap_or(before.quantity);
        let unit_price = money::round_money(input.unit_price.unwrap_or(before.unit_price));
        active.quantity = Set(quantity);
        active.unit_price = Set(unit_price);
        active.line_total = Set(money::line_total(quantity, unit_price));
        if let Some(observation) = input.observation {
            active.observation = Set(Some(observation));
        }

        let conflict = duplicate_message(phase.id, input.service_id.unwrap_or(before.service_id));
        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::from_unique_violation(e, conflict))?;

        self.audit
            .record(AuditEntry::update(LINES, line_id, &before, &updated))
            .await;
        let warnings = self.after_line_change(phase.quote_id).await;
        Ok(Outcome::with_warnings(updated, warnings))
    }

    #[instrument(skip(self))]
    pub async fn delete_service_line(
        &self,
        line_id: i32,
    ) -> Result<Outcome<phase_service_line::Model>, ServiceError> {
        let line = self.get_line(line_id).await?;
        let phase = self.get_phase(line.phase_id).await?;
        self.editable_quote_of(phase.quote_id).await?;

        line.clone().delete(&*self.db_pool).await?;
        self.audit
            .record(AuditEntry::delete(LINES, line_id, &line))
            .await;
        let warnings = self.after_line_change(phase.quote_id).await;
        Ok(Outcome::with_warnings(line, warnings))
    }

    async fn after_line_change(&self, quote_id: i32) -> Vec<String> {
        let invalidated = self.quotes.invalidate_document_best_effort(quote_id).await;
        let recomputed = self.quotes.recompute_best_effort(quote_id).await;
        invalidated.into_iter().chain(recomputed).collect()
    }
}

fn duplicate_message(phase_id: i32, service_id: i32) -> String {
    format!("Service {} is already priced on phase {}", service_id, phase_id)
}

fn duplicate_line(phase_id: i32, service_id: i32) -> ServiceError {
    ServiceError::Conflict(duplicate_message(phase_id, service_id))
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreatePhaseInput {
    pub job_site_id: i32,
    pub quote_id: i32,
    #[validate(custom = "crate::services::not_blank")]
    pub name: String,
    #[serde(default)]
    pub sort_order: i32,
    pub status: Option<PhaseStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdatePhaseInput {
    #[validate(custom = "crate::services::not_blank")]
    pub name: Option<String>,
    pub sort_order: Option<i32>,
    pub status: Option<PhaseStatus>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AddServiceLineInput {
    pub phase_id: i32,
    pub service_id: i32,
    #[validate(custom = "crate::services::positive")]
    pub quantity: Decimal,
    #[validate(custom = "crate::services::non_negative")]
    pub unit_price: Decimal,
    pub observation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateServiceLineInput {
    pub service_id: Option<i32>,
    #[validate(custom = "crate::services::positive")]
    pub quantity: Option<Decimal>,
    #[validate(custom = "crate::services::non_negative")]
    pub unit_price: Option<Decimal>,
    pub observation: Option<String>,
}
