use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        allocation::{self, AllocationKind, AllocationPeriod},
        job_site, phase,
        quote::{self, QuoteStatus},
        worker,
    },
    services::audit::{AuditEntry, AuditTrail},
};

const ENTITY: &str = "allocations";

/// An allocation with the labels a schedule screen shows next to it.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationView {
    #[serde(flatten)]
    pub allocation: allocation::Model,
    pub worker_name: String,
    pub job_site_title: String,
    pub quote_version: Option<i32>,
    pub quote_status: Option<QuoteStatus>,
    pub phase_name: Option<String>,
}

/// Daily worker assignments to job sites
#[derive(Clone)]
pub struct SchedulingService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    audit: Arc<AuditTrail>,
}

impl SchedulingService {
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
    pub async fn get_allocation(&self, allocation_id: i32) -> Result<allocation::Model, ServiceError> {
        allocation::Entity::find_by_id(allocation_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Allocation {} not found", allocation_id)))
    }

    /// Books a worker on a job site for a day. Quote and phase are optional.
    #[instrument(skip(self))]
    pub async fn create_allocation(
        &self,
        input: CreateAllocationInput,
    ) -> Result<allocation::Model, ServiceError> {
        input.validate()?;
        worker::Entity::find_by_id(input.worker_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Worker {} not found", input.worker_id)))?;
        job_site::Entity::find_by_id(input.job_site_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Job site {} not found", input.job_site_id))
            })?;

        let created = allocation::ActiveModel {
            date: Set(input.date),
            worker_id: Set(input.worker_id),
            job_site_id: Set(input.job_site_id),
            period: Set(input.period.unwrap_or(AllocationPeriod::Full)),
            kind: Set(input.kind.unwrap_or(AllocationKind::Internal)),
            quote_id: Set(input.quote_id),
            phase_id: Set(input.phase_id),
            confirmed: Set(false),
            observation: Set(input.observation),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        self.audit
            .record(AuditEntry::insert(ENTITY, created.id, &created))
            .await;
        info!(allocation_id = created.id, worker_id = created.worker_id, date = %created.date, "Created allocation");
        Ok(created)
    }

    /// Confirms an allocation against an approved quote. Confirming twice is a no-op.
    #[instrument(skip(self))]
    pub async fn confirm_allocation(
        &self,
        allocation_id: i32,
    ) -> Result<allocation::Model, ServiceError> {
        let current = self.get_allocation(allocation_id).await?;
        if current.confirmed {
            return Ok(current);
        }

        let (quote_id, phase_id) = match (current.quote_id, current.phase_id) {
            (Some(quote_id), Some(phase_id)) => (quote_id, phase_id),
            _ => {
                return Err(ServiceError::ValidationError(format!(
                    "Allocation {} needs a quote and a phase before it can be confirmed",
                    allocation_id
                )))
            }
        };

        let quote = quote::Entity::find_by_id(quote_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Quote {} not found", quote_id)))?;
        if quote.status != QuoteStatus::Approved {
            return Err(ServiceError::PreconditionFailed(format!(
                "Quote {} is {}; only approved quotes accept confirmed allocations",
                quote_id, quote.status
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

        let mut active: allocation::ActiveModel = current.clone().into();
        active.confirmed = Set(true);
        let updated = active.update(&*self.db_pool).await?;

        self.audit
            .record(AuditEntry::update(ENTITY, allocation_id, &current, &updated))
            .await;
        self.event_sender
            .send_or_log(Event::AllocationConfirmed(allocation_id))
            .await;
        info!(allocation_id, quote_id, "Confirmed allocation");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn unconfirm_allocation(
        &self,
        allocation_id: i32,
    ) -> Result<allocation::Model, ServiceError> {
        let current = self.get_allocation(allocation_id).await?;
        if !current.confirmed {
            return Ok(current);
        }

        let mut active: allocation::ActiveModel = current.clone().into();
        active.confirmed = Set(false);
        let updated = active.update(&*self.db_pool).await?;
        self.audit
            .record(AuditEntry::update(ENTITY, allocation_id, &current, &updated))
            .await;
        Ok(updated)
    }

    /// Patches an allocation. Changing or clearing its quote or phase drops the confirmation.
    #[instrument(skip(self))]
    pub async fn update_allocation(
        &self,
        allocation_id: i32,
        input: UpdateAllocationInput,
    ) -> Result<allocation::Model, ServiceError> {
        input.validate()?;
        let before = self.get_allocation(allocation_id).await?;
        let mut active: allocation::ActiveModel = before.clone().into();

        if let Some(date) = input.date {
            active.date = Set(date);
        }
        if let Some(worker_id) = input.worker_id {
            active.worker_id = Set(worker_id);
        }
        if let Some(job_site_id) = input.job_site_id {
            active.job_site_id = Set(job_site_id);
        }
        if let Some(period) = input.period {
            active.period = Set(period);
        }
        if let Some(kind) = input.kind {
            active.kind = Set(kind);
        }
        if let Some(observation) = input.observation {
            active.observation = Set(Some(observation));
        }

        let mut quote_id = before.quote_id;
        let mut phase_id = before.phase_id;
        if input.clear_quote {
            quote_id = None;
            phase_id = None;
        } else if let Some(id) = input.quote_id {
            quote_id = Some(id);
        }
        if input.clear_phase {
            phase_id = None;
        } else if let Some(id) = input.phase_id {
            phase_id = Some(id);
        }
        active.quote_id = Set(quote_id);
        active.phase_id = Set(phase_id);

        if before.confirmed && (quote_id != before.quote_id || phase_id != before.phase_id) {
            active.confirmed = Set(false);
        }

        let updated = active.update(&*self.db_pool).await?;
        self.audit
            .record(AuditEntry::update(ENTITY, allocation_id, &before, &updated))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_allocation(&self, allocation_id: i32) -> Result<(), ServiceError> {
        let allocation = self.get_allocation(allocation_id).await?;
        allocation.clone().delete(&*self.db_pool).await?;
        self.audit
            .record(AuditEntry::delete(ENTITY, allocation_id, &allocation))
            .await;
        Ok(())
    }

    /// The day's schedule, grouped by worker.
    #[instrument(skip(self))]
    pub async fn allocations_for_day(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AllocationView>, ServiceError> {
        let rows = allocation::Entity::find()
            .filter(allocation::Column::Date.eq(date))
            .order_by_asc(allocation::Column::Id)
            .all(&*self.db_pool)
            .await?;

        let mut views = self.label(rows).await?;
        views.sort_by(|a, b| {
            a.worker_name
                .cmp(&b.worker_name)
                .then(a.allocation.worker_id.cmp(&b.allocation.worker_id))
        });
        Ok(views)
    }

    /// Every allocation of a job site, most recent day first.
    #[instrument(skip(self))]
    pub async fn allocations_for_job_site(
        &self,
        job_site_id: i32,
    ) -> Result<Vec<AllocationView>, ServiceError> {
        let rows = allocation::Entity::find()
            .filter(allocation::Column::JobSiteId.eq(job_site_id))
            .order_by_desc(allocation::Column::Date)
            .order_by_asc(allocation::Column::Id)
            .all(&*self.db_pool)
            .await?;
        self.label(rows).await
    }

    async fn label(&self, rows: Vec<allocation::Model>) -> Result<Vec<AllocationView>, ServiceError> {
        let worker_ids: Vec<i32> = rows.iter().map(|a| a.worker_id).collect();
        let site_ids: Vec<i32> = rows.iter().map(|a| a.job_site_id).collect();
        let quote_ids: Vec<i32> = rows.iter().filter_map(|a| a.quote_id).collect();
        let phase_ids: Vec<i32> = rows.iter().filter_map(|a| a.phase_id).collect();

        let workers: HashMap<i32, String> = worker::Entity::find()
            .filter(worker::Column::Id.is_in(worker_ids))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|w| (w.id, w.name))
            .collect();
        let sites: HashMap<i32, String> = job_site::Entity::find()
            .filter(job_site::Column::Id.is_in(site_ids))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|s| (s.id, s.title))
            .collect();
        let quotes: HashMap<i32, quote::Model> = quote::Entity::find()
            .filter(quote::Column::Id.is_in(quote_ids))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|q| (q.id, q))
            .collect();
        let phases: HashMap<i32, String> = phase::Entity::find()
            .filter(phase::Column::Id.is_in(phase_ids))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        Ok(rows
            .into_iter()
            .map(|allocation| {
                let quote = allocation.quote_id.and_then(|id| quotes.get(&id));
                AllocationView {
                    worker_name: workers.get(&allocation.worker_id).cloned().unwrap_or_default(),
                    job_site_title: sites.get(&allocation.job_site_id).cloned().unwrap_or_default(),
                    quote_version: quote.map(|q| q.version),
                    quote_status: quote.map(|q| q.status),
                    phase_name: allocation.phase_id.and_then(|id| phases.get(&id).cloned()),
                    allocation,
                }
            })
            .collect())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateAllocationInput {
    pub date: NaiveDate,
    pub worker_id: i32,
    pub job_site_id: i32,
    pub period: Option<AllocationPeriod>,
    pub kind: Option<AllocationKind>,
    pub quote_id: Option<i32>,
    pub phase_id: Option<i32>,
    pub observation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateAllocationInput {
    pub date: Option<NaiveDate>,
    pub worker_id: Option<i32>,
    pub job_site_id: Option<i32>,
    pub period: Option<AllocationPeriod>,
    pub kind: Option<AllocationKind>,
    pub quote_id: Option<i32>,
    pub phase_id: Option<i32>,
    /// Detaches the allocation from its quote (and therefore its phase).
    #[serde(default)]
    pub clear_quote: bool,
    #[serde(default)]
    pub clear_phase: bool,
    pub observation: Option<String>,
}
