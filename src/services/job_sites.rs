use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{
        client,
        job_site::{self, JobSiteStatus},
    },
    services::audit::{AuditEntry, AuditTrail},
};

const ENTITY: &str = "job_sites";

/// Registry of job sites ("obras")
#[derive(Clone)]
pub struct JobSiteService {
    db_pool: Arc<DbPool>,
    audit: Arc<AuditTrail>,
}

impl JobSiteService {
    pub fn new(db_pool: Arc<DbPool>, audit: Arc<AuditTrail>) -> Self {
        Self { db_pool, audit }
    }

    /// Opens a job site for a client; new sites start AWAITING and active.
    #[instrument(skip(self))]
    pub async fn create_job_site(
        &self,
        input: CreateJobSiteInput,
    ) -> Result<job_site::Model, ServiceError> {
        input.validate()?;
        client::Entity::find_by_id(input.client_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Client {} not found", input.client_id)))?;

        let created = job_site::ActiveModel {
            client_id: Set(input.client_id),
            title: Set(input.title.trim().to_string()),
            address: Set(input.address),
            status: Set(JobSiteStatus::Awaiting),
            active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        self.audit
            .record(AuditEntry::insert(ENTITY, created.id, &created))
            .await;
        info!(job_site_id = created.id, client_id = created.client_id, "Created job site");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_job_site(&self, job_site_id: i32) -> Result<job_site::Model, ServiceError> {
        job_site::Entity::find_by_id(job_site_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Job site {} not found", job_site_id)))
    }

    /// Patches a job site. Status changes are free-form.
    #[instrument(skip(self))]
    pub async fn update_job_site(
        &self,
        job_site_id: i32,
        input: UpdateJobSiteInput,
    ) -> Result<job_site::Model, ServiceError> {
        input.validate()?;
        let before = self.get_job_site(job_site_id).await?;
        let mut active: job_site::ActiveModel = before.clone().into();

        if let Some(title) = input.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address));
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(is_active) = input.active {
            active.active = Set(is_active);
        }

        let updated = active.update(&*self.db_pool).await?;
        let entry = if before.status != updated.status {
            AuditEntry::status_change(ENTITY, job_site_id, before.status, updated.status)
        } else {
            AuditEntry::update(ENTITY, job_site_id, &before, &updated)
        };
        self.audit.record(entry).await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn list_job_sites(
        &self,
        filter: JobSiteFilter,
    ) -> Result<Vec<job_site::Model>, ServiceError> {
        let mut query = job_site::Entity::find();
        if let Some(client_id) = filter.client_id {
            query = query.filter(job_site::Column::ClientId.eq(client_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(job_site::Column::Status.eq(status));
        }
        if filter.active_only {
            query = query.filter(job_site::Column::Active.eq(true));
        }
        if let Some(term) = filter.search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(job_site::Column::Title.contains(term.trim()));
        }

        let sites = query
            .order_by_desc(job_site::Column::CreatedAt)
            .order_by_desc(job_site::Column::Id)
            .all(&*self.db_pool)
            .await?;
        Ok(sites)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateJobSiteInput {
    pub client_id: i32,
    #[validate(custom = "crate::services::not_blank")]
    pub title: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateJobSiteInput {
    #[validate(custom = "crate::services::not_blank")]
    pub title: Option<String>,
    pub address: Option<String>,
    pub status: Option<JobSiteStatus>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobSiteFilter {
    pub client_id: Option<i32>,
    pub status: Option<JobSiteStatus>,
    #[serde(default)]
    pub active_only: bool,
    pub search: Option<String>,
}
