use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    db::DbPool,
    errors::ServiceError,
    models::worker::{self, WorkerRole},
    services::audit::{AuditEntry, AuditTrail},
};

const ENTITY: &str = "workers";

/// Registry of painters, helpers and contractors
#[derive(Clone)]
pub struct WorkerService {
    db_pool: Arc<DbPool>,
    audit: Arc<AuditTrail>,
}

impl WorkerService {
    pub fn new(db_pool: Arc<DbPool>, audit: Arc<AuditTrail>) -> Self {
        Self { db_pool, audit }
    }

    #[instrument(skip(self))]
    pub async fn create_worker(&self, input: CreateWorkerInput) -> Result<worker::Model, ServiceError> {
        input.validate()?;

        let created = worker::ActiveModel {
            name: Set(input.name.trim().to_string()),
            role: Set(input.role),
            phone: Set(input.phone),
            daily_rate: Set(crate::money::round_money(input.daily_rate)),
            active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        self.audit
            .record(AuditEntry::insert(ENTITY, created.id, &created))
            .await;
        info!(worker_id = created.id, role = %created.role, "Created worker");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_worker(&self, worker_id: i32) -> Result<worker::Model, ServiceError> {
        worker::Entity::find_by_id(worker_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Worker {} not found", worker_id)))
    }

    #[instrument(skip(self))]
    pub async fn update_worker(
        &self,
        worker_id: i32,
        input: UpdateWorkerInput,
    ) -> Result<worker::Model, ServiceError> {
        input.validate()?;
        let before = self.get_worker(worker_id).await?;
        let mut active: worker::ActiveModel = before.clone().into();

        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(role) = input.role {
            active.role = Set(role);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(rate) = input.daily_rate {
            active.daily_rate = Set(crate::money::round_money(rate));
        }
        if let Some(is_active) = input.active {
            active.active = Set(is_active);
        }

        let updated = active.update(&*self.db_pool).await?;
        self.audit
            .record(AuditEntry::update(ENTITY, worker_id, &before, &updated))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn list_workers(
        &self,
        active_only: bool,
        role: Option<WorkerRole>,
    ) -> Result<Vec<worker::Model>, ServiceError> {
        let mut query = worker::Entity::find();
        if active_only {
            query = query.filter(worker::Column::Active.eq(true));
        }
        if let Some(role) = role {
            query = query.filter(worker::Column::Role.eq(role));
        }
        let workers = query
            .order_by_asc(worker::Column::Name)
            .all(&*self.db_pool)
            .await?;
        Ok(workers)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateWorkerInput {
    #[validate(custom = "crate::services::not_blank")]
    pub name: String,
    pub role: WorkerRole,
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(custom = "crate::services::non_negative")]
    pub daily_rate: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateWorkerInput {
    #[validate(custom = "crate::services::not_blank")]
    pub name: Option<String>,
    pub role: Option<WorkerRole>,
    pub phone: Option<String>,
    #[validate(custom = "crate::services::non_negative")]
    pub daily_rate: Option<Decimal>,
    pub active: Option<bool>,
}
