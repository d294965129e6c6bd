use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    db::DbPool,
    errors::ServiceError,
    models::service_catalog::{self, ServiceUnit},
    services::audit::{AuditEntry, AuditTrail},
};

const ENTITY: &str = "service_catalog";

/// Reusable service types that quote lines are priced against
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
    audit: Arc<AuditTrail>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>, audit: Arc<AuditTrail>) -> Self {
        Self { db_pool, audit }
    }

    #[instrument(skip(self))]
    pub async fn create_service(
        &self,
        input: CreateServiceInput,
    ) -> Result<service_catalog::Model, ServiceError> {
        input.validate()?;

        let created = service_catalog::ActiveModel {
            name: Set(input.name.trim().to_string()),
            unit: Set(input.unit),
            active: Set(true),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        self.audit
            .record(AuditEntry::insert(ENTITY, created.id, &created))
            .await;
        info!(service_id = created.id, unit = %created.unit, "Created catalog service");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_service(&self, service_id: i32) -> Result<service_catalog::Model, ServiceError> {
        service_catalog::Entity::find_by_id(service_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Service {} not found", service_id)))
    }

    #[instrument(skip(self))]
    pub async fn update_service(
        &self,
        service_id: i32,
        input: UpdateServiceInput,
    ) -> Result<service_catalog::Model, ServiceError> {
        input.validate()?;
        let before = self.get_service(service_id).await?;
        let mut active: service_catalog::ActiveModel = before.clone().into();

        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(unit) = input.unit {
            active.unit = Set(unit);
        }
        if let Some(is_active) = input.active {
            active.active = Set(is_active);
        }

        let updated = active.update(&*self.db_pool).await?;
        self.audit
            .record(AuditEntry::update(ENTITY, service_id, &before, &updated))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn list_services(
        &self,
        active_only: bool,
    ) -> Result<Vec<service_catalog::Model>, ServiceError> {
        let mut query = service_catalog::Entity::find();
        if active_only {
            query = query.filter(service_catalog::Column::Active.eq(true));
        }
        let services = query
            .order_by_asc(service_catalog::Column::Name)
            .all(&*self.db_pool)
            .await?;
        Ok(services)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateServiceInput {
    #[validate(custom = "crate::services::not_blank")]
    pub name: String,
    pub unit: ServiceUnit,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateServiceInput {
    #[validate(custom = "crate::services::not_blank")]
    pub name: Option<String>,
    pub unit: Option<ServiceUnit>,
    pub active: Option<bool>,
}
