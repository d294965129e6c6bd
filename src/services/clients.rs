use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    db::DbPool,
    errors::ServiceError,
    models::client,
    services::audit::{AuditEntry, AuditTrail},
};

const ENTITY: &str = "clients";

/// Registry of the company's clients
#[derive(Clone)]
pub struct ClientService {
    db_pool: Arc<DbPool>,
    audit: Arc<AuditTrail>,
}

impl ClientService {
    pub fn new(db_pool: Arc<DbPool>, audit: Arc<AuditTrail>) -> Self {
        Self { db_pool, audit }
    }

    #[instrument(skip(self))]
    pub async fn create_client(&self, input: CreateClientInput) -> Result<client::Model, ServiceError> {
        input.validate()?;

        let created = client::ActiveModel {
            name: Set(input.name.trim().to_string()),
            phone: Set(input.phone),
            address: Set(input.address),
            active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        self.audit
            .record(AuditEntry::insert(ENTITY, created.id, &created))
            .await;
        info!(client_id = created.id, "Created client");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_client(&self, client_id: i32) -> Result<client::Model, ServiceError> {
        client::Entity::find_by_id(client_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Client {} not found", client_id)))
    }

    #[instrument(skip(self))]
    pub async fn update_client(
        &self,
        client_id: i32,
        input: UpdateClientInput,
    ) -> Result<client::Model, ServiceError> {
        input.validate()?;
        let before = self.get_client(client_id).await?;
        let mut active: client::ActiveModel = before.clone().into();

        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address));
        }
        if let Some(is_active) = input.active {
            active.active = Set(is_active);
        }

        let updated = active.update(&*self.db_pool).await?;
        self.audit
            .record(AuditEntry::update(ENTITY, client_id, &before, &updated))
            .await;
        Ok(updated)
    }

    /// Lists clients by name, optionally only active ones or matching a name fragment.
    #[instrument(skip(self))]
    pub async fn list_clients(
        &self,
        active_only: bool,
        search: Option<String>,
    ) -> Result<Vec<client::Model>, ServiceError> {
        let mut condition = Condition::all();
        if active_only {
            condition = condition.add(client::Column::Active.eq(true));
        }
        if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
            condition = condition.add(client::Column::Name.contains(term.trim()));
        }

        let clients = client::Entity::find()
            .filter(condition)
            .order_by_asc(client::Column::Name)
            .all(&*self.db_pool)
            .await?;
        Ok(clients)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateClientInput {
    #[validate(custom = "crate::services::not_blank")]
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateClientInput {
    #[validate(custom = "crate::services::not_blank")]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub active: Option<bool>,
}
