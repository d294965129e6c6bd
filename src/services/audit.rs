use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::{
    db::DbPool,
    errors::ServiceError,
    models::audit_log::{self, AuditAction},
};

const AUDIT_LIST_LIMIT: u64 = 100;

/// One before/after record of a mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub entity: String,
    pub entity_id: Option<i32>,
    pub action: AuditAction,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

fn snapshot<T: Serialize>(record: &T) -> Option<Value> {
    serde_json::to_value(record).ok()
}

impl AuditEntry {
    pub fn insert<T: Serialize>(entity: &str, entity_id: i32, after: &T) -> Self {
        Self {
            entity: entity.to_string(),
            entity_id: Some(entity_id),
            action: AuditAction::Insert,
            before: None,
            after: snapshot(after),
        }
    }

    pub fn update<T: Serialize>(entity: &str, entity_id: i32, before: &T, after: &T) -> Self {
        Self {
            entity: entity.to_string(),
            entity_id: Some(entity_id),
            action: AuditAction::Update,
            before: snapshot(before),
            after: snapshot(after),
        }
    }

    pub fn delete<T: Serialize>(entity: &str, entity_id: i32, before: &T) -> Self {
        Self {
            entity: entity.to_string(),
            entity_id: Some(entity_id),
            action: AuditAction::Delete,
            before: snapshot(before),
            after: None,
        }
    }

    pub fn status_change<S: Display>(entity: &str, entity_id: i32, from: S, to: S) -> Self {
        Self {
            entity: entity.to_string(),
            entity_id: Some(entity_id),
            action: AuditAction::StatusChange,
            before: Some(serde_json::json!({ "status": from.to_string() })),
            after: Some(serde_json::json!({ "status": to.to_string() })),
        }
    }
}

/// Destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditEntry, actor: &str) -> Result<(), ServiceError>;
}

/// Persists audit records to the `audit_log` table.
#[derive(Clone)]
pub struct DbAuditSink {
    db_pool: Arc<DbPool>,
}

impl DbAuditSink {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AuditSink for DbAuditSink {
    async fn record(&self, entry: &AuditEntry, actor: &str) -> Result<(), ServiceError> {
        audit_log::ActiveModel {
            entity: Set(entry.entity.clone()),
            entity_id: Set(entry.entity_id),
            action: Set(entry.action),
            before: Set(entry.before.clone()),
            after: Set(entry.after.clone()),
            actor: Set(actor.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;
        Ok(())
    }
}

/// Fire-and-forget front for an [`AuditSink`]: failures are logged, never returned.
#[derive(Clone)]
pub struct AuditTrail {
    sink: Arc<dyn AuditSink>,
    actor: String,
}

impl AuditTrail {
    pub fn new(sink: Arc<dyn AuditSink>, actor: impl Into<String>) -> Self {
        Self {
            sink,
            actor: actor.into(),
        }
    }

    pub async fn record(&self, entry: AuditEntry) {
        if let Err(e) = self.sink.record(&entry, &self.actor).await {
            warn!(
                entity = %entry.entity,
                entity_id = ?entry.entity_id,
                action = %entry.action,
                error = %e,
                "Audit write failed"
            );
        }
    }
}

/// Filters for browsing the audit log.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuditFilter {
    pub entity: Option<String>,
    pub entity_id: Option<i32>,
    pub action: Option<AuditAction>,
}

/// Read side of the audit log
#[derive(Clone)]
pub struct AuditService {
    db_pool: Arc<DbPool>,
}

impl AuditService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Latest audit records matching the filter, newest first.
    #[instrument(skip(self))]
    pub async fn list_audit(
        &self,
        filter: AuditFilter,
    ) -> Result<Vec<audit_log::Model>, ServiceError> {
        let mut query = audit_log::Entity::find();
        if let Some(entity) = filter.entity {
            query = query.filter(audit_log::Column::Entity.eq(entity));
        }
        if let Some(entity_id) = filter.entity_id {
            query = query.filter(audit_log::Column::EntityId.eq(entity_id));
        }
        if let Some(action) = filter.action {
            query = query.filter(audit_log::Column::Action.eq(action));
        }

        let records = query
            .order_by_desc(audit_log::Column::CreatedAt)
            .order_by_desc(audit_log::Column::Id)
            .limit(AUDIT_LIST_LIMIT)
            .all(&*self.db_pool)
            .await?;
        Ok(records)
    }
}
