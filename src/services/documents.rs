use async_trait::async_trait;
use bytes::Bytes;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;

use crate::{
    errors::ServiceError,
    models::{job_site, phase, phase_service_line, quote, service_catalog::ServiceUnit},
};

/// A priced line as it appears on a quote document.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotLine {
    #[serde(flatten)]
    pub line: phase_service_line::Model,
    pub service_name: String,
    pub unit: Option<ServiceUnit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotPhase {
    #[serde(flatten)]
    pub phase: phase::Model,
    pub lines: Vec<SnapshotLine>,
}

/// Everything a renderer needs to lay out one quote version.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteSnapshot {
    pub quote: quote::Model,
    pub job_site_title: String,
    pub phases: Vec<SnapshotPhase>,
}

impl QuoteSnapshot {
    pub(crate) async fn load<C: ConnectionTrait>(
        conn: &C,
        quote_id: i32,
    ) -> Result<Self, ServiceError> {
        let quote = quote::Entity::find_by_id(quote_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Quote {} not found", quote_id)))?;

        let job_site_title = job_site::Entity::find_by_id(quote.job_site_id)
            .one(conn)
            .await?
            .map(|site| site.title)
            .unwrap_or_default();

        let phases = phase::Entity::find()
            .filter(phase::Column::QuoteId.eq(quote_id))
            .order_by_asc(phase::Column::SortOrder)
            .order_by_asc(phase::Column::Id)
            .all(conn)
            .await?;

        let phase_ids: Vec<i32> = phases.iter().map(|p| p.id).collect();
        let mut lines_by_phase: HashMap<i32, Vec<SnapshotLine>> = HashMap::new();
        if !phase_ids.is_empty() {
            let rows = phase_service_line::Entity::find()
                .filter(phase_service_line::Column::PhaseId.is_in(phase_ids))
                .order_by_asc(phase_service_line::Column::Id)
                .find_also_related(crate::models::service_catalog::Entity)
                .all(conn)
                .await?;
            for (line, service) in rows {
                lines_by_phase
                    .entry(line.phase_id)
                    .or_default()
                    .push(SnapshotLine {
                        service_name: service
                            .as_ref()
                            .map(|s| s.name.clone())
                            .unwrap_or_default(),
                        unit: service.map(|s| s.unit),
                        line,
                    });
            }
        }

        let phases = phases
            .into_iter()
            .map(|phase| SnapshotPhase {
                lines: lines_by_phase.remove(&phase.id).unwrap_or_default(),
                phase,
            })
            .collect();

        Ok(Self {
            quote,
            job_site_title,
            phases,
        })
    }
}

/// Turns a quote snapshot into a printable artifact.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, snapshot: &QuoteSnapshot) -> Result<Bytes, anyhow::Error>;
}

/// Renders the snapshot as a JSON document.
#[derive(Debug, Clone, Default)]
pub struct JsonDocumentRenderer;

#[async_trait]
impl DocumentRenderer for JsonDocumentRenderer {
    async fn render(&self, snapshot: &QuoteSnapshot) -> Result<Bytes, anyhow::Error> {
        let body = serde_json::to_vec_pretty(snapshot)?;
        Ok(Bytes::from(body))
    }
}
