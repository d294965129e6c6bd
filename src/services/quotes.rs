use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::{
    db::{self, DbPool},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        job_site, phase::{self, PhaseStatus}, phase_service_line,
        quote::{self, QuoteStatus},
    },
    money,
    services::{
        audit::{AuditEntry, AuditTrail},
        documents::{DocumentRenderer, QuoteSnapshot},
        Outcome,
    },
};

const ENTITY: &str = "quotes";

/// Fresh money totals of a quote after a rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteTotals {
    pub quote_id: i32,
    /// `(phase_id, phase_amount)` in display order
    pub phase_amounts: Vec<(i32, Decimal)>,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseCascadeFailure {
    pub phase_id: i32,
    pub error: String,
}

/// Per-phase result of cancelling a quote.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CascadeReport {
    pub canceled_phase_ids: Vec<i32>,
    pub failures: Vec<PhaseCascadeFailure>,
    /// Set when the open phases could not be listed at all.
    pub lookup_error: Option<String>,
}

impl CascadeReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.lookup_error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusTransition {
    pub quote: quote::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cascade: Option<CascadeReport>,
}

/// Rejects pricing changes on quotes that already have a decision.
pub fn ensure_editable(quote: &quote::Model) -> Result<(), ServiceError> {
    if quote.status.is_editable() {
        Ok(())
    } else {
        Err(ServiceError::PreconditionFailed(format!(
            "Quote {} is {} and can no longer be edited",
            quote.id, quote.status
        )))
    }
}

pub(crate) async fn find_quote<C: ConnectionTrait>(
    conn: &C,
    quote_id: i32,
) -> Result<quote::Model, ServiceError> {
    quote::Entity::find_by_id(quote_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Quote {} not found", quote_id)))
}

/// Drops the issued document reference so a stale artifact is never served.
pub(crate) async fn invalidate_document<C: ConnectionTrait>(
    conn: &C,
    quote_id: i32,
) -> Result<(), ServiceError> {
    let quote = find_quote(conn, quote_id).await?;
    if quote.document_ref.is_none() && quote.document_issued_at.is_none() {
        return Ok(());
    }

    let mut active: quote::ActiveModel = quote.into();
    active.document_ref = Set(None);
    active.document_issued_at = Set(None);
    active.update(conn).await?;
    Ok(())
}

/// Rolls line totals up into phase amounts and the quote totals.
///
/// Rows are only written when their stored amount differs from the computed one.
pub(crate) async fn recompute_totals<C: ConnectionTrait>(
    conn: &C,
    quote_id: i32,
) -> Result<QuoteTotals, ServiceError> {
    let quote = find_quote(conn, quote_id).await?;

    let phases = phase::Entity::find()
        .filter(phase::Column::QuoteId.eq(quote_id))
        .order_by_asc(phase::Column::SortOrder)
        .order_by_asc(phase::Column::Id)
        .all(conn)
        .await?;

    let phase_ids: Vec<i32> = phases.iter().map(|p| p.id).collect();
    let lines = if phase_ids.is_empty() {
        Vec::new()
    } else {
        phase_service_line::Entity::find()
            .filter(phase_service_line::Column::PhaseId.is_in(phase_ids))
            .all(conn)
            .await?
    };

    let mut line_totals: HashMap<i32, Vec<Decimal>> = HashMap::new();
    for line in lines {
        let computed = money::line_total(line.quantity, line.unit_price);
        line_totals.entry(line.phase_id).or_default().push(computed);
        if line.line_total != computed {
            let mut active: phase_service_line::ActiveModel = line.into();
            active.line_total = Set(computed);
            active.update(conn).await?;
        }
    }

    let mut phase_amounts = Vec::with_capacity(phases.len());
    for phase in phases {
        let amount = money::phase_amount(line_totals.remove(&phase.id).unwrap_or_default());
        phase_amounts.push((phase.id, amount));
        if phase.phase_amount != amount {
            let mut active: phase::ActiveModel = phase.into();
            active.phase_amount = Set(amount);
            active.update(conn).await?;
        }
    }

    let total_amount = money::round_money(phase_amounts.iter().map(|(_, amount)| *amount).sum());
    let final_amount = money::final_amount(total_amount, quote.discount_amount);
    let discount_amount = quote.discount_amount;

    if quote.total_amount != total_amount || quote.final_amount != final_amount {
        let mut active: quote::ActiveModel = quote.into();
        active.total_amount = Set(total_amount);
        active.final_amount = Set(final_amount);
        active.update(conn).await?;
    }

    Ok(QuoteTotals {
        quote_id,
        phase_amounts,
        total_amount,
        discount_amount,
        final_amount,
    })
}

/// Versioned quotes per job site and their monetary rollup
#[derive(Clone)]
pub struct QuoteService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    audit: Arc<AuditTrail>,
}

impl QuoteService {
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

    /// Opens the next quote version for a job site.
    #[instrument(skip(self))]
    pub async fn create_quote(&self, job_site_id: i32) -> Result<quote::Model, ServiceError> {
        job_site::Entity::find_by_id(job_site_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Job site {} not found", job_site_id)))?;

        let created = db::with_transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let current: Option<i32> = quote::Entity::find()
                    .select_only()
                    .column_as(quote::Column::Version.max(), "max_version")
                    .filter(quote::Column::JobSiteId.eq(job_site_id))
                    .into_tuple::<Option<i32>>()
                    .one(txn)
                    .await?
                    .flatten();
                let version = current.map_or(1, |v| v + 1);

                quote::ActiveModel {
                    job_site_id: Set(job_site_id),
                    version: Set(version),
                    status: Set(QuoteStatus::Draft),
                    total_amount: Set(Decimal::ZERO),
                    discount_amount: Set(Decimal::ZERO),
                    final_amount: Set(Decimal::ZERO),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(|e| {
                    ServiceError::from_unique_violation(
                        e,
                        format!("Quote version {} already exists for job site {}", version, job_site_id),
                    )
                })
            })
        })
        .await?;

        self.audit
            .record(AuditEntry::insert(ENTITY, created.id, &created))
            .await;
        self.event_sender
            .send_or_log(Event::QuoteCreated {
                quote_id: created.id,
                job_site_id,
                version: created.version,
            })
            .await;
        info!(quote_id = created.id, job_site_id, version = created.version, "Created quote");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_quote(&self, quote_id: i32) -> Result<quote::Model, ServiceError> {
        find_quote(&*self.db_pool, quote_id).await
    }

    /// Quote versions of a job site, newest first.
    #[instrument(skip(self))]
    pub async fn list_quotes_for_job_site(
        &self,
        job_site_id: i32,
    ) -> Result<Vec<quote::Model>, ServiceError> {
        let quotes = quote::Entity::find()
            .filter(quote::Column::JobSiteId.eq(job_site_id))
            .order_by_desc(quote::Column::Version)
            .all(&*self.db_pool)
            .await?;
        Ok(quotes)
    }

    /// Moves a quote through its lifecycle.
    ///
    /// Cancelling also cancels every open phase, one row at a time. Phases that
    /// fail to update are reported in the cascade and the rest stay canceled.
    #[instrument(skip(self))]
    pub async fn transition_status(
        &self,
        quote_id: i32,
        new_status: QuoteStatus,
    ) -> Result<StatusTransition, ServiceError> {
        let current = self.get_quote(quote_id).await?;
        let old_status = current.status;
        if !old_status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Quote {} cannot move from {} to {}",
                quote_id, old_status, new_status
            )));
        }

        let mut active: quote::ActiveModel = current.into();
        active.status = Set(new_status);
        match new_status {
            QuoteStatus::Approved => active.approved_at = Set(Some(Utc::now())),
            QuoteStatus::Canceled => active.canceled_at = Set(Some(Utc::now())),
            _ => {}
        }
        let updated = active.update(&*self.db_pool).await?;

        self.audit
            .record(AuditEntry::status_change(ENTITY, quote_id, old_status, new_status))
            .await;
        self.event_sender
            .send_or_log(Event::QuoteStatusChanged {
                quote_id,
                old_status,
                new_status,
            })
            .await;

        let cascade = if new_status == QuoteStatus::Canceled {
            Some(self.cancel_open_phases(quote_id).await)
        } else {
            None
        };

        Ok(StatusTransition {
            quote: updated,
            cascade,
        })
    }

    async fn cancel_open_phases(&self, quote_id: i32) -> CascadeReport {
        let mut report = CascadeReport::default();
        let phases = match phase::Entity::find()
            .filter(phase::Column::QuoteId.eq(quote_id))
            .order_by_asc(phase::Column::SortOrder)
            .order_by_asc(phase::Column::Id)
            .all(&*self.db_pool)
            .await
        {
            Ok(phases) => phases,
            Err(e) => {
                warn!(quote_id, error = %e, "Quote canceled but its phases could not be listed");
                report.lookup_error = Some(e.to_string());
                return report;
            }
        };

        for phase in phases.into_iter().filter(|p| !p.status.is_terminal()) {
            let phase_id = phase.id;
            let old_status = phase.status;
            let mut active: phase::ActiveModel = phase.into();
            active.status = Set(PhaseStatus::Canceled);

            match active.update(&*self.db_pool).await {
                Ok(_) => {
                    self.audit
                        .record(AuditEntry::status_change(
                            "phases",
                            phase_id,
                            old_status,
                            PhaseStatus::Canceled,
                        ))
                        .await;
                    report.canceled_phase_ids.push(phase_id);
                }
                Err(e) => {
                    error!(quote_id, phase_id, error = %e, "Failed to cancel phase of canceled quote");
                    report.failures.push(PhaseCascadeFailure {
                        phase_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        if !report.is_complete() {
            warn!(
                quote_id,
                canceled = report.canceled_phase_ids.len(),
                failed = report.failures.len(),
                "Quote canceled with phases left open"
            );
        }
        report
    }

    /// Sets the quote discount and refreshes the final amount.
    #[instrument(skip(self))]
    pub async fn apply_discount(
        &self,
        quote_id: i32,
        discount: Decimal,
    ) -> Result<Outcome<quote::Model>, ServiceError> {
        if discount.is_sign_negative() && !discount.is_zero() {
            return Err(ServiceError::ValidationError(
                "discount must be zero or positive".to_string(),
            ));
        }

        let before = self.get_quote(quote_id).await?;
        ensure_editable(&before)?;

        let mut active: quote::ActiveModel = before.clone().into();
        active.discount_amount = Set(money::round_money(discount));
        active.document_ref = Set(None);
        active.document_issued_at = Set(None);
        active.update(&*self.db_pool).await?;

        let warnings: Vec<String> = self.recompute_best_effort(quote_id).await.into_iter().collect();
        let updated = self.get_quote(quote_id).await?;

        self.audit
            .record(AuditEntry::update(ENTITY, quote_id, &before, &updated))
            .await;
        info!(quote_id, discount = %updated.discount_amount, "Applied quote discount");
        Ok(Outcome::with_warnings(updated, warnings))
    }

    #[instrument(skip(self))]
    pub async fn set_validity(
        &self,
        quote_id: i32,
        valid_until: Option<NaiveDate>,
    ) -> Result<quote::Model, ServiceError> {
        let before = self.get_quote(quote_id).await?;

        let mut active: quote::ActiveModel = before.clone().into();
        active.valid_until = Set(valid_until);
        active.document_ref = Set(None);
        active.document_issued_at = Set(None);
        let updated = active.update(&*self.db_pool).await?;

        self.audit
            .record(AuditEntry::update(ENTITY, quote_id, &before, &updated))
            .await;
        Ok(updated)
    }

    /// Authoritative rollup of line, phase and quote totals in one transaction.
    #[instrument(skip(self))]
    pub async fn recompute(&self, quote_id: i32) -> Result<QuoteTotals, ServiceError> {
        let totals = db::with_transaction(&self.db_pool, move |txn| {
            Box::pin(async move { recompute_totals(txn, quote_id).await })
        })
        .await?;

        self.event_sender
            .send_or_log(Event::QuoteRecomputed {
                quote_id,
                total_amount: totals.total_amount,
                final_amount: totals.final_amount,
            })
            .await;
        Ok(totals)
    }

    /// Runs [`Self::recompute`] and turns a failure into a warning message.
    pub async fn recompute_best_effort(&self, quote_id: i32) -> Option<String> {
        match self.recompute(quote_id).await {
            Ok(_) => None,
            Err(e) => {
                warn!(quote_id, error = %e, "Quote recompute failed");
                Some(format!("recompute of quote {} failed: {}", quote_id, e))
            }
        }
    }

    /// Clears the issued document and turns a failure into a warning message.
    pub async fn invalidate_document_best_effort(&self, quote_id: i32) -> Option<String> {
        match invalidate_document(&*self.db_pool, quote_id).await {
            Ok(()) => None,
            Err(e) => {
                warn!(quote_id, error = %e, "Quote document invalidation failed");
                Some(format!("document invalidation of quote {} failed: {}", quote_id, e))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn snapshot(&self, quote_id: i32) -> Result<QuoteSnapshot, ServiceError> {
        QuoteSnapshot::load(&*self.db_pool, quote_id).await
    }

    /// Renders the quote and records a content hash of the artifact.
    #[instrument(skip(self, renderer))]
    pub async fn issue_document(
        &self,
        quote_id: i32,
        renderer: &dyn DocumentRenderer,
    ) -> Result<quote::Model, ServiceError> {
        let quote = self.get_quote(quote_id).await?;
        if quote.status == QuoteStatus::Canceled {
            return Err(ServiceError::PreconditionFailed(format!(
                "Quote {} is canceled",
                quote_id
            )));
        }

        self.recompute(quote_id).await?;
        let snapshot = self.snapshot(quote_id).await?;
        let blob = renderer.render(&snapshot).await.map_err(|e| {
            error!(quote_id, error = %e, "Document rendering failed");
            ServiceError::ExternalServiceError(format!("document renderer: {}", e))
        })?;
        let document_ref = hex::encode(Sha256::digest(&blob));

        let mut active: quote::ActiveModel = snapshot.quote.into();
        active.document_ref = Set(Some(document_ref.clone()));
        active.document_issued_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db_pool).await?;

        self.event_sender
            .send_or_log(Event::QuoteDocumentIssued {
                quote_id,
                document_ref,
            })
            .await;
        info!(quote_id, bytes = blob.len(), "Issued quote document");
        Ok(updated)
    }
}
