pub mod common;
pub mod field;
pub mod finance;
pub mod quotes;
pub mod registry;
pub mod reports;

use crate::config::DayTypeMultipliers;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    audit::{AuditService, AuditSink, AuditTrail},
    catalog::CatalogService,
    clients::ClientService,
    job_sites::JobSiteService,
    payables::PayableService,
    phases::PhaseService,
    production::ProductionService,
    quotes::QuoteService,
    receivables::ReceivableService,
    reports::ReportService,
    scheduling::SchedulingService,
    workers::WorkerService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub clients: Arc<ClientService>,
    pub workers: Arc<WorkerService>,
    pub job_sites: Arc<JobSiteService>,
    pub catalog: Arc<CatalogService>,
    pub quotes: Arc<QuoteService>,
    pub phases: Arc<PhaseService>,
    pub scheduling: Arc<SchedulingService>,
    pub production: Arc<ProductionService>,
    pub receivables: Arc<ReceivableService>,
    pub payables: Arc<PayableService>,
    pub reports: Arc<ReportService>,
    pub audit: Arc<AuditService>,
}

impl AppServices {
    /// Wires every service over one pool, event channel and audit sink.
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        audit_sink: Arc<dyn AuditSink>,
        actor: &str,
        multipliers: DayTypeMultipliers,
    ) -> Self {
        let audit = Arc::new(AuditTrail::new(audit_sink, actor));
        let quotes = Arc::new(QuoteService::new(
            db_pool.clone(),
            event_sender.clone(),
            audit.clone(),
        ));

        Self {
            clients: Arc::new(ClientService::new(db_pool.clone(), audit.clone())),
            workers: Arc::new(WorkerService::new(db_pool.clone(), audit.clone())),
            job_sites: Arc::new(JobSiteService::new(db_pool.clone(), audit.clone())),
            catalog: Arc::new(CatalogService::new(db_pool.clone(), audit.clone())),
            phases: Arc::new(PhaseService::new(
                db_pool.clone(),
                event_sender.clone(),
                audit.clone(),
                quotes.clone(),
            )),
            quotes,
            scheduling: Arc::new(SchedulingService::new(
                db_pool.clone(),
                event_sender.clone(),
                audit.clone(),
            )),
            production: Arc::new(ProductionService::new(
                db_pool.clone(),
                event_sender.clone(),
                audit.clone(),
                multipliers,
            )),
            receivables: Arc::new(ReceivableService::new(
                db_pool.clone(),
                event_sender.clone(),
                audit.clone(),
            )),
            payables: Arc::new(PayableService::new(
                db_pool.clone(),
                event_sender,
                audit,
            )),
            reports: Arc::new(ReportService::new(db_pool.clone())),
            audit: Arc::new(AuditService::new(db_pool)),
        }
    }
}
