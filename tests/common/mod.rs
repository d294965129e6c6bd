#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use chrono::NaiveDate;
use obras_api::{
    config::AppConfig,
    db::{self, DbConfig, DbPool},
    errors::ServiceError,
    events::{self, EventSender},
    handlers::AppServices,
    models::{client, job_site, phase, quote, quote::QuoteStatus, service_catalog, worker},
    services::{
        audit::{AuditEntry, AuditSink, DbAuditSink},
        catalog::CreateServiceInput,
        clients::CreateClientInput,
        documents::{DocumentRenderer, JsonDocumentRenderer, QuoteSnapshot},
        job_sites::CreateJobSiteInput,
        phases::{AddServiceLineInput, CreatePhaseInput},
        workers::CreateWorkerInput,
    },
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::ConnectionTrait;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Application state over a fresh in-memory SQLite database with migrations applied.
pub struct TestApp {
    pub state: AppState,
    pub db: Arc<DbPool>,
    router: Router,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(None).await
    }

    /// Same as [`TestApp::new`] but audit records go to `sink`.
    pub async fn with_audit_sink(sink: Arc<dyn AuditSink>) -> Self {
        Self::build(Some(sink)).await
    }

    async fn build(sink: Option<Arc<dyn AuditSink>>) -> Self {
        // One connection: every pooled connection to sqlite::memory: is its own database.
        let pool = db::establish_connection_with_config(&DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        })
        .await
        .expect("failed to open test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        let sink = sink.unwrap_or_else(|| Arc::new(DbAuditSink::new(db_arc.clone())));
        let state = AppState::new(
            db_arc.clone(),
            cfg,
            event_sender,
            sink,
            Arc::new(JsonDocumentRenderer),
        );
        let router = obras_api::app_router(state.clone());

        Self {
            state,
            db: db_arc,
            router,
            _event_task: event_task,
        }
    }

    pub fn services(&self) -> &AppServices {
        &self.state.services
    }

    /// Runs raw SQL, e.g. to install failure-injection triggers.
    pub async fn exec(&self, sql: &str) {
        self.db
            .execute_unprepared(sql)
            .await
            .expect("raw sql should run");
    }

    /// Makes every UPDATE of the given row in `table` abort.
    pub async fn fail_updates_of(&self, table: &str, id: i32) {
        self.exec(&format!(
            "CREATE TRIGGER fail_{table}_update_{id} BEFORE UPDATE ON {table} \
             WHEN NEW.id = {id} BEGIN SELECT RAISE(ABORT, 'injected failure'); END;"
        ))
        .await;
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(json) => builder.body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    pub async fn seed_client(&self, name: &str) -> client::Model {
        self.services()
            .clients
            .create_client(CreateClientInput {
                name: name.to_string(),
                phone: None,
                address: None,
            })
            .await
            .expect("create client")
    }

    pub async fn seed_job_site(&self, title: &str) -> job_site::Model {
        let client = self.seed_client(&format!("Client of {title}")).await;
        self.services()
            .job_sites
            .create_job_site(CreateJobSiteInput {
                client_id: client.id,
                title: title.to_string(),
                address: Some("Rua das Flores, 10".to_string()),
            })
            .await
            .expect("create job site")
    }

    pub async fn seed_worker(&self, name: &str) -> worker::Model {
        self.services()
            .workers
            .create_worker(CreateWorkerInput {
                name: name.to_string(),
                role: obras_api::models::worker::WorkerRole::Painter,
                phone: None,
                daily_rate: Decimal::from(200),
            })
            .await
            .expect("create worker")
    }

    pub async fn seed_service(&self, name: &str) -> service_catalog::Model {
        self.services()
            .catalog
            .create_service(CreateServiceInput {
                name: name.to_string(),
                unit: obras_api::models::service_catalog::ServiceUnit::SquareMeter,
            })
            .await
            .expect("create service")
    }

    pub async fn seed_quote(&self, job_site_id: i32) -> quote::Model {
        self.services()
            .quotes
            .create_quote(job_site_id)
            .await
            .expect("create quote")
    }

    pub async fn seed_phase(&self, quote: &quote::Model, name: &str, order: i32) -> phase::Model {
        self.services()
            .phases
            .add_phase(CreatePhaseInput {
                job_site_id: quote.job_site_id,
                quote_id: quote.id,
                name: name.to_string(),
                sort_order: order,
                status: None,
            })
            .await
            .expect("add phase")
    }

    pub async fn seed_line(
        &self,
        phase_id: i32,
        service_id: i32,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> obras_api::models::phase_service_line::Model {
        let outcome = self
            .services()
            .phases
            .add_service_line(AddServiceLineInput {
                phase_id,
                service_id,
                quantity,
                unit_price,
                observation: None,
            })
            .await
            .expect("add service line");
        assert!(outcome.is_clean(), "unexpected warnings: {:?}", outcome.warnings);
        outcome.record
    }

    pub async fn approve(&self, quote_id: i32) -> quote::Model {
        self.services()
            .quotes
            .transition_status(quote_id, QuoteStatus::Approved)
            .await
            .expect("approve quote")
            .quote
    }

    /// Job site, quote and two priced phases: 100.00 on the first, 50.00 on the second.
    pub async fn priced_quote(&self) -> PricedQuote {
        let site = self.seed_job_site("Edifício Aurora").await;
        let quote = self.seed_quote(site.id).await;
        let prep = self.seed_phase(&quote, "Preparation", 1).await;
        let paint = self.seed_phase(&quote, "Paint coat 1", 2).await;
        let service = self.seed_service("Wall painting").await;
        self.seed_line(prep.id, service.id, Decimal::from(10), Decimal::from(10))
            .await;
        self.seed_line(paint.id, service.id, Decimal::from(5), Decimal::from(10))
            .await;
        let quote = self.services().quotes.get_quote(quote.id).await.expect("quote");

        PricedQuote {
            site,
            quote,
            phases: vec![prep, paint],
            service,
        }
    }
}

pub struct PricedQuote {
    pub site: job_site::Model,
    pub quote: quote::Model,
    pub phases: Vec<phase::Model>,
    pub service: service_catalog::Model,
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Audit sink that always fails.
pub struct FailingAuditSink;

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn record(&self, _entry: &AuditEntry, _actor: &str) -> Result<(), ServiceError> {
        Err(ServiceError::InternalError("audit store offline".to_string()))
    }
}

/// Renderer that always fails.
pub struct FailingRenderer;

#[async_trait]
impl DocumentRenderer for FailingRenderer {
    async fn render(&self, _snapshot: &QuoteSnapshot) -> Result<Bytes, anyhow::Error> {
        Err(anyhow::anyhow!("renderer unavailable"))
    }
}
