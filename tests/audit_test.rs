//! Audit trail: records land in the log with the configured actor, and sink failures never fail a mutation.

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::{FailingAuditSink, TestApp};
use obras_api::{
    errors::ServiceError,
    models::{audit_log::AuditAction, quote::QuoteStatus},
    services::audit::{AuditEntry, AuditFilter, AuditSink},
};
use rust_decimal_macros::dec;
use serde_json::json;

#[derive(Default)]
struct RecordingSink {
    entries: Mutex<Vec<(AuditEntry, String)>>,
}

#[async_trait]
impl AuditSink for RecordingSink {
    async fn record(&self, entry: &AuditEntry, actor: &str) -> Result<(), ServiceError> {
        self.entries
            .lock()
            .expect("sink lock")
            .push((entry.clone(), actor.to_string()));
        Ok(())
    }
}

#[tokio::test]
async fn test_mutations_are_written_to_the_audit_log() {
    let app = TestApp::new().await;
    let client = app.seed_client("Construtora Alfa").await;

    let records = app
        .services()
        .audit
        .list_audit(AuditFilter {
            entity: Some("clients".to_string()),
            entity_id: Some(client.id),
            ..Default::default()
        })
        .await
        .expect("audit listing");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, AuditAction::Insert);
    assert_eq!(records[0].actor, "Sistema");
    assert!(records[0].before.is_none());
    assert_eq!(records[0].after.as_ref().map(|v| v["name"].clone()), Some(json!("Construtora Alfa")));
}

#[tokio::test]
async fn test_status_changes_record_both_states() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;
    app.approve(priced.quote.id).await;

    let records = app
        .services()
        .audit
        .list_audit(AuditFilter {
            entity: Some("quotes".to_string()),
            action: Some(AuditAction::StatusChange),
            ..Default::default()
        })
        .await
        .expect("audit listing");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].before, Some(json!({ "status": "DRAFT" })));
    assert_eq!(records[0].after, Some(json!({ "status": "APPROVED" })));
}

#[tokio::test]
async fn test_audit_listing_is_newest_first() {
    let app = TestApp::new().await;
    let site = app.seed_job_site("Hotel Mar Azul").await;
    let quote = app.seed_quote(site.id).await;
    app.services()
        .quotes
        .apply_discount(quote.id, dec!(5))
        .await
        .expect("discount");

    let records = app
        .services()
        .audit
        .list_audit(AuditFilter {
            entity: Some("quotes".to_string()),
            entity_id: Some(quote.id),
            ..Default::default()
        })
        .await
        .expect("audit listing");
    let actions: Vec<AuditAction> = records.iter().map(|r| r.action).collect();
    assert_eq!(actions, vec![AuditAction::Update, AuditAction::Insert]);
}

#[tokio::test]
async fn test_failing_sink_does_not_fail_the_operation() {
    let app = TestApp::with_audit_sink(Arc::new(FailingAuditSink)).await;
    let priced = app.priced_quote().await;

    let approved = app
        .services()
        .quotes
        .transition_status(priced.quote.id, QuoteStatus::Approved)
        .await
        .expect("approval survives a broken audit store");
    assert_eq!(approved.quote.status, QuoteStatus::Approved);

    let records = app
        .services()
        .audit
        .list_audit(AuditFilter::default())
        .await
        .expect("audit listing");
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_custom_sink_receives_entries_with_actor() {
    let sink = Arc::new(RecordingSink::default());
    let app = TestApp::with_audit_sink(sink.clone()).await;
    let worker = app.seed_worker("Joana Lima").await;

    let entries = sink.entries.lock().expect("sink lock");
    let (entry, actor) = entries.last().expect("an audit entry");
    assert_eq!(entry.entity, "workers");
    assert_eq!(entry.entity_id, Some(worker.id));
    assert_eq!(entry.action, AuditAction::Insert);
    assert_eq!(actor, "Sistema");
}
