//! Quote engine: versioning, monetary rollup, editability and issued documents.

mod common;

use assert_matches::assert_matches;
use common::{date, FailingRenderer, TestApp};
use obras_api::{
    errors::ServiceError,
    models::quote::QuoteStatus,
    services::{
        documents::JsonDocumentRenderer,
        phases::{AddServiceLineInput, CreatePhaseInput, UpdateServiceLineInput},
    },
};
use rust_decimal_macros::dec;

// ==================== Versioning ====================

#[tokio::test]
async fn test_quote_versions_grow_per_job_site() {
    let app = TestApp::new().await;
    let site = app.seed_job_site("Residencial Ipê").await;
    let other = app.seed_job_site("Galpão Norte").await;

    let v1 = app.seed_quote(site.id).await;
    let v2 = app.seed_quote(site.id).await;
    app.services()
        .quotes
        .transition_status(v2.id, QuoteStatus::Canceled)
        .await
        .expect("cancel v2");
    let v3 = app.seed_quote(site.id).await;
    let first_elsewhere = app.seed_quote(other.id).await;

    assert_eq!((v1.version, v2.version, v3.version), (1, 2, 3));
    assert_eq!(first_elsewhere.version, 1);
    assert_eq!(v1.status, QuoteStatus::Draft);
    assert_eq!(v1.total_amount, dec!(0));

    let listed = app
        .services()
        .quotes
        .list_quotes_for_job_site(site.id)
        .await
        .expect("list quotes");
    let versions: Vec<i32> = listed.iter().map(|q| q.version).collect();
    assert_eq!(versions, vec![3, 2, 1]);
}

#[tokio::test]
async fn test_quote_for_unknown_job_site_is_not_found() {
    let app = TestApp::new().await;
    let result = app.services().quotes.create_quote(9_999).await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

// ==================== Rollup ====================

#[tokio::test]
async fn test_line_totals_roll_up_into_phases_and_quote() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;

    let phases = app
        .services()
        .phases
        .list_phases(priced.quote.id)
        .await
        .expect("phases");
    assert_eq!(phases[0].phase_amount, dec!(100));
    assert_eq!(phases[1].phase_amount, dec!(50));
    assert_eq!(priced.quote.total_amount, dec!(150));
    assert_eq!(priced.quote.final_amount, dec!(150));

    let discounted = app
        .services()
        .quotes
        .apply_discount(priced.quote.id, dec!(20))
        .await
        .expect("discount");
    assert!(discounted.is_clean());
    assert_eq!(discounted.record.discount_amount, dec!(20));
    assert_eq!(discounted.record.final_amount, dec!(130));
}

#[tokio::test]
async fn test_discount_larger_than_total_floors_final_at_zero() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;

    let outcome = app
        .services()
        .quotes
        .apply_discount(priced.quote.id, dec!(500))
        .await
        .expect("discount");
    assert_eq!(outcome.record.total_amount, dec!(150));
    assert_eq!(outcome.record.final_amount, dec!(0));
}

#[tokio::test]
async fn test_negative_discount_is_rejected() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;

    let result = app
        .services()
        .quotes
        .apply_discount(priced.quote.id, dec!(-1))
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn test_line_edits_and_deletes_refresh_totals() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;
    let prep = &priced.phases[0];
    let line = app
        .services()
        .phases
        .list_service_lines(prep.id)
        .await
        .expect("lines")
        .remove(0);

    let updated = app
        .services()
        .phases
        .update_service_line(
            line.id,
            UpdateServiceLineInput {
                quantity: Some(dec!(2.5)),
                unit_price: Some(dec!(10.333)),
                ..Default::default()
            },
        )
        .await
        .expect("update line");
    assert!(updated.is_clean());
    assert_eq!(updated.record.line_total, dec!(25.83));

    let quote = app.services().quotes.get_quote(priced.quote.id).await.expect("quote");
    assert_eq!(quote.total_amount, dec!(75.83));

    app.services()
        .phases
        .delete_service_line(line.id)
        .await
        .expect("delete line");
    let quote = app.services().quotes.get_quote(priced.quote.id).await.expect("quote");
    assert_eq!(quote.total_amount, dec!(50));
}

#[tokio::test]
async fn test_explicit_recompute_reports_phase_amounts() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;

    let totals = app
        .services()
        .quotes
        .recompute(priced.quote.id)
        .await
        .expect("recompute");
    assert_eq!(totals.total_amount, dec!(150));
    assert_eq!(
        totals.phase_amounts,
        vec![(priced.phases[0].id, dec!(100)), (priced.phases[1].id, dec!(50))]
    );
}

#[tokio::test]
async fn test_failed_recompute_keeps_the_line_and_warns() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;
    let paint = &priced.phases[1];
    let primer = app.seed_service("Primer").await;
    app.fail_updates_of("phases", paint.id).await;

    let outcome = app
        .services()
        .phases
        .add_service_line(AddServiceLineInput {
            phase_id: paint.id,
            service_id: primer.id,
            quantity: dec!(1),
            unit_price: dec!(30),
            observation: None,
        })
        .await
        .expect("line insert itself succeeds");

    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("recompute"));
    let lines = app
        .services()
        .phases
        .list_service_lines(paint.id)
        .await
        .expect("lines");
    assert_eq!(lines.len(), 2);

    let quote = app.services().quotes.get_quote(priced.quote.id).await.expect("quote");
    assert_eq!(quote.total_amount, dec!(150));
}

// ==================== Editability ====================

#[tokio::test]
async fn test_approved_quote_rejects_pricing_changes() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;
    app.approve(priced.quote.id).await;

    let discount = app
        .services()
        .quotes
        .apply_discount(priced.quote.id, dec!(5))
        .await;
    assert_matches!(discount, Err(ServiceError::PreconditionFailed(_)));

    let phase = app
        .services()
        .phases
        .add_phase(CreatePhaseInput {
            job_site_id: priced.site.id,
            quote_id: priced.quote.id,
            name: "Extra coat".to_string(),
            sort_order: 3,
            status: None,
        })
        .await;
    assert_matches!(phase, Err(ServiceError::PreconditionFailed(_)));

    let sealer = app.seed_service("Sealer").await;
    let line = app
        .services()
        .phases
        .add_service_line(AddServiceLineInput {
            phase_id: priced.phases[0].id,
            service_id: sealer.id,
            quantity: dec!(1),
            unit_price: dec!(1),
            observation: None,
        })
        .await;
    assert_matches!(line, Err(ServiceError::PreconditionFailed(_)));
}

#[tokio::test]
async fn test_illegal_quote_transitions_are_rejected() {
    let app = TestApp::new().await;
    let site = app.seed_job_site("Casa Verde").await;
    let quote = app.seed_quote(site.id).await;

    let rejected = app
        .services()
        .quotes
        .transition_status(quote.id, QuoteStatus::Rejected)
        .await;
    assert_matches!(rejected, Err(ServiceError::InvalidStatus(_)));

    app.services()
        .quotes
        .transition_status(quote.id, QuoteStatus::Canceled)
        .await
        .expect("cancel");
    let revived = app
        .services()
        .quotes
        .transition_status(quote.id, QuoteStatus::Draft)
        .await;
    assert_matches!(revived, Err(ServiceError::InvalidStatus(_)));
}

#[tokio::test]
async fn test_approval_and_cancellation_are_timestamped() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;

    let issued = app
        .services()
        .quotes
        .transition_status(priced.quote.id, QuoteStatus::Issued)
        .await
        .expect("issue");
    assert!(issued.cascade.is_none());
    assert!(issued.quote.approved_at.is_none());

    let approved = app.approve(priced.quote.id).await;
    assert!(approved.approved_at.is_some());

    let canceled = app
        .services()
        .quotes
        .transition_status(priced.quote.id, QuoteStatus::Canceled)
        .await
        .expect("cancel");
    assert!(canceled.quote.canceled_at.is_some());
    assert!(canceled.cascade.is_some());
}

#[tokio::test]
async fn test_validity_is_stored() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;

    let updated = app
        .services()
        .quotes
        .set_validity(priced.quote.id, Some(date(2025, 12, 31)))
        .await
        .expect("validity");
    assert_eq!(updated.valid_until, Some(date(2025, 12, 31)));

    let cleared = app
        .services()
        .quotes
        .set_validity(priced.quote.id, None)
        .await
        .expect("clear validity");
    assert!(cleared.valid_until.is_none());
}

// ==================== Documents ====================

#[tokio::test]
async fn test_issued_document_is_invalidated_by_pricing_edits() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;

    let issued = app
        .services()
        .quotes
        .issue_document(priced.quote.id, &JsonDocumentRenderer)
        .await
        .expect("issue document");
    let document_ref = issued.document_ref.clone().expect("document ref");
    assert_eq!(document_ref.len(), 64);
    assert!(issued.document_issued_at.is_some());

    let discounted = app
        .services()
        .quotes
        .apply_discount(priced.quote.id, dec!(10))
        .await
        .expect("discount");
    assert!(discounted.record.document_ref.is_none());
    assert!(discounted.record.document_issued_at.is_none());
}

#[tokio::test]
async fn test_renderer_failure_is_an_external_error() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;

    let result = app
        .services()
        .quotes
        .issue_document(priced.quote.id, &FailingRenderer)
        .await;
    assert_matches!(result, Err(ServiceError::ExternalServiceError(_)));

    let quote = app.services().quotes.get_quote(priced.quote.id).await.expect("quote");
    assert!(quote.document_ref.is_none());
}

#[tokio::test]
async fn test_canceled_quote_cannot_issue_a_document() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;
    app.services()
        .quotes
        .transition_status(priced.quote.id, QuoteStatus::Canceled)
        .await
        .expect("cancel");

    let result = app
        .services()
        .quotes
        .issue_document(priced.quote.id, &JsonDocumentRenderer)
        .await;
    assert_matches!(result, Err(ServiceError::PreconditionFailed(_)));
}

#[tokio::test]
async fn test_snapshot_names_services_on_each_line() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;

    let snapshot = app
        .services()
        .quotes
        .snapshot(priced.quote.id)
        .await
        .expect("snapshot");
    assert_eq!(snapshot.job_site_title, "Edifício Aurora");
    assert_eq!(snapshot.phases.len(), 2);
    assert_eq!(snapshot.phases[0].phase.name, "Preparation");
    assert_eq!(snapshot.phases[0].lines[0].service_name, "Wall painting");
}
