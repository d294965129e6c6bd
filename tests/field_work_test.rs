//! Scheduling and production: the approved-quote gate, confirmation and computed values.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use common::{date, PricedQuote, TestApp};
use obras_api::{
    config::DayTypeMultipliers,
    errors::ServiceError,
    models::{
        allocation::{AllocationKind, AllocationPeriod},
        production_entry::DayType,
        quote::QuoteStatus,
        worker,
    },
    services::{
        audit::{AuditTrail, DbAuditSink},
        production::{
            CreateProductionEntryInput, ProductionFilter, ProductionService,
            UpdateProductionEntryInput,
        },
        scheduling::{CreateAllocationInput, UpdateAllocationInput},
    },
};
use rust_decimal_macros::dec;

async fn approved_site(app: &TestApp) -> (PricedQuote, worker::Model) {
    let priced = app.priced_quote().await;
    app.approve(priced.quote.id).await;
    let worker = app.seed_worker("Joana Lima").await;
    (priced, worker)
}

fn entry_for(priced: &PricedQuote, worker_id: i32) -> CreateProductionEntryInput {
    CreateProductionEntryInput {
        job_site_id: priced.site.id,
        quote_id: priced.quote.id,
        phase_id: priced.phases[0].id,
        worker_id,
        date: date(2024, 3, 4),
        day_type: None,
        base_value: dec!(200),
        discount_value: dec!(0),
        observation: None,
    }
}

// ==================== Allocations ====================

#[tokio::test]
async fn test_allocation_defaults_to_full_internal_unconfirmed() {
    let app = TestApp::new().await;
    let site = app.seed_job_site("Escola Municipal").await;
    let worker = app.seed_worker("Pedro Alves").await;

    let allocation = app
        .services()
        .scheduling
        .create_allocation(CreateAllocationInput {
            date: date(2024, 3, 4),
            worker_id: worker.id,
            job_site_id: site.id,
            period: None,
            kind: None,
            quote_id: None,
            phase_id: None,
            observation: None,
        })
        .await
        .expect("allocation");
    assert_eq!(allocation.period, AllocationPeriod::Full);
    assert_eq!(allocation.kind, AllocationKind::Internal);
    assert!(!allocation.confirmed);
}

#[tokio::test]
async fn test_allocation_for_unknown_worker_is_not_found() {
    let app = TestApp::new().await;
    let site = app.seed_job_site("Escola Municipal").await;

    let result = app
        .services()
        .scheduling
        .create_allocation(CreateAllocationInput {
            date: date(2024, 3, 4),
            worker_id: 404,
            job_site_id: site.id,
            period: None,
            kind: None,
            quote_id: None,
            phase_id: None,
            observation: None,
        })
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_confirmation_requires_an_approved_quote() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;
    let worker = app.seed_worker("Pedro Alves").await;
    let scheduling = &app.services().scheduling;

    let unlinked = scheduling
        .create_allocation(CreateAllocationInput {
            date: date(2024, 3, 4),
            worker_id: worker.id,
            job_site_id: priced.site.id,
            period: Some(AllocationPeriod::Half),
            kind: None,
            quote_id: None,
            phase_id: None,
            observation: None,
        })
        .await
        .expect("allocation");
    assert_matches!(
        scheduling.confirm_allocation(unlinked.id).await,
        Err(ServiceError::ValidationError(_))
    );

    let linked = scheduling
        .update_allocation(
            unlinked.id,
            UpdateAllocationInput {
                quote_id: Some(priced.quote.id),
                phase_id: Some(priced.phases[0].id),
                ..Default::default()
            },
        )
        .await
        .expect("link quote");
    assert_matches!(
        scheduling.confirm_allocation(linked.id).await,
        Err(ServiceError::PreconditionFailed(_))
    );

    app.approve(priced.quote.id).await;
    let confirmed = scheduling
        .confirm_allocation(linked.id)
        .await
        .expect("confirm");
    assert!(confirmed.confirmed);

    let again = scheduling
        .confirm_allocation(linked.id)
        .await
        .expect("confirming twice is a no-op");
    assert!(again.confirmed);

    let unconfirmed = scheduling
        .unconfirm_allocation(linked.id)
        .await
        .expect("unconfirm");
    assert!(!unconfirmed.confirmed);
}

#[tokio::test]
async fn test_confirmation_rejects_a_phase_of_another_quote() {
    let app = TestApp::new().await;
    let (priced, worker) = approved_site(&app).await;
    let other_quote = app.seed_quote(priced.site.id).await;
    let foreign_phase = app.seed_phase(&other_quote, "Cleanup", 1).await;
    let scheduling = &app.services().scheduling;

    let allocation = scheduling
        .create_allocation(CreateAllocationInput {
            date: date(2024, 3, 5),
            worker_id: worker.id,
            job_site_id: priced.site.id,
            period: None,
            kind: None,
            quote_id: Some(priced.quote.id),
            phase_id: Some(foreign_phase.id),
            observation: None,
        })
        .await
        .expect("allocation");
    assert_matches!(
        scheduling.confirm_allocation(allocation.id).await,
        Err(ServiceError::ValidationError(_))
    );

    let stored = scheduling.get_allocation(allocation.id).await.expect("allocation");
    assert!(!stored.confirmed);
}

#[tokio::test]
async fn test_changing_the_quote_drops_confirmation() {
    let app = TestApp::new().await;
    let (priced, worker) = approved_site(&app).await;
    let next = app.seed_quote(priced.site.id).await;
    let scheduling = &app.services().scheduling;

    let allocation = scheduling
        .create_allocation(CreateAllocationInput {
            date: date(2024, 3, 4),
            worker_id: worker.id,
            job_site_id: priced.site.id,
            period: None,
            kind: Some(AllocationKind::External),
            quote_id: Some(priced.quote.id),
            phase_id: Some(priced.phases[0].id),
            observation: None,
        })
        .await
        .expect("allocation");
    scheduling
        .confirm_allocation(allocation.id)
        .await
        .expect("confirm");

    let same_quote = scheduling
        .update_allocation(
            allocation.id,
            UpdateAllocationInput {
                observation: Some("bring ladders".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("observation only");
    assert!(same_quote.confirmed);

    let moved = scheduling
        .update_allocation(
            allocation.id,
            UpdateAllocationInput {
                quote_id: Some(next.id),
                ..Default::default()
            },
        )
        .await
        .expect("move to new version");
    assert!(!moved.confirmed);
    assert_eq!(moved.quote_id, Some(next.id));

    let cleared = scheduling
        .update_allocation(
            allocation.id,
            UpdateAllocationInput {
                clear_quote: true,
                ..Default::default()
            },
        )
        .await
        .expect("clear quote");
    assert!(cleared.quote_id.is_none());
    assert!(cleared.phase_id.is_none());
}

#[tokio::test]
async fn test_day_schedule_is_labelled_and_grouped_by_worker() {
    let app = TestApp::new().await;
    let (priced, _) = approved_site(&app).await;
    let zeca = app.seed_worker("Zeca Souza").await;
    let ana = app.seed_worker("Ana Prado").await;
    let scheduling = &app.services().scheduling;

    for (worker_id, day) in [(zeca.id, 4), (ana.id, 4), (ana.id, 5)] {
        scheduling
            .create_allocation(CreateAllocationInput {
                date: date(2024, 3, day),
                worker_id,
                job_site_id: priced.site.id,
                period: None,
                kind: None,
                quote_id: Some(priced.quote.id),
                phase_id: Some(priced.phases[1].id),
                observation: None,
            })
            .await
            .expect("allocation");
    }

    let day = scheduling
        .allocations_for_day(date(2024, 3, 4))
        .await
        .expect("day schedule");
    let names: Vec<&str> = day.iter().map(|v| v.worker_name.as_str()).collect();
    assert_eq!(names, vec!["Ana Prado", "Zeca Souza"]);
    assert_eq!(day[0].job_site_title, "Edifício Aurora");
    assert_eq!(day[0].quote_version, Some(1));
    assert_eq!(day[0].quote_status, Some(QuoteStatus::Approved));
    assert_eq!(day[0].phase_name.as_deref(), Some("Paint coat 1"));

    let site_history = scheduling
        .allocations_for_job_site(priced.site.id)
        .await
        .expect("site schedule");
    assert_eq!(site_history.len(), 3);
    assert_eq!(site_history[0].allocation.date, date(2024, 3, 5));
}

// ==================== Production ====================

#[tokio::test]
async fn test_production_on_a_draft_quote_is_refused() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;
    let worker = app.seed_worker("Joana Lima").await;

    let result = app
        .services()
        .production
        .create_production_entry(entry_for(&priced, worker.id))
        .await;
    assert_matches!(result, Err(ServiceError::PreconditionFailed(_)));
}

#[tokio::test]
async fn test_production_values_are_computed() {
    let app = TestApp::new().await;
    let (priced, worker) = approved_site(&app).await;

    let entry = app
        .services()
        .production
        .create_production_entry(CreateProductionEntryInput {
            discount_value: dec!(30),
            day_type: Some(DayType::Saturday),
            ..entry_for(&priced, worker.id)
        })
        .await
        .expect("entry");
    assert_eq!(entry.gross_value, dec!(200));
    assert_eq!(entry.final_value, dec!(170));
    assert_eq!(entry.day_type, DayType::Saturday);

    let floored = app
        .services()
        .production
        .update_production_entry(
            entry.id,
            UpdateProductionEntryInput {
                discount_value: Some(dec!(500)),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(floored.final_value, dec!(0));
}

#[tokio::test]
async fn test_day_type_multipliers_scale_gross_value() {
    let app = TestApp::new().await;
    let (priced, worker) = approved_site(&app).await;
    let audit = Arc::new(AuditTrail::new(
        Arc::new(DbAuditSink::new(app.db.clone())),
        "Sistema",
    ));
    let production = ProductionService::new(
        app.db.clone(),
        app.state.event_sender.clone(),
        audit,
        DayTypeMultipliers {
            sunday: dec!(2),
            ..Default::default()
        },
    );

    let sunday = production
        .create_production_entry(CreateProductionEntryInput {
            day_type: Some(DayType::Sunday),
            ..entry_for(&priced, worker.id)
        })
        .await
        .expect("sunday entry");
    assert_eq!(sunday.gross_value, dec!(400));

    let weekday = production
        .create_production_entry(entry_for(&priced, worker.id))
        .await
        .expect("weekday entry");
    assert_eq!(weekday.gross_value, dec!(200));
}

#[tokio::test]
async fn test_production_references_must_line_up() {
    let app = TestApp::new().await;
    let (priced, worker) = approved_site(&app).await;
    let other = app.priced_quote().await;
    app.approve(other.quote.id).await;

    let foreign_phase = app
        .services()
        .production
        .create_production_entry(CreateProductionEntryInput {
            phase_id: other.phases[0].id,
            ..entry_for(&priced, worker.id)
        })
        .await;
    assert_matches!(foreign_phase, Err(ServiceError::ValidationError(_)));

    let foreign_site = app
        .services()
        .production
        .create_production_entry(CreateProductionEntryInput {
            job_site_id: other.site.id,
            ..entry_for(&priced, worker.id)
        })
        .await;
    assert_matches!(foreign_site, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn test_moving_an_entry_to_an_unapproved_quote_is_refused() {
    let app = TestApp::new().await;
    let (priced, worker) = approved_site(&app).await;
    let entry = app
        .services()
        .production
        .create_production_entry(entry_for(&priced, worker.id))
        .await
        .expect("entry");

    let draft = app.seed_quote(priced.site.id).await;
    let draft_phase = app.seed_phase(&draft, "Preparation", 1).await;

    let result = app
        .services()
        .production
        .update_production_entry(
            entry.id,
            UpdateProductionEntryInput {
                quote_id: Some(draft.id),
                phase_id: Some(draft_phase.id),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(result, Err(ServiceError::PreconditionFailed(_)));
}

#[tokio::test]
async fn test_production_listing_filters_by_worker_and_window() {
    let app = TestApp::new().await;
    let (priced, joana) = approved_site(&app).await;
    let pedro = app.seed_worker("Pedro Alves").await;
    let production = &app.services().production;

    for (worker_id, day) in [(joana.id, 4), (joana.id, 12), (pedro.id, 5)] {
        production
            .create_production_entry(CreateProductionEntryInput {
                date: date(2024, 3, day),
                ..entry_for(&priced, worker_id)
            })
            .await
            .expect("entry");
    }

    let joana_first_week = production
        .list_production_entries(ProductionFilter {
            worker_id: Some(joana.id),
            from: Some(date(2024, 3, 4)),
            to: Some(date(2024, 3, 10)),
            ..Default::default()
        })
        .await
        .expect("listing");
    assert_eq!(joana_first_week.len(), 1);
    assert_eq!(joana_first_week[0].date, date(2024, 3, 4));

    let whole_site = production
        .list_production_entries(ProductionFilter {
            job_site_id: Some(priced.site.id),
            ..Default::default()
        })
        .await
        .expect("listing");
    let dates: Vec<_> = whole_site.iter().map(|e| e.date).collect();
    assert_eq!(dates, vec![date(2024, 3, 12), date(2024, 3, 5), date(2024, 3, 4)]);
}
