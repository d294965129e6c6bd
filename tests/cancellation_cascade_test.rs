//! Canceling a quote cancels its open phases one at a time and reports the ones that failed.

mod common;

use common::TestApp;
use obras_api::models::{phase::PhaseStatus, quote::QuoteStatus};

#[tokio::test]
async fn test_cancel_cascades_to_every_open_phase() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;

    let transition = app
        .services()
        .quotes
        .transition_status(priced.quote.id, QuoteStatus::Canceled)
        .await
        .expect("cancel");
    let cascade = transition.cascade.expect("cascade report");
    assert!(cascade.is_complete());
    assert_eq!(
        cascade.canceled_phase_ids,
        vec![priced.phases[0].id, priced.phases[1].id]
    );

    let phases = app
        .services()
        .phases
        .list_phases(priced.quote.id)
        .await
        .expect("phases");
    assert!(phases.iter().all(|p| p.status == PhaseStatus::Canceled));
}

#[tokio::test]
async fn test_cancel_skips_finished_phases() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;
    let prep = &priced.phases[0];
    app.approve(priced.quote.id).await;
    app.services()
        .phases
        .set_phase_status(prep.id, PhaseStatus::InProgress)
        .await
        .expect("start");
    app.services()
        .phases
        .set_phase_status(prep.id, PhaseStatus::Done)
        .await
        .expect("finish");

    let cascade = app
        .services()
        .quotes
        .transition_status(priced.quote.id, QuoteStatus::Canceled)
        .await
        .expect("cancel")
        .cascade
        .expect("cascade report");
    assert_eq!(cascade.canceled_phase_ids, vec![priced.phases[1].id]);

    let prep = app.services().phases.get_phase(prep.id).await.expect("phase");
    assert_eq!(prep.status, PhaseStatus::Done);
}

#[tokio::test]
async fn test_failed_phase_is_reported_and_the_rest_stay_canceled() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;
    let finishing = app.seed_phase(&priced.quote, "Finishing", 3).await;
    let stuck = &priced.phases[1];
    app.fail_updates_of("phases", stuck.id).await;

    let transition = app
        .services()
        .quotes
        .transition_status(priced.quote.id, QuoteStatus::Canceled)
        .await
        .expect("quote cancellation itself succeeds");
    assert_eq!(transition.quote.status, QuoteStatus::Canceled);

    let cascade = transition.cascade.expect("cascade report");
    assert!(!cascade.is_complete());
    assert_eq!(
        cascade.canceled_phase_ids,
        vec![priced.phases[0].id, finishing.id]
    );
    assert_eq!(cascade.failures.len(), 1);
    assert_eq!(cascade.failures[0].phase_id, stuck.id);

    let stuck = app.services().phases.get_phase(stuck.id).await.expect("phase");
    assert_eq!(stuck.status, PhaseStatus::Pending);
    let finishing = app.services().phases.get_phase(finishing.id).await.expect("phase");
    assert_eq!(finishing.status, PhaseStatus::Canceled);
    let quote = app.services().quotes.get_quote(priced.quote.id).await.expect("quote");
    assert_eq!(quote.status, QuoteStatus::Canceled);
}

#[tokio::test]
async fn test_cancel_succeeds_when_phases_cannot_be_listed() {
    let app = TestApp::new().await;
    let priced = app.priced_quote().await;
    app.exec("ALTER TABLE phases RENAME TO phases_unavailable").await;

    let transition = app
        .services()
        .quotes
        .transition_status(priced.quote.id, QuoteStatus::Canceled)
        .await
        .expect("cancellation is kept once the quote row is updated");
    assert_eq!(transition.quote.status, QuoteStatus::Canceled);

    let cascade = transition.cascade.expect("cascade report");
    assert!(!cascade.is_complete());
    assert!(cascade.lookup_error.is_some());
    assert!(cascade.canceled_phase_ids.is_empty());

    let quote = app.services().quotes.get_quote(priced.quote.id).await.expect("quote");
    assert_eq!(quote.status, QuoteStatus::Canceled);
}
