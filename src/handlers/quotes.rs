use super::common::{
    created, created_outcome, ok, ok_outcome, CreatedResult, HandlerResult,
};
use crate::{
    models::{
        phase::{self, PhaseStatus},
        phase_service_line, quote,
        quote::QuoteStatus,
    },
    services::{
        documents::QuoteSnapshot,
        phases::{
            AddServiceLineInput, CreatePhaseInput, PhaseStatusUpdate, UpdatePhaseInput,
            UpdateServiceLineInput,
        },
        quotes::{QuoteTotals, StatusTransition},
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post, put},
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

pub fn quotes_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quotes).post(create_quote))
        .route("/:id", get(get_quote))
        .route("/:id/status", post(transition_status))
        .route("/:id/discount", put(apply_discount))
        .route("/:id/validity", put(set_validity))
        .route("/:id/recompute", post(recompute))
        .route("/:id/document", post(issue_document))
        .route("/:id/snapshot", get(snapshot))
        .route("/:id/phases", get(list_phases))
        .route("/:id/default-phases", post(create_default_phases))
}

pub fn phases_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(add_phase))
        .route("/:id", get(get_phase).put(update_phase).delete(delete_phase))
        .route("/:id/status", post(set_phase_status))
        .route("/:id/lines", get(list_service_lines))
}

pub fn lines_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(add_service_line))
        .route("/:id", put(update_service_line).delete(delete_service_line))
}

#[derive(Debug, Deserialize)]
struct CreateQuoteRequest {
    job_site_id: i32,
}

#[derive(Debug, Deserialize)]
struct QuoteListQuery {
    job_site_id: i32,
}

#[derive(Debug, Deserialize)]
struct QuoteStatusRequest {
    status: QuoteStatus,
}

#[derive(Debug, Deserialize)]
struct DiscountRequest {
    discount: Decimal,
}

#[derive(Debug, Deserialize)]
struct ValidityRequest {
    valid_until: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct PhaseStatusRequest {
    status: PhaseStatus,
}

async fn create_quote(
    State(state): State<AppState>,
    Json(body): Json<CreateQuoteRequest>,
) -> CreatedResult<quote::Model> {
    created(state.services.quotes.create_quote(body.job_site_id).await?)
}

async fn list_quotes(
    State(state): State<AppState>,
    Query(query): Query<QuoteListQuery>,
) -> HandlerResult<Vec<quote::Model>> {
    ok(state
        .services
        .quotes
        .list_quotes_for_job_site(query.job_site_id)
        .await?)
}

async fn get_quote(State(state): State<AppState>, Path(id): Path<i32>) -> HandlerResult<quote::Model> {
    ok(state.services.quotes.get_quote(id).await?)
}

async fn transition_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<QuoteStatusRequest>,
) -> HandlerResult<StatusTransition> {
    ok(state
        .services
        .quotes
        .transition_status(id, body.status)
        .await?)
}

async fn apply_discount(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<DiscountRequest>,
) -> HandlerResult<quote::Model> {
    ok_outcome(state.services.quotes.apply_discount(id, body.discount).await?)
}

async fn set_validity(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<ValidityRequest>,
) -> HandlerResult<quote::Model> {
    ok(state
        .services
        .quotes
        .set_validity(id, body.valid_until)
        .await?)
}

async fn recompute(State(state): State<AppState>, Path(id): Path<i32>) -> HandlerResult<QuoteTotals> {
    ok(state.services.quotes.recompute(id).await?)
}

async fn issue_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HandlerResult<quote::Model> {
    ok(state
        .services
        .quotes
        .issue_document(id, state.renderer.as_ref())
        .await?)
}

async fn snapshot(State(state): State<AppState>, Path(id): Path<i32>) -> HandlerResult<QuoteSnapshot> {
    ok(state.services.quotes.snapshot(id).await?)
}

async fn list_phases(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HandlerResult<Vec<phase::Model>> {
    ok(state.services.phases.list_phases(id).await?)
}

async fn create_default_phases(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> CreatedResult<Vec<phase::Model>> {
    created(state.services.phases.create_default_phases(id).await?)
}

async fn add_phase(
    State(state): State<AppState>,
    Json(input): Json<CreatePhaseInput>,
) -> CreatedResult<phase::Model> {
    created(state.services.phases.add_phase(input).await?)
}

async fn get_phase(State(state): State<AppState>, Path(id): Path<i32>) -> HandlerResult<phase::Model> {
    ok(state.services.phases.get_phase(id).await?)
}

async fn update_phase(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdatePhaseInput>,
) -> HandlerResult<PhaseStatusUpdate> {
    ok_outcome(state.services.phases.update_phase(id, input).await?)
}

async fn delete_phase(State(state): State<AppState>, Path(id): Path<i32>) -> HandlerResult<phase::Model> {
    ok_outcome(state.services.phases.delete_phase(id).await?)
}

async fn set_phase_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<PhaseStatusRequest>,
) -> HandlerResult<PhaseStatusUpdate> {
    ok(state
        .services
        .phases
        .set_phase_status(id, body.status)
        .await?)
}

async fn list_service_lines(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HandlerResult<Vec<phase_service_line::Model>> {
    ok(state.services.phases.list_service_lines(id).await?)
}

async fn add_service_line(
    State(state): State<AppState>,
    Json(input): Json<AddServiceLineInput>,
) -> CreatedResult<phase_service_line::Model> {
    created_outcome(state.services.phases.add_service_line(input).await?)
}

async fn update_service_line(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateServiceLineInput>,
) -> HandlerResult<phase_service_line::Model> {
    ok_outcome(state.services.phases.update_service_line(id, input).await?)
}

async fn delete_service_line(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HandlerResult<phase_service_line::Model> {
    ok_outcome(state.services.phases.delete_service_line(id).await?)
}
