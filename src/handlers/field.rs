//! Scheduling and production endpoints.

use super::common::{created, ok, CreatedResult, HandlerResult};
use crate::{
    models::{allocation, production_entry},
    services::{
        production::{CreateProductionEntryInput, ProductionFilter, UpdateProductionEntryInput},
        scheduling::{AllocationView, CreateAllocationInput, UpdateAllocationInput},
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

pub fn allocations_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(allocations_for_day).post(create_allocation))
        .route("/job-site/:job_site_id", get(allocations_for_job_site))
        .route(
            "/:id",
            get(get_allocation)
                .put(update_allocation)
                .delete(delete_allocation),
        )
        .route("/:id/confirm", post(confirm_allocation))
        .route("/:id/unconfirm", post(unconfirm_allocation))
}

pub fn production_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_production_entries).post(create_production_entry))
        .route(
            "/:id",
            get(get_production_entry)
                .put(update_production_entry)
                .delete(delete_production_entry),
        )
}

#[derive(Debug, Deserialize)]
struct DayQuery {
    date: NaiveDate,
}

async fn create_allocation(
    State(state): State<AppState>,
    Json(input): Json<CreateAllocationInput>,
) -> CreatedResult<allocation::Model> {
    created(state.services.scheduling.create_allocation(input).await?)
}

async fn get_allocation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HandlerResult<allocation::Model> {
    ok(state.services.scheduling.get_allocation(id).await?)
}

async fn update_allocation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateAllocationInput>,
) -> HandlerResult<allocation::Model> {
    ok(state.services.scheduling.update_allocation(id, input).await?)
}

async fn delete_allocation(State(state): State<AppState>, Path(id): Path<i32>) -> HandlerResult<()> {
    ok(state.services.scheduling.delete_allocation(id).await?)
}

async fn confirm_allocation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HandlerResult<allocation::Model> {
    ok(state.services.scheduling.confirm_allocation(id).await?)
}

async fn unconfirm_allocation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HandlerResult<allocation::Model> {
    ok(state.services.scheduling.unconfirm_allocation(id).await?)
}

async fn allocations_for_day(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> HandlerResult<Vec<AllocationView>> {
    ok(state.services.scheduling.allocations_for_day(query.date).await?)
}

async fn allocations_for_job_site(
    State(state): State<AppState>,
    Path(job_site_id): Path<i32>,
) -> HandlerResult<Vec<AllocationView>> {
    ok(state
        .services
        .scheduling
        .allocations_for_job_site(job_site_id)
        .await?)
}

async fn create_production_entry(
    State(state): State<AppState>,
    Json(input): Json<CreateProductionEntryInput>,
) -> CreatedResult<production_entry::Model> {
    created(state.services.production.create_production_entry(input).await?)
}

async fn get_production_entry(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HandlerResult<production_entry::Model> {
    ok(state.services.production.get_production_entry(id).await?)
}

async fn update_production_entry(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateProductionEntryInput>,
) -> HandlerResult<production_entry::Model> {
    ok(state
        .services
        .production
        .update_production_entry(id, input)
        .await?)
}

async fn delete_production_entry(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HandlerResult<()> {
    ok(state.services.production.delete_production_entry(id).await?)
}

async fn list_production_entries(
    State(state): State<AppState>,
    Query(filter): Query<ProductionFilter>,
) -> HandlerResult<Vec<production_entry::Model>> {
    ok(state
        .services
        .production
        .list_production_entries(filter)
        .await?)
}
