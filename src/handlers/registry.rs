use super::common::{created, ok, ActiveQuery, CreatedResult, HandlerResult};
use crate::{
    models::{client, job_site, service_catalog, worker, worker::WorkerRole},
    services::{
        catalog::{CreateServiceInput, UpdateServiceInput},
        clients::{CreateClientInput, UpdateClientInput},
        job_sites::{CreateJobSiteInput, JobSiteFilter, UpdateJobSiteInput},
        workers::{CreateWorkerInput, UpdateWorkerInput},
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;

pub fn clients_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route("/:id", get(get_client).put(update_client))
}

pub fn workers_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_workers).post(create_worker))
        .route("/:id", get(get_worker).put(update_worker))
}

pub fn job_sites_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_job_sites).post(create_job_site))
        .route("/:id", get(get_job_site).put(update_job_site))
}

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services).post(create_service))
        .route("/:id", get(get_service).put(update_service))
}

async fn create_client(
    State(state): State<AppState>,
    Json(input): Json<CreateClientInput>,
) -> CreatedResult<client::Model> {
    created(state.services.clients.create_client(input).await?)
}

async fn get_client(State(state): State<AppState>, Path(id): Path<i32>) -> HandlerResult<client::Model> {
    ok(state.services.clients.get_client(id).await?)
}

async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateClientInput>,
) -> HandlerResult<client::Model> {
    ok(state.services.clients.update_client(id, input).await?)
}

async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ActiveQuery>,
) -> HandlerResult<Vec<client::Model>> {
    ok(state
        .services
        .clients
        .list_clients(query.active_only, query.search)
        .await?)
}

#[derive(Debug, Default, Deserialize)]
struct WorkerQuery {
    #[serde(default)]
    active_only: bool,
    role: Option<WorkerRole>,
}

async fn create_worker(
    State(state): State<AppState>,
    Json(input): Json<CreateWorkerInput>,
) -> CreatedResult<worker::Model> {
    created(state.services.workers.create_worker(input).await?)
}

async fn get_worker(State(state): State<AppState>, Path(id): Path<i32>) -> HandlerResult<worker::Model> {
    ok(state.services.workers.get_worker(id).await?)
}

async fn update_worker(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateWorkerInput>,
) -> HandlerResult<worker::Model> {
    ok(state.services.workers.update_worker(id, input).await?)
}

async fn list_workers(
    State(state): State<AppState>,
    Query(query): Query<WorkerQuery>,
) -> HandlerResult<Vec<worker::Model>> {
    ok(state
        .services
        .workers
        .list_workers(query.active_only, query.role)
        .await?)
}

async fn create_job_site(
    State(state): State<AppState>,
    Json(input): Json<CreateJobSiteInput>,
) -> CreatedResult<job_site::Model> {
    created(state.services.job_sites.create_job_site(input).await?)
}

async fn get_job_site(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HandlerResult<job_site::Model> {
    ok(state.services.job_sites.get_job_site(id).await?)
}

async fn update_job_site(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateJobSiteInput>,
) -> HandlerResult<job_site::Model> {
    ok(state.services.job_sites.update_job_site(id, input).await?)
}

async fn list_job_sites(
    State(state): State<AppState>,
    Query(filter): Query<JobSiteFilter>,
) -> HandlerResult<Vec<job_site::Model>> {
    ok(state.services.job_sites.list_job_sites(filter).await?)
}

async fn create_service(
    State(state): State<AppState>,
    Json(input): Json<CreateServiceInput>,
) -> CreatedResult<service_catalog::Model> {
    created(state.services.catalog.create_service(input).await?)
}

async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HandlerResult<service_catalog::Model> {
    ok(state.services.catalog.get_service(id).await?)
}

async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateServiceInput>,
) -> HandlerResult<service_catalog::Model> {
    ok(state.services.catalog.update_service(id, input).await?)
}

async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<ActiveQuery>,
) -> HandlerResult<Vec<service_catalog::Model>> {
    ok(state.services.catalog.list_services(query.active_only).await?)
}
