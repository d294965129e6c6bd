use super::common::{created, created_outcome, ok, CreatedResult, HandlerResult, StatusRequest};
use crate::{
    models::{
        payable::{self, PayableStatus},
        payable_item,
        receivable::{self, ReceivableStatus},
    },
    money::DiscountShare,
    services::{
        payables::{AddPayableItemInput, CreatePayableInput, PayableFilter, UpdatePayableInput},
        receivables::{CreateReceivableInput, ReceivableFilter, UpdateReceivableInput},
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{delete, get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

pub fn receivables_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_receivables).post(create_receivable))
        .route("/flag-overdue", post(flag_overdue))
        .route("/quote/:quote_id", get(receivables_for_quote))
        .route("/quote/:quote_id/discount-proration", get(discount_proration))
        .route(
            "/:id",
            get(get_receivable)
                .put(update_receivable)
                .delete(delete_receivable),
        )
        .route("/:id/status", post(set_receivable_status))
}

pub fn payables_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payables).post(create_payable))
        .route("/items", post(add_payable_item))
        .route("/items/:item_id", delete(delete_payable_item))
        .route(
            "/:id",
            get(get_payable).put(update_payable).delete(delete_payable),
        )
        .route("/:id/status", post(set_payable_status))
        .route("/:id/items", get(list_payable_items))
}

#[derive(Debug, Deserialize)]
struct OverdueRequest {
    as_of: Option<NaiveDate>,
}

async fn create_receivable(
    State(state): State<AppState>,
    Json(input): Json<CreateReceivableInput>,
) -> CreatedResult<receivable::Model> {
    created(state.services.receivables.create_receivable(input).await?)
}

async fn get_receivable(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HandlerResult<receivable::Model> {
    ok(state.services.receivables.get_receivable(id).await?)
}

async fn update_receivable(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateReceivableInput>,
) -> HandlerResult<receivable::Model> {
    ok(state.services.receivables.update_receivable(id, input).await?)
}

async fn delete_receivable(State(state): State<AppState>, Path(id): Path<i32>) -> HandlerResult<()> {
    ok(state.services.receivables.delete_receivable(id).await?)
}

async fn set_receivable_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<StatusRequest<ReceivableStatus>>,
) -> HandlerResult<receivable::Model> {
    ok(state
        .services
        .receivables
        .set_receivable_status(id, body.status, body.paid_date)
        .await?)
}

async fn flag_overdue(
    State(state): State<AppState>,
    Json(body): Json<OverdueRequest>,
) -> HandlerResult<Vec<receivable::Model>> {
    let as_of = body
        .as_of
        .unwrap_or_else(|| chrono::Utc::now().date_naive());
    ok(state
        .services
        .receivables
        .flag_overdue_receivables(as_of)
        .await?)
}

async fn list_receivables(
    State(state): State<AppState>,
    Query(filter): Query<ReceivableFilter>,
) -> HandlerResult<Vec<receivable::Model>> {
    ok(state.services.receivables.list_receivables(filter).await?)
}

async fn receivables_for_quote(
    State(state): State<AppState>,
    Path(quote_id): Path<i32>,
) -> HandlerResult<Vec<receivable::Model>> {
    ok(state
        .services
        .receivables
        .receivables_for_quote(quote_id)
        .await?)
}

async fn discount_proration(
    State(state): State<AppState>,
    Path(quote_id): Path<i32>,
) -> HandlerResult<Vec<DiscountShare>> {
    ok(state
        .services
        .receivables
        .discount_proration_for_quote(quote_id)
        .await?)
}

async fn create_payable(
    State(state): State<AppState>,
    Json(input): Json<CreatePayableInput>,
) -> CreatedResult<payable::Model> {
    created_outcome(state.services.payables.create_payable(input).await?)
}

async fn get_payable(State(state): State<AppState>, Path(id): Path<i32>) -> HandlerResult<payable::Model> {
    ok(state.services.payables.get_payable(id).await?)
}

async fn update_payable(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdatePayableInput>,
) -> HandlerResult<payable::Model> {
    ok(state.services.payables.update_payable(id, input).await?)
}

async fn delete_payable(State(state): State<AppState>, Path(id): Path<i32>) -> HandlerResult<()> {
    ok(state.services.payables.delete_payable(id).await?)
}

async fn set_payable_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<StatusRequest<PayableStatus>>,
) -> HandlerResult<payable::Model> {
    ok(state
        .services
        .payables
        .set_payable_status(id, body.status, body.paid_date)
        .await?)
}

async fn list_payables(
    State(state): State<AppState>,
    Query(filter): Query<PayableFilter>,
) -> HandlerResult<Vec<payable::Model>> {
    ok(state.services.payables.list_payables(filter).await?)
}

async fn list_payable_items(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HandlerResult<Vec<payable_item::Model>> {
    ok(state.services.payables.list_payable_items(id).await?)
}

async fn add_payable_item(
    State(state): State<AppState>,
    Json(input): Json<AddPayableItemInput>,
) -> CreatedResult<payable_item::Model> {
    created(state.services.payables.add_payable_item(input).await?)
}

async fn delete_payable_item(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
) -> HandlerResult<payable::Model> {
    ok(state.services.payables.delete_payable_item(item_id).await?)
}
