use super::common::{ok, HandlerResult};
use crate::{
    models::audit_log,
    services::{
        audit::AuditFilter,
        reports::{DashboardStats, MonthlyStatement},
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};

pub fn reports_routes() -> Router<AppState> {
    Router::new()
        .route("/monthly/:year/:month", get(monthly_statement))
        .route("/dashboard", get(dashboard_stats))
}

pub fn audit_routes() -> Router<AppState> {
    Router::new().route("/", get(list_audit))
}

async fn monthly_statement(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> HandlerResult<MonthlyStatement> {
    ok(state.services.reports.monthly_statement(year, month).await?)
}

async fn dashboard_stats(State(state): State<AppState>) -> HandlerResult<DashboardStats> {
    ok(state.services.reports.dashboard_stats().await?)
}

async fn list_audit(
    State(state): State<AppState>,
    Query(filter): Query<AuditFilter>,
) -> HandlerResult<Vec<audit_log::Model>> {
    ok(state.services.audit.list_audit(filter).await?)
}
