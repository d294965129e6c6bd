//! Obras API Library
//!
//! Operations backend for painting contractors: job sites, versioned quotes,
//! scheduling, production and the resulting receivables and payables.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod models;
pub mod money;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::{audit::AuditSink, documents::DocumentRenderer};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub services: handlers::AppServices,
    pub renderer: Arc<dyn DocumentRenderer>,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: Arc<events::EventSender>,
        audit_sink: Arc<dyn AuditSink>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        let services = handlers::AppServices::new(
            db.clone(),
            event_sender.clone(),
            audit_sink,
            &config.default_actor,
            config.day_type_multipliers.clone(),
        );
        Self {
            db,
            config,
            event_sender,
            services,
            renderer,
        }
    }
}

// Common response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    /// Success whose secondary steps partly failed; warnings travel in `errors`.
    pub fn with_warnings(data: T, warnings: Vec<String>) -> Self {
        if warnings.is_empty() {
            return Self::success(data);
        }
        Self {
            success: true,
            data: Some(data),
            message: Some("Completed with warnings".to_string()),
            errors: Some(warnings),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        // Registries
        .nest("/clients", handlers::registry::clients_routes())
        .nest("/workers", handlers::registry::workers_routes())
        .nest("/job-sites", handlers::registry::job_sites_routes())
        .nest("/services", handlers::registry::catalog_routes())
        // Quote engine
        .nest("/quotes", handlers::quotes::quotes_routes())
        .nest("/phases", handlers::quotes::phases_routes())
        .nest("/lines", handlers::quotes::lines_routes())
        // Field work
        .nest("/allocations", handlers::field::allocations_routes())
        .nest("/production", handlers::field::production_routes())
        // Finance
        .nest("/receivables", handlers::finance::receivables_routes())
        .nest("/payables", handlers::finance::payables_routes())
        // Reports and audit
        .nest("/reports", handlers::reports::reports_routes())
        .nest("/audit", handlers::reports::audit_routes())
}

/// Full HTTP application: health probe, `/api/v1`, request tracing and CORS.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn api_status() -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "obras-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let db_status = match db::check_connection(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Ok(Json(ApiResponse::success(json!({
        "status": db_status,
        "checks": { "database": db_status },
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))))
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn warnings_are_reported_without_failing() {
        let response = ApiResponse::with_warnings(1, vec!["recompute failed".into()]);
        assert!(response.success);
        assert_eq!(response.errors.as_deref(), Some(&["recompute failed".to_string()][..]));
    }

    #[test]
    fn no_warnings_means_plain_success() {
        let response = ApiResponse::with_warnings("ok", Vec::new());
        assert!(response.errors.is_none());
        assert!(response.message.is_none());
    }

    #[test]
    fn error_envelope_has_no_data() {
        let response = ApiResponse::<()>::error("oops".into());
        assert!(!response.success);
        assert!(response.data.is_none());
    }
}
