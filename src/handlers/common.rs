use crate::{errors::ServiceError, services::Outcome, ApiResponse};
use axum::{http::StatusCode, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type HandlerResult<T> = Result<Json<ApiResponse<T>>, ServiceError>;
pub type CreatedResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ServiceError>;

/// 200 with the standard envelope
pub fn ok<T: Serialize>(data: T) -> HandlerResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

/// 201 with the standard envelope
pub fn created<T: Serialize>(data: T) -> CreatedResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

/// 200 carrying the record and any warnings of a multi-step operation.
pub fn ok_outcome<T: Serialize>(outcome: Outcome<T>) -> HandlerResult<T> {
    Ok(Json(ApiResponse::with_warnings(outcome.record, outcome.warnings)))
}

pub fn created_outcome<T: Serialize>(outcome: Outcome<T>) -> CreatedResult<T> {
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_warnings(outcome.record, outcome.warnings)),
    ))
}

/// Query flag shared by registry listings
#[derive(Debug, Default, Deserialize)]
pub struct ActiveQuery {
    #[serde(default)]
    pub active_only: bool,
    pub search: Option<String>,
}

/// Body of status-change endpoints
#[derive(Debug, Deserialize)]
pub struct StatusRequest<S> {
    pub status: S,
    pub paid_date: Option<NaiveDate>,
}
