//! Domain services. Each service owns a slice of the schema and is cheap to clone.

use rust_decimal::Decimal;
use serde::Serialize;
use validator::ValidationError;

// Registries
pub mod catalog;
pub mod clients;
pub mod job_sites;
pub mod workers;

// Quote engine and its phase/service-line store
pub mod documents;
pub mod phases;
pub mod quotes;

// Field work
pub mod production;
pub mod scheduling;

// Finance
pub mod payables;
pub mod receivables;
pub mod reports;

pub mod audit;

/// Result of a multi-step operation whose primary mutation succeeded.
///
/// Secondary steps (recompute, item population, cascades) that failed are
/// described in `warnings` instead of failing the call.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub record: T,
    pub warnings: Vec<String>,
}

impl<T> Outcome<T> {
    pub fn with_warnings(record: T, warnings: Vec<String>) -> Self {
        Self { record, warnings }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("negative");
        err.message = Some("must be zero or positive".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut err = ValidationError::new("not_positive");
        err.message = Some("must be greater than zero".into());
        return Err(err);
    }
    Ok(())
}
