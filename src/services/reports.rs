use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{
        client,
        job_site::{self, JobSiteStatus},
        payable::{self, PayableStatus},
        quote::{self, QuoteStatus},
        receivable::{self, ReceivableStatus},
        worker,
    },
    money,
};

/// Cash received and paid out in one calendar month
#[derive(Debug, Serialize, Deserialize)]
pub struct MonthlyStatement {
    pub year: i32,
    pub month: u32,
    pub receivables: Vec<receivable::Model>,
    pub payables: Vec<payable::Model>,
    pub total_received: Decimal,
    pub total_paid: Decimal,
    pub balance: Decimal,
}

/// Headline counters for the home screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub active_job_sites: u64,
    pub pending_quotes: u64,
    pub active_workers: u64,
    pub active_clients: u64,
}

/// First day of the month and first day of the next one.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ServiceError> {
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        ServiceError::ValidationError(format!("{}-{:02} is not a valid month", year, month))
    })?;
    let (next_year, next_month) = if start.month() == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(|| {
        ServiceError::ValidationError(format!("{}-{:02} is out of range", year, month))
    })?;
    Ok((start, end))
}

/// Read-only financial and operational summaries
#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Paid receivables and payables whose effective date falls in the month.
    ///
    /// Receivables count on `paid_date`, falling back to `due_date`; payables
    /// on `paid_date`, falling back to `reference_end`.
    #[instrument(skip(self))]
    pub async fn monthly_statement(
        &self,
        year: i32,
        month: u32,
    ) -> Result<MonthlyStatement, ServiceError> {
        let (start, end) = month_bounds(year, month)?;

        let receivables = receivable::Entity::find()
            .filter(receivable::Column::Status.eq(ReceivableStatus::Paid))
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(receivable::Column::PaidDate.gte(start))
                            .add(receivable::Column::PaidDate.lt(end)),
                    )
                    .add(
                        Condition::all()
                            .add(receivable::Column::PaidDate.is_null())
                            .add(receivable::Column::DueDate.gte(start))
                            .add(receivable::Column::DueDate.lt(end)),
                    ),
            )
            .order_by_asc(receivable::Column::PaidDate)
            .order_by_asc(receivable::Column::Id)
            .all(&*self.db_pool)
            .await?;

        let payables = payable::Entity::find()
            .filter(payable::Column::Status.eq(PayableStatus::Paid))
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(payable::Column::PaidDate.gte(start))
                            .add(payable::Column::PaidDate.lt(end)),
                    )
                    .add(
                        Condition::all()
                            .add(payable::Column::PaidDate.is_null())
                            .add(payable::Column::ReferenceEnd.gte(start))
                            .add(payable::Column::ReferenceEnd.lt(end)),
                    ),
            )
            .order_by_asc(payable::Column::PaidDate)
            .order_by_asc(payable::Column::Id)
            .all(&*self.db_pool)
            .await?;

        let total_received = money::round_money(receivables.iter().map(|r| r.amount).sum());
        let total_paid = money::round_money(payables.iter().map(|p| p.amount).sum());

        info!(
            year,
            month,
            receivables = receivables.len(),
            payables = payables.len(),
            "Built monthly statement"
        );
        Ok(MonthlyStatement {
            year,
            month,
            receivables,
            payables,
            total_received,
            total_paid,
            balance: total_received - total_paid,
        })
    }

    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ServiceError> {
        let active_job_sites = job_site::Entity::find()
            .filter(job_site::Column::Active.eq(true))
            .filter(job_site::Column::Status.is_in(JobSiteStatus::ongoing()))
            .count(&*self.db_pool)
            .await?;
        let pending_quotes = quote::Entity::find()
            .filter(quote::Column::Status.is_in(QuoteStatus::pending()))
            .count(&*self.db_pool)
            .await?;
        let active_workers = worker::Entity::find()
            .filter(worker::Column::Active.eq(true))
            .count(&*self.db_pool)
            .await?;
        let active_clients = client::Entity::find()
            .filter(client::Column::Active.eq(true))
            .count(&*self.db_pool)
            .await?;

        Ok(DashboardStats {
            active_job_sites,
            pending_quotes,
            active_workers,
            active_clients,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn december_rolls_into_next_year() {
        let (start, end) = month_bounds(2024, 12).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn invalid_month_is_a_validation_error() {
        assert!(matches!(
            month_bounds(2024, 13),
            Err(ServiceError::ValidationError(_))
        ));
    }
}
