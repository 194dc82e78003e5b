use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::time::Duration;
use utoipa::{IntoParams, ToSchema};

use crate::config::Config;
use crate::error::ReconciliationError;
use crate::ledger::store::{self, BatchOutcome, RangeStatistics};
use crate::model::consolidated::{BalanceSummary, ConsolidatedDay};

#[derive(Deserialize, ToSchema)]
pub struct ReconcileRequest {
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(value_type = String, format = "date", example = "2026-03-02")]
    pub date: NaiveDate,
}

/// Reconcile one employee/day into a consolidated summary
#[utoipa::path(
    post,
    path = "/api/v1/timesheet/reconcile",
    request_body = ReconcileRequest,
    responses(
        (status = 200, description = "Day consolidated (idempotent upsert)", body = ConsolidatedDay),
        (status = 404, description = "No profile or expected-hours configuration"),
        (status = 422, description = "Punch data error (pair ends before it starts)"),
        (status = 500)
    ),
    tag = "Timesheet"
)]
pub async fn reconcile_day(
    pool: web::Data<MySqlPool>,
    payload: web::Json<ReconcileRequest>,
) -> Result<impl Responder, ReconciliationError> {
    let day = store::reconcile_day(pool.get_ref(), payload.employee_id, payload.date).await?;
    Ok(HttpResponse::Ok().json(day))
}

#[derive(Deserialize, ToSchema)]
pub struct BatchRequest {
    #[schema(value_type = String, format = "date", example = "2026-03-02")]
    pub date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct SkippedEmployee {
    pub employee_id: u64,
    pub reason: String,
}

#[derive(Serialize, ToSchema)]
pub struct BatchResponse {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub reconciled: usize,
    pub skipped: Vec<SkippedEmployee>,
    pub days: Vec<ConsolidatedDay>,
}

/// Reconcile every active employee for one date
///
/// Per-employee failures are skipped and reported, never aborting the
/// rest of the batch. Safe to re-run after a timeout.
#[utoipa::path(
    post,
    path = "/api/v1/timesheet/reconcile-batch",
    request_body = BatchRequest,
    responses(
        (status = 200, body = BatchResponse),
        (status = 500)
    ),
    tag = "Timesheet"
)]
pub async fn reconcile_batch(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<BatchRequest>,
) -> Result<impl Responder, ReconciliationError> {
    let outcomes = store::reconcile_batch(
        pool.get_ref(),
        payload.date,
        Duration::from_millis(config.reconcile_timeout_ms),
    )
    .await?;

    let mut days = Vec::new();
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            BatchOutcome::Reconciled(day) => days.push(day),
            BatchOutcome::Skipped { employee_id, reason } => skipped.push(SkippedEmployee {
                employee_id,
                reason: reason.kind().to_string(),
            }),
        }
    }

    Ok(HttpResponse::Ok().json(BatchResponse {
        date: payload.date,
        reconciled: days.len(),
        skipped,
        days,
    }))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RangeQuery {
    #[param(example = "2026-03-01")]
    pub start: NaiveDate,
    #[param(example = "2026-03-31")]
    pub end: NaiveDate,
}

/// Consolidated days for an employee over a date range
#[utoipa::path(
    get,
    path = "/api/v1/timesheet/consolidated/{employee_id}",
    params(
        ("employee_id", description = "Employee ID"),
        RangeQuery
    ),
    responses(
        (status = 200, body = Vec<ConsolidatedDay>),
        (status = 500)
    ),
    tag = "Timesheet"
)]
pub async fn consolidated_range(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<RangeQuery>,
) -> Result<impl Responder, ReconciliationError> {
    let employee_id = path.into_inner();
    let days =
        store::consolidated_range(pool.get_ref(), employee_id, query.start, query.end).await?;
    Ok(HttpResponse::Ok().json(days))
}

/// Current extra/owed balance for an employee
#[utoipa::path(
    get,
    path = "/api/v1/timesheet/balance/{employee_id}",
    params(("employee_id", description = "Employee ID")),
    responses(
        (status = 200, body = BalanceSummary),
        (status = 404, description = "Unknown employee"),
        (status = 500)
    ),
    tag = "Timesheet"
)]
pub async fn current_balance(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ReconciliationError> {
    let employee_id = path.into_inner();
    match store::current_balance(pool.get_ref(), employee_id).await? {
        Some(balance) => Ok(HttpResponse::Ok().json(balance)),
        None => Err(ReconciliationError::MissingProfile { employee_id }),
    }
}

/// Aggregate statistics over a consolidated range
#[utoipa::path(
    get,
    path = "/api/v1/timesheet/statistics/{employee_id}",
    params(
        ("employee_id", description = "Employee ID"),
        RangeQuery
    ),
    responses(
        (status = 200, body = RangeStatistics),
        (status = 500)
    ),
    tag = "Timesheet"
)]
pub async fn range_statistics(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<RangeQuery>,
) -> Result<impl Responder, ReconciliationError> {
    let employee_id = path.into_inner();
    let stats =
        store::range_statistics(pool.get_ref(), employee_id, query.start, query.end).await?;
    Ok(HttpResponse::Ok().json(stats))
}
