use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One reconciled day for one employee, keyed (employee_id, date).
/// Written only by the reconciliation engine, always as an upsert.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ConsolidatedDay {
    #[schema(example = 1001)]
    pub employee_id: u64,

    #[schema(value_type = String, format = "date", example = "2026-03-02")]
    pub date: NaiveDate,

    #[schema(example = 8.0)]
    pub total_worked: f64,
    #[schema(example = 8.0)]
    pub expected: f64,
    #[schema(example = 0.0)]
    pub extra: f64,
    #[schema(example = 0.0)]
    pub owed: f64,

    /// Break time exceeded work time when this is set; net hours were
    /// clamped to zero rather than going negative.
    pub interval_violation: bool,
    pub justified: bool,
    pub incomplete: bool,

    #[schema(example = 4)]
    pub punches_count: u32,
    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub first_punch: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub last_punch: Option<NaiveDateTime>,
    #[schema(example = 1.0)]
    pub total_interval: f64,

    #[schema(value_type = String, format = "date-time")]
    pub processed_at: NaiveDateTime,
}

/// Running balance across all consolidated days of an employee.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceSummary {
    #[schema(example = 12.5)]
    pub extra: f64,
    #[schema(example = 3.0)]
    pub owed: f64,
    /// extra - owed; negative when the employee owes hours.
    #[schema(example = 9.5)]
    pub balance: f64,
}

impl BalanceSummary {
    pub fn new(extra: f64, owed: f64) -> Self {
        Self { extra, owed, balance: extra - owed }
    }
}
