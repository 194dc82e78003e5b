use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;
use tracing::{error, info, warn};

use crate::error::{AdmissionError, ReconciliationError};
use crate::ledger::pairing::{self, DayPairing};
use crate::ledger::reconcile::{self, DaySummary};
use crate::ledger::sequence;
use crate::ledger::stamp;
use crate::model::consolidated::{BalanceSummary, ConsolidatedDay};
use crate::model::employee::EmployeeProfile;
use crate::model::geofence::Geofence;
use crate::model::punch::{PunchMethod, PunchRecord, PunchType};

const PUNCH_COLUMNS: &str = "id, nsr, employee_id, punch_time, punch_type, method, \
     integrity_stamp, location_lat, location_lng, location_accuracy, \
     within_geofence, geofence_name, face_similarity, created_at";

const CONSOLIDATED_COLUMNS: &str = "employee_id, date, total_worked, expected, extra, owed, \
     interval_violation, justified, incomplete, punches_count, \
     first_punch, last_punch, total_interval, processed_at";

/// A punch that passed admission checks but has no NSR or stamp yet.
#[derive(Debug, Clone)]
pub struct PunchCandidate {
    pub employee_id: u64,
    pub punch_time: NaiveDateTime,
    pub punch_type: PunchType,
    pub method: PunchMethod,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub location_accuracy: Option<f64>,
    pub within_geofence: bool,
    pub geofence_name: Option<String>,
    pub face_similarity: Option<f64>,
}

/// The employee's most recent committed punch, across all dates.
pub async fn last_punch(
    pool: &MySqlPool,
    employee_id: u64,
) -> Result<Option<PunchRecord>, sqlx::Error> {
    sqlx::query_as::<_, PunchRecord>(&format!(
        "SELECT {PUNCH_COLUMNS} FROM time_punches \
         WHERE employee_id = ? ORDER BY nsr DESC LIMIT 1"
    ))
    .bind(employee_id)
    .fetch_optional(pool)
    .await
}

/// All punches for one employee/date. NSR (commit order) is the primary
/// sort key, wall-clock only the tie-breaker.
pub async fn punches_for_date(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Vec<PunchRecord>, sqlx::Error> {
    sqlx::query_as::<_, PunchRecord>(&format!(
        "SELECT {PUNCH_COLUMNS} FROM time_punches \
         WHERE employee_id = ? AND DATE(punch_time) = ? \
         ORDER BY nsr ASC, punch_time ASC"
    ))
    .bind(employee_id)
    .bind(date)
    .fetch_all(pool)
    .await
}

pub async fn punch_by_nsr(pool: &MySqlPool, nsr: u64) -> Result<Option<PunchRecord>, sqlx::Error> {
    sqlx::query_as::<_, PunchRecord>(&format!(
        "SELECT {PUNCH_COLUMNS} FROM time_punches WHERE nsr = ?"
    ))
    .bind(nsr)
    .fetch_optional(pool)
    .await
}

/// Punches flagged outside every geofence, for audit reports.
pub async fn punches_outside_geofence(
    pool: &MySqlPool,
    employee_id: u64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PunchRecord>, sqlx::Error> {
    sqlx::query_as::<_, PunchRecord>(&format!(
        "SELECT {PUNCH_COLUMNS} FROM time_punches \
         WHERE employee_id = ? AND DATE(punch_time) >= ? AND DATE(punch_time) <= ? \
         AND within_geofence = FALSE \
         ORDER BY nsr ASC"
    ))
    .bind(employee_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// Active zones in priority order (lowest id wins first).
pub async fn active_geofences(pool: &MySqlPool) -> Result<Vec<Geofence>, sqlx::Error> {
    sqlx::query_as::<_, Geofence>(
        "SELECT id, name, center_lat, center_lng, radius_meters, active \
         FROM geofences WHERE active = TRUE ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn employee_profile(
    pool: &MySqlPool,
    employee_id: u64,
) -> Result<Option<EmployeeProfile>, sqlx::Error> {
    sqlx::query_as::<_, EmployeeProfile>(
        "SELECT id, expected_hours_daily, extra_hours_balance, owed_hours_balance, active \
         FROM employees WHERE id = ?",
    )
    .bind(employee_id)
    .fetch_optional(pool)
    .await
}

pub async fn active_employee_ids(pool: &MySqlPool) -> Result<Vec<u64>, sqlx::Error> {
    sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE active = TRUE ORDER BY id ASC")
        .fetch_all(pool)
        .await
}

/// Justification collaborator contract: is there an approved
/// justification covering this employee/date?
pub async fn has_approved_justification(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM justifications \
         WHERE employee_id = ? AND date = ? AND approved = TRUE",
    )
    .bind(employee_id)
    .bind(date)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Commit an admitted punch: allocate the NSR, derive the stamp, and
/// insert, all inside one transaction. An `AllocationTimeout` retries
/// the whole attempt up to `max_retries` times; every retry is a fresh
/// allocation, a timed-out NSR is never reused.
pub async fn commit_punch(
    pool: &MySqlPool,
    candidate: &PunchCandidate,
    lock_timeout: Duration,
    max_retries: u32,
) -> Result<PunchRecord, AdmissionError> {
    let mut attempt = 0;
    loop {
        match try_commit_punch(pool, candidate, lock_timeout).await {
            Err(AdmissionError::AllocationTimeout) if attempt < max_retries => {
                attempt += 1;
                warn!(
                    employee_id = candidate.employee_id,
                    attempt, "NSR allocation timed out, retrying submission"
                );
            }
            other => return other,
        }
    }
}

async fn try_commit_punch(
    pool: &MySqlPool,
    candidate: &PunchCandidate,
    lock_timeout: Duration,
) -> Result<PunchRecord, AdmissionError> {
    let mut tx = pool.begin().await?;

    let nsr = sequence::next_nsr(&mut tx, lock_timeout).await?;
    let integrity_stamp = stamp::compute(
        candidate.employee_id,
        candidate.punch_type,
        candidate.punch_time,
        nsr,
    );

    sqlx::query(
        "INSERT INTO time_punches \
         (nsr, employee_id, punch_time, punch_type, method, integrity_stamp, \
          location_lat, location_lng, location_accuracy, within_geofence, \
          geofence_name, face_similarity) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(nsr)
    .bind(candidate.employee_id)
    .bind(candidate.punch_time)
    .bind(candidate.punch_type)
    .bind(candidate.method)
    .bind(&integrity_stamp)
    .bind(candidate.location_lat)
    .bind(candidate.location_lng)
    .bind(candidate.location_accuracy)
    .bind(candidate.within_geofence)
    .bind(&candidate.geofence_name)
    .bind(candidate.face_similarity)
    .execute(&mut *tx)
    .await?;

    let record = sqlx::query_as::<_, PunchRecord>(&format!(
        "SELECT {PUNCH_COLUMNS} FROM time_punches WHERE nsr = ?"
    ))
    .bind(nsr)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        employee_id = record.employee_id,
        nsr = record.nsr,
        punch_type = %record.punch_type,
        within_geofence = record.within_geofence,
        "punch committed"
    );
    Ok(record)
}

/// Reconcile one employee/day: pair the punches, summarize against the
/// expected hours, upsert the consolidated row, and move the running
/// balances by the delta versus any earlier consolidation of the same
/// day. Re-running with the same punch set is a no-op on the balances.
pub async fn reconcile_day(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<ConsolidatedDay, ReconciliationError> {
    let profile = employee_profile(pool, employee_id)
        .await?
        .ok_or(ReconciliationError::MissingProfile { employee_id })?;
    if profile.expected_hours_daily <= 0.0 {
        return Err(ReconciliationError::MissingProfile { employee_id });
    }

    // Punches are immutable once committed, so one read is a consistent
    // snapshot. A punch committed after this read is picked up by the
    // next run, which the delta-based balance update makes safe.
    let punches = punches_for_date(pool, employee_id, date).await?;
    let pairing = pairing::pair_day(&punches)?;
    let justified = has_approved_justification(pool, employee_id, date).await?;
    let summary = reconcile::summarize(&pairing, profile.expected_hours_daily, justified);

    apply_consolidation(pool, employee_id, date, &summary, &pairing).await
}

async fn apply_consolidation(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
    summary: &DaySummary,
    pairing: &DayPairing,
) -> Result<ConsolidatedDay, ReconciliationError> {
    let mut tx = pool.begin().await?;

    // Lock the previous consolidation (if any) so two overlapping jobs
    // for the same day serialize and neither delta is lost.
    let previous = sqlx::query_as::<_, ConsolidatedDay>(&format!(
        "SELECT {CONSOLIDATED_COLUMNS} FROM timesheet_consolidated \
         WHERE employee_id = ? AND date = ? FOR UPDATE"
    ))
    .bind(employee_id)
    .bind(date)
    .fetch_optional(&mut *tx)
    .await?;

    let delta = reconcile::balance_delta(summary, previous.as_ref());

    sqlx::query(
        "INSERT INTO timesheet_consolidated \
         (employee_id, date, total_worked, expected, extra, owed, \
          interval_violation, justified, incomplete, punches_count, \
          first_punch, last_punch, total_interval, processed_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NOW()) \
         ON DUPLICATE KEY UPDATE \
          total_worked = VALUES(total_worked), expected = VALUES(expected), \
          extra = VALUES(extra), owed = VALUES(owed), \
          interval_violation = VALUES(interval_violation), \
          justified = VALUES(justified), incomplete = VALUES(incomplete), \
          punches_count = VALUES(punches_count), first_punch = VALUES(first_punch), \
          last_punch = VALUES(last_punch), total_interval = VALUES(total_interval), \
          processed_at = NOW()",
    )
    .bind(employee_id)
    .bind(date)
    .bind(summary.total_worked)
    .bind(summary.expected)
    .bind(summary.extra)
    .bind(summary.owed)
    .bind(summary.interval_violation)
    .bind(summary.justified)
    .bind(summary.incomplete)
    .bind(pairing.punches_count)
    .bind(pairing.first_punch)
    .bind(pairing.last_punch)
    .bind(summary.total_interval)
    .execute(&mut *tx)
    .await?;

    // In-place delta update: never a read-then-blind-overwrite, so
    // concurrent reconciliations of other days cannot lose updates.
    if delta.extra != 0.0 || delta.owed != 0.0 {
        sqlx::query(
            "UPDATE employees \
             SET extra_hours_balance = extra_hours_balance + ?, \
                 owed_hours_balance = owed_hours_balance + ? \
             WHERE id = ?",
        )
        .bind(delta.extra)
        .bind(delta.owed)
        .bind(employee_id)
        .execute(&mut *tx)
        .await?;
    }

    let row = sqlx::query_as::<_, ConsolidatedDay>(&format!(
        "SELECT {CONSOLIDATED_COLUMNS} FROM timesheet_consolidated \
         WHERE employee_id = ? AND date = ?"
    ))
    .bind(employee_id)
    .bind(date)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        employee_id,
        %date,
        extra = summary.extra,
        owed = summary.owed,
        delta_extra = delta.extra,
        delta_owed = delta.owed,
        incomplete = summary.incomplete,
        "day consolidated"
    );
    Ok(row)
}

/// Outcome of one employee inside a batch run.
#[derive(Debug)]
pub enum BatchOutcome {
    Reconciled(ConsolidatedDay),
    Skipped { employee_id: u64, reason: ReconciliationError },
}

/// Reconcile every active employee for one date. Failures skip the
/// affected employee and are reported in the result, never aborting the
/// rest of the batch. Each employee gets a bounded slice of time; a
/// timed-out day is safely re-runnable because the upsert is idempotent.
pub async fn reconcile_batch(
    pool: &MySqlPool,
    date: NaiveDate,
    per_employee_timeout: Duration,
) -> Result<Vec<BatchOutcome>, ReconciliationError> {
    let employee_ids = active_employee_ids(pool).await?;
    let mut outcomes = Vec::with_capacity(employee_ids.len());

    for employee_id in employee_ids {
        let result =
            tokio::time::timeout(per_employee_timeout, reconcile_day(pool, employee_id, date))
                .await
                .unwrap_or(Err(ReconciliationError::Timeout { employee_id }));

        match result {
            Ok(day) => outcomes.push(BatchOutcome::Reconciled(day)),
            Err(reason) => {
                error!(employee_id, %date, error = %reason, "reconciliation skipped");
                outcomes.push(BatchOutcome::Skipped { employee_id, reason });
            }
        }
    }
    Ok(outcomes)
}

pub async fn consolidated_range(
    pool: &MySqlPool,
    employee_id: u64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ConsolidatedDay>, sqlx::Error> {
    sqlx::query_as::<_, ConsolidatedDay>(&format!(
        "SELECT {CONSOLIDATED_COLUMNS} FROM timesheet_consolidated \
         WHERE employee_id = ? AND date >= ? AND date <= ? \
         ORDER BY date ASC"
    ))
    .bind(employee_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// Current running balance straight off the employee row, which the
/// reconciliation engine keeps in sync through delta updates.
pub async fn current_balance(
    pool: &MySqlPool,
    employee_id: u64,
) -> Result<Option<BalanceSummary>, sqlx::Error> {
    let profile = employee_profile(pool, employee_id).await?;
    Ok(profile.map(|p| BalanceSummary::new(p.extra_hours_balance, p.owed_hours_balance)))
}

/// Aggregate stats over a consolidated range, for the balance screen.
#[derive(Debug, serde::Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct RangeStatistics {
    pub total_days: i64,
    pub incomplete_days: i64,
    pub justified_days: i64,
    pub total_worked: f64,
    pub total_expected: f64,
    pub total_extra: f64,
    pub total_owed: f64,
    pub violation_days: i64,
}

pub async fn range_statistics(
    pool: &MySqlPool,
    employee_id: u64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<RangeStatistics, sqlx::Error> {
    sqlx::query_as::<_, RangeStatistics>(
        "SELECT \
           COUNT(*) AS total_days, \
           CAST(COALESCE(SUM(incomplete), 0) AS SIGNED) AS incomplete_days, \
           CAST(COALESCE(SUM(justified), 0) AS SIGNED) AS justified_days, \
           CAST(COALESCE(SUM(total_worked), 0) AS DOUBLE) AS total_worked, \
           CAST(COALESCE(SUM(expected), 0) AS DOUBLE) AS total_expected, \
           CAST(COALESCE(SUM(extra), 0) AS DOUBLE) AS total_extra, \
           CAST(COALESCE(SUM(owed), 0) AS DOUBLE) AS total_owed, \
           CAST(COALESCE(SUM(interval_violation), 0) AS SIGNED) AS violation_days \
         FROM timesheet_consolidated \
         WHERE employee_id = ? AND date >= ? AND date <= ?",
    )
    .bind(employee_id)
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await
}
