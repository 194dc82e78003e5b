use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::time::Duration;
use utoipa::{IntoParams, ToSchema};

use crate::config::Config;
use crate::error::AdmissionError;
use crate::ledger::admission::AdmissionRules;
use crate::ledger::geofence::{self, GeoPoint, GeofenceVerdict};
use crate::ledger::{stamp, store};
use crate::model::punch::{PunchMethod, PunchRecord, PunchType};

#[derive(Deserialize, ToSchema)]
pub struct SubmitPunch {
    #[schema(example = 1001)]
    pub employee_id: u64,

    /// Server time is used when omitted; terminals with a trusted clock
    /// may supply their own capture time.
    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub punch_time: Option<NaiveDateTime>,

    pub method: PunchMethod,

    /// Defaults to the type the cycle expects next. An explicit
    /// out-of-cycle type is admitted and recorded as given; physical
    /// reality beats the ideal cycle.
    #[schema(nullable = true)]
    pub punch_type: Option<PunchType>,

    #[schema(example = -23.5505, nullable = true)]
    pub location_lat: Option<f64>,
    #[schema(example = -46.6333, nullable = true)]
    pub location_lng: Option<f64>,
    #[schema(example = 12.5, nullable = true)]
    pub location_accuracy: Option<f64>,

    /// Score from the external face classifier; absent when the
    /// classifier did not run or degraded. Stored as-is, never defaulted.
    #[schema(example = 0.97, nullable = true)]
    pub face_similarity: Option<f64>,
}

#[derive(Serialize, ToSchema)]
pub struct GeofenceReport {
    pub within: bool,
    #[schema(nullable = true)]
    pub zone_name: Option<String>,
    /// How far outside the nearest zone, human readable ("120m").
    #[schema(example = "120m", nullable = true)]
    pub distance_outside: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct PunchResponse {
    pub record: PunchRecord,
    /// The type the ideal cycle expects after this punch.
    pub expected_next_type: PunchType,
    /// The submitted type was not the one the cycle expected. Recorded
    /// anyway; pairing analysis deals with it later.
    pub out_of_cycle: bool,
    pub geofence: GeofenceReport,
}

/// Submit a time punch
#[utoipa::path(
    post,
    path = "/api/v1/punch",
    request_body = SubmitPunch,
    responses(
        (status = 201, description = "Punch committed to the ledger", body = PunchResponse),
        (status = 400, description = "Invalid coordinate or geofence"),
        (status = 403, description = "Outside geofence (hard enforcement enabled)"),
        (status = 429, description = "Duplicate suppression: last punch too recent"),
        (status = 503, description = "Sequence allocation timed out after retries"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Punch"
)]
pub async fn submit_punch(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<SubmitPunch>,
) -> Result<impl Responder, AdmissionError> {
    let punch_time = payload
        .punch_time
        .unwrap_or_else(|| chrono::Local::now().naive_local());

    let verdict = match (payload.location_lat, payload.location_lng) {
        (Some(lat), Some(lng)) => {
            let point = GeoPoint::new(lat, lng)?;
            let zones = store::active_geofences(pool.get_ref()).await?;
            geofence::evaluate(point, &zones)?
        }
        _ => GeofenceVerdict::no_location(),
    };

    let rules = AdmissionRules::new(config.punch_cooldown_secs);
    let last = store::last_punch(pool.get_ref(), payload.employee_id).await?;
    rules.check_cooldown(last.as_ref(), punch_time)?;

    // Advisory by default; blocks only under hard enforcement policy.
    if config.enforce_geofence && !verdict.within {
        return Err(AdmissionError::OutsideGeofence {
            distance_m: verdict.distance_outside_m.unwrap_or(0.0),
        });
    }

    let expected_type = rules.expected_next_type(last.as_ref());
    let submitted_type = payload.punch_type.unwrap_or(expected_type);
    let candidate = store::PunchCandidate {
        employee_id: payload.employee_id,
        punch_time,
        punch_type: submitted_type,
        method: payload.method,
        location_lat: payload.location_lat,
        location_lng: payload.location_lng,
        location_accuracy: payload.location_accuracy,
        within_geofence: verdict.within,
        geofence_name: verdict.zone_name.clone(),
        face_similarity: payload.face_similarity,
    };

    let record = store::commit_punch(
        pool.get_ref(),
        &candidate,
        Duration::from_millis(config.nsr_lock_timeout_ms),
        config.nsr_max_retries,
    )
    .await?;

    let expected_next_type = record.punch_type.next_in_cycle();
    Ok(HttpResponse::Created().json(PunchResponse {
        out_of_cycle: submitted_type != expected_type,
        expected_next_type,
        geofence: GeofenceReport {
            within: verdict.within,
            zone_name: verdict.zone_name,
            distance_outside: verdict.distance_outside_m.map(geofence::format_distance),
        },
        record,
    }))
}

#[derive(Serialize, ToSchema)]
pub struct PunchStatus {
    #[schema(nullable = true)]
    pub last_punch: Option<PunchRecord>,
    pub expected_next_type: PunchType,
    /// Seconds until duplicate suppression clears; 0 when punchable now.
    pub cooldown_remaining_secs: i64,
}

/// Current punch state for an employee
#[utoipa::path(
    get,
    path = "/api/v1/punch/status/{employee_id}",
    params(("employee_id", description = "Employee ID")),
    responses(
        (status = 200, body = PunchStatus),
        (status = 500)
    ),
    tag = "Punch"
)]
pub async fn punch_status(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<impl Responder, AdmissionError> {
    let employee_id = path.into_inner();
    let now = chrono::Local::now().naive_local();

    let rules = AdmissionRules::new(config.punch_cooldown_secs);
    let last = store::last_punch(pool.get_ref(), employee_id).await?;

    Ok(HttpResponse::Ok().json(PunchStatus {
        expected_next_type: rules.expected_next_type(last.as_ref()),
        cooldown_remaining_secs: rules.cooldown_remaining(last.as_ref(), now),
        last_punch: last,
    }))
}

#[derive(Serialize, ToSchema)]
pub struct VerifyResponse {
    pub nsr: u64,
    /// False means the stored row no longer matches its stamp. That is a
    /// compliance event: it is reported and logged, never repaired.
    pub valid: bool,
}

/// Re-derive and check a punch's integrity stamp
#[utoipa::path(
    get,
    path = "/api/v1/punch/{nsr}/verify",
    params(("nsr", description = "Sequential record number")),
    responses(
        (status = 200, body = VerifyResponse),
        (status = 404, description = "No punch with that NSR"),
        (status = 500)
    ),
    tag = "Punch"
)]
pub async fn verify_punch(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let nsr = path.into_inner();

    let record = store::punch_by_nsr(pool.get_ref(), nsr)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, nsr, "failed to fetch punch for verification");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(record) = record else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Punch not found"
        })));
    };

    let valid = stamp::verify(&record);
    if !valid {
        // Audit/alerting path: the ledger row was altered after commit.
        tracing::error!(
            nsr,
            employee_id = record.employee_id,
            "integrity stamp mismatch on committed punch"
        );
    }

    Ok(HttpResponse::Ok().json(VerifyResponse { nsr, valid }))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct DateRangeQuery {
    #[param(example = "2026-03-01")]
    pub start: NaiveDate,
    #[param(example = "2026-03-31")]
    pub end: NaiveDate,
}

/// Punches recorded outside every authorized zone
#[utoipa::path(
    get,
    path = "/api/v1/punch/outside-geofence/{employee_id}",
    params(
        ("employee_id", description = "Employee ID"),
        DateRangeQuery
    ),
    responses(
        (status = 200, body = Vec<PunchRecord>),
        (status = 500)
    ),
    tag = "Punch"
)]
pub async fn outside_geofence(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<DateRangeQuery>,
) -> Result<impl Responder, AdmissionError> {
    let employee_id = path.into_inner();
    let punches =
        store::punches_outside_geofence(pool.get_ref(), employee_id, query.start, query.end)
            .await?;
    Ok(HttpResponse::Ok().json(punches))
}
