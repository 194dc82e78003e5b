use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

/// Everything that can stop a punch before it reaches the ledger.
/// Returned synchronously to the caller; nothing on this path is
/// silently dropped.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// Duplicate suppression: last punch landed inside the cooldown window.
    #[error("last punch was too recent, retry in {retry_after_secs}s")]
    TooSoon { retry_after_secs: i64 },

    /// The NSR counter lock could not be acquired within the bounded wait.
    /// The whole submission is retried fresh; a half-allocated NSR is
    /// never reused.
    #[error("sequence number allocation timed out")]
    AllocationTimeout,

    /// Hard geofence enforcement is on and the punch landed outside
    /// every active zone.
    #[error("location is {distance_m:.0}m outside the nearest authorized zone")]
    OutsideGeofence { distance_m: f64 },

    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("invalid geofence: {0}")]
    InvalidGeofence(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ResponseError for AdmissionError {
    fn status_code(&self) -> StatusCode {
        match self {
            AdmissionError::TooSoon { .. } => StatusCode::TOO_MANY_REQUESTS,
            AdmissionError::AllocationTimeout => StatusCode::SERVICE_UNAVAILABLE,
            AdmissionError::OutsideGeofence { .. } => StatusCode::FORBIDDEN,
            AdmissionError::InvalidCoordinate(_) | AdmissionError::InvalidGeofence(_) => {
                StatusCode::BAD_REQUEST
            }
            AdmissionError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // Database details stay in the logs, not the response body
            AdmissionError::Database(e) => {
                tracing::error!(error = %e, "admission database error");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.kind(),
            "message": message,
        }))
    }
}

impl AdmissionError {
    pub fn kind(&self) -> &'static str {
        match self {
            AdmissionError::TooSoon { .. } => "too_soon",
            AdmissionError::AllocationTimeout => "allocation_timeout",
            AdmissionError::OutsideGeofence { .. } => "outside_geofence",
            AdmissionError::InvalidCoordinate(_) => "invalid_coordinate",
            AdmissionError::InvalidGeofence(_) => "invalid_geofence",
            AdmissionError::Database(_) => "database",
        }
    }
}

/// Failures while consolidating one employee/day. In batch runs these
/// skip the affected employee and never abort the rest of the batch.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// No employee row or no expected-hours configuration.
    #[error("no profile or expected-hours configuration for employee {employee_id}")]
    MissingProfile { employee_id: u64 },

    /// A pair closed before it opened. Data error, surfaced as-is.
    #[error("punch pair ends before it starts (nsr {start_nsr} -> {end_nsr})")]
    PairOrder { start_nsr: u64, end_nsr: u64 },

    /// Per-employee batch timeout; the day is safely re-runnable.
    #[error("reconciliation timed out for employee {employee_id}")]
    Timeout { employee_id: u64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ResponseError for ReconciliationError {
    fn status_code(&self) -> StatusCode {
        match self {
            ReconciliationError::MissingProfile { .. } => StatusCode::NOT_FOUND,
            ReconciliationError::PairOrder { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ReconciliationError::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ReconciliationError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ReconciliationError::Database(e) => {
                tracing::error!(error = %e, "reconciliation database error");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.kind(),
            "message": message,
        }))
    }
}

impl ReconciliationError {
    pub fn kind(&self) -> &'static str {
        match self {
            ReconciliationError::MissingProfile { .. } => "missing_profile",
            ReconciliationError::PairOrder { .. } => "pair_order",
            ReconciliationError::Timeout { .. } => "timeout",
            ReconciliationError::Database(_) => "database",
        }
    }
}
