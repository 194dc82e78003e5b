use crate::api::punch::{
    GeofenceReport, PunchResponse, PunchStatus, SubmitPunch, VerifyResponse,
};
use crate::api::timesheet::{
    BatchRequest, BatchResponse, ReconcileRequest, SkippedEmployee,
};
use crate::ledger::store::RangeStatistics;
use crate::model::consolidated::{BalanceSummary, ConsolidatedDay};
use crate::model::employee::EmployeeProfile;
use crate::model::geofence::Geofence;
use crate::model::punch::{PunchMethod, PunchRecord, PunchType};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Ledger API",
        version = "1.0.0",
        description = r#"
## Attendance Ledger & Reconciliation Engine

Durable, tamper-evident employee time-punch ledger with daily hour
reconciliation.

### 🔹 Key Features
- **Punch Ledger**
  - Append-only records with a strictly-ordered sequence number (NSR)
    and a SHA-256 integrity stamp, re-derivable for audit
- **Admission Control**
  - Duplicate suppression, cycle guidance, geofence validation
- **Reconciliation**
  - Pairs a day's punches into work/interval segments and consolidates
    worked/expected/extra/owed hours, updating running balances by delta
- **Geofencing**
  - Haversine-based circular zone matching with distance reporting

### 📦 Response Format
- JSON-based RESTful responses

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::punch::submit_punch,
        crate::api::punch::punch_status,
        crate::api::punch::verify_punch,
        crate::api::punch::outside_geofence,

        crate::api::timesheet::reconcile_day,
        crate::api::timesheet::reconcile_batch,
        crate::api::timesheet::consolidated_range,
        crate::api::timesheet::current_balance,
        crate::api::timesheet::range_statistics
    ),
    components(
        schemas(
            SubmitPunch,
            PunchResponse,
            PunchStatus,
            VerifyResponse,
            GeofenceReport,
            PunchRecord,
            PunchType,
            PunchMethod,
            Geofence,
            EmployeeProfile,
            ConsolidatedDay,
            BalanceSummary,
            ReconcileRequest,
            BatchRequest,
            BatchResponse,
            SkippedEmployee,
            RangeStatistics
        )
    ),
    tags(
        (name = "Punch", description = "Punch admission and integrity APIs"),
        (name = "Timesheet", description = "Reconciliation and balance APIs"),
    )
)]
pub struct ApiDoc;
