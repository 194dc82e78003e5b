use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// The four punch events of a daily cycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type, ToSchema,
)]
#[sqlx(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PunchType {
    ClockIn,
    BreakStart,
    BreakEnd,
    ClockOut,
}

impl PunchType {
    /// True for the punch types that open a pending work/interval segment.
    pub fn opens_segment(self) -> bool {
        matches!(self, PunchType::ClockIn | PunchType::BreakStart)
    }

    /// The closing type that pairs with an opening type, if this is one.
    pub fn closing_type(self) -> Option<PunchType> {
        match self {
            PunchType::ClockIn => Some(PunchType::ClockOut),
            PunchType::BreakStart => Some(PunchType::BreakEnd),
            _ => None,
        }
    }

    /// Next punch type expected after this one in the ideal cycle.
    pub fn next_in_cycle(self) -> PunchType {
        match self {
            PunchType::ClockIn => PunchType::BreakStart,
            PunchType::BreakStart => PunchType::BreakEnd,
            PunchType::BreakEnd => PunchType::ClockOut,
            PunchType::ClockOut => PunchType::ClockIn, // new cycle
        }
    }
}

/// How the punch was captured at the terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type, ToSchema,
)]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PunchMethod {
    Code,
    QrCode,
    Facial,
    Biometric,
}

/// One committed ledger entry. Rows are append-only: no field is ever
/// mutated after the insert transaction commits, and `nsr` is unique
/// across the whole table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PunchRecord {
    #[schema(example = 42)]
    pub id: u64,

    /// Sequential record number. Strictly ordered by commit, never reused.
    #[schema(example = 1207)]
    pub nsr: u64,

    #[schema(example = 1001)]
    pub employee_id: u64,

    #[schema(value_type = String, format = "date-time", example = "2026-03-02T08:00:00")]
    pub punch_time: NaiveDateTime,

    pub punch_type: PunchType,
    pub method: PunchMethod,

    /// SHA-256 over (employee_id, punch_type, punch_time, nsr), hex encoded.
    #[schema(example = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08")]
    pub integrity_stamp: String,

    #[schema(example = -23.5505, nullable = true)]
    pub location_lat: Option<f64>,
    #[schema(example = -46.6333, nullable = true)]
    pub location_lng: Option<f64>,
    #[schema(example = 12.5, nullable = true)]
    pub location_accuracy: Option<f64>,

    pub within_geofence: bool,
    #[schema(example = "Headquarters", nullable = true)]
    pub geofence_name: Option<String>,

    /// Score from the external face classifier, when one ran. Absence is
    /// meaningful (classifier skipped or degraded), never coerced to 0.
    #[schema(example = 0.97, nullable = true)]
    pub face_similarity: Option<f64>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn punch_type_wire_names_round_trip() {
        assert_eq!(PunchType::ClockIn.to_string(), "clock-in");
        assert_eq!(PunchType::BreakStart.to_string(), "break-start");
        assert_eq!(PunchType::from_str("break-end").unwrap(), PunchType::BreakEnd);
        assert_eq!(PunchType::from_str("clock-out").unwrap(), PunchType::ClockOut);
        assert!(PunchType::from_str("lunch").is_err());
    }

    #[test]
    fn cycle_covers_all_four_types() {
        assert_eq!(PunchType::ClockIn.next_in_cycle(), PunchType::BreakStart);
        assert_eq!(PunchType::BreakStart.next_in_cycle(), PunchType::BreakEnd);
        assert_eq!(PunchType::BreakEnd.next_in_cycle(), PunchType::ClockOut);
        assert_eq!(PunchType::ClockOut.next_in_cycle(), PunchType::ClockIn);
    }

    #[test]
    fn closing_types_match_families() {
        assert_eq!(PunchType::ClockIn.closing_type(), Some(PunchType::ClockOut));
        assert_eq!(PunchType::BreakStart.closing_type(), Some(PunchType::BreakEnd));
        assert_eq!(PunchType::ClockOut.closing_type(), None);
    }
}
