use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};

use crate::model::punch::{PunchRecord, PunchType};

/// Timestamp format fed into the digest. Fixed: changing it would
/// invalidate every stamp already in the ledger.
const STAMP_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Derive the integrity stamp for a punch from its four immutable
/// identity fields. Deterministic, so an auditor can re-derive it from
/// the stored row at any later point.
pub fn compute(
    employee_id: u64,
    punch_type: PunchType,
    punch_time: NaiveDateTime,
    nsr: u64,
) -> String {
    let payload = format!(
        "{}|{}|{}|{}",
        employee_id,
        punch_type,
        punch_time.format(STAMP_TIME_FORMAT),
        nsr
    );
    hex::encode(Sha256::digest(payload.as_bytes()))
}

/// Recompute the stamp from the record's fields and compare against the
/// stored one. A `false` here is a compliance event: the record was
/// altered after creation (or was never internally consistent) and must
/// be escalated, never corrected in place.
pub fn verify(record: &PunchRecord) -> bool {
    let expected = compute(record.employee_id, record.punch_type, record.punch_time, record.nsr);
    constant_time_eq(expected.as_bytes(), record.integrity_stamp.as_bytes())
}

/// Byte comparison that does not short-circuit on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::punch::PunchMethod;
    use chrono::NaiveDate;

    fn record() -> PunchRecord {
        let punch_time = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        PunchRecord {
            id: 1,
            nsr: 1207,
            employee_id: 1001,
            punch_time,
            punch_type: PunchType::ClockIn,
            method: PunchMethod::QrCode,
            integrity_stamp: compute(1001, PunchType::ClockIn, punch_time, 1207),
            location_lat: None,
            location_lng: None,
            location_accuracy: None,
            within_geofence: false,
            geofence_name: None,
            face_similarity: None,
            created_at: punch_time,
        }
    }

    #[test]
    fn stamp_is_deterministic_and_verifies() {
        let r = record();
        assert_eq!(
            r.integrity_stamp,
            compute(r.employee_id, r.punch_type, r.punch_time, r.nsr)
        );
        assert!(verify(&r));
    }

    #[test]
    fn mutating_any_stamped_field_breaks_verification() {
        let mut r = record();
        r.employee_id = 1002;
        assert!(!verify(&r));

        let mut r = record();
        r.punch_type = PunchType::ClockOut;
        assert!(!verify(&r));

        let mut r = record();
        r.punch_time = r.punch_time + chrono::Duration::seconds(1);
        assert!(!verify(&r));

        let mut r = record();
        r.nsr += 1;
        assert!(!verify(&r));
    }

    #[test]
    fn mutating_unstamped_fields_does_not_break_verification() {
        let mut r = record();
        r.method = PunchMethod::Facial;
        r.face_similarity = Some(0.93);
        assert!(verify(&r));
    }

    #[test]
    fn tampered_stamp_fails() {
        let mut r = record();
        r.integrity_stamp = r.integrity_stamp.replace(|c: char| c.is_ascii_hexdigit(), "0");
        assert!(!verify(&r));
    }

    #[test]
    fn constant_time_eq_handles_length_mismatch() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
