use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::ReconciliationError;
use crate::model::punch::{PunchRecord, PunchType};

/// Work (clock-in/clock-out) vs interval (break-start/break-end) pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PairKind {
    Work,
    Interval,
}

/// A matched opening/closing punch pair and its duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PunchPair {
    pub kind: PairKind,
    pub start_nsr: u64,
    pub end_nsr: u64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub hours: f64,
}

/// An opening punch that never got its closing counterpart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingEnd {
    pub kind: PairKind,
    pub start_nsr: u64,
    pub start_type: PunchType,
    pub start_time: NaiveDateTime,
}

/// A closing punch with no open segment of its family to close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrphanPunch {
    pub nsr: u64,
    pub punch_type: PunchType,
    pub punch_time: NaiveDateTime,
}

/// Read-time view over one employee/day's punches. Never touches
/// storage; running it twice over the same punches gives the same
/// result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPairing {
    pub work_pairs: Vec<PunchPair>,
    pub interval_pairs: Vec<PunchPair>,
    pub missing: Vec<MissingEnd>,
    pub orphans: Vec<OrphanPunch>,
    pub total_work_hours: f64,
    pub total_interval_hours: f64,
    pub punches_count: u32,
    pub first_punch: Option<NaiveDateTime>,
    pub last_punch: Option<NaiveDateTime>,
}

impl DayPairing {
    /// Both anomaly lists empty and at least one work pair closed.
    pub fn complete(&self) -> bool {
        self.missing.is_empty() && self.orphans.is_empty() && !self.work_pairs.is_empty()
    }
}

/// Pair a day's punches into work and interval segments.
///
/// Punches are scanned in NSR order (commit order is the source of
/// truth; wall-clock is only the tie-breaker, so skewed device clocks
/// cannot reorder the day). Openings and closings match by type family:
/// clock-in closes with clock-out, break-start with break-end. An
/// opening with a same-family segment already pending reports the older
/// one as missing its end and starts fresh.
pub fn pair_day(punches: &[PunchRecord]) -> Result<DayPairing, ReconciliationError> {
    let mut ordered: Vec<&PunchRecord> = punches.iter().collect();
    ordered.sort_by_key(|p| (p.nsr, p.punch_time));

    let mut work_pairs = Vec::new();
    let mut interval_pairs = Vec::new();
    let mut missing = Vec::new();
    let mut orphans = Vec::new();

    let mut pending_work: Option<&PunchRecord> = None;
    let mut pending_interval: Option<&PunchRecord> = None;

    for punch in &ordered {
        let (kind, pending, pairs) = match family(punch.punch_type) {
            PairKind::Work => (PairKind::Work, &mut pending_work, &mut work_pairs),
            PairKind::Interval => (PairKind::Interval, &mut pending_interval, &mut interval_pairs),
        };
        if punch.punch_type.opens_segment() {
            if let Some(open) = pending.replace(punch) {
                missing.push(missing_end(kind, open));
            }
        } else {
            match pending.take() {
                Some(open) => pairs.push(close_pair(kind, open, punch)?),
                None => orphans.push(orphan(punch)),
            }
        }
    }

    if let Some(open) = pending_work {
        missing.push(missing_end(PairKind::Work, open));
    }
    if let Some(open) = pending_interval {
        missing.push(missing_end(PairKind::Interval, open));
    }

    let total_work_hours = round2(work_pairs.iter().map(|p| p.hours).sum());
    let total_interval_hours = round2(interval_pairs.iter().map(|p| p.hours).sum());

    Ok(DayPairing {
        total_work_hours,
        total_interval_hours,
        punches_count: ordered.len() as u32,
        first_punch: ordered.first().map(|p| p.punch_time),
        last_punch: ordered.last().map(|p| p.punch_time),
        work_pairs,
        interval_pairs,
        missing,
        orphans,
    })
}

/// Family of a punch type, named by the closing punch of its pair.
fn family(punch_type: PunchType) -> PairKind {
    match punch_type.closing_type().unwrap_or(punch_type) {
        PunchType::ClockOut => PairKind::Work,
        _ => PairKind::Interval,
    }
}

fn close_pair(
    kind: PairKind,
    start: &PunchRecord,
    end: &PunchRecord,
) -> Result<PunchPair, ReconciliationError> {
    // Commit order should forbid this; a negative span here means the
    // stored data is wrong and must surface, not wrap around.
    if end.punch_time < start.punch_time {
        return Err(ReconciliationError::PairOrder {
            start_nsr: start.nsr,
            end_nsr: end.nsr,
        });
    }
    let hours = (end.punch_time - start.punch_time).num_seconds() as f64 / 3600.0;
    Ok(PunchPair {
        kind,
        start_nsr: start.nsr,
        end_nsr: end.nsr,
        start_time: start.punch_time,
        end_time: end.punch_time,
        hours,
    })
}

fn missing_end(kind: PairKind, open: &PunchRecord) -> MissingEnd {
    MissingEnd {
        kind,
        start_nsr: open.nsr,
        start_type: open.punch_type,
        start_time: open.punch_time,
    }
}

fn orphan(punch: &PunchRecord) -> OrphanPunch {
    OrphanPunch {
        nsr: punch.nsr,
        punch_type: punch.punch_type,
        punch_time: punch.punch_time,
    }
}

/// Two decimal places, the ledger's reporting precision for hours.
pub fn round2(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::stamp;
    use crate::model::punch::PunchMethod;
    use chrono::NaiveDate;

    fn punch(nsr: u64, punch_type: PunchType, h: u32, m: u32) -> PunchRecord {
        let time = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap();
        PunchRecord {
            id: nsr,
            nsr,
            employee_id: 1001,
            punch_time: time,
            punch_type,
            method: PunchMethod::Code,
            integrity_stamp: stamp::compute(1001, punch_type, time, nsr),
            location_lat: None,
            location_lng: None,
            location_accuracy: None,
            within_geofence: true,
            geofence_name: None,
            face_similarity: None,
            created_at: time,
        }
    }

    #[test]
    fn full_day_pairs_cleanly() {
        let punches = vec![
            punch(1, PunchType::ClockIn, 8, 0),
            punch(2, PunchType::BreakStart, 12, 0),
            punch(3, PunchType::BreakEnd, 13, 0),
            punch(4, PunchType::ClockOut, 17, 0),
        ];
        let day = pair_day(&punches).unwrap();
        assert!(day.complete());
        assert_eq!(day.work_pairs.len(), 1);
        assert_eq!(day.interval_pairs.len(), 1);
        assert_eq!(day.total_work_hours, 9.0);
        assert_eq!(day.total_interval_hours, 1.0);
        assert_eq!(day.punches_count, 4);
        assert_eq!(day.first_punch, Some(punches[0].punch_time));
        assert_eq!(day.last_punch, Some(punches[3].punch_time));
    }

    #[test]
    fn clock_in_without_clock_out_is_missing_an_end() {
        let punches = vec![punch(1, PunchType::ClockIn, 8, 0)];
        let day = pair_day(&punches).unwrap();
        assert!(!day.complete());
        assert_eq!(day.missing.len(), 1);
        assert_eq!(day.missing[0].kind, PairKind::Work);
        assert_eq!(day.missing[0].start_nsr, 1);
        assert_eq!(day.total_work_hours, 0.0);
    }

    #[test]
    fn break_end_without_break_start_is_an_orphan() {
        let punches = vec![
            punch(1, PunchType::ClockIn, 8, 0),
            punch(2, PunchType::BreakEnd, 13, 0),
            punch(3, PunchType::ClockOut, 17, 0),
        ];
        let day = pair_day(&punches).unwrap();
        assert!(!day.complete());
        assert_eq!(day.orphans.len(), 1);
        assert_eq!(day.orphans[0].punch_type, PunchType::BreakEnd);
        // The clean work pair still counts
        assert_eq!(day.work_pairs.len(), 1);
        assert_eq!(day.total_work_hours, 9.0);
    }

    #[test]
    fn families_do_not_cross_pair() {
        // Break started but never ended; the clock-out must still close
        // the work segment, not the break.
        let punches = vec![
            punch(1, PunchType::ClockIn, 8, 0),
            punch(2, PunchType::BreakStart, 12, 0),
            punch(3, PunchType::ClockOut, 17, 0),
        ];
        let day = pair_day(&punches).unwrap();
        assert_eq!(day.work_pairs.len(), 1);
        assert_eq!(day.interval_pairs.len(), 0);
        assert_eq!(day.missing.len(), 1);
        assert_eq!(day.missing[0].kind, PairKind::Interval);
    }

    #[test]
    fn second_clock_in_reports_the_first_as_missing() {
        let punches = vec![
            punch(1, PunchType::ClockIn, 8, 0),
            punch(2, PunchType::ClockIn, 9, 0),
            punch(3, PunchType::ClockOut, 17, 0),
        ];
        let day = pair_day(&punches).unwrap();
        assert_eq!(day.missing.len(), 1);
        assert_eq!(day.missing[0].start_nsr, 1);
        assert_eq!(day.work_pairs.len(), 1);
        assert_eq!(day.work_pairs[0].start_nsr, 2);
        assert_eq!(day.total_work_hours, 8.0);
    }

    #[test]
    fn nsr_order_beats_wall_clock_order() {
        // Device clock skew: the clock-out carries an earlier wall time
        // than a later-committed punch. Commit order decides.
        let mut clock_in = punch(1, PunchType::ClockIn, 8, 0);
        clock_in.punch_time = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(8, 0, 30)
            .unwrap();
        let punches = vec![
            punch(2, PunchType::ClockOut, 17, 0), // listed first, commits second
            clock_in,
        ];
        let day = pair_day(&punches).unwrap();
        assert_eq!(day.work_pairs.len(), 1);
        assert_eq!(day.work_pairs[0].start_nsr, 1);
        assert_eq!(day.work_pairs[0].end_nsr, 2);
    }

    #[test]
    fn pair_ending_before_it_starts_is_a_data_error() {
        let punches = vec![
            punch(1, PunchType::ClockIn, 18, 0),
            punch(2, PunchType::ClockOut, 17, 0),
        ];
        match pair_day(&punches) {
            Err(ReconciliationError::PairOrder { start_nsr: 1, end_nsr: 2 }) => {}
            other => panic!("expected PairOrder, got {other:?}"),
        }
    }

    #[test]
    fn pairing_is_idempotent() {
        let punches = vec![
            punch(1, PunchType::ClockIn, 8, 0),
            punch(2, PunchType::BreakStart, 12, 0),
            punch(3, PunchType::BreakEnd, 13, 0),
            punch(4, PunchType::ClockOut, 17, 0),
        ];
        let first = pair_day(&punches).unwrap();
        let second = pair_day(&punches).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_day_is_empty_and_incomplete() {
        let day = pair_day(&[]).unwrap();
        assert!(!day.complete());
        assert_eq!(day.punches_count, 0);
        assert!(day.first_punch.is_none());
    }
}
