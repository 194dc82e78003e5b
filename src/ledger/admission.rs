use chrono::NaiveDateTime;

use crate::error::AdmissionError;
use crate::model::punch::{PunchRecord, PunchType};

/// Duplicate-suppression and cycle-guidance rules. Pure: the caller
/// fetches the employee's most recent punch (globally, not per day) and
/// hands it in together with the submission time.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionRules {
    pub cooldown_secs: i64,
}

impl AdmissionRules {
    pub fn new(cooldown_secs: i64) -> Self {
        Self { cooldown_secs }
    }

    /// Rule 1: reject any punch landing inside the cooldown window after
    /// the employee's previous punch, whatever its type.
    pub fn check_cooldown(
        &self,
        last_punch: Option<&PunchRecord>,
        now: NaiveDateTime,
    ) -> Result<(), AdmissionError> {
        let Some(last) = last_punch else {
            return Ok(());
        };
        let elapsed = (now - last.punch_time).num_seconds();
        if elapsed < self.cooldown_secs {
            // A submission time behind the last punch makes elapsed
            // negative; the wait reported back never exceeds the window.
            return Err(AdmissionError::TooSoon {
                retry_after_secs: (self.cooldown_secs - elapsed).min(self.cooldown_secs),
            });
        }
        Ok(())
    }

    /// Rule 2: the type the ideal cycle expects next. Out-of-cycle
    /// punches are still admitted (physical reality wins over the ideal
    /// cycle); this is guidance for the client and input for pairing
    /// analysis, never a hard block.
    pub fn expected_next_type(&self, last_punch: Option<&PunchRecord>) -> PunchType {
        match last_punch {
            None => PunchType::ClockIn,
            Some(last) => last.punch_type.next_in_cycle(),
        }
    }

    /// Seconds until the cooldown clears, for the punch status screen.
    pub fn cooldown_remaining(&self, last_punch: Option<&PunchRecord>, now: NaiveDateTime) -> i64 {
        match last_punch {
            None => 0,
            Some(last) => {
                (self.cooldown_secs - (now - last.punch_time).num_seconds())
                    .clamp(0, self.cooldown_secs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::stamp;
    use crate::model::punch::PunchMethod;
    use chrono::NaiveDate;

    fn punch_at(punch_type: PunchType, time: NaiveDateTime) -> PunchRecord {
        PunchRecord {
            id: 1,
            nsr: 10,
            employee_id: 1001,
            punch_time: time,
            punch_type,
            method: PunchMethod::Code,
            integrity_stamp: stamp::compute(1001, punch_type, time, 10),
            location_lat: None,
            location_lng: None,
            location_accuracy: None,
            within_geofence: false,
            geofence_name: None,
            face_similarity: None,
            created_at: time,
        }
    }

    fn t(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn punch_ten_seconds_after_the_last_is_rejected() {
        let rules = AdmissionRules::new(60);
        let last = punch_at(PunchType::ClockIn, t(8, 0, 0));
        let result = rules.check_cooldown(Some(&last), t(8, 0, 10));
        match result {
            Err(AdmissionError::TooSoon { retry_after_secs }) => assert_eq!(retry_after_secs, 50),
            other => panic!("expected TooSoon, got {other:?}"),
        }
    }

    #[test]
    fn cooldown_clears_exactly_at_the_window() {
        let rules = AdmissionRules::new(60);
        let last = punch_at(PunchType::ClockIn, t(8, 0, 0));
        assert!(rules.check_cooldown(Some(&last), t(8, 0, 59)).is_err());
        assert!(rules.check_cooldown(Some(&last), t(8, 1, 0)).is_ok());
    }

    #[test]
    fn backdated_punch_never_reports_more_than_the_window() {
        let rules = AdmissionRules::new(60);
        let last = punch_at(PunchType::ClockIn, t(8, 0, 0));
        // Submission time five minutes behind the last committed punch.
        let result = rules.check_cooldown(Some(&last), t(7, 55, 0));
        match result {
            Err(AdmissionError::TooSoon { retry_after_secs }) => assert_eq!(retry_after_secs, 60),
            other => panic!("expected TooSoon, got {other:?}"),
        }
        assert_eq!(rules.cooldown_remaining(Some(&last), t(7, 55, 0)), 60);
    }

    #[test]
    fn first_punch_ever_has_no_cooldown() {
        let rules = AdmissionRules::new(60);
        assert!(rules.check_cooldown(None, t(8, 0, 0)).is_ok());
        assert_eq!(rules.cooldown_remaining(None, t(8, 0, 0)), 0);
    }

    #[test]
    fn expected_type_follows_the_cycle() {
        let rules = AdmissionRules::new(60);
        assert_eq!(rules.expected_next_type(None), PunchType::ClockIn);

        let cases = [
            (PunchType::ClockIn, PunchType::BreakStart),
            (PunchType::BreakStart, PunchType::BreakEnd),
            (PunchType::BreakEnd, PunchType::ClockOut),
            (PunchType::ClockOut, PunchType::ClockIn),
        ];
        for (last, expected) in cases {
            let p = punch_at(last, t(8, 0, 0));
            assert_eq!(rules.expected_next_type(Some(&p)), expected);
        }
    }

    #[test]
    fn cooldown_remaining_counts_down() {
        let rules = AdmissionRules::new(60);
        let last = punch_at(PunchType::ClockIn, t(8, 0, 0));
        assert_eq!(rules.cooldown_remaining(Some(&last), t(8, 0, 15)), 45);
        assert_eq!(rules.cooldown_remaining(Some(&last), t(9, 0, 0)), 0);
    }
}
