use serde::Serialize;

use crate::ledger::pairing::{DayPairing, round2};
use crate::model::consolidated::ConsolidatedDay;

/// The computed side of a consolidated day, before storage concerns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    /// Net worked hours: work pairs minus interval pairs, clamped at 0.
    pub total_worked: f64,
    pub expected: f64,
    pub extra: f64,
    pub owed: f64,
    pub interval_violation: bool,
    pub justified: bool,
    pub incomplete: bool,
    pub total_interval: f64,
}

/// Turn a day's pairing view into payroll-relevant totals.
///
/// `justified` comes from the justification collaborator: an approved
/// justification clears the incomplete flag and waives the owed hours
/// for the date, so the absence never charges the running balance.
pub fn summarize(pairing: &DayPairing, expected_hours: f64, justified: bool) -> DaySummary {
    let raw_net = pairing.total_work_hours - pairing.total_interval_hours;
    let interval_violation = raw_net < 0.0;
    let net = round2(raw_net.max(0.0));

    let extra = round2((net - expected_hours).max(0.0));
    let owed = round2((expected_hours - net).max(0.0));

    let (incomplete, owed) = if justified {
        (false, 0.0)
    } else {
        (!pairing.complete(), owed)
    };

    DaySummary {
        total_worked: net,
        expected: expected_hours,
        extra,
        owed,
        interval_violation,
        justified,
        incomplete,
        total_interval: pairing.total_interval_hours,
    }
}

/// Balance adjustment for one re-processed day: the difference against
/// whatever was previously consolidated, never the full new value. First
/// consolidation of a day sees no previous row, so the delta is the full
/// amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalanceDelta {
    pub extra: f64,
    pub owed: f64,
}

pub fn balance_delta(new: &DaySummary, previous: Option<&ConsolidatedDay>) -> BalanceDelta {
    match previous {
        None => BalanceDelta { extra: new.extra, owed: new.owed },
        Some(old) => BalanceDelta {
            extra: round2(new.extra - old.extra),
            owed: round2(new.owed - old.owed),
        },
    }
}
