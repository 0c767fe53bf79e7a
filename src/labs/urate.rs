use chrono::{Duration, NaiveDate};

use crate::models::LabReading;

use super::series::LabSeries;

/// A urate drawn within this many days counts as recent.
pub const RECENT_URATE_DAYS: i64 = 90;

/// Months at goal before prophylaxis can usually stop.
pub const DEFAULT_MONTHS_AT_GOAL: u32 = 6;

/// Longest at-goal run settings may ask for (ten years).
pub const MAX_MONTHS_AT_GOAL: u32 = 120;

/// Latest urate is at or below the goal.
pub fn last_at_goal(urates: &LabSeries, goal_mg_dl: f64) -> bool {
    urates.latest_value().is_some_and(|v| v <= goal_mg_dl)
}

/// True when the urate has been at or below goal for `months` (30-day months).
///
/// Walks back from the newest reading; every reading passed must be at
/// goal, and one of them must be drawn at least `months` before the newest.
pub fn months_at_goal(urates: &LabSeries, goal_mg_dl: f64, months: u32) -> bool {
    let Some(newest) = urates.latest() else {
        return false;
    };
    let Some(span) = Duration::try_days(30 * i64::from(months)) else {
        return false;
    };

    for reading in urates.readings() {
        if reading.value() > goal_mg_dl {
            return false;
        }
        if newest.drawn_at() - reading.drawn_at() >= span {
            return true;
        }
    }
    false
}

/// Readings drawn within the last `days` before `as_of`, newest first.
pub fn recent(urates: &LabSeries, as_of: NaiveDate, days: i64) -> Vec<&LabReading> {
    urates
        .readings()
        .iter()
        .filter(|r| (as_of - r.drawn_at().date()).num_days() < days)
        .collect()
}

/// Whether the newest urate is less than [`RECENT_URATE_DAYS`] old.
pub fn has_recent(urates: &LabSeries, as_of: NaiveDate) -> bool {
    urates
        .latest()
        .is_some_and(|r| (as_of - r.drawn_at().date()).num_days() < RECENT_URATE_DAYS)
}
