use std::collections::BTreeSet;

use moira_client::{Day, Schedule, Weekday};

/// Minutes since midnight.
pub fn day_offset(hour: u32, minute: u32) -> i64 {
    i64::from(hour) * 60 + i64::from(minute)
}

/// Builds the notification schedule of a trigger.
///
/// All seven days are listed in calendar order; a day is disabled iff it is
/// in `disabled_days`.
pub fn build_schedule(
    disabled_days: &BTreeSet<Weekday>,
    start: (u32, u32),
    end: (u32, u32),
    timezone_offset: i64,
) -> Schedule {
    Schedule {
        days: Weekday::ALL
            .iter()
            .map(|&name| Day {
                name,
                enabled: !disabled_days.contains(&name),
            })
            .collect(),
        start_offset: day_offset(start.0, start.1),
        end_offset: day_offset(end.0, end.1),
        tz_offset: timezone_offset,
    }
}
