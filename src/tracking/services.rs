use std::collections::HashMap;

use time::{macros::time, Duration, OffsetDateTime, Time};
use tracing::warn;

use super::repo_types::{TaskSummary, TimeEntry};
use crate::error::LedgerResult;
use crate::tz::UserZone;

const END_OF_DAY: Time = time!(23:59:59);

/// End used for an entry that was never stopped: the user's default end time
/// on the entry's day, or 23:59:59 local when none is configured. Midnight
/// counts as not configured.
pub fn effective_end(
    entry: &TimeEntry,
    zone: &UserZone,
    default_end_time: Option<Time>,
) -> LedgerResult<OffsetDateTime> {
    if let Some(end) = entry.end_time {
        return Ok(end);
    }
    let wall = match default_end_time {
        Some(t) if t != Time::MIDNIGHT => t,
        _ => END_OF_DAY,
    };
    zone.at(entry.event_date, wall)
}

/// Sums durations per task and orders the result by descending total,
/// ties broken by task id.
pub fn summarize(
    entries: &[TimeEntry],
    zone: &UserZone,
    default_end_time: Option<Time>,
) -> LedgerResult<Vec<TaskSummary>> {
    let mut totals: HashMap<i64, Duration> = HashMap::new();
    for entry in entries {
        let end = effective_end(entry, zone, default_end_time)?;
        let mut spent = end - entry.start_time;
        if spent.is_negative() {
            warn!(
                entry_id = entry.id,
                task_id = entry.task_id,
                start = %entry.start_time,
                end = %end,
                "session ends before it starts; counting zero"
            );
            spent = Duration::ZERO;
        }
        *totals.entry(entry.task_id).or_insert(Duration::ZERO) += spent;
    }

    let mut out: Vec<TaskSummary> = totals
        .into_iter()
        .map(|(task_id, total_time)| TaskSummary {
            task_id,
            total_time,
        })
        .collect();
    out.sort_by(|a, b| {
        b.total_time
            .cmp(&a.total_time)
            .then(a.task_id.cmp(&b.task_id))
    });
    Ok(out)
}

/// Renders a duration as `9h0m0s`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.whole_seconds();
    let sign = if secs < 0 { "-" } else { "" };
    let secs = secs.abs();
    format!("{sign}{}h{}m{}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn moscow() -> UserZone {
        UserZone::parse("Europe/Moscow").unwrap()
    }

    fn entry(id: i64, task_id: i64, start: OffsetDateTime, end: Option<OffsetDateTime>) -> TimeEntry {
        TimeEntry {
            id,
            user_id: 1,
            task_id,
            event_date: date!(2024 - 05 - 06),
            start_time: start,
            end_time: end,
        }
    }

    #[test]
    fn closed_entries_use_their_own_end() {
        let entries = vec![
            entry(1, 4, datetime!(2024-05-06 10:00 +3), Some(datetime!(2024-05-06 11:30 +3))),
            entry(2, 4, datetime!(2024-05-06 12:00 +3), Some(datetime!(2024-05-06 12:15 +3))),
        ];
        let summary = summarize(&entries, &moscow(), Some(time!(19:00))).unwrap();
        assert_eq!(
            summary,
            vec![TaskSummary {
                task_id: 4,
                total_time: Duration::minutes(105)
            }]
        );
    }

    #[test]
    fn open_entry_runs_until_default_end_time() {
        let entries = vec![entry(1, 4, datetime!(2024-05-06 10:00 +3), None)];
        let summary = summarize(&entries, &moscow(), Some(time!(19:00))).unwrap();
        assert_eq!(summary[0].total_time, Duration::hours(9));
        assert_eq!(format_duration(summary[0].total_time), "9h0m0s");
    }

    #[test]
    fn open_entry_without_default_runs_until_end_of_day() {
        let entries = vec![entry(1, 4, datetime!(2024-05-06 10:00 +3), None)];
        for default in [None, Some(Time::MIDNIGHT)] {
            let summary = summarize(&entries, &moscow(), default).unwrap();
            assert_eq!(
                summary[0].total_time,
                Duration::hours(13) + Duration::minutes(59) + Duration::seconds(59)
            );
        }
    }

    #[test]
    fn open_entry_ends_on_its_own_day_even_if_started_in_another_offset() {
        // stored in UTC; the event day is still the Moscow calendar day
        let entries = vec![entry(1, 4, datetime!(2024-05-06 07:00 UTC), None)];
        let summary = summarize(&entries, &moscow(), Some(time!(19:00))).unwrap();
        assert_eq!(summary[0].total_time, Duration::hours(9));
    }

    #[test]
    fn default_end_before_start_counts_zero() {
        let entries = vec![entry(1, 4, datetime!(2024-05-06 20:00 +3), None)];
        let summary = summarize(&entries, &moscow(), Some(time!(19:00))).unwrap();
        assert_eq!(summary[0].total_time, Duration::ZERO);
    }

    #[test]
    fn summaries_are_sorted_by_descending_total() {
        let entries = vec![
            entry(1, 1, datetime!(2024-05-06 09:00 +3), Some(datetime!(2024-05-06 09:30 +3))),
            entry(2, 2, datetime!(2024-05-06 10:00 +3), Some(datetime!(2024-05-06 13:00 +3))),
            entry(3, 3, datetime!(2024-05-06 14:00 +3), Some(datetime!(2024-05-06 15:00 +3))),
            entry(4, 5, datetime!(2024-05-06 16:00 +3), Some(datetime!(2024-05-06 17:00 +3))),
        ];
        let order: Vec<i64> = summarize(&entries, &moscow(), None)
            .unwrap()
            .into_iter()
            .map(|s| s.task_id)
            .collect();
        assert_eq!(order, vec![2, 3, 5, 1]);
    }

    #[test]
    fn format_duration_handles_minutes_and_seconds() {
        assert_eq!(format_duration(Duration::seconds(5430)), "1h30m30s");
        assert_eq!(format_duration(Duration::ZERO), "0h0m0s");
    }
}
