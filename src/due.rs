// Due-time derivation: overdue checks, remaining-time labels, display order
//
// Everything here is a pure function of a task and an evaluation time. Callers
// pass `now` explicitly; `local_now()` is the wall clock for the CLI. Stored
// due times are local wall-clock values and are resolved to instants in the
// time zone of `now` before any comparison.

use crate::task::{Task, parse_date_time};
use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone};
use std::cmp::Ordering;

/// Label for a due date/time that has already passed
pub const OVERDUE: &str = "Overdue";

/// Label for a stored date/time that cannot be parsed
pub const INVALID_DATE: &str = "Invalid date";

/// Current local time
pub fn local_now() -> DateTime<Local> {
    Local::now()
}

/// Instant a local due date/time refers to in `tz`
///
/// A time repeated when clocks go back resolves to its earlier occurrence. A
/// time skipped when clocks go forward is moved one hour later.
pub fn resolve_due<Tz: TimeZone>(due: NaiveDateTime, tz: &Tz) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&due).earliest().or_else(|| {
        due.checked_add_signed(TimeDelta::hours(1))
            .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
    })
}

/// True iff the task is not completed and its due time is strictly before `now`
///
/// A task whose date/time cannot be parsed is never overdue.
pub fn is_overdue<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> bool {
    !task.completed
        && task
            .due()
            .and_then(|due| resolve_due(due, &now.timezone()))
            .is_some_and(|due| due < *now)
}

/// Human-readable time left until `date_time`, evaluated at `now`
///
/// Hours and days are rounded down.
pub fn format_remaining<Tz: TimeZone>(date_time: &str, now: &DateTime<Tz>) -> String {
    let Some(due) = parse_date_time(date_time).and_then(|due| resolve_due(due, &now.timezone())) else {
        return INVALID_DATE.to_string();
    };

    let diff = due.signed_duration_since(now.clone());
    if diff < TimeDelta::zero() {
        return OVERDUE.to_string();
    }

    // diff is non-negative, so truncation is floor
    let hours = diff.num_hours();
    if hours < 24 {
        format!("Due in {} hours", hours)
    } else {
        format!("Due in {} days", hours / 24)
    }
}

/// Display ordering: incomplete before completed, then ascending due time
///
/// Unparseable date/times sort after parseable ones within the same group.
/// Equal keys compare `Equal` so a stable sort keeps insertion order.
pub fn display_order(a: &Task, b: &Task) -> Ordering {
    a.completed.cmp(&b.completed).then_with(|| match (a.due(), b.due()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, LocalResult, NaiveDate, Utc};

    fn naive(month: u32, day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        let dt = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(h, m, s).unwrap();
        Utc.from_utc_datetime(&dt)
    }

    fn iso<Tz: TimeZone>(dt: DateTime<Tz>) -> String {
        dt.naive_local().format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    /// Central European time for 2025: UTC+1, UTC+2 from 30 March 01:00 UTC
    /// until 26 October 01:00 UTC.
    #[derive(Debug, Clone, Copy)]
    struct Cet2025;

    impl Cet2025 {
        fn winter() -> FixedOffset {
            FixedOffset::east_opt(3600).unwrap()
        }

        fn summer() -> FixedOffset {
            FixedOffset::east_opt(7200).unwrap()
        }
    }

    impl TimeZone for Cet2025 {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            Cet2025
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            if *local < naive(3, 30, 2, 0) {
                LocalResult::Single(Self::winter())
            } else if *local < naive(3, 30, 3, 0) {
                LocalResult::None
            } else if *local < naive(10, 26, 2, 0) {
                LocalResult::Single(Self::summer())
            } else if *local < naive(10, 26, 3, 0) {
                LocalResult::Ambiguous(Self::summer(), Self::winter())
            } else {
                LocalResult::Single(Self::winter())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < naive(3, 30, 1, 0) || *utc >= naive(10, 26, 1, 0) {
                Self::winter()
            } else {
                Self::summer()
            }
        }
    }

    #[test]
    fn test_format_remaining_overdue() {
        let now = at(12, 0, 0);
        assert_eq!(format_remaining(&iso(now - TimeDelta::seconds(1)), &now), "Overdue");
    }

    #[test]
    fn test_format_remaining_hours() {
        let now = at(12, 0, 0);
        assert_eq!(format_remaining(&iso(now + TimeDelta::hours(2)), &now), "Due in 2 hours");
        assert_eq!(
            format_remaining(&iso(now + TimeDelta::minutes(179)), &now),
            "Due in 2 hours"
        );
        assert_eq!(format_remaining(&iso(now), &now), "Due in 0 hours");
        assert_eq!(
            format_remaining(&iso(now + TimeDelta::hours(23) + TimeDelta::minutes(59)), &now),
            "Due in 23 hours"
        );
    }

    #[test]
    fn test_format_remaining_days() {
        let now = at(12, 0, 0);
        assert_eq!(format_remaining(&iso(now + TimeDelta::hours(24)), &now), "Due in 1 days");
        assert_eq!(format_remaining(&iso(now + TimeDelta::hours(50)), &now), "Due in 2 days");
    }

    #[test]
    fn test_format_remaining_invalid() {
        assert_eq!(format_remaining("someday", &at(0, 0, 0)), INVALID_DATE);
    }

    #[test]
    fn test_format_remaining_uses_offset_of_now() {
        let tz = FixedOffset::east_opt(5 * 3600).unwrap();
        let now = tz.from_local_datetime(&naive(6, 1, 12, 0)).unwrap();
        assert_eq!(format_remaining("2025-06-01T14:00", &now), "Due in 2 hours");
    }

    #[test]
    fn test_format_remaining_across_spring_forward() {
        // Wall clock says 24h, but the night is one hour short
        let now = Cet2025.from_local_datetime(&naive(3, 29, 12, 0)).unwrap();
        assert_eq!(format_remaining("2025-03-30T12:00", &now), "Due in 23 hours");
    }

    #[test]
    fn test_format_remaining_across_fall_back() {
        let now = Cet2025.from_local_datetime(&naive(10, 25, 12, 0)).unwrap();
        // 23 wall-clock hours are 24 real hours here
        assert_eq!(format_remaining("2025-10-26T11:00", &now), "Due in 1 days");
    }

    #[test]
    fn test_skipped_local_time_moves_forward() {
        // 02:30 does not exist on 30 March; it resolves to 03:30 summer time
        let due = resolve_due(naive(3, 30, 2, 30), &Cet2025).unwrap();
        assert_eq!(due.naive_utc(), naive(3, 30, 1, 30));

        let now = Cet2025.from_local_datetime(&naive(3, 30, 1, 0)).unwrap();
        assert_eq!(format_remaining("2025-03-30T02:30", &now), "Due in 1 hours");
    }

    #[test]
    fn test_is_overdue_in_repeated_hour() {
        // Second pass through 02:30, after clocks went back (01:30 UTC)
        let now = Cet2025.from_utc_datetime(&naive(10, 26, 1, 30));
        assert_eq!(now.naive_local(), naive(10, 26, 2, 30));

        // 02:45 resolves to its first occurrence, 00:45 UTC, already past
        let task = Task::new(1, "repeated hour", "2025-10-26T02:45");
        assert!(is_overdue(&task, &now));
        assert_eq!(format_remaining(&task.date_time, &now), "Overdue");
    }

    #[test]
    fn test_is_overdue() {
        let now = at(12, 0, 0);
        let mut task = Task::new(1, "pay rent", "2025-06-01T11:59");
        assert!(is_overdue(&task, &now));

        task.completed = true;
        assert!(!is_overdue(&task, &now));

        // Exactly now is not strictly in the past
        let due_now = Task::new(2, "call", "2025-06-01T12:00");
        assert!(!is_overdue(&due_now, &now));

        let garbage = Task::new(3, "?", "whenever");
        assert!(!is_overdue(&garbage, &now));
    }

    #[test]
    fn test_display_order() {
        let pending_early = Task::new(1, "a", "2025-06-01T08:00");
        let pending_late = Task::new(2, "b", "2025-06-01T09:00");
        let mut done_early = Task::new(3, "c", "2025-05-01T08:00");
        done_early.completed = true;
        let unparseable = Task::new(4, "d", "??");

        assert_eq!(display_order(&pending_early, &pending_late), Ordering::Less);
        assert_eq!(display_order(&done_early, &pending_late), Ordering::Greater);
        assert_eq!(display_order(&unparseable, &pending_late), Ordering::Greater);
        assert_eq!(display_order(&unparseable, &done_early), Ordering::Less);
        assert_eq!(display_order(&pending_early, &pending_early.clone()), Ordering::Equal);
    }
}
