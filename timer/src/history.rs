//! History presentation.
//!
//! Turns the cycle list into rows for the history table: newest cycle first,
//! with a human duration ("25 minutes"), a relative start time
//! ("about 2 hours ago") and the status derived from the terminal dates.

use chrono::{DateTime, Utc};

use crate::types::{Cycle, CycleStatus};

const MINUTES_IN_HOUR: i64 = 60;
const MINUTES_IN_DAY: i64 = 1_440;
const MINUTES_IN_ALMOST_TWO_DAYS: i64 = 2_520;
const MINUTES_IN_MONTH: i64 = 43_200;
const MINUTES_IN_TWO_MONTHS: i64 = 86_400;

/// One row of the history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub task: String,
    pub duration: String,
    pub started: String,
    pub status: CycleStatus,
}

impl HistoryEntry {
    /// Builds the row for `cycle` as seen at `now`.
    #[must_use]
    pub fn from_cycle(cycle: &Cycle, now: DateTime<Utc>) -> Self {
        Self {
            task: cycle.task.clone(),
            duration: format_duration_label(cycle.minutes_amount),
            started: format_relative(cycle.start_date, now),
            status: cycle.status(),
        }
    }
}

/// History rows, newest first.
#[must_use]
pub fn history_entries(cycles: &[Cycle], now: DateTime<Utc>) -> Vec<HistoryEntry> {
    cycles
        .iter()
        .rev()
        .map(|cycle| HistoryEntry::from_cycle(cycle, now))
        .collect()
}

/// "1 minute" or "N minutes".
#[must_use]
pub fn format_duration_label(minutes: u32) -> String {
    if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{minutes} minutes")
    }
}

/// Distance from `start` to `now` in words, with an "ago" suffix.
///
/// Times in the future are treated as "now".
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use pomodoro_timer::history::format_relative;
///
/// let now = Utc::now();
/// assert_eq!(format_relative(now - Duration::minutes(5), now), "5 minutes ago");
/// assert_eq!(format_relative(now - Duration::hours(2), now), "about 2 hours ago");
/// ```
#[must_use]
pub fn format_relative(start: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - start).num_seconds().max(0);
    format!("{} ago", format_distance(seconds))
}

fn format_distance(seconds: i64) -> String {
    let minutes = round_div(seconds, 60);

    if minutes < 2 {
        return if minutes == 0 {
            "less than a minute".to_string()
        } else {
            "1 minute".to_string()
        };
    }
    if minutes < 45 {
        return format!("{minutes} minutes");
    }
    if minutes < 90 {
        return "about 1 hour".to_string();
    }
    if minutes < MINUTES_IN_DAY {
        return format!("about {} hours", round_div(minutes, MINUTES_IN_HOUR));
    }
    if minutes < MINUTES_IN_ALMOST_TWO_DAYS {
        return "1 day".to_string();
    }
    if minutes < MINUTES_IN_MONTH {
        return format!("{} days", round_div(minutes, MINUTES_IN_DAY));
    }
    if minutes < MINUTES_IN_TWO_MONTHS {
        let months = round_div(minutes, MINUTES_IN_MONTH);
        return if months == 1 {
            "about 1 month".to_string()
        } else {
            format!("about {months} months")
        };
    }

    let months = minutes / MINUTES_IN_MONTH;
    if months < 12 {
        return format!("{} months", round_div(minutes, MINUTES_IN_MONTH));
    }

    let years = months / 12;
    let remainder = months % 12;
    let plural = |n: i64| if n == 1 { "1 year".to_string() } else { format!("{n} years") };
    if remainder < 3 {
        format!("about {}", plural(years))
    } else if remainder < 9 {
        format!("over {}", plural(years))
    } else {
        format!("almost {}", plural(years + 1))
    }
}

/// Division rounded half away from zero, for non-negative operands.
fn round_div(value: i64, divisor: i64) -> i64 {
    (value + divisor / 2) / divisor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn ago(duration: Duration) -> String {
        format_relative(now() - duration, now())
    }

    #[test]
    fn duration_label_pluralises() {
        assert_eq!(format_duration_label(1), "1 minute");
        assert_eq!(format_duration_label(25), "25 minutes");
    }

    #[test]
    fn relative_under_a_minute() {
        assert_eq!(ago(Duration::seconds(10)), "less than a minute ago");
        assert_eq!(ago(Duration::seconds(60)), "1 minute ago");
    }

    #[test]
    fn relative_minutes_and_hours() {
        assert_eq!(ago(Duration::minutes(5)), "5 minutes ago");
        assert_eq!(ago(Duration::minutes(50)), "about 1 hour ago");
        assert_eq!(ago(Duration::hours(2)), "about 2 hours ago");
        assert_eq!(ago(Duration::hours(23)), "about 23 hours ago");
    }

    #[test]
    fn relative_days_and_months() {
        assert_eq!(ago(Duration::hours(30)), "1 day ago");
        assert_eq!(ago(Duration::days(3)), "3 days ago");
        assert_eq!(ago(Duration::days(35)), "about 1 month ago");
        assert_eq!(ago(Duration::days(120)), "4 months ago");
    }

    #[test]
    fn relative_years() {
        assert_eq!(ago(Duration::days(370)), "about 1 year ago");
        assert_eq!(ago(Duration::days(365 + 180)), "over 1 year ago");
        assert_eq!(ago(Duration::days(365 + 300)), "almost 2 years ago");
    }

    #[test]
    fn relative_future_is_clamped() {
        let future = now() + Duration::minutes(10);
        assert_eq!(format_relative(future, now()), "less than a minute ago");
    }

    #[test]
    fn entries_are_newest_first_with_status() {
        let mut done = Cycle::new("Read", 25, now() - Duration::hours(2));
        done.finished_date = Some(now() - Duration::minutes(95));
        let mut stopped = Cycle::new("Write", 1, now() - Duration::minutes(30));
        stopped.interrupted_date = Some(now() - Duration::minutes(29));
        let running = Cycle::new("Review", 50, now() - Duration::seconds(5));

        let entries = history_entries(&[done, stopped, running], now());

        let tasks: Vec<_> = entries.iter().map(|e| e.task.as_str()).collect();
        assert_eq!(tasks, ["Review", "Write", "Read"]);
        assert_eq!(entries[0].status, CycleStatus::Running);
        assert_eq!(entries[1].status, CycleStatus::Interrupted);
        assert_eq!(entries[1].duration, "1 minute");
        assert_eq!(entries[2].status, CycleStatus::Completed);
        assert_eq!(entries[2].started, "about 2 hours ago");
    }
}
