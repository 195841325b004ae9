//! Day and week boundary arithmetic.
//!
//! Everything works on naive local wall-clock time. Handlers capture
//! `Local::now().naive_local()` once per request and pass it down, so the
//! rest of the crate stays pure and deterministic. Weeks run Monday through
//! Sunday; Sunday belongs to the week that started six days earlier.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};

/// Weeks shown on the progress report, most recent first.
pub const HISTORY_WEEKS: usize = 8;

/// Midnight of the day containing `t`.
pub fn start_of_day(t: NaiveDateTime) -> NaiveDateTime {
    t.date().and_time(NaiveTime::MIN)
}

/// 23:59:59.999 of the day containing `t`.
pub fn end_of_day(t: NaiveDateTime) -> NaiveDateTime {
    start_of_day(t) + Duration::days(1) - Duration::milliseconds(1)
}

/// Midnight of the Monday at or before `t`.
pub fn start_of_week(t: NaiveDateTime) -> NaiveDateTime {
    let back = t.date().weekday().num_days_from_monday() as i64;
    (t.date() - Duration::days(back)).and_time(NaiveTime::MIN)
}

/// 23:59:59.999 of the Sunday ending the week containing `t`.
pub fn end_of_week(t: NaiveDateTime) -> NaiveDateTime {
    start_of_week(t) + Duration::days(7) - Duration::milliseconds(1)
}

/// Identifier of the ISO-8601 week containing `t`, e.g. `2025-W34`.
///
/// Uses the ISO week-year rather than the calendar year, so the days around
/// New Year that belong to the neighbouring year's week get that week's key.
/// Clients use this only as an opaque dedup token for one-per-week effects.
pub fn week_key(t: NaiveDateTime) -> String {
    let iso = t.date().iso_week();
    format!("{}-W{}", iso.year(), iso.week())
}

/// Calendar-date key of the day containing `t`, e.g. `2025-08-22`.
pub fn day_key(t: NaiveDateTime) -> String {
    t.date().format("%Y-%m-%d").to_string()
}

/// The `count` whole Monday..Sunday windows before the week containing `t`,
/// most recent first. Each entry is (week start, week end).
pub fn past_week_windows(t: NaiveDateTime, count: usize) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    let current = start_of_week(t);
    (1..=count as i64)
        .map(|back| {
            let start = current - Duration::weeks(back);
            (start, start + Duration::days(7) - Duration::milliseconds(1))
        })
        .collect()
}
