//! Calendar arithmetic over plan days
//!
//! All day counts work on calendar dates, so daylight saving transitions
//! never produce fractional days.

use chrono::{Days, NaiveDate};

/// Number of calendar days from `start` to `end`, counting both ends.
///
/// The same day gives 1, consecutive days give 2, and `end` before `start`
/// gives zero or less.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Shift a date by a signed number of days
pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// Iterator over every day from `start` to `end`, inclusive
pub fn each_day(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}
