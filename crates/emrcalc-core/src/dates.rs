//! Calendar-day boundaries.
//!
//! Day boundaries are taken in UTC, the zone observation timestamps are
//! stored in.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

/// First moment of the given day.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// First moment of the day after `date`.
///
/// Anything strictly before this instant happened on or before `date`.
pub fn start_of_next_day(date: NaiveDate) -> DateTime<Utc> {
    match date.checked_add_days(Days::new(1)) {
        Some(next) => start_of_day(next),
        // `date` is the last representable day; every instant is on or before it
        None => DateTime::<Utc>::MAX_UTC,
    }
}
