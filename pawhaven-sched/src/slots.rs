//! Slot grid model: the fixed daily slots and the rolling booking
//! horizon. Pure functions of an explicit reference date; never fails.

use chrono::{Duration, NaiveDate};

/// Length of the rolling booking window, in days.
pub const HORIZON_DAYS: i64 = 30;

/// Hourly slots from 09:00 to 16:00 inclusive, in booking order.
pub const SLOT_LABELS: [&str; 8] = [
    "09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00",
];

/// The fixed ordered slot labels for any day.
pub fn slot_labels() -> &'static [&'static str] {
    &SLOT_LABELS
}

/// Number of bookable slots per day.
pub fn total_daily_capacity() -> usize {
    SLOT_LABELS.len()
}

/// Whether `time` is one of the grid's slot labels.
pub fn is_slot_label(time: &str) -> bool {
    SLOT_LABELS.contains(&time)
}

/// The 30 bookable dates relative to `now`: tomorrow through
/// `now + 30` days. Restartable; recompute per query, never cache.
pub fn horizon_dates(now: NaiveDate) -> impl Iterator<Item = NaiveDate> + Clone {
    (1..=HORIZON_DAYS).map(move |offset| now + Duration::days(offset))
}
