//! Pure scheduling rules: no I/O, no clock reads.
//!
//! Services load state from the store, apply these rules, and persist the
//! outcome inside a single transaction. Keeping the rules here means the
//! boundary cases (lead times, rest day, room scan) are testable without a
//! database.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

pub mod attendance;
pub mod conflict;

pub use attendance::AttendanceState;
pub use conflict::{classify, overlaps, Overlap};

/// Scheduling policy knobs. All defaults match the gym's house rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Weekday on which no classes may be scheduled.
    pub rest_day: Weekday,
    /// Size of the room pool; rooms are numbered `1..=rooms`.
    pub rooms: i32,
    /// Minimum days between booking and the class date (inclusive).
    pub min_lead_days: i64,
    /// Maximum days between booking and the class date (inclusive).
    pub max_lead_days: i64,
    /// Rolling window for bulk instance generation.
    pub generate_window_days: u64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            rest_day: Weekday::Sun,
            rooms: 5,
            min_lead_days: 1,
            max_lead_days: 15,
            generate_window_days: 15,
        }
    }
}

pub fn validate_time_window(start: NaiveTime, end: NaiveTime) -> Result<()> {
    if start >= end {
        return Err(Error::Validation(
            "start time must be before end time".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_weekday(policy: &Policy, weekday: Weekday) -> Result<()> {
    if weekday == policy.rest_day {
        return Err(Error::Validation(format!(
            "no classes are scheduled on {weekday}"
        )));
    }
    Ok(())
}

pub fn validate_capacity(capacity: i32) -> Result<()> {
    if capacity <= 0 {
        return Err(Error::Validation(
            "capacity must be a positive number".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_room(policy: &Policy, room: i32) -> Result<()> {
    if room < 1 || room > policy.rooms {
        return Err(Error::Validation(format!(
            "room must be between 1 and {}",
            policy.rooms
        )));
    }
    Ok(())
}

/// Booking lead time: the class date must be between `min_lead_days` and
/// `max_lead_days` ahead of today, both inclusive.
pub fn check_booking_window(policy: &Policy, today: NaiveDate, class_date: NaiveDate) -> Result<()> {
    let lead = (class_date - today).num_days();
    if lead < policy.min_lead_days {
        return Err(Error::InvalidOperation(format!(
            "must book at least {} day(s) in advance",
            policy.min_lead_days
        )));
    }
    if lead > policy.max_lead_days {
        return Err(Error::InvalidOperation(format!(
            "cannot book more than {} days in advance",
            policy.max_lead_days
        )));
    }
    Ok(())
}

/// Cancellation is allowed only while the class date is strictly in the future.
pub fn check_cancellation_window(today: NaiveDate, class_date: NaiveDate) -> Result<()> {
    if class_date <= today {
        return Err(Error::InvalidOperation(
            "reservations can only be cancelled before the class day".to_string(),
        ));
    }
    Ok(())
}

/// Attendance may only be marked on or after the class date.
pub fn check_attendance_window(today: NaiveDate, class_date: NaiveDate) -> Result<()> {
    if class_date > today {
        return Err(Error::InvalidOperation(
            "attendance cannot be marked before the class takes place".to_string(),
        ));
    }
    Ok(())
}

/// All dates in `[today, today + window_days]` (inclusive) falling on `weekday`.
pub fn matching_dates(today: NaiveDate, window_days: u64, weekday: Weekday) -> Vec<NaiveDate> {
    (0..=window_days)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter(|date| date.weekday() == weekday)
        .collect()
}

/// First room in ascending order whose occupied windows don't overlap the
/// candidate window. Deterministic, not load-balanced.
pub fn first_free_room(
    rooms: i32,
    start: NaiveTime,
    end: NaiveTime,
    occupied: &[(i32, NaiveTime, NaiveTime)],
) -> Option<i32> {
    (1..=rooms).find(|room| {
        !occupied
            .iter()
            .any(|&(r, s, e)| r == *room && overlaps(start, end, s, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn booking_window_boundaries_are_inclusive() {
        let policy = Policy::default();
        let today = d(2026, 3, 2);

        // Same day and past: too soon.
        assert!(check_booking_window(&policy, today, today).is_err());
        assert!(check_booking_window(&policy, today, d(2026, 3, 1)).is_err());
        // Exactly 1 and exactly 15 days out: allowed.
        assert!(check_booking_window(&policy, today, d(2026, 3, 3)).is_ok());
        assert!(check_booking_window(&policy, today, d(2026, 3, 17)).is_ok());
        // 16 days out: too far.
        assert!(check_booking_window(&policy, today, d(2026, 3, 18)).is_err());
    }

    #[test]
    fn cancellation_requires_a_future_date() {
        let today = d(2026, 3, 2);
        assert!(check_cancellation_window(today, today).is_err());
        assert!(check_cancellation_window(today, d(2026, 3, 1)).is_err());
        assert!(check_cancellation_window(today, d(2026, 3, 3)).is_ok());
    }

    #[test]
    fn attendance_waits_for_the_class_date() {
        let today = d(2026, 3, 2);
        assert!(check_attendance_window(today, d(2026, 3, 3)).is_err());
        assert!(check_attendance_window(today, today).is_ok());
        assert!(check_attendance_window(today, d(2026, 3, 1)).is_ok());
    }

    #[test]
    fn rest_day_is_refused() {
        let policy = Policy::default();
        assert!(validate_weekday(&policy, Weekday::Sun).is_err());
        assert!(validate_weekday(&policy, Weekday::Mon).is_ok());
    }

    #[test]
    fn matching_dates_covers_the_inclusive_window() {
        // 2026-03-02 is a Monday; a 15-day window ends on Tuesday 2026-03-17.
        let today = d(2026, 3, 2);
        let tuesdays = matching_dates(today, 15, Weekday::Tue);
        assert_eq!(tuesdays, vec![d(2026, 3, 3), d(2026, 3, 10), d(2026, 3, 17)]);

        let mondays = matching_dates(today, 15, Weekday::Mon);
        assert_eq!(mondays, vec![d(2026, 3, 2), d(2026, 3, 9), d(2026, 3, 16)]);

        let sundays = matching_dates(today, 6, Weekday::Sun);
        assert_eq!(sundays, vec![d(2026, 3, 8)]);
    }

    #[test]
    fn room_scan_is_first_free_ascending() {
        let occupied = vec![
            (1, t(18, 0), t(19, 0)),
            (2, t(18, 30), t(19, 30)),
            (4, t(17, 0), t(20, 0)),
        ];
        assert_eq!(first_free_room(5, t(18, 0), t(19, 0), &occupied), Some(3));
        // Touching boundary in room 1 is fine: half-open windows.
        assert_eq!(first_free_room(5, t(19, 0), t(20, 0), &occupied), Some(1));
        // Pool of one fully booked.
        assert_eq!(
            first_free_room(1, t(18, 0), t(19, 0), &[(1, t(18, 0), t(19, 0))]),
            None
        );
        // Empty pool never yields a room.
        assert_eq!(first_free_room(0, t(18, 0), t(19, 0), &[]), None);
    }

    #[test]
    fn room_validation_respects_the_pool() {
        let policy = Policy::default();
        assert!(validate_room(&policy, 0).is_err());
        assert!(validate_room(&policy, 1).is_ok());
        assert!(validate_room(&policy, 5).is_ok());
        assert!(validate_room(&policy, 6).is_err());
    }
}
