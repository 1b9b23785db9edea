//! Day-streak rules.
//!
//! Two distinct rules live here and must stay distinct:
//!
//! * [`record_activity`] runs once per completed session. A gap of exactly one
//!   calendar day extends the streak, a longer gap restarts it at 1.
//! * [`decay_on_load`] runs once per process start, before any new activity. A
//!   gap of more than one calendar day drops the streak to 0.
//!
//! Calendar days are evaluated in the caller's timezone, not as 24h windows.

use chrono::{DateTime, TimeZone, Utc};

/// Result of recording a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    /// New streak value
    pub streak: u32,
    /// Always the completion time
    pub last_activity_date: DateTime<Utc>,
}

/// Number of calendar-day boundaries between two instants, seen from `tz`.
///
/// Negative when `later` falls on an earlier calendar day than `earlier`.
pub fn calendar_days_between<Tz: TimeZone>(
    earlier: DateTime<Utc>,
    later: DateTime<Utc>,
    tz: &Tz,
) -> i64 {
    let from = earlier.with_timezone(tz).date_naive();
    let to = later.with_timezone(tz).date_naive();
    to.signed_duration_since(from).num_days()
}

/// Update the streak for a session completed at `now`.
///
/// # Arguments
///
/// * `streak` - Current streak
/// * `last_activity` - Previous completion time, if any
/// * `now` - Completion time of this session
/// * `tz` - Calendar used to compare days
///
/// # Rules
///
/// * No prior activity: 1
/// * Previous activity yesterday: streak + 1
/// * Previous activity earlier than yesterday: 1
/// * Anything else (same day): unchanged
pub fn record_activity<Tz: TimeZone>(
    streak: u32,
    last_activity: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    tz: &Tz,
) -> StreakUpdate {
    let streak = match last_activity.map(|last| calendar_days_between(last, now, tz)) {
        None => 1,
        Some(1) => streak.saturating_add(1),
        Some(days) if days > 1 => 1,
        Some(_) => streak,
    };

    StreakUpdate {
        streak,
        last_activity_date: now,
    }
}

/// Passive streak check performed when stats are loaded.
///
/// Returns 0 when more than one calendar day has passed since the last
/// activity, otherwise the streak as-is. `last_activity` is not touched.
pub fn decay_on_load<Tz: TimeZone>(
    streak: u32,
    last_activity: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    tz: &Tz,
) -> u32 {
    match last_activity {
        Some(last) if calendar_days_between(last, now, tz) > 1 => 0,
        _ => streak,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_first_activity_starts_at_one() {
        let update = record_activity(0, None, at(12, 8, 0), &Utc);
        assert_eq!(update.streak, 1);
        assert_eq!(update.last_activity_date, at(12, 8, 0));

        // Stored streak is irrelevant without a prior date
        assert_eq!(record_activity(9, None, at(12, 8, 0), &Utc).streak, 1);
    }

    #[test]
    fn test_yesterday_extends() {
        let update = record_activity(4, Some(at(11, 10, 0)), at(12, 10, 0), &Utc);
        assert_eq!(update.streak, 5);
    }

    #[test]
    fn test_calendar_day_not_rolling_window() {
        // Ten minutes apart, but across midnight
        let update = record_activity(2, Some(at(11, 23, 55)), at(12, 0, 5), &Utc);
        assert_eq!(update.streak, 3);

        // Almost 48 hours apart, still only one calendar day
        let update = record_activity(2, Some(at(11, 0, 1)), at(12, 23, 59), &Utc);
        assert_eq!(update.streak, 3);
    }

    #[test]
    fn test_same_day_unchanged() {
        let update = record_activity(6, Some(at(12, 7, 0)), at(12, 21, 0), &Utc);
        assert_eq!(update.streak, 6);
        assert_eq!(update.last_activity_date, at(12, 21, 0));
    }

    #[test]
    fn test_gap_restarts_at_one() {
        let update = record_activity(8, Some(at(9, 12, 0)), at(12, 12, 0), &Utc);
        assert_eq!(update.streak, 1);
    }

    #[test]
    fn test_future_activity_leaves_streak() {
        let update = record_activity(3, Some(at(14, 12, 0)), at(12, 12, 0), &Utc);
        assert_eq!(update.streak, 3);
    }

    #[test]
    fn test_timezone_decides_the_day() {
        // 23:30 UTC on the 11th is already the 12th at UTC+2
        let last = at(11, 23, 30);
        let now = at(12, 20, 0);
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();

        assert_eq!(calendar_days_between(last, now, &Utc), 1);
        assert_eq!(calendar_days_between(last, now, &plus_two), 0);
        assert_eq!(record_activity(3, Some(last), now, &plus_two).streak, 3);
    }

    #[test]
    fn test_decay_resets_to_zero() {
        assert_eq!(decay_on_load(7, Some(at(9, 12, 0)), at(12, 12, 0), &Utc), 0);
    }

    #[test]
    fn test_decay_keeps_recent_streaks() {
        assert_eq!(decay_on_load(7, Some(at(11, 12, 0)), at(12, 12, 0), &Utc), 7);
        assert_eq!(decay_on_load(7, Some(at(12, 1, 0)), at(12, 12, 0), &Utc), 7);
        assert_eq!(decay_on_load(7, None, at(12, 12, 0), &Utc), 7);
    }

    #[test]
    fn test_decay_and_record_disagree_on_gaps() {
        let last = at(12, 12, 0) - Duration::days(3);
        let now = at(12, 12, 0);
        assert_eq!(decay_on_load(5, Some(last), now, &Utc), 0);
        assert_eq!(record_activity(5, Some(last), now, &Utc).streak, 1);
    }
}
