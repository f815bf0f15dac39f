//! Habit streak computation.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};

use crate::defaults::STREAK_LOOKBACK_DAYS;

/// Consecutive completed days ending today.
///
/// A missing check-in for `today` itself does not break the streak, so a
/// habit done every day up to yesterday still counts while today is open.
pub fn current_streak(completed: &[NaiveDate], today: NaiveDate) -> u32 {
    let done: HashSet<NaiveDate> = completed.iter().copied().collect();
    let mut streak = 0;

    for offset in 0..STREAK_LOOKBACK_DAYS {
        let day = today - Duration::days(offset);
        if done.contains(&day) {
            streak += 1;
        } else if offset > 0 {
            break;
        }
    }

    streak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 20).unwrap()
    }

    fn days_ago(n: i64) -> NaiveDate {
        today() - Duration::days(n)
    }

    #[test]
    fn test_streak_allows_open_today() {
        let dates = vec![days_ago(1), days_ago(2), days_ago(3), days_ago(5)];
        assert_eq!(current_streak(&dates, today()), 3);
    }

    #[test]
    fn test_streak_includes_today_when_done() {
        let dates = vec![today(), days_ago(1)];
        assert_eq!(current_streak(&dates, today()), 2);
    }

    #[test]
    fn test_streak_zero_when_yesterday_missing() {
        let dates = vec![days_ago(2), days_ago(3)];
        assert_eq!(current_streak(&dates, today()), 0);
    }

    #[test]
    fn test_streak_empty() {
        assert_eq!(current_streak(&[], today()), 0);
    }

    #[test]
    fn test_streak_capped_by_lookback() {
        let dates: Vec<NaiveDate> = (0..90).map(days_ago).collect();
        assert_eq!(current_streak(&dates, today()), STREAK_LOOKBACK_DAYS as u32);
    }

    #[test]
    fn test_streak_ignores_duplicates_and_order() {
        let dates = vec![days_ago(1), today(), days_ago(1), days_ago(2)];
        assert_eq!(current_streak(&dates, today()), 3);
    }
}
