//! Study statistics over stored sessions

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{StudySession, STUDY_MINUTES_PER_POMODORO};

/// Number of days covered by the weekly summary, today included
pub const WEEK_DAYS: i64 = 7;

/// Totals for a single calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    pub date: NaiveDate,
    pub weekday: String,
    pub session_count: u32,
    pub study_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyStats {
    pub today: Vec<StudySession>,
    /// Last seven days with at least one session, newest first
    pub weekly: Vec<DayStats>,
    pub week_study_minutes: u64,
}

/// Summarize sessions relative to `now` (UTC calendar days)
pub fn summarize(sessions: &[StudySession], now: DateTime<Utc>) -> StudyStats {
    let today = now.date_naive();
    let window_start = today - Duration::days(WEEK_DAYS - 1);

    let today_sessions = sessions
        .iter()
        .filter(|s| s.start_time.date_naive() == today)
        .cloned()
        .collect();

    let mut weekly: Vec<DayStats> = Vec::new();
    for session in sessions {
        let date = session.start_time.date_naive();
        if date < window_start || date > today {
            continue;
        }

        let minutes =
            u64::from(session.pomodoro_sessions) * u64::from(STUDY_MINUTES_PER_POMODORO);
        match weekly.iter_mut().find(|d| d.date == date) {
            Some(day) => {
                day.session_count = day.session_count.saturating_add(1);
                day.study_minutes = day.study_minutes.saturating_add(minutes);
            }
            None => weekly.push(DayStats {
                date,
                weekday: date.format("%A").to_string(),
                session_count: 1,
                study_minutes: minutes,
            }),
        }
    }
    weekly.sort_by(|a, b| b.date.cmp(&a.date));

    StudyStats {
        today: today_sessions,
        week_study_minutes: weekly
            .iter()
            .fold(0u64, |total, d| total.saturating_add(d.study_minutes)),
        weekly,
    }
}
