//! Staleness alerts over "days since last work" and "days since last
//! interview".
//!
//! The two signals are orthogonal: a person can carry both at once, and
//! the view layer decides prominence (work alert red, interview alert
//! yellow). Nothing here ever collapses them into one level.

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::PersonRecord;

/// Work-recency level. Highest matching threshold wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkAlert {
    Notice,
    Elevated,
    Critical,
}

/// Interview-recency level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewAlert {
    Stale,
}

/// Both signals for one person. Either side may be absent.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPair {
    pub work: Option<WorkAlert>,
    pub interview: Option<InterviewAlert>,
}

/// Whole days between a recorded date and today, with time-of-day
/// discarded on both sides (dates are already midnight-aligned).
pub fn days_since(date: NaiveDate, today: NaiveDate) -> i64 {
    (today - date).num_days()
}

/// Work alert for a day delta. Boundaries are inclusive: exactly 30 days
/// is already critical, exactly 10 is already a notice.
pub fn work_alert(days: i64) -> Option<WorkAlert> {
    if days >= 30 {
        Some(WorkAlert::Critical)
    } else if days >= 20 {
        Some(WorkAlert::Elevated)
    } else if days >= 10 {
        Some(WorkAlert::Notice)
    } else {
        None
    }
}

/// Interview alert for a day delta; 60 days or more is stale.
pub fn interview_alert(days: i64) -> Option<InterviewAlert> {
    if days >= 60 {
        Some(InterviewAlert::Stale)
    } else {
        None
    }
}

/// Evaluate both signals for a directory entry. A missing date never
/// alerts — new entries start quiet until their first recorded work day.
pub fn evaluate(person: &PersonRecord, today: NaiveDate) -> AlertPair {
    AlertPair {
        work: person
            .last_work_date
            .and_then(|d| work_alert(days_since(d, today))),
        interview: person
            .last_interview_date
            .and_then(|d| interview_alert(days_since(d, today))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_work_alert_boundaries() {
        assert_eq!(work_alert(30), Some(WorkAlert::Critical));
        assert_eq!(work_alert(29), Some(WorkAlert::Elevated));
        assert_eq!(work_alert(20), Some(WorkAlert::Elevated));
        assert_eq!(work_alert(19), Some(WorkAlert::Notice));
        assert_eq!(work_alert(10), Some(WorkAlert::Notice));
        assert_eq!(work_alert(9), None);
        assert_eq!(work_alert(0), None);
    }

    #[test]
    fn test_interview_alert_boundary() {
        assert_eq!(interview_alert(60), Some(InterviewAlert::Stale));
        assert_eq!(interview_alert(59), None);
    }

    #[test]
    fn test_days_since_midnight_delta() {
        assert_eq!(days_since(date(2026, 7, 8), date(2026, 8, 7)), 30);
        assert_eq!(days_since(date(2026, 8, 7), date(2026, 8, 7)), 0);
    }

    #[test]
    fn test_evaluate_missing_dates_stay_quiet() {
        let p = PersonRecord::default();
        let pair = evaluate(&p, date(2026, 8, 7));
        assert_eq!(pair.work, None);
        assert_eq!(pair.interview, None);
    }

    #[test]
    fn test_evaluate_signals_are_independent() {
        let p = PersonRecord {
            last_work_date: Some(date(2026, 7, 8)),      // 30 days ago
            last_interview_date: Some(date(2026, 5, 1)), // long stale
            ..Default::default()
        };
        let pair = evaluate(&p, date(2026, 8, 7));
        assert_eq!(pair.work, Some(WorkAlert::Critical));
        assert_eq!(pair.interview, Some(InterviewAlert::Stale));
    }
}
