//! Derived-field scoring for tasks.
//!
//! Both functions are pure: given the same inputs and the same `now` they
//! always produce the same outputs, which is what lets the model layer cache
//! the results in the `completion_percentage` and `priority_score` columns
//! at write time instead of recomputing them on read.

use chrono::{DateTime, Utc};

use crate::types::{TaskPriority, TaskStatus};

pub const MAX_PRIORITY_SCORE: i32 = 100;

const URGENT_FLAG_BONUS: i32 = 20;
const SECONDS_PER_DAY: i64 = 86_400;

/// How far along a task is, inferred from its status alone.
pub fn completion_percentage(status: TaskStatus) -> i32 {
    match status {
        TaskStatus::Todo => 0,
        TaskStatus::InProgress => 50,
        TaskStatus::Completed => 100,
        TaskStatus::Cancelled => 0,
    }
}

fn priority_weight(priority: TaskPriority) -> i32 {
    match priority {
        TaskPriority::Low => 10,
        TaskPriority::Medium => 25,
        TaskPriority::High => 40,
        TaskPriority::Urgent => 60,
    }
}

/// Whole-day difference between `due_date` and `now`, floored. A task due
/// twelve hours ago is -1 day out; one due in twelve hours is 0 days out.
fn days_until(due_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (due_date - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

fn due_date_weight(due_date: DateTime<Utc>, now: DateTime<Utc>) -> i32 {
    match days_until(due_date, now) {
        days if days < 0 => 40,
        0..=1 => 35,
        2..=3 => 25,
        4..=7 => 15,
        _ => 5,
    }
}

/// Additive urgency score in 0..=100. `now` is injected so callers (and
/// tests) control the clock.
pub fn priority_score(
    priority: TaskPriority,
    is_urgent: bool,
    due_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> i32 {
    let mut score = priority_weight(priority);
    if is_urgent {
        score += URGENT_FLAG_BONUS;
    }
    if let Some(due_date) = due_date {
        score += due_date_weight(due_date, now);
    }
    score.min(MAX_PRIORITY_SCORE)
}

/// Both derived fields at once, the shape the model layer persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedFields {
    pub completion_percentage: i32,
    pub priority_score: i32,
}

pub fn derived_fields(
    status: TaskStatus,
    priority: TaskPriority,
    is_urgent: bool,
    due_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DerivedFields {
    DerivedFields {
        completion_percentage: completion_percentage(status),
        priority_score: priority_score(priority, is_urgent, due_date, now),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use sea_orm::Iterable;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn completion_percentage_per_status() {
        assert_eq!(completion_percentage(TaskStatus::Todo), 0);
        assert_eq!(completion_percentage(TaskStatus::InProgress), 50);
        assert_eq!(completion_percentage(TaskStatus::Completed), 100);
        assert_eq!(completion_percentage(TaskStatus::Cancelled), 0);
    }

    #[test]
    fn low_priority_without_due_date_scores_base_weight() {
        assert_eq!(
            priority_score(TaskPriority::Low, false, None, fixed_now()),
            10
        );
    }

    #[test]
    fn medium_priority_due_in_five_days() {
        let now = fixed_now();
        assert_eq!(
            priority_score(TaskPriority::Medium, false, Some(now + Duration::days(5)), now),
            40
        );
    }

    #[test]
    fn overdue_urgent_task_clamps_at_100() {
        let now = fixed_now();
        assert_eq!(
            priority_score(TaskPriority::Urgent, true, Some(now - Duration::days(1)), now),
            100
        );
    }

    #[test]
    fn due_date_buckets() {
        let now = fixed_now();
        let score = |days: i64| {
            priority_score(TaskPriority::Low, false, Some(now + Duration::days(days)), now)
        };
        assert_eq!(score(-3), 10 + 40);
        assert_eq!(score(0), 10 + 35);
        assert_eq!(score(1), 10 + 35);
        assert_eq!(score(2), 10 + 25);
        assert_eq!(score(3), 10 + 25);
        assert_eq!(score(4), 10 + 15);
        assert_eq!(score(7), 10 + 15);
        assert_eq!(score(8), 10 + 5);
        assert_eq!(score(30), 10 + 5);
    }

    #[test]
    fn partial_days_floor_toward_the_past() {
        let now = fixed_now();
        // Twelve hours overdue floors to -1, which is the overdue bucket.
        assert_eq!(
            priority_score(TaskPriority::Low, false, Some(now - Duration::hours(12)), now),
            10 + 40
        );
        // Twelve hours out floors to day 0.
        assert_eq!(
            priority_score(TaskPriority::Low, false, Some(now + Duration::hours(12)), now),
            10 + 35
        );
    }

    #[test]
    fn score_stays_within_bounds_for_all_combinations() {
        let now = fixed_now();
        let offsets = [-10i64, -1, 0, 1, 3, 5, 10];
        for priority in TaskPriority::iter() {
            for is_urgent in [false, true] {
                let mut due_dates: Vec<Option<DateTime<Utc>>> = offsets
                    .iter()
                    .map(|days| Some(now + Duration::days(*days)))
                    .collect();
                due_dates.push(None);
                for due_date in due_dates {
                    let score = priority_score(priority, is_urgent, due_date, now);
                    assert!((0..=MAX_PRIORITY_SCORE).contains(&score));
                }
            }
        }
    }

    #[test]
    fn derived_fields_bundles_both_values() {
        let now = fixed_now();
        let derived = derived_fields(TaskStatus::InProgress, TaskPriority::High, true, None, now);
        assert_eq!(derived.completion_percentage, 50);
        assert_eq!(derived.priority_score, 60);
    }
}
