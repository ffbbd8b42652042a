//! Per-owner task statistics, aggregated over an already-fetched task set.

use serde::{Deserialize, Serialize};

use crate::{models::task::Task, types::TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskStatistics {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub in_progress_tasks: u64,
    pub todo_tasks: u64,
    pub urgent_tasks: u64,
    pub avg_completion_percentage: i32,
    pub avg_priority_score: i32,
    /// round(100 * completed / total); 0 on an empty set.
    pub completion_rate: i32,
}

impl TaskStatistics {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len() as u64;
        if total == 0 {
            return Self::default();
        }

        let mut stats = Self {
            total_tasks: total,
            ..Self::default()
        };
        let mut completion_sum: i64 = 0;
        let mut score_sum: i64 = 0;

        for task in tasks {
            match task.status {
                TaskStatus::Completed => stats.completed_tasks += 1,
                TaskStatus::InProgress => stats.in_progress_tasks += 1,
                TaskStatus::Todo => stats.todo_tasks += 1,
                TaskStatus::Cancelled => {}
            }
            if task.is_urgent {
                stats.urgent_tasks += 1;
            }
            completion_sum += i64::from(task.completion_percentage);
            score_sum += i64::from(task.priority_score);
        }

        stats.avg_completion_percentage = rounded_ratio(completion_sum, total);
        stats.avg_priority_score = rounded_ratio(score_sum, total);
        stats.completion_rate = rounded_ratio(stats.completed_tasks as i64 * 100, total);
        stats
    }
}

fn rounded_ratio(sum: i64, count: u64) -> i32 {
    (sum as f64 / count as f64).round() as i32
}
