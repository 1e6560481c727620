// Read-side task selection for the presentation layer

use crate::due::is_overdue;
use crate::task::Task;
use chrono::{DateTime, TimeZone};
use std::str::FromStr;

/// Which tasks to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    All,
    Pending,
    Completed,
    Overdue,
}

impl View {
    pub fn matches<Tz: TimeZone>(self, task: &Task, now: &DateTime<Tz>) -> bool {
        match self {
            View::All => true,
            View::Pending => !task.completed,
            View::Completed => task.completed,
            View::Overdue => is_overdue(task, now),
        }
    }

    /// Keep matching tasks, preserving order
    pub fn apply<Tz: TimeZone>(self, tasks: Vec<Task>, now: &DateTime<Tz>) -> Vec<Task> {
        tasks.into_iter().filter(|t| self.matches(t, now)).collect()
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(View::All),
            "pending" => Ok(View::Pending),
            "completed" | "done" => Ok(View::Completed),
            "overdue" => Ok(View::Overdue),
            other => Err(format!(
                "unknown view '{}' (expected all, pending, completed or overdue)",
                other
            )),
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::All => write!(f, "all"),
            View::Pending => write!(f, "pending"),
            View::Completed => write!(f, "completed"),
            View::Overdue => write!(f, "overdue"),
        }
    }
}
