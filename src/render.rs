// Terminal rendering of the task list

use crate::due::{format_remaining, is_overdue};
use crate::task::Task;
use chrono::{DateTime, TimeZone};
use colored::Colorize;

/// One line per task: id, checkbox, text, due date/time and remaining time
///
/// Completed tasks are dimmed, overdue tasks are red.
pub fn render_task<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> String {
    let checkbox = if task.completed { "[x]" } else { "[ ]" };
    let line = format!(
        "{:>13}  {} {}  {}  ({})",
        task.id,
        checkbox,
        task.text,
        task.date_time,
        format_remaining(&task.date_time, now)
    );

    if task.completed {
        line.dimmed().to_string()
    } else if is_overdue(task, now) {
        line.red().to_string()
    } else {
        line
    }
}

/// Render tasks in the order given
pub fn render_list<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> String {
    if tasks.is_empty() {
        return "No tasks".dimmed().to_string();
    }

    tasks
        .iter()
        .map(|t| render_task(t, now))
        .collect::<Vec<_>>()
        .join("\n")
}
