// Task store: the owned task collection and its persistence round-trip

use crate::due::{self, display_order};
use crate::slot::{Slot, validate_key};
use crate::task::{Task, now_ms};
use chrono::{DateTime, TimeZone};
use eyre::{Context, Result, eyre};
use tracing::{debug, info, warn};

/// Default slot key for the task collection
pub const DEFAULT_KEY: &str = "tasks";

/// Ordered task collection persisted to a single slot
///
/// All mutations go through this type. Each successful mutation rewrites the
/// whole collection to the slot before returning; rejected input and unknown
/// ids return `None`/`false` without touching storage.
pub struct TaskStore<S: Slot> {
    slot: S,
    key: String,
    tasks: Vec<Task>,
}

impl<S: Slot> TaskStore<S> {
    /// Open a store over `slot`, loading whatever is stored under `key`
    pub fn open(slot: S, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;

        let tasks = Self::load(&slot, &key)?;
        info!(key = %key, count = tasks.len(), "Opened task store");

        Ok(Self { slot, key, tasks })
    }

    /// Read and parse the collection stored under `key`
    ///
    /// An absent slot or content that does not parse as a task array yields an
    /// empty collection. Only backend failures are errors.
    pub fn load(slot: &S, key: &str) -> Result<Vec<Task>> {
        let Some(raw) = slot.get(key).context("Failed to read task slot")? else {
            debug!(key, "Task slot is empty");
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Option<Vec<Task>>>(&raw) {
            Ok(tasks) => Ok(tasks.unwrap_or_default()),
            Err(e) => {
                warn!(key, error = ?e, "Failed to parse stored tasks, starting empty");
                Ok(Vec::new())
            }
        }
    }

    /// Serialize the full collection and replace the slot contents
    pub fn save(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.tasks).context("Failed to serialize tasks")?;
        self.slot.set(&self.key, &json).context("Failed to write task slot")?;
        debug!(key = %self.key, count = self.tasks.len(), "Saved tasks");
        Ok(())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a pending task
    ///
    /// Returns `None` if `text` or `date_time` is empty after trimming.
    pub fn add(&mut self, text: &str, date_time: &str) -> Result<Option<Task>> {
        let (text, date_time) = (text.trim(), date_time.trim());
        if text.is_empty() || date_time.is_empty() {
            debug!("add: rejected empty input");
            return Ok(None);
        }

        let task = Task::new(self.next_id(now_ms())?, text, date_time);
        self.tasks.push(task.clone());
        self.save()?;

        info!(id = task.id, "Added task");
        Ok(Some(task))
    }

    /// Flip `completed` on the task with `id`
    pub fn toggle_complete(&mut self, id: i64) -> Result<Option<Task>> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "toggle_complete: no such task");
            return Ok(None);
        };

        task.completed = !task.completed;
        let task = task.clone();
        self.save()?;

        info!(id, completed = task.completed, "Toggled task");
        Ok(Some(task))
    }

    /// Replace text and due date/time of the task with `id`
    ///
    /// Returns `None` if either value is empty after trimming or the id is unknown.
    pub fn edit(&mut self, id: i64, new_text: &str, new_date_time: &str) -> Result<Option<Task>> {
        let (new_text, new_date_time) = (new_text.trim(), new_date_time.trim());
        if new_text.is_empty() || new_date_time.is_empty() {
            debug!(id, "edit: rejected empty input");
            return Ok(None);
        }

        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "edit: no such task");
            return Ok(None);
        };

        task.text = new_text.to_string();
        task.date_time = new_date_time.to_string();
        let task = task.clone();
        self.save()?;

        info!(id, "Edited task");
        Ok(Some(task))
    }

    /// Remove the task with `id`; returns whether anything was removed
    pub fn delete(&mut self, id: i64) -> Result<bool> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            debug!(id, "delete: no such task");
            return Ok(false);
        }

        self.save()?;
        info!(id, "Deleted task");
        Ok(true)
    }

    /// Remove every completed task; returns the number removed
    pub fn clear_completed(&mut self) -> Result<usize> {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        let removed = before - self.tasks.len();

        if removed > 0 {
            self.save()?;
            info!(removed, "Cleared completed tasks");
        }
        Ok(removed)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// All tasks in display order, without reordering the stored collection
    ///
    /// Incomplete before completed, then ascending due time; ties keep
    /// insertion order.
    pub fn list(&self) -> Vec<Task> {
        let mut tasks = self.tasks.clone();
        // sort_by is stable
        tasks.sort_by(display_order);
        tasks
    }

    /// Tasks in stored (insertion) order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_overdue<Tz: TimeZone>(&self, task: &Task, now: &DateTime<Tz>) -> bool {
        due::is_overdue(task, now)
    }

    pub fn format_remaining<Tz: TimeZone>(&self, date_time: &str, now: &DateTime<Tz>) -> String {
        due::format_remaining(date_time, now)
    }

    /// Clock value as id, bumped past the largest existing id when needed
    ///
    /// If the largest id is `i64::MAX` (corrupt stored data), the first unused
    /// id at or after the clock value is taken instead.
    fn next_id(&self, clock_ms: i64) -> Result<i64> {
        let Some(max) = self.tasks.iter().map(|t| t.id).max() else {
            return Ok(clock_ms);
        };
        if clock_ms > max {
            return Ok(clock_ms);
        }
        if let Some(next) = max.checked_add(1) {
            return Ok(next);
        }

        warn!(max, "Largest task id cannot be incremented, searching for a free id");
        (clock_ms..i64::MAX)
            .find(|id| self.get(*id).is_none())
            .ok_or_else(|| eyre!("No free task id"))
    }
}
