// tasklist - Local task list with due dates, persisted to a key-value slot

pub mod config;
pub mod due;
pub mod filter;
pub mod render;
pub mod slot;
pub mod store;
pub mod task;

// Re-export main types for convenience
pub use config::{Backend, Config};
pub use due::{format_remaining, is_overdue, local_now};
pub use filter::View;
pub use slot::{FileSlot, MemorySlot, Slot, SqliteSlot};
pub use store::{DEFAULT_KEY, TaskStore};
pub use task::{Task, now_ms};
