// Key-value string slots: the persistence medium for the task collection

use eyre::{Context, Result, eyre};
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::task::now_ms;

/// Synchronous key-value store holding whole string values
///
/// Every `set` replaces the previous value atomically; there are no partial
/// writes and no history.
pub trait Slot {
    /// Read the value stored under `key`, `None` if absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<S: Slot + ?Sized> Slot for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Validate a slot key
///
/// Keys become file names in `FileSlot`, so they are restricted to
/// alphanumerics plus `_` and `-`.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(eyre!("Slot key cannot be empty"));
    }
    if key.len() > 64 {
        return Err(eyre!("Slot key too long: {} (max 64 chars)", key));
    }
    if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(eyre!("Invalid slot key: {} (must be alphanumeric with _/-)", key));
    }
    Ok(())
}

// ============================================================================
// File backend
// ============================================================================

/// Directory of `<key>.json` files
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    /// Open or create a slot directory
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).context("Failed to create slot directory")?;
        debug!(dir = ?dir, "Opened file slot");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(".lock")
    }

    /// Lock file shared by every key in the directory, created if missing
    fn lock_file(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())
            .context("Failed to open slot lock file")
    }

    /// Lock file opened for a shared lock
    ///
    /// An existing lock file is opened read-only. When there is none and it
    /// cannot be created (read-only directory), no writer has ever used this
    /// directory and reading proceeds unlocked.
    fn read_lock_file(&self) -> Result<Option<File>> {
        let path = self.lock_path();
        if path.exists() {
            let file = File::open(&path).context("Failed to open slot lock file")?;
            return Ok(Some(file));
        }

        match self.lock_file() {
            Ok(file) => Ok(Some(file)),
            Err(e) => {
                debug!(dir = ?self.dir, error = ?e, "Cannot create lock file, reading unlocked");
                Ok(None)
            }
        }
    }
}

impl Slot for FileSlot {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.path_for(key);

        // Lock is released when `lock` is dropped
        let lock = self.read_lock_file()?;
        if let Some(lock) = &lock {
            lock.lock_shared().context("Failed to acquire shared slot lock")?;
        }

        if !path.exists() {
            return Ok(None);
        }

        let value = fs::read_to_string(&path).context("Failed to read slot file")?;
        Ok(Some(value))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!(".{}.json.tmp", key));

        let lock = self.lock_file()?;
        lock.lock_exclusive().context("Failed to acquire slot lock")?;

        {
            let mut tmp = File::create(&tmp_path).context("Failed to create temporary slot file")?;
            tmp.write_all(value.as_bytes())?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &path).context("Failed to replace slot file")?;

        debug!(key, bytes = value.len(), "Wrote file slot");
        Ok(())
    }
}

// ============================================================================
// SQLite backend
// ============================================================================

/// Single `slots` table in a SQLite database
pub struct SqliteSlot {
    db: Connection,
}

impl SqliteSlot {
    /// Open or create the database file, creating parent directories as needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let db = Connection::open(path).context("Failed to open SQLite database")?;
        let slot = Self { db };
        slot.create_schema()?;

        debug!(path = ?path, "Opened sqlite slot");
        Ok(slot)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let slot = Self { db };
        slot.create_schema()?;
        Ok(slot)
    }

    fn create_schema(&self) -> Result<()> {
        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

impl Slot for SqliteSlot {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let value = self
            .db
            .query_row("SELECT value FROM slots WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.db.execute(
            "INSERT OR REPLACE INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, now_ms()],
        )?;
        debug!(key, bytes = value.len(), "Wrote sqlite slot");
        Ok(())
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Process-local map, nothing touches disk
#[derive(Debug, Default, Clone)]
pub struct MemorySlot {
    values: HashMap<String, String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Slot for MemorySlot {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
