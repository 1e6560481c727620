// Configuration loading: defaults, config.yaml, environment, CLI flags
//
// Later sources win. `config.yaml` is the explicit `--config` path or
// `dirs::config_dir()/tasklist/config.yaml`; command-line flags are applied by
// the binary after `Config::load`.

use crate::slot::{FileSlot, Slot, SqliteSlot, validate_key};
use crate::store::DEFAULT_KEY;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "TASKLIST_DATA_DIR";

/// File name of the SQLite database inside the data directory
pub const SQLITE_FILE: &str = "tasklist.db";

/// Storage backend for the task slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One JSON file per slot key
    #[default]
    File,
    /// Key/value table in a SQLite database
    Sqlite,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(Backend::File),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(format!("unknown backend '{}' (expected file or sqlite)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where slot files or the database live
    pub data_dir: PathBuf,
    pub backend: Backend,
    /// Slot key holding the task collection
    pub key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: Backend::default(),
            key: DEFAULT_KEY.to_string(),
        }
    }
}

/// `dirs::data_dir()/tasklist`, or `.tasklist` when the platform has no data dir
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("tasklist"))
        .unwrap_or_else(|| PathBuf::from(".tasklist"))
}

/// `dirs::config_dir()/tasklist/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tasklist").join("config.yaml"))
}

impl Config {
    /// Load configuration
    ///
    /// An explicit `path` must exist. Without one, the default config path is
    /// used if present, otherwise defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("No config file, using defaults");
                    Self::default()
                }
            },
        };

        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        debug!(path = ?path, "Loaded config file");
        Self::from_yaml(&contents).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file deserializes to unit, not a mapping
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(yaml).context("Failed to parse config YAML")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_key(&self.key)?;
        if self.data_dir.as_os_str().is_empty() {
            return Err(eyre!("data_dir cannot be empty"));
        }
        Ok(())
    }

    /// Open the configured backend
    pub fn open_slot(&self) -> Result<Box<dyn Slot>> {
        let slot: Box<dyn Slot> = match self.backend {
            Backend::File => Box::new(FileSlot::open(&self.data_dir)?),
            Backend::Sqlite => Box::new(SqliteSlot::open(self.data_dir.join(SQLITE_FILE))?),
        };
        Ok(slot)
    }
}
