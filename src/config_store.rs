use crate::params::{ConfigRecord, ParamFields};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the record written on every processing run.
pub const LAST_USED: &str = "last_config";

const APP_DIR: &str = "white-border";
const EXTENSION: &str = "json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration name: {0:?}")]
    InvalidName(String),
}

/// Named parameter sets stored as one JSON file each.
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform config directory, or the working directory if
    /// there is none.
    pub fn open_default() -> Self {
        let dir = dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("."));

        if let Err(e) = fs::create_dir_all(&dir) {
            log::error!("Failed to create config directory {}: {}", dir.display(), e);
        }

        let store = Self::new(dir);
        if let Ok(cwd) = std::env::current_dir() {
            store.migrate_from(&cwd);
        }
        store
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Older installs kept every record in the working directory. Copy the
    /// ones this store does not have yet; files that are not parameter
    /// records are left alone.
    fn migrate_from(&self, legacy_dir: &Path) -> usize {
        if fs::canonicalize(legacy_dir).ok() == fs::canonicalize(&self.dir).ok() {
            return 0;
        }

        let entries = match fs::read_dir(legacy_dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("No legacy configs in {}: {}", legacy_dir.display(), e);
                return 0;
            }
        };

        let mut migrated = 0;
        for legacy in entries.flatten().map(|entry| entry.path()) {
            if !legacy.is_file()
                || legacy.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION)
            {
                continue;
            }
            let Some(name) = legacy.file_name() else {
                continue;
            };
            let target = self.dir.join(name);
            if target.exists() {
                continue;
            }

            let is_record = fs::read_to_string(&legacy)
                .ok()
                .and_then(|content| serde_json::from_str::<ConfigRecord>(&content).ok())
                .is_some_and(|record| record != ConfigRecord::default());
            if !is_record {
                log::debug!("Not a config record, leaving {:?}", legacy);
                continue;
            }

            match fs::copy(&legacy, &target) {
                Ok(_) => {
                    log::info!("Migrated config from {:?} to {:?}", legacy, target);
                    migrated += 1;
                }
                Err(e) => log::warn!("Failed to migrate config from {:?}: {}", legacy, e),
            }
        }
        migrated
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{EXTENSION}"))
    }

    /// Write `fields` under `name`, or under the last-used name when `name` is
    /// `None`. Returns the written path.
    pub fn save(&self, fields: &ParamFields, name: Option<&str>) -> Result<PathBuf, ConfigError> {
        let name = match name {
            Some(name) => checked_name(name)?,
            None => LAST_USED,
        };

        let path = self.path_for(name);
        let json = serde_json::to_string_pretty(&fields.to_record())?;
        fs::write(&path, json)?;

        log::info!("Saved config {:?} to {:?}", name, path);
        Ok(path)
    }

    /// Read the record saved under `name` (last-used when `None`). A record
    /// that does not exist is `Ok(None)`.
    pub fn load(&self, name: Option<&str>) -> Result<Option<ConfigRecord>, ConfigError> {
        let name = match name {
            Some(name) => checked_name(name)?,
            None => LAST_USED,
        };

        let path = self.path_for(name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("Config file does not exist at: {:?}", path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let record: ConfigRecord = serde_json::from_str(&content)?;
        log::debug!("Loaded config {:?}: {:?}", name, record);
        Ok(Some(record))
    }

    /// Names of all saved records except the last-used one, sorted.
    pub fn list_available(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Failed to list configs in {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some(EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .filter(|name| name != LAST_USED)
            .collect();

        names.sort();
        names
    }
}

fn checked_name(name: &str) -> Result<&str, ConfigError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\'])
    {
        return Err(ConfigError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}
