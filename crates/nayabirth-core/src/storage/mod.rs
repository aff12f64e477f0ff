mod config;
pub mod database;
pub mod memory;

pub use config::{Config, ContractionsConfig, KicksConfig, WatchConfig};
pub use database::Database;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

use crate::error::{Result, StorageError};

/// Persisted contraction history (JSON array, most recent first).
pub const CONTRACTIONS_KEY: &str = "nayabirth-contractions";
/// Persisted kick counter sessions (JSON array, most recent first).
pub const KICK_SESSIONS_KEY: &str = "nayabirth-kick-sessions";
/// Persisted due date for the pregnancy timeline.
pub const TIMELINE_KEY: &str = "nayabirth-timeline";
/// Birth plan wizard draft (`{pin, responses, ...}`).
pub const BIRTH_PLAN_DRAFT_KEY: &str = "nayabirth_draft";
/// Hospital bag checklist state.
pub const CHECKLIST_KEY: &str = "nayabirth_hospital_checklist";

/// Minimal key-value interface the tracking engines persist through.
///
/// Values are opaque strings; the engines store JSON documents in them.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Read and decode a JSON value.
///
/// Missing keys, read failures and documents that don't match `T` all come
/// back as `None`; the latter two are logged.
pub fn read_json<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("failed to read '{key}', treating as absent: {e}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("discarding unreadable value under '{key}': {e}");
            None
        }
    }
}

/// Encode and write a JSON value. Returns `false` if the write failed.
pub fn write_json<T, S>(store: &mut S, key: &str, value: &T) -> bool
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            log::warn!("failed to encode value for '{key}': {e}");
            return false;
        }
    };
    match store.set(key, &json) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("failed to persist '{key}', keeping in-memory state only: {e}");
            false
        }
    }
}

/// Remove a key. Returns `false` if the removal failed.
pub fn remove_key<S: KeyValueStore + ?Sized>(store: &mut S, key: &str) -> bool {
    match store.remove(key) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("failed to remove '{key}': {e}");
            false
        }
    }
}

/// Returns the data directory, creating it if needed.
///
/// `NAYABIRTH_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/nayabirth[-dev]/`, with `NAYABIRTH_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("NAYABIRTH_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("NAYABIRTH_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("nayabirth-dev")
            } else {
                base_dir.join("nayabirth")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Load the configuration and open the database, both from the data
/// directory.
///
/// # Errors
/// Returns an error if the config file is invalid or the database cannot
/// be opened.
pub fn open_default() -> Result<(Config, Database)> {
    let config = Config::load()?;
    let db = Database::open()?;
    Ok((config, db))
}
