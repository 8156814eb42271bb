mod config;
pub mod database;
pub mod keys;
mod memory;

pub use config::{
    BlockingConfig, Config, GatekeeperConfig, LoggingConfig, PlaybackConfig, TimerConfig,
};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

/// Host key-value storage. Every value is a whole JSON blob under a string key.
pub trait Store {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: Store + ?Sized> Store for Rc<S> {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_raw(key)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_raw(key, value)
    }
}

impl<S: Store + ?Sized> Store for &S {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_raw(key)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_raw(key, value)
    }
}

/// Read and decode the blob under `key`. `Ok(None)` when the key was never written.
pub fn read<T: DeserializeOwned>(store: &impl Store, key: &str) -> Result<Option<T>, StorageError> {
    match store.get_raw(key)? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Encode `value` and overwrite the blob under `key`.
pub fn write<T: Serialize + ?Sized>(store: &impl Store, key: &str, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string(value).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.set_raw(key, &json)
}

/// Soft read: any failure is logged and the caller gets `None`.
pub fn load<T: DeserializeOwned>(store: &impl Store, key: &str) -> Option<T> {
    match read(store, key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "storage read failed, using default");
            None
        }
    }
}

/// Soft write: any failure is logged and otherwise ignored.
pub fn persist<T: Serialize + ?Sized>(store: &impl Store, key: &str, value: &T) {
    if let Err(e) = write(store, key, value) {
        tracing::warn!(key, error = %e, "storage write failed");
    }
}

/// Returns the focusbee data directory.
///
/// `FOCUSBEE_DATA_DIR` wins when set. Otherwise `~/.config/focusbee[-dev]/`,
/// where `FOCUSBEE_ENV=dev` selects the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("FOCUSBEE_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSBEE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusbee-dev")
            } else {
                base_dir.join("focusbee")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
