//! Durable local storage: a key-value backend plus the two records the timer
//! persists (settings and the break log).

mod kv;
pub mod log;
pub mod settings;

pub use kv::{FileKvStore, KvStore, MemoryKvStore};
pub use log::{BreakKind, EventLog, LogEntry};
pub use settings::{SettingKey, Settings, Theme};

use std::path::PathBuf;

use crate::error::StorageError;

/// Storage key of the settings record.
pub const SETTINGS_KEY: &str = "eyesaver.settings.v1";
/// Storage key of the break log.
pub const LOG_KEY: &str = "eyesaver.log.v1";

/// Returns the local data directory.
///
/// `EYESAVER_HOME` wins when set. Otherwise `~/.config/eyesaver[-dev]/`,
/// with the `-dev` suffix selected by `EYESAVER_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("EYESAVER_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("EYESAVER_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("eyesaver-dev")
            } else {
                base_dir.join("eyesaver")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
