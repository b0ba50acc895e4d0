//! Optional `runtime.toml` in the data directory.
//!
//! Holds host-specific options that are not user settings: which external
//! programs produce tones and speech, and the application name shown on
//! desktop notifications. A missing or unreadable file means defaults.

use serde::Deserialize;
use std::path::Path;

pub const RUNTIME_FILE: &str = "runtime.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Shown as the notification sender.
    pub app_name: String,
    /// sox-compatible `play` program. Empty means terminal bell only.
    pub tone_command: String,
    /// Speech programs tried in order until one starts.
    pub speech_commands: Vec<String>,
    /// Terminal bell when the tone program cannot be started.
    pub bell_fallback: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            app_name: "Eye Saver".to_string(),
            tone_command: "play".to_string(),
            speech_commands: vec!["spd-say".to_string(), "espeak".to_string(), "say".to_string()],
            bell_fallback: true,
        }
    }
}

impl RuntimeConfig {
    /// Load `runtime.toml` from `dir`, falling back to defaults.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(RUNTIME_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!("cannot read {}: {e}", path.display());
                return Self::default();
            }
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring invalid {}: {e}", path.display());
                Self::default()
            }
        }
    }
}
