use chrono::Utc;
use clap::Subcommand;
use eyesaver_core::SettingKey;

use super::{ensure_persisted, open_app};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a setting value
    Get {
        /// Setting key (e.g. "focusMinutes", "soundEnabled")
        key: String,
    },
    /// Set a setting value (numbers are clamped into range)
    Set {
        /// Setting key
        key: String,
        /// New value
        value: String,
    },
    /// List all settings as JSON
    List,
    /// Reset settings to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app()?;

    match action {
        ConfigAction::Get { key } => {
            let key: SettingKey = key.parse()?;
            println!("{}", app.settings().get(key));
        }
        ConfigAction::Set { key, value } => {
            let key: SettingKey = key.parse()?;
            app.update_setting(key.name(), &value, Utc::now())?;
            ensure_persisted(&mut app)?;
            println!("{key} = {}", app.settings().get(key));
        }
        ConfigAction::List => {
            println!("{}", serde_json::to_string_pretty(app.settings())?);
        }
        ConfigAction::Reset => {
            app.reset_settings(Utc::now());
            ensure_persisted(&mut app)?;
            println!("settings reset to defaults");
        }
    }
    Ok(())
}
