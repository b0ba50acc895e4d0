//! User settings record.
//!
//! Persisted as a flat JSON object under [`super::SETTINGS_KEY`]. Loading is
//! a field-by-field merge of whatever is stored over the defaults, so a
//! missing, partial or corrupt record always resolves to a complete,
//! in-range `Settings`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::kv::KvStore;
use super::SETTINGS_KEY;
use crate::error::{ConfigError, Result};
use crate::format::clamp_int;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(()),
        }
    }
}

/// User-configurable durations and toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub focus_minutes: u32,
    pub break_seconds: u32,
    pub long_break_minutes: u32,
    pub cycles_until_long: u32,
    pub auto_start_next: bool,
    pub notifications_enabled: bool,
    pub sound_enabled: bool,
    pub voice_enabled: bool,
    pub dim_during_break: bool,
    /// 0 disables the hydration nudge.
    pub hydration_interval_minutes: u32,
    /// 0 disables the posture nudge.
    pub posture_interval_minutes: u32,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_minutes: 20,
            break_seconds: 20,
            long_break_minutes: 5,
            cycles_until_long: 4,
            auto_start_next: true,
            notifications_enabled: true,
            sound_enabled: true,
            voice_enabled: false,
            dim_during_break: true,
            hydration_interval_minutes: 60,
            posture_interval_minutes: 30,
            theme: Theme::System,
        }
    }
}

/// Addressable settings fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    FocusMinutes,
    BreakSeconds,
    LongBreakMinutes,
    CyclesUntilLong,
    AutoStartNext,
    NotificationsEnabled,
    SoundEnabled,
    VoiceEnabled,
    DimDuringBreak,
    HydrationIntervalMinutes,
    PostureIntervalMinutes,
    Theme,
}

impl SettingKey {
    pub const ALL: [SettingKey; 12] = [
        Self::FocusMinutes,
        Self::BreakSeconds,
        Self::LongBreakMinutes,
        Self::CyclesUntilLong,
        Self::AutoStartNext,
        Self::NotificationsEnabled,
        Self::SoundEnabled,
        Self::VoiceEnabled,
        Self::DimDuringBreak,
        Self::HydrationIntervalMinutes,
        Self::PostureIntervalMinutes,
        Self::Theme,
    ];

    /// Persisted (camelCase) name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FocusMinutes => "focusMinutes",
            Self::BreakSeconds => "breakSeconds",
            Self::LongBreakMinutes => "longBreakMinutes",
            Self::CyclesUntilLong => "cyclesUntilLong",
            Self::AutoStartNext => "autoStartNext",
            Self::NotificationsEnabled => "notificationsEnabled",
            Self::SoundEnabled => "soundEnabled",
            Self::VoiceEnabled => "voiceEnabled",
            Self::DimDuringBreak => "dimDuringBreak",
            Self::HydrationIntervalMinutes => "hydrationIntervalMinutes",
            Self::PostureIntervalMinutes => "postureIntervalMinutes",
            Self::Theme => "theme",
        }
    }

    /// Short key used by the first version of the record.
    fn legacy_name(&self) -> Option<&'static str> {
        match self {
            Self::FocusMinutes => Some("focusMin"),
            Self::BreakSeconds => Some("breakSec"),
            Self::LongBreakMinutes => Some("longBreakMin"),
            Self::NotificationsEnabled => Some("notifications"),
            Self::SoundEnabled => Some("sound"),
            Self::VoiceEnabled => Some("voice"),
            Self::HydrationIntervalMinutes => Some("hydrationNudgeMin"),
            Self::PostureIntervalMinutes => Some("postureNudgeMin"),
            _ => None,
        }
    }

    /// Inclusive bounds for numeric settings.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        match self {
            Self::FocusMinutes => Some((1, 120)),
            Self::BreakSeconds => Some((5, 180)),
            Self::LongBreakMinutes => Some((1, 60)),
            Self::CyclesUntilLong => Some((1, 12)),
            Self::HydrationIntervalMinutes | Self::PostureIntervalMinutes => Some((0, 1440)),
            _ => None,
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SettingKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s || k.legacy_name() == Some(s))
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl Settings {
    /// Overlay a stored (possibly partial or damaged) record on the defaults.
    ///
    /// Numbers are clamped into range, wrong-typed values keep the default,
    /// unknown keys are ignored and a non-object yields the defaults.
    pub fn merge_partial(value: &Value) -> Self {
        let mut settings = Self::default();
        let Some(obj) = value.as_object() else {
            return settings;
        };

        for key in SettingKey::ALL {
            let raw = obj
                .get(key.name())
                .or_else(|| key.legacy_name().and_then(|legacy| obj.get(legacy)));
            if let Some(raw) = raw {
                settings.overlay(key, raw);
            }
        }
        settings
    }

    fn overlay(&mut self, key: SettingKey, raw: &Value) {
        if let Some((lo, hi)) = key.bounds() {
            let n = match raw {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
                Value::String(s) if s.trim_start().starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+') => {
                    Some(clamp_int(s, lo, hi))
                }
                _ => None,
            };
            if let Some(n) = n {
                self.set_number(key, n.clamp(lo, hi));
            }
            return;
        }

        match key {
            SettingKey::Theme => {
                if let Some(theme) = raw.as_str().and_then(|s| s.parse().ok()) {
                    self.theme = theme;
                }
            }
            _ => {
                if let Some(b) = raw.as_bool() {
                    self.set_flag(key, b);
                }
            }
        }
    }

    /// Update one field from raw input.
    ///
    /// Numeric input is clamped and never rejected. Booleans and the theme
    /// must parse.
    pub fn apply(&mut self, key: SettingKey, raw: &str) -> Result<(), ConfigError> {
        if let Some((lo, hi)) = key.bounds() {
            self.set_number(key, clamp_int(raw, lo, hi));
            return Ok(());
        }

        match key {
            SettingKey::Theme => {
                self.theme = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.name().to_string(),
                    message: format!("expected system, light or dark, got '{raw}'"),
                })?;
            }
            _ => {
                let flag = parse_flag(raw).ok_or_else(|| ConfigError::InvalidValue {
                    key: key.name().to_string(),
                    message: format!("expected a boolean, got '{raw}'"),
                })?;
                self.set_flag(key, flag);
            }
        }
        Ok(())
    }

    /// String rendering of one field.
    pub fn get(&self, key: SettingKey) -> String {
        match key {
            SettingKey::FocusMinutes => self.focus_minutes.to_string(),
            SettingKey::BreakSeconds => self.break_seconds.to_string(),
            SettingKey::LongBreakMinutes => self.long_break_minutes.to_string(),
            SettingKey::CyclesUntilLong => self.cycles_until_long.to_string(),
            SettingKey::AutoStartNext => self.auto_start_next.to_string(),
            SettingKey::NotificationsEnabled => self.notifications_enabled.to_string(),
            SettingKey::SoundEnabled => self.sound_enabled.to_string(),
            SettingKey::VoiceEnabled => self.voice_enabled.to_string(),
            SettingKey::DimDuringBreak => self.dim_during_break.to_string(),
            SettingKey::HydrationIntervalMinutes => self.hydration_interval_minutes.to_string(),
            SettingKey::PostureIntervalMinutes => self.posture_interval_minutes.to_string(),
            SettingKey::Theme => self.theme.as_str().to_string(),
        }
    }

    fn set_number(&mut self, key: SettingKey, n: i64) {
        let n = u32::try_from(n.max(0)).unwrap_or(u32::MAX);
        match key {
            SettingKey::FocusMinutes => self.focus_minutes = n,
            SettingKey::BreakSeconds => self.break_seconds = n,
            SettingKey::LongBreakMinutes => self.long_break_minutes = n,
            SettingKey::CyclesUntilLong => self.cycles_until_long = n,
            SettingKey::HydrationIntervalMinutes => self.hydration_interval_minutes = n,
            SettingKey::PostureIntervalMinutes => self.posture_interval_minutes = n,
            _ => {}
        }
    }

    fn set_flag(&mut self, key: SettingKey, flag: bool) {
        match key {
            SettingKey::AutoStartNext => self.auto_start_next = flag,
            SettingKey::NotificationsEnabled => self.notifications_enabled = flag,
            SettingKey::SoundEnabled => self.sound_enabled = flag,
            SettingKey::VoiceEnabled => self.voice_enabled = flag,
            SettingKey::DimDuringBreak => self.dim_during_break = flag,
            _ => {}
        }
    }

    pub fn focus_secs(&self) -> u64 {
        u64::from(self.focus_minutes) * 60
    }

    pub fn break_secs(&self) -> u64 {
        u64::from(self.break_seconds)
    }

    pub fn long_break_secs(&self) -> u64 {
        u64::from(self.long_break_minutes) * 60
    }

    /// Load from storage, falling back to defaults on any failure.
    pub fn load(store: &dyn KvStore) -> Self {
        let raw = match store.get(SETTINGS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(e) => {
                tracing::warn!("settings unreadable, using defaults: {e}");
                return Self::default();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Self::merge_partial(&value),
            Err(e) => {
                tracing::warn!("settings record corrupt, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Persist the whole record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub fn save(&self, store: &mut dyn KvStore) -> Result<()> {
        let json = serde_json::to_string(self)?;
        store.set(SETTINGS_KEY, &json)?;
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKvStore;
    use serde_json::json;

    #[test]
    fn corrupt_record_loads_defaults() {
        let store = MemoryKvStore::new().with_entry(SETTINGS_KEY, "{not json");
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn missing_record_loads_defaults() {
        assert_eq!(Settings::load(&MemoryKvStore::new()), Settings::default());
    }

    #[test]
    fn partial_record_merges_over_defaults() {
        let s = Settings::merge_partial(&json!({ "focusMinutes": 25, "voiceEnabled": true }));
        assert_eq!(s.focus_minutes, 25);
        assert!(s.voice_enabled);
        assert_eq!(s.break_seconds, 20);
        assert_eq!(s.cycles_until_long, 4);
    }

    #[test]
    fn out_of_range_and_wrong_types_are_repaired() {
        let s = Settings::merge_partial(&json!({
            "focusMinutes": 0,
            "breakSeconds": 9000,
            "cyclesUntilLong": "3",
            "longBreakMinutes": 7.8,
            "soundEnabled": "loud",
            "theme": "neon",
            "somethingElse": 1,
        }));
        assert_eq!(s.focus_minutes, 1);
        assert_eq!(s.break_seconds, 180);
        assert_eq!(s.cycles_until_long, 3);
        assert_eq!(s.long_break_minutes, 7);
        assert!(s.sound_enabled);
        assert_eq!(s.theme, Theme::System);
    }

    #[test]
    fn legacy_keys_are_accepted() {
        let s = Settings::merge_partial(&json!({
            "focusMin": 30,
            "breakSec": 40,
            "sound": false,
            "hydrationNudgeMin": 0,
        }));
        assert_eq!(s.focus_minutes, 30);
        assert_eq!(s.break_seconds, 40);
        assert!(!s.sound_enabled);
        assert_eq!(s.hydration_interval_minutes, 0);
    }

    #[test]
    fn non_object_record_is_defaults() {
        assert_eq!(Settings::merge_partial(&json!([1, 2, 3])), Settings::default());
        assert_eq!(Settings::merge_partial(&Value::Null), Settings::default());
    }

    #[test]
    fn apply_clamps_numbers_and_parses_flags() {
        let mut s = Settings::default();
        s.apply(SettingKey::FocusMinutes, "500").unwrap();
        assert_eq!(s.focus_minutes, 120);
        s.apply(SettingKey::BreakSeconds, "abc").unwrap();
        assert_eq!(s.break_seconds, 5);
        s.apply(SettingKey::AutoStartNext, "off").unwrap();
        assert!(!s.auto_start_next);
        s.apply(SettingKey::Theme, "Dark").unwrap();
        assert_eq!(s.theme, Theme::Dark);
    }

    #[test]
    fn apply_rejects_unparseable_flag_and_theme() {
        let mut s = Settings::default();
        assert!(matches!(
            s.apply(SettingKey::SoundEnabled, "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(s.apply(SettingKey::Theme, "sepia").is_err());
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn key_parsing() {
        assert_eq!("focusMinutes".parse::<SettingKey>(), Ok(SettingKey::FocusMinutes));
        assert_eq!("breakSec".parse::<SettingKey>(), Ok(SettingKey::BreakSeconds));
        assert_eq!(
            "nope".parse::<SettingKey>(),
            Err(ConfigError::UnknownKey("nope".into()))
        );
    }

    #[test]
    fn save_then_load_preserves_record() {
        let mut store = MemoryKvStore::new();
        let mut s = Settings::default();
        s.apply(SettingKey::PostureIntervalMinutes, "45").unwrap();
        s.save(&mut store).unwrap();
        assert!(store.raw(SETTINGS_KEY).unwrap().contains("\"postureIntervalMinutes\":45"));
        assert_eq!(Settings::load(&store), s);
    }
}
