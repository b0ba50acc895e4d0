//! Application state object.
//!
//! `EyeSaver` bundles the settings, the break log, the timer engine, the
//! nudge tracker and the reminder dispatcher. It is created once by
//! [`EyeSaver::init`] and passed by reference to whatever drives it; there is
//! no ambient global state. Every mutation of settings or the log is written
//! through to storage straight away, and a failed write is logged and
//! otherwise ignored so reminders keep working without persistence.
//!
//! Other processes may write the same records (a second terminal running
//! `config set` or `log clear`). [`EyeSaver::reload`] picks those changes up,
//! and the log is re-read before every append so an external clear is never
//! undone by a stale in-memory copy.

use chrono::{DateTime, TimeZone, Utc};

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::export::export_csv;
use crate::format::format_mm_ss;
use crate::nudge::{NudgeKind, NudgeTracker};
use crate::reminder::{Dispatcher, RemindOptions};
use crate::stats::{weekly_buckets, DayBucket};
use crate::storage::{
    BreakKind, EventLog, KvStore, LogEntry, SettingKey, Settings, LOG_KEY, SETTINGS_KEY,
};
use crate::timer::{Phase, Tick, TickScheduler, TimerEngine, Tone};

pub struct EyeSaver {
    settings: Settings,
    log: EventLog,
    engine: TimerEngine,
    nudges: NudgeTracker,
    dispatcher: Dispatcher,
    store: Box<dyn KvStore>,
    /// Raw records as last read or written, to detect outside edits.
    settings_raw: Option<String>,
    log_raw: Option<String>,
    /// Most recent swallowed persistence failure.
    persist_error: Option<CoreError>,
}

impl EyeSaver {
    /// Load settings and log from `store` and build an idle timer.
    pub fn init(
        store: Box<dyn KvStore>,
        dispatcher: Dispatcher,
        ticker: Box<dyn TickScheduler>,
        now: DateTime<Utc>,
    ) -> Self {
        let settings = Settings::load(store.as_ref());
        let log = EventLog::load(store.as_ref());
        let engine = TimerEngine::new(&settings, ticker);
        let settings_raw = store.get(SETTINGS_KEY).ok().flatten();
        let log_raw = store.get(LOG_KEY).ok().flatten();
        tracing::debug!(entries = log.len(), "eyesaver initialised");
        Self {
            settings,
            log,
            engine,
            nudges: NudgeTracker::new(now.timestamp_millis()),
            dispatcher,
            store,
            settings_raw,
            log_raw,
            persist_error: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn nudges(&self) -> &NudgeTracker {
        &self.nudges
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.engine.remaining_secs()
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format_mm_ss(self.engine.remaining_secs())
    }

    pub fn progress_pct(&self) -> f64 {
        self.engine.progress_pct(&self.settings)
    }

    pub fn overlay_shown(&self) -> bool {
        self.engine.overlay_shown()
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        self.engine.snapshot(&self.settings, now)
    }

    pub fn export_log(&self) -> String {
        export_csv(self.log.entries())
    }

    pub fn weekly_summary<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<DayBucket> {
        weekly_buckets(self.log.entries(), now)
    }

    /// Hand out the last persistence failure, if any. Mutations never fail
    /// on storage errors; callers that must report them (one-shot CLI
    /// commands) check here afterwards.
    pub fn take_persist_error(&mut self) -> Option<CoreError> {
        self.persist_error.take()
    }

    // ── Timer commands ───────────────────────────────────────────────

    pub fn start(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let event = self.engine.start(&self.settings, now);
        self.after_command(event)
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let event = self.engine.pause(now);
        self.after_command(event)
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let event = self.engine.resume(now);
        self.after_command(event)
    }

    pub fn toggle_start_pause(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let event = self.engine.toggle_start_pause(&self.settings, now);
        self.after_command(event)
    }

    pub fn skip(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let events = self.engine.skip(&self.settings, now);
        self.apply(events)
    }

    pub fn reset(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let event = self.engine.reset(&self.settings, now);
        self.after_command(event)
    }

    pub fn dismiss_overlay(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        self.engine.dismiss_overlay(now).into_iter().collect()
    }

    /// Advance the countdown one second (only does anything while running).
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let events = self.engine.tick(&self.settings, now);
        self.apply(events)
    }

    /// Advance the countdown for a tick delivered by the scheduler.
    pub fn on_tick(&mut self, tick: Tick, now: DateTime<Utc>) -> Vec<Event> {
        let events = self.engine.on_tick(tick, &self.settings, now);
        self.apply(events)
    }

    /// Fire any wellness nudges that are due. Independent of the phase.
    pub fn poll_nudges(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let events = self
            .nudges
            .poll(now.timestamp_millis(), &self.settings)
            .into_iter()
            .map(|kind| Event::NudgeFired { kind, at: now })
            .collect();
        self.apply(events)
    }

    // ── Settings & log ───────────────────────────────────────────────

    /// Generic settings mutator; persists immediately.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown key or an unparseable
    /// boolean/theme value. Numbers are clamped, never rejected.
    pub fn update_setting(&mut self, key: &str, value: &str, now: DateTime<Utc>) -> Result<()> {
        let key: SettingKey = key.parse()?;
        let previous = self.settings.clone();
        self.settings.apply(key, value)?;
        tracing::debug!(%key, value = %self.settings.get(key), "setting updated");
        self.persist_settings();
        self.on_settings_changed(&previous, now);
        Ok(())
    }

    /// Replace every setting with its default; persists immediately.
    pub fn reset_settings(&mut self, now: DateTime<Utc>) {
        let previous = std::mem::take(&mut self.settings);
        self.persist_settings();
        self.on_settings_changed(&previous, now);
    }

    /// Empty the break log and persist. The timer is untouched.
    pub fn clear_history(&mut self) {
        self.log.clear();
        self.persist_log();
    }

    /// Re-read records another process changed since they were last read
    /// or written here. Returns whether anything was replaced.
    pub fn reload(&mut self, now: DateTime<Utc>) -> bool {
        let settings = self.reload_settings(now);
        let log = self.reload_log();
        settings || log
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn after_command(&mut self, event: Option<Event>) -> Vec<Event> {
        if matches!(event, Some(Event::TimerStarted { .. })) && self.settings.notifications_enabled {
            self.dispatcher.ensure_notification_permission();
        }
        event.into_iter().collect()
    }

    /// Carry out the side effects an engine event asks for.
    fn apply(&mut self, events: Vec<Event>) -> Vec<Event> {
        for event in &events {
            match event {
                Event::BreakStarted { kind, at, .. } => {
                    self.reload_log();
                    self.log.append(LogEntry::new(at.timestamp_millis(), *kind));
                    self.persist_log();
                    let body = match kind {
                        BreakKind::LongBreak => format!(
                            "Take {} minutes away from screens",
                            self.settings.long_break_minutes
                        ),
                        BreakKind::Break => format!(
                            "Look 20 feet away for {} seconds",
                            self.settings.break_seconds
                        ),
                    };
                    self.dispatcher
                        .remind(&self.settings, "Break time", &body, RemindOptions::default());
                }
                Event::FocusStarted { .. } => {
                    let body = format!("Next focus: {} minutes", self.settings.focus_minutes);
                    self.dispatcher
                        .remind(&self.settings, "Focus time", &body, RemindOptions::silent());
                }
                Event::CueTone { tone } => {
                    self.dispatcher.play_tone(&self.settings, *tone);
                }
                Event::NudgeFired { kind, .. } => {
                    let opts = RemindOptions {
                        sound: true,
                        tone: Tone::NUDGE,
                    };
                    self.dispatcher
                        .remind(&self.settings, kind.title(), kind.body(), opts);
                }
                _ => {}
            }
        }
        events
    }

    /// Follow-ups for a settings change: restart the clock of any nudge
    /// whose interval moved, and ask for notification permission when
    /// notifications were just switched on.
    fn on_settings_changed(&mut self, previous: &Settings, now: DateTime<Utc>) {
        for kind in NudgeKind::ALL {
            if kind.interval_minutes(previous) != kind.interval_minutes(&self.settings) {
                self.nudges.reset(kind, now.timestamp_millis());
            }
        }
        if self.settings.notifications_enabled && !previous.notifications_enabled {
            self.dispatcher.ensure_notification_permission();
        }
    }

    fn reload_settings(&mut self, now: DateTime<Utc>) -> bool {
        let raw = match self.store.get(SETTINGS_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("settings not reloaded: {e}");
                return false;
            }
        };
        if raw == self.settings_raw {
            return false;
        }
        let previous = std::mem::replace(&mut self.settings, Settings::load(self.store.as_ref()));
        self.settings_raw = raw;
        self.on_settings_changed(&previous, now);
        tracing::debug!("settings changed in storage, reloaded");
        true
    }

    fn reload_log(&mut self) -> bool {
        let raw = match self.store.get(LOG_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("break log not reloaded: {e}");
                return false;
            }
        };
        if raw == self.log_raw {
            return false;
        }
        self.log = EventLog::load(self.store.as_ref());
        self.log_raw = raw;
        tracing::debug!(entries = self.log.len(), "break log changed in storage, reloaded");
        true
    }

    fn persist_settings(&mut self) {
        match self.settings.save(self.store.as_mut()) {
            Ok(()) => self.settings_raw = self.store.get(SETTINGS_KEY).ok().flatten(),
            Err(e) => {
                tracing::warn!("failed to save settings: {e}");
                self.persist_error = Some(e);
            }
        }
    }

    fn persist_log(&mut self) {
        match self.log.save(self.store.as_mut()) {
            Ok(()) => self.log_raw = self.store.get(LOG_KEY).ok().flatten(),
            Err(e) => {
                tracing::warn!("failed to save break log: {e}");
                self.persist_error = Some(e);
            }
        }
    }
}
