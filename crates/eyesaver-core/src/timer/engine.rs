//! Timer engine implementation.
//!
//! A one-tick-per-second countdown state machine. It owns no thread; the
//! [`TickScheduler`] it is given is armed while a phase is running and
//! disarmed otherwise, and whoever receives the ticks calls [`TimerEngine::tick`].
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Focus -> (Break | LongBreak) -> Focus -> ...
//!                                      \-> Idle   (auto-start off)
//! Focus | Break | LongBreak -> Paused -> (same phase)
//! ```
//!
//! Durations are read from [`Settings`] at the moment a phase is entered, so
//! editing a duration never retargets the countdown already in progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ticker::{Tick, TickScheduler};
use super::tone::{break_tick_tone, pre_break_tone};
use crate::events::Event;
use crate::format::format_mm_ss;
use crate::storage::{BreakKind, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Focus,
    Break,
    LongBreak,
    Paused,
}

impl Phase {
    /// Whether the countdown advances in this phase.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Focus | Self::Break | Self::LongBreak)
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Self::Break | Self::LongBreak)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Focus => "focus",
            Self::Break => "break",
            Self::LongBreak => "longbreak",
            Self::Paused => "paused",
        }
    }
}

impl From<BreakKind> for Phase {
    fn from(kind: BreakKind) -> Self {
        match kind {
            BreakKind::Break => Self::Break,
            BreakKind::LongBreak => Self::LongBreak,
        }
    }
}

/// Core timer engine.
pub struct TimerEngine {
    phase: Phase,
    /// Running phase captured by `pause`, restored by `resume`.
    paused_from: Option<Phase>,
    remaining_secs: u64,
    completed_cycles: u32,
    overlay_visible: bool,
    ticker: Box<dyn TickScheduler>,
    tick_armed: bool,
}

impl TimerEngine {
    /// Create an idle engine showing a full focus countdown.
    pub fn new(settings: &Settings, ticker: Box<dyn TickScheduler>) -> Self {
        Self {
            phase: Phase::Idle,
            paused_from: None,
            remaining_secs: settings.focus_secs(),
            completed_cycles: 0,
            overlay_visible: false,
            ticker,
            tick_armed: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The phase a pause interrupted, if paused.
    pub fn paused_from(&self) -> Option<Phase> {
        self.paused_from
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn completed_cycles(&self) -> u32 {
        self.completed_cycles
    }

    pub fn is_tick_armed(&self) -> bool {
        self.tick_armed
    }

    /// Overlay flag as collaborators should render it: set during a break
    /// with dimming enabled, hidden as soon as the phase is no longer a break.
    pub fn overlay_shown(&self) -> bool {
        self.overlay_visible && self.phase.is_break()
    }

    /// Raw overlay flag, independent of the current phase.
    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    /// Configured length of the current phase. A paused engine reports the
    /// phase it interrupted; idle reports focus.
    pub fn phase_total_secs(&self, settings: &Settings) -> u64 {
        let phase = match self.phase {
            Phase::Paused => self.paused_from.unwrap_or(Phase::Focus),
            other => other,
        };
        match phase {
            Phase::Break => settings.break_secs(),
            Phase::LongBreak => settings.long_break_secs(),
            _ => settings.focus_secs(),
        }
    }

    /// 0.0 ..= 100.0 progress within the current phase.
    pub fn progress_pct(&self, settings: &Settings) -> f64 {
        let total = self.phase_total_secs(settings) as f64;
        if total <= 0.0 {
            return 0.0;
        }
        let elapsed = total - self.remaining_secs as f64;
        (elapsed / total).clamp(0.0, 1.0) * 100.0
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, settings: &Settings, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            display: format_mm_ss(self.remaining_secs),
            completed_cycles: self.completed_cycles,
            progress_pct: self.progress_pct(settings),
            overlay_visible: self.overlay_shown(),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, settings: &Settings, now: DateTime<Utc>) -> Option<Event> {
        if self.phase != Phase::Idle {
            return None;
        }
        self.phase = Phase::Focus;
        self.paused_from = None;
        self.remaining_secs = settings.focus_secs();
        self.sync_ticker();
        tracing::debug!(secs = self.remaining_secs, "focus started");
        Some(Event::TimerStarted {
            duration_secs: self.remaining_secs,
            at: now,
        })
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.phase.is_running() {
            return None;
        }
        let phase = self.phase;
        self.paused_from = Some(phase);
        self.phase = Phase::Paused;
        self.sync_ticker();
        Some(Event::TimerPaused {
            phase,
            remaining_secs: self.remaining_secs,
            at: now,
        })
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.phase != Phase::Paused {
            return None;
        }
        self.phase = self.paused_from.take().unwrap_or(Phase::Focus);
        self.sync_ticker();
        Some(Event::TimerResumed {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: now,
        })
    }

    pub fn toggle_start_pause(&mut self, settings: &Settings, now: DateTime<Utc>) -> Option<Event> {
        match self.phase {
            Phase::Idle => self.start(settings, now),
            Phase::Paused => self.resume(now),
            _ => self.pause(now),
        }
    }

    /// End the current countdown now.
    ///
    /// While running, the phase transition happens immediately with the same
    /// side effects as a natural expiry. While idle or paused only the
    /// countdown is zeroed.
    pub fn skip(&mut self, settings: &Settings, now: DateTime<Utc>) -> Vec<Event> {
        let phase = self.phase;
        self.remaining_secs = 0;
        let mut events = vec![Event::TimerSkipped { phase, at: now }];
        events.extend(self.settle(settings, now));
        events
    }

    pub fn reset(&mut self, settings: &Settings, now: DateTime<Utc>) -> Option<Event> {
        self.phase = Phase::Idle;
        self.paused_from = None;
        self.remaining_secs = settings.focus_secs();
        self.completed_cycles = 0;
        self.overlay_visible = false;
        self.sync_ticker();
        Some(Event::TimerReset { at: now })
    }

    /// Hide the break overlay; timing is unaffected.
    pub fn dismiss_overlay(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.overlay_visible {
            return None;
        }
        self.overlay_visible = false;
        Some(Event::OverlayDismissed { at: now })
    }

    /// Handle a tick delivered by the scheduler. Ticks from a previous arm
    /// generation are dropped.
    pub fn on_tick(&mut self, tick: Tick, settings: &Settings, now: DateTime<Utc>) -> Vec<Event> {
        if !self.ticker.is_current(&tick) {
            tracing::trace!(generation = tick.generation, "stale tick dropped");
            return Vec::new();
        }
        self.tick(settings, now)
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self, settings: &Settings, now: DateTime<Utc>) -> Vec<Event> {
        if !self.phase.is_running() {
            return Vec::new();
        }

        let before = self.remaining_secs;
        self.remaining_secs = before.saturating_sub(1);

        let mut events = Vec::new();
        if let Some(tone) = break_tick_tone(self.phase, settings.sound_enabled, before) {
            events.push(Event::CueTone { tone });
        }
        if let Some(tone) = pre_break_tone(self.phase, settings.sound_enabled, self.remaining_secs) {
            events.push(Event::CueTone { tone });
        }
        events.extend(self.settle(settings, now));
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Zero check: transition out of an expired running phase.
    fn settle(&mut self, settings: &Settings, now: DateTime<Utc>) -> Option<Event> {
        if self.remaining_secs > 0 {
            return None;
        }

        match self.phase {
            Phase::Focus => {
                let cycles_until_long = settings.cycles_until_long.max(1);
                let next_is_long = (self.completed_cycles + 1) % cycles_until_long == 0;
                let (kind, duration_secs) = if next_is_long {
                    (BreakKind::LongBreak, settings.long_break_secs())
                } else {
                    (BreakKind::Break, settings.break_secs())
                };

                self.phase = kind.into();
                self.remaining_secs = duration_secs;
                self.completed_cycles = self.completed_cycles.saturating_add(1);
                if settings.dim_during_break {
                    self.overlay_visible = true;
                }
                tracing::debug!(
                    kind = kind.as_str(),
                    cycle = self.completed_cycles,
                    "break started"
                );
                Some(Event::BreakStarted {
                    kind,
                    cycle: self.completed_cycles,
                    duration_secs,
                    at: now,
                })
            }
            Phase::Break | Phase::LongBreak => {
                self.overlay_visible = false;
                self.remaining_secs = settings.focus_secs();
                if settings.auto_start_next {
                    self.phase = Phase::Focus;
                    tracing::debug!("break over, focus restarted");
                    Some(Event::FocusStarted {
                        duration_secs: self.remaining_secs,
                        at: now,
                    })
                } else {
                    self.phase = Phase::Idle;
                    self.sync_ticker();
                    tracing::debug!("break over, waiting for user");
                    Some(Event::WentIdle { at: now })
                }
            }
            Phase::Idle | Phase::Paused => None,
        }
    }

    /// Arm or disarm the tick source when crossing running ⇄ not running.
    fn sync_ticker(&mut self) {
        let running = self.phase.is_running();
        if running && !self.tick_armed {
            self.ticker.arm();
            self.tick_armed = true;
        } else if !running && self.tick_armed {
            self.ticker.disarm();
            self.tick_armed = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualTicker;
    use crate::timer::Tone;

    fn engine(settings: &Settings) -> (TimerEngine, ManualTicker) {
        let ticker = ManualTicker::new();
        (TimerEngine::new(settings, Box::new(ticker.clone())), ticker)
    }

    fn run_out(engine: &mut TimerEngine, settings: &Settings) -> Vec<Event> {
        let mut out = Vec::new();
        let start = engine.phase();
        while engine.phase() == start {
            out.extend(engine.tick(settings, Utc::now()));
        }
        out
    }

    fn break_kinds(events: &[Event]) -> Vec<BreakKind> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::BreakStarted { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn start_pause_resume() {
        let s = Settings::default();
        let (mut engine, _) = engine(&s);
        assert_eq!(engine.phase(), Phase::Idle);

        assert!(engine.start(&s, Utc::now()).is_some());
        assert_eq!(engine.phase(), Phase::Focus);
        assert_eq!(engine.remaining_secs(), 1200);

        assert!(engine.pause(Utc::now()).is_some());
        assert_eq!(engine.phase(), Phase::Paused);

        assert!(engine.resume(Utc::now()).is_some());
        assert_eq!(engine.phase(), Phase::Focus);
    }

    #[test]
    fn invalid_commands_are_ignored() {
        let s = Settings::default();
        let (mut engine, _) = engine(&s);
        assert!(engine.pause(Utc::now()).is_none());
        assert!(engine.resume(Utc::now()).is_none());
        engine.start(&s, Utc::now());
        assert!(engine.start(&s, Utc::now()).is_none());
    }

    #[test]
    fn paused_countdown_does_not_move() {
        let s = Settings::default();
        let (mut engine, _) = engine(&s);
        engine.start(&s, Utc::now());
        engine.tick(&s, Utc::now());
        engine.pause(Utc::now());
        for _ in 0..10 {
            assert!(engine.tick(&s, Utc::now()).is_empty());
        }
        assert_eq!(engine.remaining_secs(), 1199);
    }

    #[test]
    fn resume_returns_to_the_paused_break() {
        let s = Settings::default();
        let (mut engine, _) = engine(&s);
        engine.start(&s, Utc::now());
        engine.skip(&s, Utc::now());
        assert_eq!(engine.phase(), Phase::Break);
        engine.tick(&s, Utc::now());

        engine.pause(Utc::now());
        assert_eq!(engine.paused_from(), Some(Phase::Break));
        engine.resume(Utc::now());
        assert_eq!(engine.phase(), Phase::Break);
        assert_eq!(engine.remaining_secs(), 19);
    }

    #[test]
    fn toggle_dispatches_by_phase() {
        let s = Settings::default();
        let (mut engine, _) = engine(&s);
        assert!(matches!(engine.toggle_start_pause(&s, Utc::now()), Some(Event::TimerStarted { .. })));
        assert!(matches!(engine.toggle_start_pause(&s, Utc::now()), Some(Event::TimerPaused { .. })));
        assert!(matches!(engine.toggle_start_pause(&s, Utc::now()), Some(Event::TimerResumed { .. })));
    }

    #[test]
    fn default_scenario_focus_to_break() {
        let s = Settings::default();
        let (mut engine, _) = engine(&s);
        engine.start(&s, Utc::now());

        let mut events = Vec::new();
        for _ in 0..1200 {
            events.extend(engine.tick(&s, Utc::now()));
        }
        assert_eq!(engine.phase(), Phase::Break);
        assert_eq!(engine.remaining_secs(), 20);
        assert_eq!(engine.completed_cycles(), 1);
        assert_eq!(break_kinds(&events), vec![BreakKind::Break]);
        assert!(engine.overlay_shown());
    }

    #[test]
    fn every_fourth_cycle_is_long() {
        let s = Settings {
            focus_minutes: 1,
            auto_start_next: true,
            ..Settings::default()
        };
        let (mut engine, _) = engine(&s);
        engine.start(&s, Utc::now());

        let mut kinds = Vec::new();
        for _ in 0..5 {
            kinds.extend(break_kinds(&run_out(&mut engine, &s)));
            run_out(&mut engine, &s);
        }
        use BreakKind::*;
        assert_eq!(kinds, vec![Break, Break, Break, LongBreak, Break]);
    }

    #[test]
    fn single_cycle_setting_makes_every_break_long() {
        let s = Settings {
            cycles_until_long: 1,
            ..Settings::default()
        };
        let (mut engine, _) = engine(&s);
        engine.start(&s, Utc::now());
        let events = engine.skip(&s, Utc::now());
        assert_eq!(break_kinds(&events), vec![BreakKind::LongBreak]);
        assert_eq!(engine.remaining_secs(), 300);
    }

    #[test]
    fn break_end_without_autostart_goes_idle() {
        let s = Settings {
            auto_start_next: false,
            ..Settings::default()
        };
        let (mut engine, ticker) = engine(&s);
        engine.start(&s, Utc::now());
        engine.skip(&s, Utc::now());
        let events = run_out(&mut engine, &s);

        assert_eq!(engine.phase(), Phase::Idle);
        assert_eq!(engine.remaining_secs(), 1200);
        assert!(!engine.overlay_visible());
        assert!(events.iter().any(|e| matches!(e, Event::WentIdle { .. })));
        assert!(!ticker.ledger().armed);
    }

    #[test]
    fn break_end_with_autostart_refocuses() {
        let s = Settings::default();
        let (mut engine, ticker) = engine(&s);
        engine.start(&s, Utc::now());
        engine.skip(&s, Utc::now());
        let events = run_out(&mut engine, &s);

        assert_eq!(engine.phase(), Phase::Focus);
        assert!(!engine.overlay_visible());
        assert!(events.iter().any(|e| matches!(e, Event::FocusStarted { duration_secs: 1200, .. })));
        // focus -> break -> focus never leaves the running class
        assert_eq!(ticker.ledger().arms, 1);
    }

    #[test]
    fn skip_matches_natural_expiry() {
        let s = Settings::default();
        let (mut natural, _) = engine(&s);
        natural.start(&s, Utc::now());
        let mut natural_events = Vec::new();
        for _ in 0..1200 {
            natural_events.extend(natural.tick(&s, Utc::now()));
        }

        let (mut skipped, _) = engine(&s);
        skipped.start(&s, Utc::now());
        skipped.tick(&s, Utc::now());
        let skip_events = skipped.skip(&s, Utc::now());

        assert_eq!(skipped.phase(), natural.phase());
        assert_eq!(skipped.remaining_secs(), natural.remaining_secs());
        assert_eq!(skipped.completed_cycles(), natural.completed_cycles());
        assert_eq!(skipped.overlay_shown(), natural.overlay_shown());
        assert_eq!(break_kinds(&skip_events), break_kinds(&natural_events));
        assert!(matches!(skip_events[0], Event::TimerSkipped { phase: Phase::Focus, .. }));
    }

    #[test]
    fn skip_while_paused_transitions_after_resume() {
        let s = Settings::default();
        let (mut engine, _) = engine(&s);
        engine.start(&s, Utc::now());
        engine.pause(Utc::now());
        let events = engine.skip(&s, Utc::now());
        assert_eq!(events.len(), 1);
        assert_eq!(engine.phase(), Phase::Paused);

        engine.resume(Utc::now());
        let events = engine.tick(&s, Utc::now());
        assert_eq!(break_kinds(&events), vec![BreakKind::Break]);
    }

    #[test]
    fn reset_always_returns_to_idle() {
        let s = Settings::default();
        let (mut engine, ticker) = engine(&s);
        engine.start(&s, Utc::now());
        engine.skip(&s, Utc::now());
        engine.pause(Utc::now());
        engine.reset(&s, Utc::now());

        assert_eq!(engine.phase(), Phase::Idle);
        assert_eq!(engine.remaining_secs(), 1200);
        assert_eq!(engine.completed_cycles(), 0);
        assert!(!engine.overlay_visible());
        assert!(!ticker.ledger().armed);
    }

    #[test]
    fn duration_change_applies_on_next_entry() {
        let mut s = Settings::default();
        let (mut engine, _) = engine(&s);
        engine.start(&s, Utc::now());
        s.focus_minutes = 1;
        engine.tick(&s, Utc::now());
        assert_eq!(engine.remaining_secs(), 1199);
        assert_eq!(engine.progress_pct(&s), 0.0);
    }

    #[test]
    fn progress_tracks_current_phase() {
        let s = Settings::default();
        let (mut engine, _) = engine(&s);
        assert_eq!(engine.progress_pct(&s), 0.0);
        engine.start(&s, Utc::now());
        for _ in 0..600 {
            engine.tick(&s, Utc::now());
        }
        assert!((engine.progress_pct(&s) - 50.0).abs() < 1e-9);

        engine.skip(&s, Utc::now());
        for _ in 0..5 {
            engine.tick(&s, Utc::now());
        }
        assert!((engine.progress_pct(&s) - 25.0).abs() < 1e-9);
        engine.pause(Utc::now());
        assert!((engine.progress_pct(&s) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn pre_break_cues_in_final_seconds() {
        let s = Settings::default();
        let (mut engine, _) = engine(&s);
        engine.start(&s, Utc::now());
        let mut cues = Vec::new();
        for _ in 0..1200 {
            let remaining_before = engine.remaining_secs();
            for e in engine.tick(&s, Utc::now()) {
                if let Event::CueTone { tone } = e {
                    cues.push((remaining_before, tone));
                }
            }
        }
        let pre: Vec<u64> = cues
            .iter()
            .filter(|(_, t)| *t == Tone::PRE_BREAK)
            .map(|(r, _)| *r)
            .collect();
        assert_eq!(pre, vec![4, 3, 2]);
    }

    #[test]
    fn no_cues_without_sound() {
        let s = Settings {
            sound_enabled: false,
            ..Settings::default()
        };
        let (mut engine, _) = engine(&s);
        engine.start(&s, Utc::now());
        engine.skip(&s, Utc::now());
        let events = run_out(&mut engine, &s);
        assert!(!events.iter().any(|e| matches!(e, Event::CueTone { .. })));
    }

    #[test]
    fn overlay_respects_dim_setting_and_dismissal() {
        let s = Settings {
            dim_during_break: false,
            ..Settings::default()
        };
        let (mut engine, _) = engine(&s);
        engine.start(&s, Utc::now());
        engine.skip(&s, Utc::now());
        assert!(!engine.overlay_shown());

        let s = Settings::default();
        engine.reset(&s, Utc::now());
        engine.start(&s, Utc::now());
        engine.skip(&s, Utc::now());
        assert!(engine.overlay_shown());
        assert!(engine.dismiss_overlay(Utc::now()).is_some());
        assert!(!engine.overlay_shown());
        assert_eq!(engine.phase(), Phase::Break);
        assert!(engine.dismiss_overlay(Utc::now()).is_none());
    }

    #[test]
    fn ticker_follows_running_class() {
        let s = Settings::default();
        let (mut engine, ticker) = engine(&s);
        engine.start(&s, Utc::now());
        engine.pause(Utc::now());
        engine.resume(Utc::now());
        engine.pause(Utc::now());
        engine.reset(&s, Utc::now());
        let l = ticker.ledger();
        assert_eq!((l.arms, l.disarms, l.armed), (2, 2, false));
    }

    #[test]
    fn stale_ticks_are_dropped() {
        let s = Settings::default();
        let (mut engine, ticker) = engine(&s);
        engine.start(&s, Utc::now());
        let old = ticker.tick();
        engine.pause(Utc::now());
        engine.resume(Utc::now());

        assert!(engine.on_tick(old, &s, Utc::now()).is_empty());
        assert_eq!(engine.remaining_secs(), 1200);
        engine.on_tick(ticker.tick(), &s, Utc::now());
        assert_eq!(engine.remaining_secs(), 1199);
    }

    #[test]
    fn events_carry_the_supplied_time() {
        use chrono::TimeZone;
        let s = Settings::default();
        let (mut engine, _) = engine(&s);
        let t0 = Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap();
        let t1 = t0 + chrono::Duration::seconds(40);

        assert!(matches!(engine.start(&s, t0), Some(Event::TimerStarted { at, .. }) if at == t0));
        assert!(matches!(engine.pause(t1), Some(Event::TimerPaused { at, .. }) if at == t1));
        assert!(matches!(engine.resume(t1), Some(Event::TimerResumed { at, .. }) if at == t1));
        assert!(matches!(engine.reset(&s, t0), Some(Event::TimerReset { at }) if at == t0));
        assert!(matches!(
            engine.snapshot(&s, t1),
            Event::StateSnapshot { at, .. } if at == t1
        ));
    }
}
