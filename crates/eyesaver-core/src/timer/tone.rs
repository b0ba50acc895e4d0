//! Audible cues derived from the countdown.
//!
//! These are pure functions of the phase and the countdown value so the
//! engine can decide *whether* to beep without touching any audio backend.

use serde::{Deserialize, Serialize};

use super::engine::Phase;

/// A short sine ping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub freq_hz: u32,
    /// 0.0 ..= 1.0
    pub volume: f32,
    pub duration_ms: u64,
}

impl Tone {
    /// Reminder ping played with announcements.
    pub const PING: Tone = Tone {
        freq_hz: 880,
        volume: 0.15,
        duration_ms: 180,
    };

    /// Quieter ping for wellness nudges.
    pub const NUDGE: Tone = Tone {
        freq_hz: 880,
        volume: 0.1,
        duration_ms: 180,
    };

    /// Once-a-second rhythm during a short break.
    pub const BREAK_TICK: Tone = Tone {
        freq_hz: 880,
        volume: 0.12,
        duration_ms: 180,
    };

    /// Higher cue in the last three seconds of focus.
    pub const PRE_BREAK: Tone = Tone {
        freq_hz: 1200,
        volume: 0.12,
        duration_ms: 120,
    };
}

/// Pre-break countdown cue.
///
/// `remaining` is the value *after* this tick's decrement. Only the final
/// three seconds of a focus phase produce a tone, and only with sound on.
pub fn pre_break_tone(phase: Phase, sound_enabled: bool, remaining: u64) -> Option<Tone> {
    if phase != Phase::Focus || !sound_enabled {
        return None;
    }
    (1..=3).contains(&remaining).then_some(Tone::PRE_BREAK)
}

/// Rhythmic tone for short breaks; `before` is the pre-decrement countdown.
pub fn break_tick_tone(phase: Phase, sound_enabled: bool, before: u64) -> Option<Tone> {
    (phase == Phase::Break && sound_enabled && before > 0).then_some(Tone::BREAK_TICK)
}
