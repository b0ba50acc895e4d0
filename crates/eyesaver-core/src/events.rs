use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::nudge::NudgeKind;
use crate::storage::BreakKind;
use crate::timer::{Phase, Tone};

/// Every state change in the timer produces an Event.
/// The application layer turns them into log entries and reminders;
/// presentation collaborators may also render them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        /// Phase that was running when paused.
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        phase: Phase,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// Focus ran out; a break of `kind` begins.
    BreakStarted {
        kind: BreakKind,
        /// Completed focus cycles including the one just finished.
        cycle: u32,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// A break ended and focus restarted automatically.
    FocusStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// A break ended and the timer stopped, waiting for the user.
    WentIdle {
        at: DateTime<Utc>,
    },
    /// Countdown cue that should be played if sound is available.
    CueTone {
        tone: Tone,
    },
    NudgeFired {
        kind: NudgeKind,
        at: DateTime<Utc>,
    },
    OverlayDismissed {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        remaining_secs: u64,
        /// `MM:SS`
        display: String,
        completed_cycles: u32,
        progress_pct: f64,
        overlay_visible: bool,
        at: DateTime<Utc>,
    },
}
