//! Wellness nudges.
//!
//! Hydration and posture reminders run on their own wall-clock intervals,
//! measured from the last time each fired. They ignore the focus/break cycle
//! entirely: no effect on cycle counts or the break log, and they fire in
//! any phase.

use serde::{Deserialize, Serialize};

use crate::storage::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NudgeKind {
    Hydration,
    Posture,
}

impl NudgeKind {
    pub const ALL: [NudgeKind; 2] = [Self::Hydration, Self::Posture];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Hydration => "Hydration check",
            Self::Posture => "Posture check",
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            Self::Hydration => "Take a sip of water",
            Self::Posture => "Relax shoulders, ears over shoulders, feet flat",
        }
    }

    /// Configured interval in minutes; 0 means disabled.
    pub fn interval_minutes(&self, settings: &Settings) -> u32 {
        match self {
            Self::Hydration => settings.hydration_interval_minutes,
            Self::Posture => settings.posture_interval_minutes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NudgeClock {
    /// Epoch milliseconds.
    pub last_fired_at: i64,
}

#[derive(Debug, Clone)]
pub struct NudgeTracker {
    hydration: NudgeClock,
    posture: NudgeClock,
}

impl NudgeTracker {
    /// Both clocks start at `now_ms`.
    pub fn new(now_ms: i64) -> Self {
        Self {
            hydration: NudgeClock { last_fired_at: now_ms },
            posture: NudgeClock { last_fired_at: now_ms },
        }
    }

    pub fn clock(&self, kind: NudgeKind) -> NudgeClock {
        match kind {
            NudgeKind::Hydration => self.hydration,
            NudgeKind::Posture => self.posture,
        }
    }

    fn clock_mut(&mut self, kind: NudgeKind) -> &mut NudgeClock {
        match kind {
            NudgeKind::Hydration => &mut self.hydration,
            NudgeKind::Posture => &mut self.posture,
        }
    }

    /// Restart one clock, e.g. after its interval was reconfigured.
    pub fn reset(&mut self, kind: NudgeKind, now_ms: i64) {
        self.clock_mut(kind).last_fired_at = now_ms;
    }

    /// Return the nudges due at `now_ms`, restarting their clocks.
    ///
    /// A nudge is due once strictly more than its interval has elapsed.
    pub fn poll(&mut self, now_ms: i64, settings: &Settings) -> Vec<NudgeKind> {
        let mut due = Vec::new();
        for kind in NudgeKind::ALL {
            let minutes = kind.interval_minutes(settings);
            if minutes == 0 {
                continue;
            }
            let interval_ms = i64::from(minutes) * 60_000;
            let clock = self.clock_mut(kind);
            if now_ms.saturating_sub(clock.last_fired_at) > interval_ms {
                clock.last_fired_at = now_ms;
                due.push(kind);
            }
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: i64 = 60_000;

    #[test]
    fn fires_strictly_after_interval_and_restarts() {
        let s = Settings::default();
        let mut tracker = NudgeTracker::new(0);

        assert!(tracker.poll(30 * MIN, &s).is_empty());
        assert_eq!(tracker.poll(30 * MIN + 1, &s), vec![NudgeKind::Posture]);
        assert_eq!(tracker.clock(NudgeKind::Posture).last_fired_at, 30 * MIN + 1);

        assert_eq!(tracker.poll(60 * MIN + 1, &s), vec![NudgeKind::Hydration]);
        assert_eq!(tracker.poll(60 * MIN + 2, &s), vec![NudgeKind::Posture]);
    }

    #[test]
    fn zero_interval_never_fires() {
        let s = Settings {
            hydration_interval_minutes: 0,
            posture_interval_minutes: 0,
            ..Settings::default()
        };
        let mut tracker = NudgeTracker::new(0);
        assert!(tracker.poll(i64::MAX / 2, &s).is_empty());
        assert_eq!(tracker.clock(NudgeKind::Hydration).last_fired_at, 0);
    }

    #[test]
    fn reset_restarts_one_clock() {
        let s = Settings::default();
        let mut tracker = NudgeTracker::new(0);
        tracker.reset(NudgeKind::Posture, 20 * MIN);
        assert!(tracker.poll(31 * MIN, &s).is_empty());
        assert_eq!(tracker.poll(50 * MIN + 1, &s), vec![NudgeKind::Posture]);
    }
}
