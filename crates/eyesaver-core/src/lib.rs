//! # Eye Saver Core Library
//!
//! Core logic for a 20-20-20 eye-strain timer: every N minutes of focus, rest
//! your eyes for a few seconds, with a longer break every few cycles, plus
//! hydration and posture nudges on their own clocks.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a one-second-tick state machine over
//!   idle/focus/break/longbreak/paused; it owns a tick scheduler that is
//!   armed only while a phase is running
//! - **Nudge Tracker**: independent wall-clock reminders
//! - **Reminder Dispatcher**: fan-out to tone, notification and speech
//!   channels, each failing silently on its own
//! - **Storage**: settings record and append-only break log over a small
//!   key-value backend
//!
//! ## Key Components
//!
//! - [`EyeSaver`]: application state object tying everything together
//! - [`TimerEngine`]: core timer state machine
//! - [`Settings`]: user configuration with clamping defaults merge
//! - [`Dispatcher`]: reminder fan-out

pub mod app;
pub mod error;
pub mod events;
pub mod export;
pub mod format;
pub mod nudge;
pub mod reminder;
pub mod stats;
pub mod storage;
pub mod timer;

pub use app::EyeSaver;
pub use error::{ConfigError, CoreError, StorageError};
pub use events::Event;
pub use export::export_csv;
pub use format::{clamp_int, format_mm_ss, parse_mm_ss};
pub use nudge::{NudgeKind, NudgeTracker};
pub use reminder::{Dispatcher, Outcome, RemindOptions};
pub use stats::{weekly_buckets, DayBucket};
pub use storage::{BreakKind, EventLog, FileKvStore, KvStore, LogEntry, MemoryKvStore, SettingKey, Settings, Theme};
pub use timer::{Phase, TickScheduler, TimerEngine, Tone};
