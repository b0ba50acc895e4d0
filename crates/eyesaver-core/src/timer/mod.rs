mod engine;
mod ticker;
mod tone;

pub use engine::{Phase, TimerEngine};
pub use ticker::{ManualTicker, Tick, TickLedger, TickScheduler, TokioTicker};
pub use tone::{break_tick_tone, pre_break_tone, Tone};
