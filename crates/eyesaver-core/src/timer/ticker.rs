//! One-second tick sources.
//!
//! The engine arms its scheduler when it enters a running phase and disarms
//! it when it leaves, so at most one tick source exists at a time. Each arm
//! starts a new generation; ticks from an earlier generation that are still
//! queued are rejected by [`TickScheduler::is_current`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// A single countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

pub trait TickScheduler: Send {
    /// Start delivering ticks. Always clears a previous source first.
    fn arm(&mut self);
    /// Stop delivering ticks.
    fn disarm(&mut self);
    /// Whether a delivered tick belongs to the active source.
    fn is_current(&self, tick: &Tick) -> bool;
}

/// Tokio interval task forwarding ticks over a channel.
pub struct TokioTicker {
    period: Duration,
    tx: mpsc::UnboundedSender<Tick>,
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl TokioTicker {
    /// Must be armed from inside a tokio runtime.
    pub fn new(period: Duration) -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                period,
                tx,
                handle: None,
                generation: 0,
            },
            rx,
        )
    }
}

impl TickScheduler for TokioTicker {
    fn arm(&mut self) {
        self.disarm();
        self.generation = self.generation.wrapping_add(1);

        let tx = self.tx.clone();
        let period = self.period;
        let tick = Tick {
            generation: self.generation,
        };

        self.handle = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(tick).is_err() {
                    break;
                }
            }
        }));
        tracing::trace!(generation = self.generation, "tick armed");
    }

    fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::trace!(generation = self.generation, "tick disarmed");
        }
    }

    fn is_current(&self, tick: &Tick) -> bool {
        self.handle.is_some() && tick.generation == self.generation
    }
}

impl Drop for TokioTicker {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickLedger {
    pub arms: u32,
    pub disarms: u32,
    pub armed: bool,
    pub generation: u64,
}

/// Records arm/disarm calls without producing ticks; the caller drives the
/// engine by hand. Clones share one ledger.
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    ledger: Arc<Mutex<TickLedger>>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger(&self) -> TickLedger {
        self.ledger.lock().map(|l| *l).unwrap_or_default()
    }

    /// A tick for the currently armed generation.
    pub fn tick(&self) -> Tick {
        Tick {
            generation: self.ledger().generation,
        }
    }
}

impl TickScheduler for ManualTicker {
    fn arm(&mut self) {
        if let Ok(mut l) = self.ledger.lock() {
            if l.armed {
                l.disarms += 1;
            }
            l.arms += 1;
            l.armed = true;
            l.generation += 1;
        }
    }

    fn disarm(&mut self) {
        if let Ok(mut l) = self.ledger.lock() {
            if l.armed {
                l.disarms += 1;
                l.armed = false;
            }
        }
    }

    fn is_current(&self, tick: &Tick) -> bool {
        let l = self.ledger();
        l.armed && tick.generation == l.generation
    }
}
