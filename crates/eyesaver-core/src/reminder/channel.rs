//! Reminder channels as independent capabilities.
//!
//! Each channel reports what happened through an [`Outcome`] instead of an
//! error: a missing audio device or a refused notification is a normal,
//! silent result, never something that interrupts the timer.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Handed off to the backend.
    Delivered,
    /// No backend for this capability on this system.
    Unavailable,
    /// Backend exists but the user refused it.
    Denied,
    /// Turned off in settings (or by the caller); nothing attempted.
    Disabled,
}

/// Visible system notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

/// Text to speak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
}

/// Notification permission as last reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Not asked yet.
    #[default]
    Default,
    Granted,
    Denied,
}

/// Fire-and-forget capability. Implementations must not block on the
/// backend finishing (spawn, queue, or return).
pub trait Channel<P>: Send {
    fn try_fire(&mut self, payload: &P) -> Outcome;
}

/// Notification channels additionally gate on a user permission.
pub trait NotificationChannel: Channel<Notice> {
    /// Ask the backend for permission. Backends without a permission model
    /// grant by default.
    fn request_permission(&mut self) -> Permission {
        Permission::Granted
    }
}

/// Channel for a capability the host does not have.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullChannel;

impl<P> Channel<P> for NullChannel {
    fn try_fire(&mut self, _payload: &P) -> Outcome {
        Outcome::Unavailable
    }
}

impl NotificationChannel for NullChannel {
    fn request_permission(&mut self) -> Permission {
        Permission::Denied
    }
}

/// In-memory channel that keeps every payload it receives. Clones share the
/// same record, so a test can hand one to the dispatcher and inspect the other.
#[derive(Debug, Clone)]
pub struct RecordingChannel<P> {
    fired: Arc<Mutex<Vec<P>>>,
    outcome: Outcome,
    permission: Permission,
    permission_requests: Arc<Mutex<u32>>,
}

impl<P> Default for RecordingChannel<P> {
    fn default() -> Self {
        Self {
            fired: Arc::new(Mutex::new(Vec::new())),
            outcome: Outcome::Delivered,
            permission: Permission::Granted,
            permission_requests: Arc::new(Mutex::new(0)),
        }
    }
}

impl<P: Clone> RecordingChannel<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `outcome` for every fire (payloads are still recorded).
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Answer permission requests with `permission`.
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    pub fn fired(&self) -> Vec<P> {
        self.fired.lock().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn permission_requests(&self) -> u32 {
        self.permission_requests.lock().map(|n| *n).unwrap_or(0)
    }
}

impl<P: Clone + Send> Channel<P> for RecordingChannel<P> {
    fn try_fire(&mut self, payload: &P) -> Outcome {
        if let Ok(mut fired) = self.fired.lock() {
            fired.push(payload.clone());
        }
        self.outcome
    }
}

impl NotificationChannel for RecordingChannel<Notice> {
    fn request_permission(&mut self) -> Permission {
        if let Ok(mut n) = self.permission_requests.lock() {
            *n += 1;
        }
        self.permission
    }
}
