//! Fan-out of one reminder to tone, notification and speech.

use serde::Serialize;

use super::channel::{
    Channel, Notice, NotificationChannel, NullChannel, Outcome, Permission, Utterance,
};
use crate::storage::Settings;
use crate::timer::Tone;

/// Speech rate used for spoken reminders.
pub const SPEECH_RATE: f32 = 1.05;

#[derive(Debug, Clone, Copy)]
pub struct RemindOptions {
    /// Allow the audible ping (still subject to the sound setting).
    pub sound: bool,
    /// Ping to use when sound is allowed.
    pub tone: Tone,
}

impl Default for RemindOptions {
    fn default() -> Self {
        Self {
            sound: true,
            tone: Tone::PING,
        }
    }
}

impl RemindOptions {
    pub fn silent() -> Self {
        Self {
            sound: false,
            ..Self::default()
        }
    }
}

/// What each channel did for one reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub sound: Outcome,
    pub notification: Outcome,
    pub voice: Outcome,
}

pub struct Dispatcher {
    sound: Box<dyn Channel<Tone>>,
    notifier: Box<dyn NotificationChannel>,
    voice: Box<dyn Channel<Utterance>>,
    permission: Permission,
}

impl Default for Dispatcher {
    /// A dispatcher with no capabilities at all.
    fn default() -> Self {
        Self::new(Box::new(NullChannel), Box::new(NullChannel), Box::new(NullChannel))
    }
}

impl Dispatcher {
    pub fn new(
        sound: Box<dyn Channel<Tone>>,
        notifier: Box<dyn NotificationChannel>,
        voice: Box<dyn Channel<Utterance>>,
    ) -> Self {
        Self {
            sound,
            notifier,
            voice,
            permission: Permission::Default,
        }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Forget a cached denial, e.g. after the user changed it in the
    /// system settings.
    pub fn reset_notification_permission(&mut self) {
        self.permission = Permission::Default;
    }

    /// Ask for notification permission once, caching the answer. Anything
    /// short of a grant is remembered as a denial.
    pub fn ensure_notification_permission(&mut self) -> Permission {
        if self.permission == Permission::Default {
            self.permission = match self.notifier.request_permission() {
                Permission::Granted => Permission::Granted,
                _ => Permission::Denied,
            };
            tracing::debug!(permission = ?self.permission, "notification permission resolved");
        }
        self.permission
    }

    /// Deliver one reminder on every enabled channel. Channels fail
    /// independently; the report is informational only.
    pub fn remind(
        &mut self,
        settings: &Settings,
        title: &str,
        body: &str,
        opts: RemindOptions,
    ) -> DispatchReport {
        let sound = if opts.sound {
            self.play_tone(settings, opts.tone)
        } else {
            Outcome::Disabled
        };

        let notification = if !settings.notifications_enabled {
            Outcome::Disabled
        } else if self.ensure_notification_permission() == Permission::Granted {
            self.notifier.try_fire(&Notice {
                title: title.to_string(),
                body: body.to_string(),
            })
        } else {
            Outcome::Denied
        };

        let voice = if settings.voice_enabled {
            self.voice.try_fire(&Utterance {
                text: format!("{title}. {body}."),
                rate: SPEECH_RATE,
            })
        } else {
            Outcome::Disabled
        };

        let report = DispatchReport {
            sound,
            notification,
            voice,
        };
        tracing::trace!(title, ?report, "reminder dispatched");
        report
    }

    /// Play a bare tone if sound is enabled.
    pub fn play_tone(&mut self, settings: &Settings, tone: Tone) -> Outcome {
        if !settings.sound_enabled {
            return Outcome::Disabled;
        }
        self.sound.try_fire(&tone)
    }
}
