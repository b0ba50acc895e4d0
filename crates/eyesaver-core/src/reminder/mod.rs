//! Reminder delivery: tone, system notification and speech.

mod channel;
mod dispatcher;

pub use channel::{
    Channel, Notice, NotificationChannel, NullChannel, Outcome, Permission, RecordingChannel,
    Utterance,
};
pub use dispatcher::{DispatchReport, Dispatcher, RemindOptions, SPEECH_RATE};
