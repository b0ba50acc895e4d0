//! Concrete reminder channels for a desktop terminal session.
//!
//! Everything here is fire-and-forget: external programs are spawned and
//! reaped on a helper thread, and desktop notifications are shown from their
//! own thread, so the timer loop never waits on the host.

use std::io::Write;
use std::process::{Command, Stdio};

use eyesaver_core::reminder::{Channel, Notice, NotificationChannel, Outcome, Utterance};
use eyesaver_core::Tone;
use notify_rust::Notification;

use crate::runtime::RuntimeConfig;

/// Spawn `program` with all stdio detached and reap it in the background.
fn spawn_detached(program: &str, args: &[String]) -> std::io::Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    std::thread::spawn(move || {
        let _ = child.wait();
    });
    Ok(())
}

fn ring_bell() {
    let mut out = std::io::stdout();
    let _ = out.write_all(b"\x07");
    let _ = out.flush();
}

/// Arguments for a sox `play` sine tone.
pub fn tone_args(tone: &Tone) -> Vec<String> {
    vec![
        "-q".to_string(),
        "-n".to_string(),
        "synth".to_string(),
        format!("{:.3}", tone.duration_ms as f64 / 1000.0),
        "sine".to_string(),
        tone.freq_hz.to_string(),
        "vol".to_string(),
        format!("{:.2}", tone.volume),
    ]
}

/// Sine tones through an external player, with the terminal bell as the
/// last resort.
pub struct ToneChannel {
    command: String,
    bell_fallback: bool,
    player_missing: bool,
}

impl ToneChannel {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            command: config.tone_command.trim().to_string(),
            bell_fallback: config.bell_fallback,
            player_missing: config.tone_command.trim().is_empty(),
        }
    }
}

impl Channel<Tone> for ToneChannel {
    fn try_fire(&mut self, tone: &Tone) -> Outcome {
        if !self.player_missing {
            match spawn_detached(&self.command, &tone_args(tone)) {
                Ok(()) => return Outcome::Delivered,
                Err(e) => {
                    tracing::debug!(command = %self.command, "tone player unavailable: {e}");
                    self.player_missing = true;
                }
            }
        }
        if self.bell_fallback {
            ring_bell();
            Outcome::Delivered
        } else {
            Outcome::Unavailable
        }
    }
}

/// Desktop notifications over the platform notification service.
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            app_name: config.app_name.clone(),
        }
    }
}

impl Channel<Notice> for DesktopNotifier {
    fn try_fire(&mut self, notice: &Notice) -> Outcome {
        let notice = notice.clone();
        let app_name = self.app_name.clone();
        let spawned = std::thread::Builder::new()
            .name("eyesaver-notify".into())
            .spawn(move || {
                if let Err(e) = Notification::new()
                    .summary(&notice.title)
                    .body(&notice.body)
                    .appname(&app_name)
                    .icon("alarm-clock")
                    .show()
                {
                    tracing::debug!("notification not shown: {e}");
                }
            });
        match spawned {
            Ok(_) => Outcome::Delivered,
            Err(_) => Outcome::Unavailable,
        }
    }
}

// Desktop notification daemons have no permission prompt.
impl NotificationChannel for DesktopNotifier {}

/// Arguments for a known speech program at `rate` (1.0 = normal).
pub fn speech_args(program: &str, text: &str, rate: f32) -> Vec<String> {
    let name = std::path::Path::new(program)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(program);
    let words_per_minute = (175.0 * rate).round() as i64;
    match name {
        // -100..=100 relative to the default voice rate
        "spd-say" => vec![
            "-r".to_string(),
            (((rate - 1.0) * 100.0).round() as i64).clamp(-100, 100).to_string(),
            text.to_string(),
        ],
        "espeak" | "espeak-ng" => vec!["-s".to_string(), words_per_minute.to_string(), text.to_string()],
        "say" => vec!["-r".to_string(), words_per_minute.to_string(), text.to_string()],
        _ => vec![text.to_string()],
    }
}

/// Speech through the first available text-to-speech program.
pub struct CommandSpeaker {
    candidates: Vec<String>,
    chosen: Option<String>,
}

impl CommandSpeaker {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            candidates: config.speech_commands.clone(),
            chosen: None,
        }
    }
}

impl Channel<Utterance> for CommandSpeaker {
    fn try_fire(&mut self, utterance: &Utterance) -> Outcome {
        if let Some(program) = &self.chosen {
            return match spawn_detached(program, &speech_args(program, &utterance.text, utterance.rate)) {
                Ok(()) => Outcome::Delivered,
                Err(_) => Outcome::Unavailable,
            };
        }

        for program in &self.candidates {
            if spawn_detached(program, &speech_args(program, &utterance.text, utterance.rate)).is_ok() {
                tracing::debug!(%program, "speech program selected");
                self.chosen = Some(program.clone());
                return Outcome::Delivered;
            }
        }
        Outcome::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sox_arguments_for_the_default_ping() {
        assert_eq!(
            tone_args(&Tone::PING),
            vec!["-q", "-n", "synth", "0.180", "sine", "880", "vol", "0.15"]
        );
    }

    #[test]
    fn speech_rate_per_program() {
        assert_eq!(speech_args("spd-say", "hi", 1.05), vec!["-r", "5", "hi"]);
        assert_eq!(speech_args("/usr/bin/espeak", "hi", 1.05), vec!["-s", "184", "hi"]);
        assert_eq!(speech_args("say", "hi", 1.0), vec!["-r", "175", "hi"]);
        assert_eq!(speech_args("festival-say", "hi", 1.05), vec!["hi"]);
    }

    #[test]
    fn missing_player_falls_back_or_reports_unavailable() {
        let config = RuntimeConfig {
            tone_command: "eyesaver-no-such-player".to_string(),
            bell_fallback: false,
            ..RuntimeConfig::default()
        };
        let mut tones = ToneChannel::new(&config);
        assert_eq!(tones.try_fire(&Tone::PING), Outcome::Unavailable);
    }

    #[test]
    fn no_speech_program_is_unavailable() {
        let config = RuntimeConfig {
            speech_commands: vec!["eyesaver-no-such-tts".to_string()],
            ..RuntimeConfig::default()
        };
        let mut speaker = CommandSpeaker::new(&config);
        let utterance = Utterance {
            text: "Break time.".to_string(),
            rate: 1.05,
        };
        assert_eq!(speaker.try_fire(&utterance), Outcome::Unavailable);
    }
}
