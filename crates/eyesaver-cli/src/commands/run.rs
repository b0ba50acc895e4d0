//! Interactive timer loop.
//!
//! One task selects over three sources: countdown ticks from the engine's
//! tick scheduler (armed only while a phase runs), a continuous one-second
//! nudge poll, and line commands on stdin. Every command goes through the
//! `EyeSaver` so settings and log changes are persisted, and the nudge poll
//! also reloads records that another `eyesaver` process has changed.

use std::io::Write;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Args;
use eyesaver_core::storage::data_dir;
use eyesaver_core::timer::TokioTicker;
use eyesaver_core::{format_mm_ss, BreakKind, Dispatcher, Event, EyeSaver, Phase};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use super::open_store_or_memory;
use crate::channels::{CommandSpeaker, DesktopNotifier, ToneChannel};
use crate::runtime::RuntimeConfig;

#[derive(Args)]
pub struct RunArgs {
    /// Start the first focus interval immediately
    #[arg(long)]
    pub autostart: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunCommand {
    ToggleStartPause,
    Skip,
    Reset,
    HideOverlay,
    /// `set <key> <value>`
    Set { key: String, value: String },
    ClearHistory,
    DefaultSettings,
    Help,
    Quit,
}

impl RunCommand {
    /// Keyboard-style command from one stdin line. A blank line (just
    /// Enter) or a literal space toggles start/pause.
    pub fn parse(line: &str) -> Option<Self> {
        if line.chars().all(|c| c == ' ') && !line.is_empty() {
            return Some(Self::ToggleStartPause);
        }
        let mut words = line.split_whitespace();
        if words.next().is_some_and(|w| w.eq_ignore_ascii_case("set")) {
            return match (words.next(), words.next(), words.next()) {
                (Some(key), Some(value), None) => Some(Self::Set {
                    key: key.to_string(),
                    value: value.to_string(),
                }),
                _ => None,
            };
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "space" | "p" => Some(Self::ToggleStartPause),
            "s" | "skip" => Some(Self::Skip),
            "r" | "reset" => Some(Self::Reset),
            "h" | "hide" => Some(Self::HideOverlay),
            "clear" => Some(Self::ClearHistory),
            "defaults" => Some(Self::DefaultSettings),
            "?" | "help" => Some(Self::Help),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

const HELP: &str = "commands: [enter]/p start-pause  s skip  r reset  h hide overlay  \
                    set <key> <value>  clear (history)  defaults (settings)  q quit";

const BREAK_GUIDANCE: [&str; 3] = [
    "Look at something far away (~6 meters/20 feet).",
    "Blink 10 slow times: squeeze gently, then open.",
    "Relax shoulders; drop your jaw; inhale through nose, slow exhale.",
];

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run_loop(args));
    // stdin reads live on a blocking thread that may never return
    runtime.shutdown_background();
    result
}

async fn run_loop(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = match data_dir() {
        Ok(dir) => RuntimeConfig::load(&dir),
        Err(_) => RuntimeConfig::default(),
    };
    let dispatcher = Dispatcher::new(
        Box::new(ToneChannel::new(&config)),
        Box::new(DesktopNotifier::new(&config)),
        Box::new(CommandSpeaker::new(&config)),
    );
    let (ticker, mut ticks) = TokioTicker::new(Duration::from_secs(1));
    let mut app = EyeSaver::init(open_store_or_memory(), dispatcher, Box::new(ticker), Utc::now());

    let mut nudge_poll = tokio::time::interval(Duration::from_secs(1));
    nudge_poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    println!("{HELP}");
    if args.autostart {
        let events = app.start(Utc::now());
        report(&app, &events);
    }
    draw_status(&app);

    loop {
        tokio::select! {
            Some(tick) = ticks.recv() => {
                let events = app.on_tick(tick, Utc::now());
                report(&app, &events);
            }
            _ = nudge_poll.tick() => {
                let now = Utc::now();
                app.reload(now);
                let events = app.poll_nudges(now);
                report(&app, &events);
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    tracing::debug!("stdin closed, timer keeps running");
                    stdin_open = false;
                    continue;
                };
                let events = match RunCommand::parse(&line) {
                    Some(RunCommand::Quit) => break,
                    Some(command) => apply_command(&mut app, command, Utc::now()),
                    None => {
                        println!("\nunknown command: {}", line.trim());
                        Vec::new()
                    }
                };
                report(&app, &events);
            }
        }
    }
    println!();
    Ok(())
}

/// Carry out one stdin command against the app. Settings errors are
/// printed and the loop keeps going.
pub fn apply_command(app: &mut EyeSaver, command: RunCommand, now: DateTime<Utc>) -> Vec<Event> {
    match command {
        RunCommand::ToggleStartPause => app.toggle_start_pause(now),
        RunCommand::Skip => app.skip(now),
        RunCommand::Reset => app.reset(now),
        RunCommand::HideOverlay => app.dismiss_overlay(now),
        RunCommand::Set { key, value } => {
            match app.update_setting(&key, &value, now) {
                Ok(()) => println!("\n{key} updated"),
                Err(e) => println!("\nerror: {e}"),
            }
            Vec::new()
        }
        RunCommand::ClearHistory => {
            let removed = app.log().len();
            app.clear_history();
            println!("\nhistory cleared ({removed} entries removed)");
            Vec::new()
        }
        RunCommand::DefaultSettings => {
            app.reset_settings(now);
            println!("\nsettings reset to defaults");
            Vec::new()
        }
        RunCommand::Help => {
            println!("\n{HELP}");
            Vec::new()
        }
        RunCommand::Quit => Vec::new(),
    }
}

/// Print a line per noteworthy event, then redraw the status line.
fn report(app: &EyeSaver, events: &[Event]) {
    for event in events {
        for text in describe_lines(event) {
            println!("\r\x1b[2K{text}");
        }
    }
    draw_status(app);
}

/// Everything printed for one event: the summary line, followed by the
/// eye-rest guidance when a break begins.
pub fn describe_lines(event: &Event) -> Vec<String> {
    let mut lines: Vec<String> = describe(event).into_iter().collect();
    if matches!(event, Event::BreakStarted { .. }) {
        lines.extend(BREAK_GUIDANCE.iter().map(|g| format!("  {g}")));
    }
    lines
}

fn draw_status(app: &EyeSaver) {
    let engine = app.engine();
    let phase = match (engine.phase(), engine.paused_from()) {
        (Phase::Paused, Some(from)) => format!("paused ({})", from.as_str()),
        (phase, _) => phase.as_str().to_string(),
    };
    let overlay = if app.overlay_shown() { "  [rest your eyes]" } else { "" };
    print!(
        "\r\x1b[2K{phase:<18} {}  {:>3.0}%  cycles {}{overlay}",
        app.display(),
        app.progress_pct(),
        engine.completed_cycles()
    );
    let _ = std::io::stdout().flush();
}

pub fn describe(event: &Event) -> Option<String> {
    match event {
        Event::TimerStarted { duration_secs, .. } => {
            Some(format!("focus started ({})", format_mm_ss(*duration_secs)))
        }
        Event::TimerPaused { phase, .. } => Some(format!("paused during {}", phase.as_str())),
        Event::TimerResumed { phase, .. } => Some(format!("resumed {}", phase.as_str())),
        Event::TimerSkipped { phase, .. } => Some(format!("skipped {}", phase.as_str())),
        Event::TimerReset { .. } => Some("timer reset".to_string()),
        Event::BreakStarted {
            kind,
            cycle,
            duration_secs,
            ..
        } => {
            let label = match kind {
                BreakKind::Break => "break",
                BreakKind::LongBreak => "long break",
            };
            Some(format!(
                "cycle {cycle} done: {label} for {}",
                format_mm_ss(*duration_secs)
            ))
        }
        Event::FocusStarted { duration_secs, .. } => {
            Some(format!("back to focus ({})", format_mm_ss(*duration_secs)))
        }
        Event::WentIdle { .. } => Some("break over, press enter to start".to_string()),
        Event::NudgeFired { kind, .. } => Some(format!("{}: {}", kind.title(), kind.body())),
        Event::OverlayDismissed { .. } => Some("overlay hidden".to_string()),
        Event::CueTone { .. } | Event::StateSnapshot { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use eyesaver_core::timer::ManualTicker;
    use eyesaver_core::{MemoryKvStore, NudgeKind};

    fn app_at(now: DateTime<Utc>) -> EyeSaver {
        EyeSaver::init(
            Box::new(MemoryKvStore::new()),
            Dispatcher::default(),
            Box::new(ManualTicker::new()),
            now,
        )
    }

    #[test]
    fn parses_keyboard_commands() {
        assert_eq!(RunCommand::parse(" "), Some(RunCommand::ToggleStartPause));
        assert_eq!(RunCommand::parse(""), Some(RunCommand::ToggleStartPause));
        assert_eq!(RunCommand::parse("P"), Some(RunCommand::ToggleStartPause));
        assert_eq!(RunCommand::parse("space"), Some(RunCommand::ToggleStartPause));
        assert_eq!(RunCommand::parse("s\n"), Some(RunCommand::Skip));
        assert_eq!(RunCommand::parse("r"), Some(RunCommand::Reset));
        assert_eq!(RunCommand::parse("h"), Some(RunCommand::HideOverlay));
        assert_eq!(RunCommand::parse("q"), Some(RunCommand::Quit));
        assert_eq!(RunCommand::parse("clear"), Some(RunCommand::ClearHistory));
        assert_eq!(RunCommand::parse("defaults"), Some(RunCommand::DefaultSettings));
        assert_eq!(
            RunCommand::parse("set hydrationIntervalMinutes 5"),
            Some(RunCommand::Set {
                key: "hydrationIntervalMinutes".to_string(),
                value: "5".to_string(),
            })
        );
        assert_eq!(RunCommand::parse("set focusMinutes"), None);
        assert_eq!(RunCommand::parse("x"), None);
    }

    #[test]
    fn live_set_restarts_the_nudge_clock() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap();
        let mut app = app_at(t0);
        let later = t0 + chrono::Duration::minutes(10);
        let command = RunCommand::parse("set hydrationIntervalMinutes 5").unwrap();
        apply_command(&mut app, command, later);

        assert_eq!(app.settings().hydration_interval_minutes, 5);
        assert_eq!(
            app.nudges().clock(NudgeKind::Hydration).last_fired_at,
            later.timestamp_millis()
        );
    }

    #[test]
    fn bad_live_set_keeps_the_loop_going() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap();
        let mut app = app_at(t0);
        let command = RunCommand::parse("set brightness 3").unwrap();
        assert!(apply_command(&mut app, command, t0).is_empty());
        assert_eq!(app.settings(), &eyesaver_core::Settings::default());
    }

    #[test]
    fn live_clear_and_defaults_go_through_the_app() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap();
        let mut app = app_at(t0);
        app.start(t0);
        app.skip(t0);
        let set = RunCommand::parse("set focusMinutes 30").unwrap();
        apply_command(&mut app, set, t0);
        assert_eq!(app.log().len(), 1);

        apply_command(&mut app, RunCommand::ClearHistory, t0);
        apply_command(&mut app, RunCommand::DefaultSettings, t0);
        assert!(app.log().is_empty());
        assert_eq!(app.settings().focus_minutes, 20);
    }

    #[test]
    fn break_start_prints_eye_rest_guidance() {
        let start = Event::BreakStarted {
            kind: BreakKind::Break,
            cycle: 1,
            duration_secs: 20,
            at: Utc::now(),
        };
        let lines = describe_lines(&start);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "cycle 1 done: break for 00:20");
        assert_eq!(lines[1], "  Look at something far away (~6 meters/20 feet).");
        assert!(lines[3].contains("slow exhale"));

        let reset = Event::TimerReset { at: Utc::now() };
        assert_eq!(describe_lines(&reset), vec!["timer reset".to_string()]);
    }

    #[test]
    fn describes_breaks_and_nudges() {
        let at = Utc::now();
        let long = Event::BreakStarted {
            kind: BreakKind::LongBreak,
            cycle: 4,
            duration_secs: 300,
            at,
        };
        assert_eq!(describe(&long).unwrap(), "cycle 4 done: long break for 05:00");

        let nudge = Event::NudgeFired {
            kind: NudgeKind::Hydration,
            at,
        };
        assert_eq!(describe(&nudge).unwrap(), "Hydration check: Take a sip of water");

        let cue = Event::CueTone {
            tone: eyesaver_core::Tone::PRE_BREAK,
        };
        assert!(describe(&cue).is_none());
    }
}
