use std::path::PathBuf;

use chrono::SecondsFormat;
use clap::Subcommand;

use super::{ensure_persisted, open_app};

#[derive(Subcommand)]
pub enum LogAction {
    /// List logged breaks, oldest first
    List {
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the log as timestamp_iso,type rows
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Delete all logged breaks
    Clear,
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app()?;
    let log = app.log();

    match action {
        LogAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(log.entries())?);
            } else if log.is_empty() {
                println!("no breaks logged");
            } else {
                for entry in log.entries() {
                    let at = entry
                        .at()
                        .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
                        .unwrap_or_else(|| entry.t.to_string());
                    println!("{at}  {}", entry.kind.as_str());
                }
            }
        }
        LogAction::Export { output } => {
            let csv = app.export_log();
            match output {
                Some(path) => {
                    std::fs::write(&path, &csv)?;
                    eprintln!("exported {} entries to {}", log.len(), path.display());
                }
                None => println!("{csv}"),
            }
        }
        LogAction::Clear => {
            let removed = log.len();
            app.clear_history();
            ensure_persisted(&mut app)?;
            println!("history cleared ({removed} entries removed)");
        }
    }
    Ok(())
}
