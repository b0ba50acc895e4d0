use chrono::Utc;

use super::open_app;

/// Snapshot of a fresh timer under the stored settings. Timer state is not
/// persisted, so this is always idle with a full focus countdown.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let app = open_app()?;
    println!("{}", serde_json::to_string_pretty(&app.snapshot(Utc::now()))?);
    Ok(())
}
