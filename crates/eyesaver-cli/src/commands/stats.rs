use chrono::Local;
use clap::Subcommand;

use super::open_app;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Breaks per day over the last seven days
    Week {
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = open_app()?;

    match action {
        StatsAction::Week { json } => {
            let buckets = app.weekly_summary(&Local::now());
            if json {
                println!("{}", serde_json::to_string_pretty(&buckets)?);
                return Ok(());
            }
            for bucket in &buckets {
                println!("{}  {:>3}", bucket.day.format("%a %Y-%m-%d"), bucket.breaks);
            }
            let total: u32 = buckets.iter().map(|b| b.breaks).sum();
            println!("total: {total}");
        }
    }
    Ok(())
}
