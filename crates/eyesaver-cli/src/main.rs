use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod channels;
mod commands;
mod runtime;

#[derive(Parser)]
#[command(name = "eyesaver", version, about = "Eye Saver: 20-20-20 eye-strain timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive timer
    Run(commands::run::RunArgs),
    /// Settings management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Break history
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Break statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Print the timer state as JSON
    Status,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("EYESAVER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Log { action } => commands::log::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Status => commands::status::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
