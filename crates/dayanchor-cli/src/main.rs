use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "dayanchor", version, about = "Energy-aware calendar anchoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Anchor a day's tasks from a JSON request
    Anchor(commands::anchor::AnchorArgs),
    /// Synthesize and chart an energy timeline
    Timeline(commands::timeline::TimelineArgs),
    /// List free gaps around busy intervals
    Gaps(commands::gaps::GapsArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("DAYANCHOR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Anchor(args) => commands::anchor::run(args),
        Commands::Timeline(args) => commands::timeline::run(args),
        Commands::Gaps(args) => commands::gaps::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
