//! Colloquy CLI - drive a multi-expert debate session from the terminal
//!
//! # Usage
//!
//! ```bash
//! # Rank the expert catalogue for a topic
//! colloquy experts --topic "Should AI be regulated?"
//!
//! # Generate a debate and lay out its second stage
//! colloquy debate --topic "Should AI be regulated?" --experts technologist,ethicist,economist --stage 1
//!
//! # Show version and configuration
//! colloquy info
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;

use commands::{debate, experts, info};

/// Colloquy - multi-expert debate explorer
#[derive(Parser)]
#[command(
    name = "colloquy",
    version,
    about = "Colloquy CLI - explore debates between expert personas",
    long_about = "Colloquy generates structured debates between expert personas,\n\
                  lays out their argument graphs and maps where the experts agree."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the expert catalogue
    #[command(name = "experts")]
    Experts(experts::ExpertsArgs),

    /// Generate and display a debate
    #[command(name = "debate")]
    Debate(debate::DebateArgs),

    /// Show version and configuration
    #[command(name = "info")]
    Info(info::InfoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Experts(args) => experts::run(args),
        Commands::Debate(args) => debate::run(args).await,
        Commands::Info(args) => info::run(args),
    }
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();
}

/// Print a success message with a checkmark
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow().bold(), msg);
}
