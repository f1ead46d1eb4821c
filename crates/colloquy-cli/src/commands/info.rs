//! Info command - Show version and configuration
//!
//! Usage:
//! ```bash
//! colloquy info
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use colloquy_core::{catalog, DebateFormat};
use colloquy_runtime::RuntimeConfig;

/// Arguments for the info command
#[derive(Args)]
pub struct InfoArgs;

/// Run the info command
pub fn run(_args: InfoArgs) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let config = RuntimeConfig::from_env();

    println!("{}", "Colloquy - Multi-Expert Debate Explorer".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!();

    println!("{}", "Version Information:".bold());
    println!("  {} {}", "CLI Version:".dimmed(), version.green());
    println!();

    println!("{}", "Debate Formats:".bold());
    for format in DebateFormat::ALL {
        let stages: Vec<&str> = format.stage_plan().iter().map(|k| k.label()).collect();
        println!("  {} {:<11} {}", "•".cyan(), format.as_str().green(), stages.join(" → ").dimmed());
    }
    println!();

    println!("{}", "Experts:".bold());
    println!("  {} {} personas in the catalogue", "ℹ".blue(), catalog().len());
    println!();

    println!("{}", "Configuration:".bold());
    let rows = [
        ("COLLOQUY_MOCK_LATENCY_MS", format!("{:?}", config.mock_latency)),
        ("COLLOQUY_REQUEST_TIMEOUT_MS", format!("{:?}", config.request_timeout)),
        ("COLLOQUY_TICK_INTERVAL_MS", format!("{:?}", config.tick_interval)),
        ("COLLOQUY_MAX_TICKS", config.max_ticks.to_string()),
        ("COLLOQUY_DEFAULT_FORMAT", config.default_format.to_string()),
        ("COLLOQUY_DEBUG", config.debug.to_string()),
    ];
    for (name, value) in rows {
        println!("  {:<28} {}", name.dimmed(), value.green());
    }
    println!();

    Ok(())
}
