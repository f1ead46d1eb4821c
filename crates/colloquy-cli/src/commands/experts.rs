//! Experts command - Show the expert catalogue
//!
//! Usage:
//! ```bash
//! colloquy experts
//! colloquy experts --topic "Is nuclear power the answer to climate change?"
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use colloquy_core::{catalog, relevance_score, relevant_experts, suggested_combinations};

/// Arguments for the experts command
#[derive(Args)]
pub struct ExpertsArgs {
    /// Rank experts by relevance to this topic
    #[arg(short, long)]
    topic: Option<String>,

    /// Roster size for suggested combinations
    #[arg(long, default_value_t = 3)]
    size: usize,
}

/// Run the experts command
pub fn run(args: ExpertsArgs) -> Result<()> {
    let experts = match &args.topic {
        Some(topic) => relevant_experts(topic),
        None => catalog(),
    };

    println!("{}", "Expert Catalogue".bold().cyan());
    println!();

    let mut table = Table::new();
    let mut header = vec![
        Cell::new("Id").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Title").fg(Color::Cyan),
        Cell::new("Areas").fg(Color::Cyan),
    ];
    if args.topic.is_some() {
        header.push(Cell::new("Relevance").fg(Color::Cyan));
    }
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);

    for expert in &experts {
        let areas: Vec<&str> = expert.areas.iter().map(String::as_str).collect();
        let mut row = vec![
            Cell::new(&expert.id).fg(Color::Green),
            Cell::new(&expert.name),
            Cell::new(&expert.title),
            Cell::new(areas.join(", ")),
        ];
        if let Some(topic) = &args.topic {
            row.push(Cell::new(relevance_score(expert, topic)));
        }
        table.add_row(row);
    }
    println!("{table}");

    if let Some(topic) = &args.topic {
        println!();
        println!("{}", "Suggested rosters:".bold());
        for roster in suggested_combinations(topic, args.size) {
            println!("  {} {}", "•".cyan(), roster.join(", ").green());
        }
    }

    Ok(())
}
