//! Debate command - Generate a debate and show its layouts
//!
//! Usage:
//! ```bash
//! colloquy debate --topic "Should AI be regulated?" --experts technologist,ethicist,economist
//! colloquy debate --topic "Universal basic income" --experts economist,ethicist --format oxford --stage 2
//! colloquy debate --topic "Gene editing" --experts scientist,ethicist --json
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;

use colloquy_core::{suggest_follow_ups, ArgumentKind, DebateFormat};
use colloquy_layout::{
    ConsensusLayout, ConsensusLayoutEngine, ConsensusMap, ForceConfig, ForceSimulation,
    LayoutFrame, PointClass,
};
use colloquy_provider::MockProvider;
use colloquy_runtime::{DebateSession, DebateSessionState, RuntimeConfig};

use crate::{print_success, print_warning};

/// Arguments for the debate command
#[derive(Args)]
pub struct DebateArgs {
    /// Debate topic
    #[arg(short, long)]
    topic: String,

    /// Comma-separated expert ids (2-4), see `colloquy experts`
    #[arg(short, long, value_delimiter = ',', required = true)]
    experts: Vec<String>,

    /// Debate format (standard, oxford, socratic, roundtable)
    #[arg(short, long)]
    format: Option<DebateFormat>,

    /// Stage whose argument graph is laid out
    #[arg(short, long, default_value_t = 0)]
    stage: usize,

    /// Seed for layout randomness
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    /// Output JSON instead of tables
    #[arg(long)]
    json: bool,
}

/// Run the debate command
pub async fn run(args: DebateArgs) -> Result<()> {
    let config = RuntimeConfig::from_env();
    let format = args.format.unwrap_or(config.default_format);
    let provider = MockProvider::instant().with_latency(config.mock_latency);
    let session = DebateSession::new(Arc::new(provider), config).await;

    let experts: Vec<&str> = args.experts.iter().map(String::as_str).collect();
    session
        .start_new_debate(&args.topic, &experts, format)
        .await
        .context("Failed to generate debate")?;

    session
        .select_stage(args.stage)
        .context("Failed to select stage")?;
    let state = session.snapshot();

    let force = ForceConfig {
        seed: args.seed,
        ..session.config().force_config()
    };
    let frame = ForceSimulation::new(&state.stage_graph(), force).run_to_convergence();

    let ids = state
        .debate()
        .map(|d| d.expert_ids.clone())
        .unwrap_or_default();
    let consensus = ConsensusLayoutEngine::default().layout_with_rng(
        &ids,
        state.arguments(),
        &mut StdRng::seed_from_u64(args.seed),
    );

    if args.json {
        let output = json!({
            "debate": state.debate(),
            "stage_index": state.current_stage_index,
            "graph": frame,
            "consensus": consensus,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_transcript(&state);
    print_graph(&state, &frame);
    match &consensus {
        ConsensusMap::Layout(layout) => print_consensus(layout),
        ConsensusMap::Insufficient { expert_count } => {
            print_warning(&format!("Consensus map needs two experts, got {}", expert_count));
        }
    }

    if let Some(stage) = state.current_stage() {
        println!("{}", "Follow-up ideas:".bold());
        for question in suggest_follow_ups(stage, &args.topic) {
            println!("  {} {}", "?".cyan(), question);
        }
        println!();
    }

    Ok(())
}

fn print_transcript(state: &DebateSessionState) {
    let Some(debate) = state.debate() else {
        return;
    };

    println!("{} {}", "Debate:".bold().cyan(), debate.topic.bold());
    println!(
        "  {} {}   {} {}",
        "Format:".dimmed(),
        debate.format.as_str().green(),
        "Experts:".dimmed(),
        debate.expert_ids.join(", ").green()
    );
    println!("{}", "═".repeat(60).cyan());

    for (i, stage) in debate.stages.iter().enumerate() {
        let marker = if i == state.current_stage_index { "▶" } else { " " };
        println!("{} {} {}", marker.yellow(), format!("{}.", i + 1).dimmed(), stage.title.bold());
        if !stage.content.is_empty() {
            println!("    {}", stage.content);
        }
        for id in &stage.argument_ids {
            let Some(argument) = debate.argument(id) else {
                continue;
            };
            let speaker = argument.speaker_id.as_deref().unwrap_or("moderator");
            println!(
                "    {} [{}] {}: {}",
                "•".cyan(),
                kind_label(argument.kind),
                speaker.green(),
                argument.content
            );
        }
    }
    println!();
}

fn print_graph(state: &DebateSessionState, frame: &LayoutFrame) {
    let title = state
        .current_stage()
        .map(|s| s.title.as_str())
        .unwrap_or("Stage");
    println!(
        "{} {} ({} ticks, {:?})",
        "Argument graph:".bold(),
        title,
        frame.tick,
        frame.status
    );

    if frame.nodes.is_empty() {
        print_warning("No arguments in this stage");
        println!();
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Argument").fg(Color::Cyan),
            Cell::new("Kind").fg(Color::Cyan),
            Cell::new("x").fg(Color::Cyan),
            Cell::new("y").fg(Color::Cyan),
            Cell::new("r").fg(Color::Cyan),
            Cell::new("Label").fg(Color::Cyan),
        ]);
    for node in &frame.nodes {
        let id = if node.primary {
            Cell::new(&node.id).fg(Color::Green)
        } else {
            Cell::new(&node.id)
        };
        table.add_row(vec![
            id,
            Cell::new(kind_label(node.kind)),
            Cell::new(format!("{:.1}", node.x)),
            Cell::new(format!("{:.1}", node.y)),
            Cell::new(format!("{:.0}", node.radius)),
            Cell::new(&node.label),
        ]);
    }
    println!("{table}");

    for link in &frame.links {
        println!(
            "  {} {} {:?} {}",
            "→".dimmed(),
            link.source,
            link.relation,
            link.target
        );
    }
    println!();
}

fn print_consensus(layout: &ConsensusLayout) {
    println!("{}", "Consensus map:".bold());
    for region in &layout.experts {
        println!(
            "  {} {:<14} center ({:.0}, {:.0}) r={:.0} {}",
            "◯".cyan(),
            region.expert_id,
            region.center.x,
            region.center.y,
            region.radius,
            region.color.dimmed()
        );
    }

    if layout.points.is_empty() {
        print_warning("No arguments with clear agreement or disagreement");
        println!();
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Argument").fg(Color::Cyan),
            Cell::new("Class").fg(Color::Cyan),
            Cell::new("Placement").fg(Color::Cyan),
            Cell::new("x").fg(Color::Cyan),
            Cell::new("y").fg(Color::Cyan),
            Cell::new("r").fg(Color::Cyan),
        ]);
    for point in &layout.points {
        let class = match point.class {
            PointClass::Consensus => Cell::new("consensus").fg(Color::Green),
            PointClass::Disagreement => Cell::new("disagreement").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&point.argument_id),
            class,
            Cell::new(format!("{:?}", point.placement)),
            Cell::new(format!("{:.1}", point.position.x)),
            Cell::new(format!("{:.1}", point.position.y)),
            Cell::new(format!("{:.1}", point.radius)),
        ]);
    }
    println!("{table}");

    let consensus = layout.consensus_points().count();
    let disagreement = layout.disagreement_points().count();
    print_success(&format!(
        "{} consensus and {} disagreement points",
        consensus, disagreement
    ));
    println!();
}

fn kind_label(kind: ArgumentKind) -> &'static str {
    match kind {
        ArgumentKind::Claim => "claim",
        ArgumentKind::Supporting => "supporting",
        ArgumentKind::Counter => "counter",
        ArgumentKind::Response => "response",
        ArgumentKind::Evidence => "evidence",
    }
}
