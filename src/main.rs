//! Nest Arena - Headless Match Runner
//!
//! Runs one match between two built-in policies and prints the summary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use nest_arena::arena::ArenaLayout;
use nest_arena::core::{ArenaConfig, ArenaError, Result};
use nest_arena::policy::{policy_by_kind, Policy};
use nest_arena::simulation::{MatchRunner, MatchSummary};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyKind {
    Seeker,
    Idle,
}

impl PolicyKind {
    fn name(self) -> &'static str {
        match self {
            PolicyKind::Seeker => "seeker",
            PolicyKind::Idle => "idle",
        }
    }

    fn build(self) -> Result<Box<dyn Policy>> {
        policy_by_kind(self.name())
            .ok_or_else(|| ArenaError::InvalidConfig(format!("unknown policy {}", self.name())))
    }
}

/// Headless Nest Arena match - two agents race to fill nests
#[derive(Parser, Debug)]
#[command(name = "nest-arena")]
#[command(about = "Run one headless arena match and print the result")]
struct Args {
    /// Arena configuration (TOML); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Arena layout (JSON); the built-in ring of trees when omitted
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Random seed for deterministic runs (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Frames per second of the virtual session clock
    #[arg(long, default_value_t = 60.0)]
    frame_rate: f64,

    /// Policy driving the player agent
    #[arg(long, value_enum, default_value = "seeker")]
    player: PolicyKind,

    /// Policy driving the opponent agent
    #[arg(long, value_enum, default_value = "seeker")]
    opponent: PolicyKind,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nest_arena=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(summary) => {
            print_summary(&summary, args.format);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "match failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<MatchSummary> {
    let config = match &args.config {
        Some(path) => ArenaConfig::load(path)?,
        None => ArenaConfig::default(),
    };
    let layout = match &args.layout {
        Some(path) => ArenaLayout::load(path)?,
        None => ArenaLayout::default_layout(),
    };

    let seed = args
        .seed
        .or(config.simulation.seed)
        .unwrap_or_else(rand::random);
    tracing::info!(seed, nodes = layout.nodes.len(), "starting headless match");

    let mut runner = MatchRunner::from_config(
        &config,
        &layout,
        seed,
        args.player.build()?,
        args.opponent.build()?,
        args.frame_rate,
    )?;
    runner.run()?;
    runner.finished_summary()
}

fn print_summary(summary: &MatchSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!(error = %e, "could not serialize summary"),
        },
        OutputFormat::Text => {
            let winner = summary.winner.map(|w| w.label()).unwrap_or("none");
            println!("Match Result");
            println!("============");
            println!("Match: {}", summary.match_id.0);
            println!("Winner: {winner}");
            println!(
                "Score: {} (player, {}) vs {} (opponent, {})",
                summary.player_score,
                summary.player_policy,
                summary.opponent_score,
                summary.opponent_policy
            );
            println!("Duration: {:.2}s over {} steps", summary.duration_secs, summary.steps);
            println!("Seed: {}", summary.seed);
        }
    }
}
