use std::path::PathBuf;

use clap::Parser;

use detmin_bench::config::{BenchmarkConfig, ResolvedOutputs};
use detmin_bench::logging::init_logging;
use detmin_bench::tournament::TournamentRunner;

/// Tournament harness pitting pegging agents against each other.
#[derive(Debug, Parser)]
#[command(
    name = "detmin-bench",
    author,
    version,
    about = "Deterministic two-seat pegging tournament harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of hands to deal.
    #[arg(long, value_name = "HANDS")]
    hands: Option<usize>,

    /// Override the RNG seed for deal generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Play every deal once, without the seat swap.
    #[arg(long)]
    no_swap: bool,

    /// Exit after validating the configuration (no tournament is run).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(hands) = cli.hands {
        config.deals.hands = hands;
    }

    if let Some(seed) = cli.seed {
        config.deals.seed = Some(seed);
    }

    if cli.no_swap {
        config.deals.swap_seats = false;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let agent_count = config.agents.len();
    let run_id = config.run_id.clone();
    let hands = config.deals.hands;

    println!(
        "Loaded configuration '{run_id}' with {agent_count} agent{} ({hands} hands of {} cards)",
        if agent_count == 1 { "" } else { "s" },
        config.deals.hand_size
    );

    let _logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = TournamentRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: tournament execution skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Tournament complete for '{run_id}': {} hands × {} seatings → {} rows at {}",
        summary.hands_played,
        summary.seatings,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    for agent in &summary.analytics.agents {
        println!(
            "  {}: avg diff {:+.3} over {} hands, repair rate {:.2}%",
            agent.name,
            agent.avg_point_diff,
            agent.hands,
            agent.repair_rate * 100.0
        );
    }
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
