//! ACCORD CLI - command-line interface
//!
//! Commands:
//! - tournament: run a tournament from a descriptor file
//! - session: run one multi-thread negotiation session

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use accord_core::{Registry, ScenarioSpec};
use accord_tournament::{
    assign_scenario, run_assigned, Competitor, Parallelism, RunParams, TournamentOptions,
    TournamentSpec,
};

#[derive(Parser)]
#[command(name = "accord")]
#[command(about = "Multi-thread negotiation tournament runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a tournament from a descriptor file
    Tournament {
        /// Tournament descriptor (YAML)
        descriptor: PathBuf,
        #[arg(long, default_value_t = 1)]
        repetitions: usize,
        /// Worker pool: "serial", "all", a count, or a core fraction
        #[arg(long, default_value = "all")]
        jobs: Parallelism,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Directory for per-session traces and results
        #[arg(long)]
        output: Option<PathBuf>,
        /// Schedule everything but execute no negotiation
        #[arg(long)]
        dry: bool,
        /// Write all score records to this JSON file
        #[arg(long)]
        scores: Option<PathBuf>,
    },
    /// Run one session of a single scenario
    Session {
        /// Scenario descriptor (YAML)
        scenario: PathBuf,
        #[arg(long, default_value = "boulware")]
        center: String,
        /// Edge strategy pool, sampled per thread
        #[arg(long, value_delimiter = ',', default_value = "boulware,random")]
        edges: Vec<String>,
        #[arg(long, default_value_t = 100)]
        nsteps: usize,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long)]
        dry: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Tournament {
            descriptor,
            repetitions,
            jobs,
            seed,
            output,
            dry,
            scores,
        } => run_tournament(descriptor, repetitions, jobs, seed, output, dry, scores),
        Commands::Session {
            scenario,
            center,
            edges,
            nsteps,
            output,
            seed,
            dry,
        } => run_session(scenario, center, edges, nsteps, output, seed, dry),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_tournament(
    descriptor: PathBuf,
    repetitions: usize,
    jobs: Parallelism,
    seed: u64,
    output: Option<PathBuf>,
    dry: bool,
    scores: Option<PathBuf>,
) -> anyhow::Result<()> {
    let spec = TournamentSpec::load(&descriptor)?;
    let tournament = spec.build()?;
    let registry = Registry::with_builtins();

    let mut opts = TournamentOptions::repetitions(repetitions)
        .with_seed(seed)
        .with_parallelism(jobs);
    if let Some(output) = output {
        opts = opts.with_output(output);
    }
    if dry {
        opts = opts.dry();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("running negotiations");
    spinner.enable_steady_tick(Duration::from_millis(120));
    let results = tournament.run(&registry, &opts)?;
    spinner.finish_and_clear();

    println!("{} sessions completed", results.session_results.len());
    println!();
    println!("Final scores:");
    for (rank, (identity, score)) in results.ranked().iter().enumerate() {
        println!("{:>3}. {:<24} {:>10.3}", rank + 1, identity, score);
    }

    if let Some(path) = scores {
        std::fs::write(&path, serde_json::to_string_pretty(&results.scores)?)
            .with_context(|| format!("writing scores to {}", path.display()))?;
        println!();
        println!("Score records written to {}", path.display());
    }
    Ok(())
}

fn run_session(
    scenario: PathBuf,
    center: String,
    edges: Vec<String>,
    nsteps: usize,
    output: Option<PathBuf>,
    seed: u64,
    dry: bool,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&scenario)
        .with_context(|| format!("reading scenario {}", scenario.display()))?;
    let spec: ScenarioSpec = serde_yaml::from_str(&text)
        .with_context(|| format!("malformed scenario {}", scenario.display()))?;
    let built = spec.build()?;

    let registry = Registry::with_builtins();
    let edge_types: Vec<Competitor> = edges
        .iter()
        .map(|name| Competitor::new(name.as_str()))
        .collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let assigned = assign_scenario(
        &built,
        &registry,
        RunParams::new(nsteps),
        &Competitor::new(center),
        &edge_types,
        true,
        &mut rng,
    )?;
    let result = run_assigned(assigned, "session", output.as_deref(), dry, seed)?;

    for (i, agreement) in result.agreements.iter().enumerate() {
        match agreement {
            Some(outcome) => println!("thread {i}: agreement ({})", format_outcome(outcome)),
            None => println!("thread {i}: no agreement"),
        }
    }
    println!("center utility: {:.3}", result.center_utility);
    for (i, utility) in result.edge_utilities.iter().enumerate() {
        println!("edge {i} utility: {utility:.3}");
    }
    Ok(())
}

fn format_outcome(outcome: &accord_core::Outcome) -> String {
    outcome
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
