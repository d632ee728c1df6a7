use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use biosim::{scenario::ScenarioLoader, snapshot::SnapshotWriter};

#[derive(Debug, Parser)]
#[command(author, version, about = "Island population simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/rossumoya.yaml")]
    scenario: PathBuf,

    /// Override year count (uses scenario default when omitted)
    #[arg(long)]
    years: Option<u32>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override snapshot interval in years (0 disables snapshots)
    #[arg(long)]
    snapshot_interval: Option<u32>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let loader = ScenarioLoader::new(".");
    let mut scenario = loader.load(&cli.scenario)?;
    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }
    let years = scenario.years(cli.years);
    let snapshot_interval = cli
        .snapshot_interval
        .unwrap_or(scenario.snapshot_interval_years);
    let snapshot_dir = cli
        .snapshot_dir
        .unwrap_or_else(|| PathBuf::from("snapshots"));

    let mut sim = scenario
        .build_simulation()
        .with_context(|| format!("Invalid scenario '{}'", scenario.name))?;
    info!(
        scenario = %scenario.name,
        seed = scenario.seed,
        years,
        animals = sim.num_animals(),
        "scenario loaded"
    );

    let writer = SnapshotWriter::new(&snapshot_dir, snapshot_interval);
    let completed = sim.simulate_with_hook(years, |current, _| {
        if let Some(path) = writer
            .maybe_write(&current.snapshot(&scenario.name))
            .context("Failed to write snapshot")?
        {
            info!(path = %path.display(), "snapshot written");
        }
        Ok::<(), anyhow::Error>(())
    })?;
    if completed < years {
        warn!(completed, requested = years, "island emptied before the last year");
    }

    let counts = sim.num_animals_per_species();
    println!(
        "Scenario '{}' completed {} years. Final population: {} herbivores, {} carnivores",
        scenario.name,
        sim.year(),
        counts.herbivores,
        counts.carnivores
    );
    Ok(())
}
