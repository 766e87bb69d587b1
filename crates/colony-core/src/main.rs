//! Colony Scheduler
//!
//! Headless runner: builds the default colony, drives the scheduler for a
//! fixed number of ticks and writes events and snapshots to disk.

use clap::Parser;
use std::path::PathBuf;

use colony_core::events::EventLogger;
use colony_core::output::{self, RunSummary, SnapshotGenerator};
use colony_core::{setup, ColonyError, SchedulerConfig, Simulation};

/// Command line arguments for the scheduler
#[derive(Parser, Debug)]
#[command(name = "colony_sim")]
#[command(about = "Colonist task and mission scheduler")]
struct Args {
    /// TOML tuning file; defaults apply where it is silent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate (overrides the config)
    #[arg(long)]
    ticks: Option<u64>,

    /// Millisols per tick (overrides the config)
    #[arg(long)]
    tick_millisols: Option<f64>,

    /// Interval between colony snapshots in ticks, 0 disables them
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots and run statistics
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// JSONL event log path (defaults to <output-dir>/events.jsonl)
    #[arg(long)]
    events: Option<PathBuf>,

    /// Skip writing the event log
    #[arg(long)]
    no_events: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

fn load_config(args: &Args) -> Result<SchedulerConfig, ColonyError> {
    let mut config = match &args.config {
        Some(path) => SchedulerConfig::from_file(path)?,
        None => SchedulerConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(ticks) = args.ticks {
        config.simulation.ticks = ticks;
    }
    if let Some(tick_millisols) = args.tick_millisols {
        config.simulation.tick_millisols = tick_millisols;
    }
    if let Some(interval) = args.snapshot_interval {
        config.simulation.snapshot_interval = interval;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<(), ColonyError> {
    let config = load_config(&args)?;

    println!("Colony Scheduler");
    println!("================");
    println!("Seed: {}", config.simulation.seed);
    println!("Ticks: {}", config.simulation.ticks);
    println!("Tick length: {} msol", config.simulation.tick_millisols);
    println!("Snapshot interval: {}", config.simulation.snapshot_interval);
    println!();

    let snapshot_dir = args.output_dir.join("snapshots");
    std::fs::create_dir_all(&snapshot_dir)?;

    let colony = setup::build_colony(&config)?;
    println!(
        "Built {} settlements, {} rovers, {} colonists",
        colony.settlements.len(),
        colony.vehicles.len(),
        colony.people.len()
    );

    let mut logger = if args.no_events {
        EventLogger::null()
    } else {
        let path = args
            .events
            .clone()
            .unwrap_or_else(|| args.output_dir.join("events.jsonl"));
        EventLogger::new(path)?
    };
    let ticks = config.simulation.ticks;
    let mut generator = SnapshotGenerator::new(config.simulation.snapshot_interval);
    let mut summary = RunSummary::new();
    let mut sim = Simulation::new(colony, config);

    let initial = output::generate_snapshot(&sim, &mut generator);
    output::write_snapshot_to_dir(&initial, &snapshot_dir)?;
    output::write_current_state(&initial, &args.output_dir)?;

    println!();
    println!("Starting simulation...");
    println!();

    for _ in 0..ticks {
        let events = sim.tick();
        let tick = sim.current_tick();
        logger.log_batch(&events)?;
        summary.record_tick(&events);

        if generator.should_snapshot(tick) {
            let snapshot = output::generate_snapshot(&sim, &mut generator);
            if let Err(e) = output::write_snapshot_to_dir(&snapshot, &snapshot_dir) {
                tracing::warn!(tick, error = %e, "could not write snapshot");
            }
            if let Err(e) = output::write_current_state(&snapshot, &args.output_dir) {
                tracing::warn!(tick, error = %e, "could not write current state");
            }
        }

        if tick % 100 == 0 {
            println!(
                "Tick {} / {} ({}) - {} active missions",
                tick,
                ticks,
                sim.colony().clock,
                sim.missions().len()
            );
        }
    }

    let final_snapshot = output::generate_snapshot(&sim, &mut generator);
    output::write_snapshot_to_dir(&final_snapshot, &snapshot_dir)?;
    output::write_current_state(&final_snapshot, &args.output_dir)?;

    // close out whatever was still running
    let closing = sim.shutdown();
    logger.log_batch(&closing)?;
    summary.record_events(&closing);
    logger.flush()?;
    summary.write(args.output_dir.join("stats.json"))?;

    println!();
    println!(
        "Simulation complete. Ran {} ticks (ending on {}).",
        sim.current_tick(),
        sim.colony().clock
    );
    println!("Logged {} events.", logger.event_count());
    println!("Generated {} snapshots.", generator.snapshot_count());
    println!();
    print!("{}", summary);
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    if args.print_default_config {
        match SchedulerConfig::default().to_toml() {
            Ok(toml) => print!("{}", toml),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
