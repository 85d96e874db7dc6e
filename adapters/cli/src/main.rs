#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Skyward session.

mod config;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Result};
use clap::Parser;

use crate::simulation::{RunSummary, Simulation};

/// Runs a scripted climb through the procedurally generated column.
#[derive(Parser, Debug)]
#[command(name = "skyward", version, about)]
struct Args {
    /// Session configuration file.
    #[arg(long, default_value = "assets/skyward.toml")]
    config: PathBuf,

    /// Overrides the session seed from the configuration.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 3_600)]
    ticks: u64,

    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 16)]
    dt_ms: u64,

    /// Overrides the autopilot climb speed in world units per second.
    #[arg(long)]
    climb_speed: Option<f32>,

    /// Enables debug logging unless `RUST_LOG` says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the Skyward command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.dt_ms == 0 {
        bail!("--dt-ms must be greater than zero");
    }

    let mut session = config::load(&args.config)?;
    if let Some(seed) = args.seed {
        session.seed = seed;
    }
    if let Some(climb_speed) = args.climb_speed {
        session.autopilot.climb_speed = climb_speed;
    }
    log::info!(
        "loaded {} zones from {} with seed {}",
        session.catalog.len(),
        args.config.display(),
        session.seed
    );

    let mut simulation = Simulation::new(session);
    println!("{}", simulation.banner());
    let dt = Duration::from_millis(args.dt_ms);
    for _ in 0..args.ticks {
        simulation.step(dt);
    }

    print_summary(&simulation.summary());
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .try_init();
}

fn print_summary(summary: &RunSummary) {
    println!("ticks:           {}", summary.ticks);
    println!("score:           {}", summary.score);
    println!("best score:      {}", summary.best_score);
    println!("stars:           {}", summary.stars);
    println!("power-ups:       {}", summary.power_ups_collected);
    println!("shield rescues:  {}", summary.shield_rescues);
    println!("restarts:        {}", summary.restarts);
    println!(
        "zone:            {}",
        summary.zone.as_deref().unwrap_or("<none>")
    );
    println!("live platforms:  {}", summary.live_platforms);
    println!("death floor:     {:.2}", summary.death_floor);
    println!("player height:   {:.2}", summary.player_height);
}
