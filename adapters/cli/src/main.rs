#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for the Gridwalk occupancy tracker.

mod config;
mod simulation;
mod snapshot_transfer;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec3;
use gridwalk_core::GridConfig;
use gridwalk_world::{query, GridTracker};
use tracing_subscriber::EnvFilter;

use crate::{
    config::CliConfig,
    simulation::{Simulation, PLAYER, WORKER},
    snapshot_transfer::OccupancySnapshot,
};

#[derive(Debug, Parser)]
#[command(name = "gridwalk", version, about = "Grid occupancy tracker playground")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Converts a world-space position into grid coordinates.
    ToGrid(PointArgs),
    /// Converts grid coordinates into a world-space position.
    ToWorld(PointArgs),
    /// Runs the scripted scenario and prints the resulting occupancy.
    Simulate(RunArgs),
    /// Runs the scripted scenario and prints a snapshot transfer string.
    Snapshot(RunArgs),
    /// Decodes a snapshot transfer string.
    Inspect {
        /// String produced by the `snapshot` command.
        encoded: String,
    },
}

#[derive(Debug, clap::Args)]
struct PointArgs {
    #[arg(allow_negative_numbers = true)]
    x: f32,
    #[arg(allow_negative_numbers = true)]
    y: f32,
    #[arg(allow_negative_numbers = true)]
    z: f32,
}

impl PointArgs {
    fn to_vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 40)]
    ticks: u32,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 250)]
    dt_ms: u64,
}

/// Entry point for the Gridwalk command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;
    init_tracing(&config.logging.filter);

    let grid = config.grid_config()?;
    match cli.command {
        CliCommand::ToGrid(point) => {
            let tracker = GridTracker::new(grid);
            println!("{}", format_vec3(tracker.to_grid_coordinate(point.to_vec3())));
        }
        CliCommand::ToWorld(point) => {
            let tracker = GridTracker::new(grid);
            println!("{}", format_vec3(tracker.to_world_position(point.to_vec3())));
        }
        CliCommand::Simulate(run) => {
            let simulation = run_scenario(grid, &config, &run)?;
            print_summary(&simulation);
        }
        CliCommand::Snapshot(run) => {
            let simulation = run_scenario(grid, &config, &run)?;
            let snapshot = OccupancySnapshot::capture(query::tracker(simulation.world()));
            println!("{}", snapshot.encode()?);
        }
        CliCommand::Inspect { encoded } => {
            let snapshot =
                OccupancySnapshot::decode(&encoded).context("failed to decode snapshot")?;
            let tracker = snapshot.restore()?;
            print_tracker(&tracker);
        }
    }

    Ok(())
}

fn init_tracing(fallback_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_scenario(grid: GridConfig, config: &CliConfig, run: &RunArgs) -> Result<Simulation> {
    let mut simulation = Simulation::scripted(grid, config.movement.speed)?;
    let events = simulation.run(run.ticks, Duration::from_millis(run.dt_ms))?;
    tracing::info!(ticks = run.ticks, events = events.len(), "scenario finished");
    Ok(simulation)
}

fn print_summary(simulation: &Simulation) {
    let world = simulation.world();
    let vitals = query::vitals(world);
    println!("ticks: {}", query::tick_index(world));
    println!(
        "health: {}/{}  score: {}",
        vitals.health(),
        vitals.max_health(),
        vitals.score()
    );
    for entity in [PLAYER, WORKER] {
        if let Some(position) = simulation.movement().position(entity) {
            println!("entity {} at {}", entity.get(), format_vec3(position));
        }
    }
    print_tracker(query::tracker(world));
}

fn print_tracker(tracker: &GridTracker) {
    let config = tracker.config();
    println!(
        "grid: origin {} cell size {}",
        format_vec3(config.origin()),
        config.cell_size()
    );
    println!("occupied: {}", tracker.occupied_count());
    for cell in tracker.occupied_cells() {
        println!(
            "  ({}, {}, {}) at {}",
            cell.x(),
            cell.y(),
            cell.z(),
            format_vec3(tracker.cell_to_world(cell))
        );
    }
    for (entity, cell) in tracker.last_positions() {
        let next = tracker
            .next_position(entity)
            .map_or_else(|| "-".to_owned(), |next| format!("{next:?}"));
        println!("entity {}: last {cell:?} next {next}", entity.get());
    }
}

fn format_vec3(value: Vec3) -> String {
    format!("{:.3} {:.3} {:.3}", value.x, value.y, value.z)
}
