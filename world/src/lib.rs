#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Gridwalk.

mod tracker;
mod vitals;

use gridwalk_core::{Command, Event, GridConfig};

pub use tracker::GridTracker;
pub use vitals::{PlayerVitals, RESPAWN_DELAY, STARTING_HEALTH};

/// Represents the authoritative Gridwalk world state.
#[derive(Debug)]
pub struct World {
    tracker: GridTracker,
    vitals: PlayerVitals,
    tick_index: u64,
}

impl World {
    /// Creates a new world whose grid follows the provided configuration.
    #[must_use]
    pub fn new(config: GridConfig) -> Self {
        Self {
            tracker: GridTracker::new(config),
            vitals: PlayerVitals::startup(),
            tick_index: 0,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Occupancy events are only reported when the occupied set actually changed.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::OccupyCell { cell } => {
            if world.tracker.occupy(cell) {
                out_events.push(Event::CellOccupied { cell });
            }
        }
        Command::FreeCell { cell } => {
            if world.tracker.free(cell) {
                out_events.push(Event::CellFreed { cell });
            }
        }
        Command::SetNextPosition { entity, cell } => {
            world.tracker.set_next_position(entity, cell);
            out_events.push(Event::NextPositionSet { entity, cell });
        }
        Command::SetLastPosition { entity, cell } => {
            world.tracker.set_last_position(entity, cell);
            out_events.push(Event::LastPositionSet { entity, cell });
        }
        Command::ForgetEntity { entity } => {
            if world.tracker.forget(entity) {
                out_events.push(Event::EntityForgotten { entity });
            }
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            out_events.extend(world.vitals.tick(dt).into_iter().map(Event::Vitals));
        }
        Command::ChangeHealth { delta } => {
            out_events.extend(world.vitals.change_health(delta).into_iter().map(Event::Vitals));
        }
        Command::ChangeScore { delta } => {
            out_events.extend(world.vitals.change_score(delta).into_iter().map(Event::Vitals));
        }
        Command::UpdateCheckpoint { position } => {
            out_events.push(Event::Vitals(world.vitals.update_checkpoint(position)));
        }
        Command::RespawnFull => {
            out_events.push(Event::Vitals(world.vitals.respawn_full()));
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use gridwalk_core::{GridConfig, OccupancyView};

    use super::{GridTracker, PlayerVitals, World};

    /// Provides read-only access to the occupancy tracker.
    #[must_use]
    pub fn tracker(world: &World) -> &GridTracker {
        &world.tracker
    }

    /// Exposes a read-only view of the occupied cells.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        world.tracker.view()
    }

    /// Provides read-only access to the grid configuration.
    #[must_use]
    pub fn grid_config(world: &World) -> &GridConfig {
        world.tracker.config()
    }

    /// Provides read-only access to the player's vitals.
    #[must_use]
    pub fn vitals(world: &World) -> &PlayerVitals {
        &world.vitals
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}
