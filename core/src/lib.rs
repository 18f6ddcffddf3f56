#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gridwalk workspace.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then reports [`Event`] values describing what
//! actually changed. Grid geometry lives in [`GridConfig`], which is validated
//! once at setup and immutable afterwards.

use std::{collections::HashSet, time::Duration};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Marks a cell as occupied.
    OccupyCell {
        /// Cell to claim.
        cell: CellCoord,
    },
    /// Marks a cell as unoccupied.
    FreeCell {
        /// Cell to release.
        cell: CellCoord,
    },
    /// Records the cell an entity is currently travelling toward.
    SetNextPosition {
        /// Entity whose destination changed.
        entity: EntityId,
        /// Cell the entity will occupy once it arrives.
        cell: CellCoord,
    },
    /// Records the cell an entity last passed through exactly.
    SetLastPosition {
        /// Entity that reached a cell.
        entity: EntityId,
        /// Cell the entity now rests on.
        cell: CellCoord,
    },
    /// Drops every position entry recorded for an entity.
    ForgetEntity {
        /// Entity that left the simulation.
        entity: EntityId,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Adds the provided amount to the player's health.
    ChangeHealth {
        /// Signed change; negative values deal damage.
        delta: i32,
    },
    /// Adds the provided amount to the player's score.
    ChangeScore {
        /// Signed change; the score never drops below zero.
        delta: i32,
    },
    /// Stores the world position of the most recently activated checkpoint.
    UpdateCheckpoint {
        /// World-space position of the checkpoint.
        position: Vec3,
    },
    /// Restores the player to full health.
    RespawnFull,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a previously free cell became occupied.
    CellOccupied {
        /// Cell that was claimed.
        cell: CellCoord,
    },
    /// Confirms that a previously occupied cell became free.
    CellFreed {
        /// Cell that was released.
        cell: CellCoord,
    },
    /// Confirms that an entity's next position was recorded.
    NextPositionSet {
        /// Entity whose destination was recorded.
        entity: EntityId,
        /// Recorded destination cell.
        cell: CellCoord,
    },
    /// Confirms that an entity's last position was recorded.
    LastPositionSet {
        /// Entity whose resting cell was recorded.
        entity: EntityId,
        /// Recorded resting cell.
        cell: CellCoord,
    },
    /// Confirms that all position entries of an entity were dropped.
    EntityForgotten {
        /// Entity that is no longer tracked.
        entity: EntityId,
    },
    /// Change notification emitted by the player's vitals.
    Vitals(VitalsEvent),
}

/// Notifications produced when the player's vitals or checkpoint change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VitalsEvent {
    /// The score changed; carries the clamped value.
    ScoreUpdated {
        /// Score after the change.
        score: u32,
    },
    /// The health changed; carries the clamped value.
    HealthUpdated {
        /// Health after the change.
        health: u32,
    },
    /// The player ran out of health or score.
    LevelFailed,
    /// A new checkpoint was recorded.
    CheckpointUpdated {
        /// World-space position of the checkpoint.
        position: Vec3,
    },
    /// The respawn delay elapsed and the player should return to the checkpoint.
    ReturnToCheckpoint {
        /// Last checkpoint recorded before the respawn fired.
        position: Vec3,
    },
}

/// Unique identifier assigned to a tracked entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as integral grid coordinates.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    x: i32,
    y: i32,
    z: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Cell that contains the lattice point nearest to a continuous grid position.
    ///
    /// Components outside the `i32` range saturate and `NaN` maps to zero.
    #[must_use]
    pub fn nearest(grid_position: Vec3) -> Self {
        let rounded = grid_position.round();
        Self {
            x: rounded.x as i32,
            y: rounded.y as i32,
            z: rounded.z as i32,
        }
    }

    /// Coordinate along the x axis.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Coordinate along the y axis.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Coordinate along the z axis.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }

    /// Lifts the cell into continuous grid space.
    #[must_use]
    pub fn as_grid_position(&self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

/// Reasons a grid configuration may be rejected during setup.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The cell size was zero or negative.
    #[error("cell size must be positive, got {0}")]
    NonPositiveCellSize(f32),
    /// The cell size was infinite or NaN.
    #[error("cell size must be finite, got {0}")]
    NonFiniteCellSize(f32),
    /// One of the origin components was infinite or NaN.
    #[error("grid origin must be finite, got {0}")]
    NonFiniteOrigin(Vec3),
}

/// Placement and scale of the grid in world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGridConfig")]
pub struct GridConfig {
    origin: Vec3,
    cell_size: f32,
}

impl GridConfig {
    /// Validates and creates a new grid configuration.
    pub fn new(origin: Vec3, cell_size: f32) -> Result<Self, ConfigError> {
        if !origin.is_finite() {
            return Err(ConfigError::NonFiniteOrigin(origin));
        }
        if !cell_size.is_finite() {
            return Err(ConfigError::NonFiniteCellSize(cell_size));
        }
        if cell_size <= 0.0 {
            return Err(ConfigError::NonPositiveCellSize(cell_size));
        }
        Ok(Self { origin, cell_size })
    }

    /// World-space position of the grid origin.
    #[must_use]
    pub const fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Edge length of a single cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Converts a world-space position into continuous grid coordinates.
    #[must_use]
    pub fn to_grid(&self, world_position: Vec3) -> Vec3 {
        (world_position - self.origin) / self.cell_size
    }

    /// Converts continuous grid coordinates into a world-space position.
    #[must_use]
    pub fn to_world(&self, grid_position: Vec3) -> Vec3 {
        self.origin + grid_position * self.cell_size
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            cell_size: 1.0,
        }
    }
}

#[derive(Deserialize)]
struct RawGridConfig {
    origin: Vec3,
    cell_size: f32,
}

impl TryFrom<RawGridConfig> for GridConfig {
    type Error = ConfigError;

    fn try_from(raw: RawGridConfig) -> Result<Self, Self::Error> {
        Self::new(raw.origin, raw.cell_size)
    }
}

/// Read-only view into the occupied cell set.
///
/// Handed to collaborators such as debug renderers that must observe the grid
/// without being able to mutate it.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    occupied: &'a HashSet<CellCoord>,
    config: &'a GridConfig,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided set.
    #[must_use]
    pub fn new(occupied: &'a HashSet<CellCoord>, config: &'a GridConfig) -> Self {
        Self { occupied, config }
    }

    /// Reports whether the cell is currently occupied.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        self.occupied.contains(&cell)
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    /// Whether no cell is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    /// Occupied cells in ascending order.
    #[must_use]
    pub fn cells(&self) -> Vec<CellCoord> {
        let mut cells: Vec<CellCoord> = self.occupied.iter().copied().collect();
        cells.sort_unstable();
        cells
    }

    /// Grid geometry the occupied cells are expressed in.
    #[must_use]
    pub fn config(&self) -> &'a GridConfig {
        self.config
    }
}
