//! Occupancy bookkeeping for entities travelling on the grid.

use std::collections::{HashMap, HashSet};

use glam::Vec3;
use gridwalk_core::{CellCoord, EntityId, GridConfig, OccupancyView};

/// Registry of occupied cells plus the last and next cell of every tracked entity.
///
/// The last position is the cell an entity rested on the last time it was
/// exactly aligned with the grid; the next position is the cell it will occupy
/// once it reaches its current destination. Neither mapping expires on its own.
#[derive(Clone, Debug)]
pub struct GridTracker {
    config: GridConfig,
    occupied: HashSet<CellCoord>,
    last_positions: HashMap<EntityId, CellCoord>,
    next_positions: HashMap<EntityId, CellCoord>,
}

impl GridTracker {
    /// Creates an empty tracker laid out according to the provided configuration.
    #[must_use]
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            occupied: HashSet::new(),
            last_positions: HashMap::new(),
            next_positions: HashMap::new(),
        }
    }

    /// Grid geometry used for coordinate conversion.
    #[must_use]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Reports whether the cell is currently occupied.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        self.occupied.contains(&cell)
    }

    /// Marks the cell as occupied, returning `true` if it was previously free.
    pub fn occupy(&mut self, cell: CellCoord) -> bool {
        let inserted = self.occupied.insert(cell);
        if inserted {
            tracing::debug!(?cell, "cell occupied");
        }
        inserted
    }

    /// Marks the cell as free, returning `true` if it was previously occupied.
    pub fn free(&mut self, cell: CellCoord) -> bool {
        let removed = self.occupied.remove(&cell);
        if removed {
            tracing::debug!(?cell, "cell freed");
        }
        removed
    }

    /// Records the cell the entity is travelling toward, replacing any earlier entry.
    pub fn set_next_position(&mut self, entity: EntityId, cell: CellCoord) {
        if let Some(previous) = self.next_positions.insert(entity, cell) {
            tracing::trace!(entity = entity.get(), ?previous, ?cell, "next position replaced");
        }
    }

    /// Records the cell the entity last rested on, replacing any earlier entry.
    pub fn set_last_position(&mut self, entity: EntityId, cell: CellCoord) {
        if let Some(previous) = self.last_positions.insert(entity, cell) {
            tracing::trace!(entity = entity.get(), ?previous, ?cell, "last position replaced");
        }
    }

    /// Cell the entity is travelling toward, if one was ever recorded.
    #[must_use]
    pub fn next_position(&self, entity: EntityId) -> Option<CellCoord> {
        self.next_positions.get(&entity).copied()
    }

    /// Cell the entity last rested on, if one was ever recorded.
    #[must_use]
    pub fn last_position(&self, entity: EntityId) -> Option<CellCoord> {
        self.last_positions.get(&entity).copied()
    }

    /// Drops both position entries of the entity. Occupied cells are left untouched.
    ///
    /// Returns `true` if any entry existed.
    pub fn forget(&mut self, entity: EntityId) -> bool {
        let had_last = self.last_positions.remove(&entity).is_some();
        let had_next = self.next_positions.remove(&entity).is_some();
        had_last || had_next
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.occupied.len()
    }

    /// Occupied cells in ascending order.
    #[must_use]
    pub fn occupied_cells(&self) -> Vec<CellCoord> {
        self.view().cells()
    }

    /// Entities with a recorded last position, ordered by identifier.
    #[must_use]
    pub fn last_positions(&self) -> Vec<(EntityId, CellCoord)> {
        sorted_entries(&self.last_positions)
    }

    /// Entities with a recorded next position, ordered by identifier.
    #[must_use]
    pub fn next_positions(&self) -> Vec<(EntityId, CellCoord)> {
        sorted_entries(&self.next_positions)
    }

    /// Converts a world-space position into continuous grid coordinates.
    ///
    /// The result is not snapped; use [`CellCoord::nearest`] to obtain a cell.
    #[must_use]
    pub fn to_grid_coordinate(&self, world_position: Vec3) -> Vec3 {
        self.config.to_grid(world_position)
    }

    /// Converts continuous grid coordinates into a world-space position.
    #[must_use]
    pub fn to_world_position(&self, grid_position: Vec3) -> Vec3 {
        self.config.to_world(grid_position)
    }

    /// World-space position of the cell's lattice point.
    #[must_use]
    pub fn cell_to_world(&self, cell: CellCoord) -> Vec3 {
        self.to_world_position(cell.as_grid_position())
    }

    /// Read-only view for collaborators that only observe occupancy.
    #[must_use]
    pub fn view(&self) -> OccupancyView<'_> {
        OccupancyView::new(&self.occupied, &self.config)
    }
}

fn sorted_entries(positions: &HashMap<EntityId, CellCoord>) -> Vec<(EntityId, CellCoord)> {
    let mut entries: Vec<_> = positions
        .iter()
        .map(|(entity, cell)| (*entity, *cell))
        .collect();
    entries.sort_unstable_by_key(|(entity, _)| *entity);
    entries
}
