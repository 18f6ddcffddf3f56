#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tick movement system that walks entities from cell to cell.
//!
//! Entities travel along queued waypoint cells. Before leaving its resting
//! cell an entity claims the next one by occupying it and recording it as its
//! next position; once it arrives it frees the cell it left and records the
//! new one as its last position. All mutations are emitted as commands for
//! the world to apply.

use std::collections::{BTreeMap, HashSet, VecDeque};

use glam::Vec3;
use gridwalk_core::{CellCoord, Command, EntityId, Event};
use gridwalk_world::GridTracker;
use thiserror::Error;

/// Travel speed used when none is configured, in world units per second.
pub const DEFAULT_SPEED: f32 = 4.0;

/// Reasons the movement system may refuse a request.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum MovementError {
    /// Speed was zero, negative, or not finite.
    #[error("movement speed must be positive and finite, got {0}")]
    InvalidSpeed(f32),
    /// The start cell is already held by another entity.
    #[error("cell {0:?} is already occupied")]
    CellOccupied(CellCoord),
}

/// Pure system that reacts to world events and emits occupancy commands.
#[derive(Debug)]
pub struct Movement {
    speed: f32,
    walkers: BTreeMap<EntityId, Walker>,
}

impl Movement {
    /// Creates a movement system travelling at `speed` world units per second.
    pub fn new(speed: f32) -> Result<Self, MovementError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(MovementError::InvalidSpeed(speed));
        }
        Ok(Self {
            speed,
            walkers: BTreeMap::new(),
        })
    }

    /// Travel speed in world units per second.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Starts tracking an entity standing at `world_position`.
    ///
    /// The entity is snapped onto the nearest cell, which it claims and
    /// records as its last position. Re-tracking an entity replaces it. A cell
    /// held by any other entity is refused.
    pub fn track(
        &mut self,
        entity: EntityId,
        world_position: Vec3,
        tracker: &GridTracker,
        out: &mut Vec<Command>,
    ) -> Result<CellCoord, MovementError> {
        let config = tracker.config();
        let cell = CellCoord::nearest(config.to_grid(world_position));
        let held_by_self = self
            .walkers
            .get(&entity)
            .map_or(false, |walker| walker.holds(cell));
        let held_by_other = self
            .walkers
            .iter()
            .any(|(other, walker)| *other != entity && walker.holds(cell));
        if held_by_other || (tracker.is_occupied(cell) && !held_by_self) {
            tracing::warn!(entity = entity.get(), ?cell, "start cell already occupied");
            return Err(MovementError::CellOccupied(cell));
        }

        tracing::debug!(entity = entity.get(), ?cell, "tracking entity");
        if let Some(previous) = self.walkers.insert(
            entity,
            Walker::resting_at(config.to_world(cell.as_grid_position()), cell),
        ) {
            previous.release(out);
        }
        out.push(Command::OccupyCell { cell });
        out.push(Command::SetLastPosition { entity, cell });
        Ok(cell)
    }

    /// Stops tracking an entity, releasing every cell it held.
    pub fn untrack(&mut self, entity: EntityId, out: &mut Vec<Command>) -> bool {
        let Some(walker) = self.walkers.remove(&entity) else {
            return false;
        };
        walker.release(out);
        out.push(Command::ForgetEntity { entity });
        true
    }

    /// Appends waypoint cells to the entity's route.
    ///
    /// Returns `false` if the entity is not tracked.
    pub fn queue_path<I>(&mut self, entity: EntityId, cells: I) -> bool
    where
        I: IntoIterator<Item = CellCoord>,
    {
        let Some(walker) = self.walkers.get_mut(&entity) else {
            tracing::warn!(entity = entity.get(), "path queued for untracked entity");
            return false;
        };
        walker.waypoints.extend(cells);
        true
    }

    /// Freezes or releases an entity; halted entities keep their claims.
    pub fn set_halted(&mut self, entity: EntityId, halted: bool) -> bool {
        match self.walkers.get_mut(&entity) {
            Some(walker) => {
                walker.halted = halted;
                true
            }
            None => false,
        }
    }

    /// Current world position of the entity.
    #[must_use]
    pub fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.walkers.get(&entity).map(|walker| walker.position)
    }

    /// Whether the entity is travelling between two cells.
    #[must_use]
    pub fn is_moving(&self, entity: EntityId) -> bool {
        self.walkers
            .get(&entity)
            .map_or(false, |walker| walker.destination.is_some())
    }

    /// Whether the entity has no destination and no queued waypoints.
    #[must_use]
    pub fn is_idle(&self, entity: EntityId) -> bool {
        self.walkers.get(&entity).map_or(true, |walker| {
            walker.destination.is_none() && walker.waypoints.is_empty()
        })
    }

    /// Consumes world events and the tracker state to emit movement commands.
    ///
    /// The tracker is not updated until the emitted commands are applied, so
    /// claims and releases made earlier in the same batch are tracked here.
    pub fn handle(&mut self, events: &[Event], tracker: &GridTracker, out: &mut Vec<Command>) {
        let mut pending = PendingOccupancy::new(tracker);
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                self.advance(dt.as_secs_f32(), &mut pending, out);
            }
        }
    }

    fn advance(
        &mut self,
        seconds: f32,
        pending: &mut PendingOccupancy<'_>,
        out: &mut Vec<Command>,
    ) {
        let budget = self.speed * seconds;
        for (entity, walker) in &mut self.walkers {
            if walker.halted {
                continue;
            }
            walker.advance(*entity, budget, pending, out);
        }
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            walkers: BTreeMap::new(),
        }
    }
}

/// Tracker occupancy overlaid with the commands emitted but not yet applied.
struct PendingOccupancy<'a> {
    tracker: &'a GridTracker,
    claimed: HashSet<CellCoord>,
    released: HashSet<CellCoord>,
}

impl<'a> PendingOccupancy<'a> {
    fn new(tracker: &'a GridTracker) -> Self {
        Self {
            tracker,
            claimed: HashSet::new(),
            released: HashSet::new(),
        }
    }

    fn is_free(&self, cell: CellCoord) -> bool {
        if self.claimed.contains(&cell) {
            return false;
        }
        self.released.contains(&cell) || !self.tracker.is_occupied(cell)
    }

    fn claim(&mut self, cell: CellCoord) {
        let _ = self.released.remove(&cell);
        let _ = self.claimed.insert(cell);
    }

    fn release(&mut self, cell: CellCoord) {
        let _ = self.claimed.remove(&cell);
        let _ = self.released.insert(cell);
    }
}

#[derive(Clone, Debug)]
struct Walker {
    position: Vec3,
    resting: CellCoord,
    destination: Option<CellCoord>,
    waypoints: VecDeque<CellCoord>,
    halted: bool,
}

impl Walker {
    fn resting_at(position: Vec3, cell: CellCoord) -> Self {
        Self {
            position,
            resting: cell,
            destination: None,
            waypoints: VecDeque::new(),
            halted: false,
        }
    }

    fn holds(&self, cell: CellCoord) -> bool {
        self.resting == cell || self.destination == Some(cell)
    }

    fn release(&self, out: &mut Vec<Command>) {
        out.push(Command::FreeCell { cell: self.resting });
        if let Some(cell) = self.destination {
            out.push(Command::FreeCell { cell });
        }
    }

    fn advance(
        &mut self,
        entity: EntityId,
        mut budget: f32,
        pending: &mut PendingOccupancy<'_>,
        out: &mut Vec<Command>,
    ) {
        loop {
            let destination = match self.destination {
                Some(cell) => cell,
                None => {
                    let Some(next) = self.waypoints.front().copied() else {
                        return;
                    };
                    if next == self.resting {
                        let _ = self.waypoints.pop_front();
                        continue;
                    }
                    if !pending.is_free(next) {
                        tracing::trace!(entity = entity.get(), cell = ?next, "waiting for cell");
                        return;
                    }
                    let _ = self.waypoints.pop_front();
                    pending.claim(next);
                    out.push(Command::OccupyCell { cell: next });
                    out.push(Command::SetNextPosition { entity, cell: next });
                    self.destination = Some(next);
                    next
                }
            };

            let target = pending.tracker.cell_to_world(destination);
            let offset = target - self.position;
            let distance = offset.length();
            if distance > budget {
                self.position += offset * (budget / distance);
                return;
            }

            budget -= distance;
            self.position = target;
            pending.release(self.resting);
            out.push(Command::FreeCell { cell: self.resting });
            out.push(Command::SetLastPosition {
                entity,
                cell: destination,
            });
            tracing::debug!(entity = entity.get(), cell = ?destination, "entity arrived");
            self.resting = destination;
            self.destination = None;
            if budget <= 0.0 {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gridwalk_core::GridConfig;

    use super::*;

    #[test]
    fn rejects_non_positive_speed() {
        assert_eq!(
            Movement::new(0.0).unwrap_err(),
            MovementError::InvalidSpeed(0.0)
        );
        assert!(Movement::new(-2.0).is_err());
        assert!(Movement::new(f32::INFINITY).is_err());
        assert!(Movement::new(1.5).is_ok());
    }

    #[test]
    fn track_snaps_to_nearest_cell() {
        let mut movement = Movement::default();
        let tracker = GridTracker::new(GridConfig::default());
        let mut out = Vec::new();
        let entity = EntityId::new(1);

        let cell = movement
            .track(entity, Vec3::new(2.4, 0.0, 3.7), &tracker, &mut out)
            .expect("cell is free");

        assert_eq!(cell, CellCoord::new(2, 0, 4));
        assert_eq!(movement.position(entity), Some(Vec3::new(2.0, 0.0, 4.0)));
        assert_eq!(
            out,
            vec![
                Command::OccupyCell { cell },
                Command::SetLastPosition { entity, cell },
            ]
        );
    }

    #[test]
    fn track_refuses_cell_held_by_another_walker() {
        let mut movement = Movement::default();
        let tracker = GridTracker::new(GridConfig::default());
        let mut out = Vec::new();
        let _ = movement
            .track(EntityId::new(1), Vec3::ZERO, &tracker, &mut out)
            .expect("cell is free");

        let error = movement
            .track(EntityId::new(2), Vec3::new(0.2, 0.0, 0.0), &tracker, &mut out)
            .unwrap_err();
        assert_eq!(error, MovementError::CellOccupied(CellCoord::new(0, 0, 0)));
        assert_eq!(movement.position(EntityId::new(2)), None);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn retracking_onto_own_cell_is_allowed() {
        let mut movement = Movement::default();
        let mut tracker = GridTracker::new(GridConfig::default());
        let entity = EntityId::new(4);
        let mut out = Vec::new();
        let _ = movement
            .track(entity, Vec3::ZERO, &tracker, &mut out)
            .expect("cell is free");
        let _ = tracker.occupy(CellCoord::new(0, 0, 0));
        out.clear();

        let cell = movement
            .track(entity, Vec3::new(-0.3, 0.0, 0.1), &tracker, &mut out)
            .expect("own cell");
        assert_eq!(cell, CellCoord::new(0, 0, 0));
        assert_eq!(
            out,
            vec![
                Command::FreeCell { cell },
                Command::OccupyCell { cell },
                Command::SetLastPosition { entity, cell },
            ]
        );
    }

    #[test]
    fn batched_ticks_do_not_double_claim() {
        let mut movement = Movement::new(1.0).expect("valid speed");
        let mut tracker = GridTracker::new(GridConfig::default());
        let first = EntityId::new(1);
        let second = EntityId::new(2);
        let mut out = Vec::new();
        let _ = movement
            .track(first, Vec3::ZERO, &tracker, &mut out)
            .expect("cell is free");
        let _ = movement
            .track(second, Vec3::new(2.0, 0.0, 0.0), &tracker, &mut out)
            .expect("cell is free");
        let _ = tracker.occupy(CellCoord::new(0, 0, 0));
        let _ = tracker.occupy(CellCoord::new(2, 0, 0));
        assert!(movement.queue_path(first, [CellCoord::new(1, 0, 0)]));
        assert!(movement.queue_path(second, [CellCoord::new(1, 0, 0)]));
        out.clear();

        let dt = Duration::from_millis(100);
        movement.handle(
            &[Event::TimeAdvanced { dt }, Event::TimeAdvanced { dt }],
            &tracker,
            &mut out,
        );

        let claims = out
            .iter()
            .filter(|command| {
                **command
                    == Command::OccupyCell {
                        cell: CellCoord::new(1, 0, 0),
                    }
            })
            .count();
        assert_eq!(claims, 1);
        assert!(movement.is_moving(first));
        assert!(!movement.is_moving(second));
    }

    #[test]
    fn cell_released_earlier_in_batch_can_be_claimed() {
        let mut movement = Movement::new(1.0).expect("valid speed");
        let mut tracker = GridTracker::new(GridConfig::default());
        let leader = EntityId::new(1);
        let follower = EntityId::new(2);
        let mut out = Vec::new();
        let _ = movement
            .track(leader, Vec3::new(1.0, 0.0, 0.0), &tracker, &mut out)
            .expect("cell is free");
        let _ = movement
            .track(follower, Vec3::ZERO, &tracker, &mut out)
            .expect("cell is free");
        let _ = tracker.occupy(CellCoord::new(0, 0, 0));
        let _ = tracker.occupy(CellCoord::new(1, 0, 0));
        assert!(movement.queue_path(leader, [CellCoord::new(2, 0, 0)]));
        assert!(movement.queue_path(follower, [CellCoord::new(1, 0, 0)]));
        out.clear();

        let dt = Duration::from_secs(1);
        movement.handle(
            &[Event::TimeAdvanced { dt }, Event::TimeAdvanced { dt }],
            &tracker,
            &mut out,
        );

        assert!(out.contains(&Command::SetLastPosition {
            entity: follower,
            cell: CellCoord::new(1, 0, 0),
        }));
        assert!(movement.is_idle(leader));
        assert!(movement.is_idle(follower));
    }

    #[test]
    fn queue_path_requires_tracked_entity() {
        let mut movement = Movement::default();
        assert!(!movement.queue_path(EntityId::new(9), [CellCoord::new(1, 0, 0)]));
        assert!(movement.is_idle(EntityId::new(9)));
    }

    #[test]
    fn untrack_releases_claims() {
        let mut movement = Movement::default();
        let tracker = GridTracker::new(GridConfig::default());
        let mut out = Vec::new();
        let entity = EntityId::new(2);
        let _ = movement
            .track(entity, Vec3::ZERO, &tracker, &mut out)
            .expect("cell is free");
        out.clear();

        assert!(movement.untrack(entity, &mut out));
        assert!(!movement.untrack(entity, &mut out));
        assert_eq!(
            out,
            vec![
                Command::FreeCell {
                    cell: CellCoord::new(0, 0, 0)
                },
                Command::ForgetEntity { entity },
            ]
        );
    }
}
