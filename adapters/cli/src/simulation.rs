//! Scripted scenario that wires the world, movement and work stations together.

use std::{collections::BTreeMap, time::Duration};

use anyhow::{Context, Result};
use gridwalk_core::{CellCoord, Command, EntityId, Event, GridConfig, VitalsEvent};
use gridwalk_system_movement::Movement;
use gridwalk_system_work::{EntityTag, StationId, WorkAction, WorkStations, DEFAULT_COOLDOWN};
use gridwalk_world::{self as world, query, World};

/// Entity controlled by the player.
pub(crate) const PLAYER: EntityId = EntityId::new(0);
/// Non-player character patrolling past the work station.
pub(crate) const WORKER: EntityId = EntityId::new(1);

const STATION_CELL: CellCoord = CellCoord::new(2, 0, 2);
const STATION_EMOTE: usize = 0;

#[derive(Debug)]
struct Profile {
    tag: EntityTag,
    animation_lengths: Vec<Duration>,
}

/// Deterministic two-entity walk across a small grid.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    movement: Movement,
    stations: WorkStations,
    station_cells: BTreeMap<CellCoord, StationId>,
    profiles: BTreeMap<EntityId, Profile>,
}

impl Simulation {
    /// Builds the scripted scenario on the provided grid.
    ///
    /// The player walks along the x axis while the worker walks the opposite
    /// way two rows further and passes the work station on its way.
    pub(crate) fn scripted(grid: GridConfig, speed: f32) -> Result<Self> {
        let movement = Movement::new(speed).context("invalid [movement] section")?;
        let mut simulation = Self {
            world: World::new(grid),
            movement,
            stations: WorkStations::default(),
            station_cells: BTreeMap::new(),
            profiles: BTreeMap::new(),
        };

        let station = simulation.stations.add(STATION_EMOTE, DEFAULT_COOLDOWN);
        let _ = simulation.station_cells.insert(STATION_CELL, station);

        simulation.spawn(
            PLAYER,
            CellCoord::new(0, 0, 0),
            (1..=4).map(|x| CellCoord::new(x, 0, 0)),
            Profile {
                tag: EntityTag::Player,
                animation_lengths: vec![Duration::from_secs(1)],
            },
        )?;
        simulation.spawn(
            WORKER,
            CellCoord::new(4, 0, 2),
            (0..=3).rev().map(|x| CellCoord::new(x, 0, 2)),
            Profile {
                tag: EntityTag::Npc,
                animation_lengths: vec![Duration::from_millis(1500)],
            },
        )?;

        Ok(simulation)
    }

    fn spawn<I>(
        &mut self,
        entity: EntityId,
        cell: CellCoord,
        path: I,
        profile: Profile,
    ) -> Result<()>
    where
        I: IntoIterator<Item = CellCoord>,
    {
        let tracker = query::tracker(&self.world);
        let position = tracker.cell_to_world(cell);
        let mut commands = Vec::new();
        let _ = self
            .movement
            .track(entity, position, tracker, &mut commands)
            .with_context(|| format!("entity {} could not be placed", entity.get()))?;
        let _ = self.movement.queue_path(entity, path);
        let _ = self.profiles.insert(entity, profile);
        let _ = self.apply_all(commands);
        Ok(())
    }

    /// Read-only access to the simulated world.
    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Movement system driving the entities.
    pub(crate) fn movement(&self) -> &Movement {
        &self.movement
    }

    /// Runs `ticks` steps of `dt` each, returning every event produced.
    pub(crate) fn run(&mut self, ticks: u32, dt: Duration) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(self.step(dt)?);
        }
        Ok(events)
    }

    /// Advances the scenario by a single tick.
    pub(crate) fn step(&mut self, dt: Duration) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);

        for action in self.stations.tick(dt) {
            self.perform(action);
        }

        let mut commands = Vec::new();
        self.movement
            .handle(&events, query::tracker(&self.world), &mut commands);
        let applied = self.apply_all(commands);
        let reactions = self.react(&applied)?;

        events.extend(applied);
        events.extend(reactions);
        Ok(events)
    }

    fn react(&mut self, events: &[Event]) -> Result<Vec<Event>> {
        let mut commands = Vec::new();
        for event in events {
            let Event::LastPositionSet { entity, cell } = *event else {
                continue;
            };

            if entity == PLAYER {
                commands.push(Command::ChangeScore { delta: 1 });
            }

            let Some(&station) = self.station_cells.get(&cell) else {
                continue;
            };
            let Some(profile) = self.profiles.get(&entity) else {
                continue;
            };
            let actions = self
                .stations
                .enter(station, entity, profile.tag, &profile.animation_lengths)
                .with_context(|| format!("entity {} could not start working", entity.get()))?;
            for action in actions {
                self.perform(action);
            }
        }
        Ok(self.apply_all(commands))
    }

    fn perform(&mut self, action: WorkAction) {
        match action {
            WorkAction::StopMovement { entity } => {
                let _ = self.movement.set_halted(entity, true);
            }
            WorkAction::PlayEmote {
                entity,
                emote_index,
            } => {
                tracing::info!(entity = entity.get(), emote_index, "playing emote");
            }
            WorkAction::ResumeMovement { entity } => {
                let _ = self.movement.set_halted(entity, false);
            }
        }
    }

    fn apply_all(&mut self, commands: Vec<Command>) -> Vec<Event> {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        for event in &events {
            if let Event::Vitals(VitalsEvent::LevelFailed) = event {
                tracing::warn!("level failed");
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_completion() -> Simulation {
        let mut simulation =
            Simulation::scripted(GridConfig::default(), 1.0).expect("scenario builds");
        let _ = simulation
            .run(40, Duration::from_millis(250))
            .expect("scenario runs");
        simulation
    }

    #[test]
    fn entities_reach_their_final_cells() {
        let simulation = run_to_completion();
        let tracker = query::tracker(simulation.world());

        assert_eq!(tracker.last_position(PLAYER), Some(CellCoord::new(4, 0, 0)));
        assert_eq!(tracker.last_position(WORKER), Some(CellCoord::new(0, 0, 2)));
        assert_eq!(
            tracker.occupied_cells(),
            vec![CellCoord::new(0, 0, 2), CellCoord::new(4, 0, 0)]
        );
        assert!(simulation.movement().is_idle(PLAYER));
        assert!(simulation.movement().is_idle(WORKER));
    }

    #[test]
    fn player_scores_once_per_cell() {
        let simulation = run_to_completion();
        assert_eq!(query::vitals(simulation.world()).score(), 4);
    }

    #[test]
    fn worker_pauses_at_the_station() {
        let mut simulation =
            Simulation::scripted(GridConfig::default(), 1.0).expect("scenario builds");
        let _ = simulation
            .run(8, Duration::from_millis(250))
            .expect("scenario runs");

        let tracker = query::tracker(simulation.world());
        assert_eq!(tracker.last_position(WORKER), Some(STATION_CELL));
        assert!(!simulation.movement().is_moving(WORKER));

        let _ = simulation
            .run(4, Duration::from_millis(250))
            .expect("scenario runs");
        assert_eq!(
            query::tracker(simulation.world()).last_position(WORKER),
            Some(STATION_CELL)
        );

        let _ = simulation
            .run(8, Duration::from_millis(250))
            .expect("scenario runs");
        assert_ne!(
            query::tracker(simulation.world()).last_position(WORKER),
            Some(STATION_CELL)
        );
    }
}
