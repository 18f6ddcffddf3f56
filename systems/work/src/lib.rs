#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Work stations that pause entities while they play an emote.
//!
//! When an eligible entity enters a station it is halted, asked to play the
//! station's emote, and released once the emote's animation length elapsed.
//! The station then refuses further entries until its cooldown ran out. All
//! delays are explicit countdowns advanced by [`WorkStations::tick`].

use std::{collections::BTreeMap, time::Duration};

use gridwalk_core::EntityId;
use thiserror::Error;

/// Time a station stays disabled after a worker finished.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10);

/// Unique identifier assigned to a work station.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId(u32);

impl StationId {
    /// Creates a new station identifier with the provided numeric value.
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

/// Category of an entity entering a station.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityTag {
    /// Non-player character.
    Npc,
    /// The player.
    Player,
    /// Anything else; never triggers a station.
    Untagged,
}

impl EntityTag {
    const fn triggers_work(self) -> bool {
        matches!(self, Self::Npc | Self::Player)
    }
}

/// Instructions a station issues to the entity it is serving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkAction {
    /// The entity must stop moving.
    StopMovement {
        /// Entity that started working.
        entity: EntityId,
    },
    /// The entity should play the station's emote.
    PlayEmote {
        /// Entity that started working.
        entity: EntityId,
        /// Index into the entity's emote animations.
        emote_index: usize,
    },
    /// The entity may move again.
    ResumeMovement {
        /// Entity that finished working.
        entity: EntityId,
    },
}

/// Errors raised when serving an entity at a station.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum WorkError {
    /// No station is registered under the identifier.
    #[error("no work station registered as {0:?}")]
    UnknownStation(StationId),
    /// The entity has no animation for the station's emote.
    #[error("entity provides {available} animations but the station plays emote {emote_index}")]
    MissingAnimation {
        /// Emote the station plays.
        emote_index: usize,
        /// Number of animation lengths the entity provided.
        available: usize,
    },
}

/// Read-only state of a single station.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkStation {
    emote_index: usize,
    cooldown: Duration,
    cooldown_remaining: Option<Duration>,
    workers: BTreeMap<EntityId, Duration>,
}

impl WorkStation {
    fn new(emote_index: usize, cooldown: Duration) -> Self {
        Self {
            emote_index,
            cooldown,
            cooldown_remaining: None,
            workers: BTreeMap::new(),
        }
    }

    /// Emote played by entities working here.
    #[must_use]
    pub const fn emote_index(&self) -> usize {
        self.emote_index
    }

    /// Whether the station currently accepts entries.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.cooldown_remaining.is_none()
    }

    /// Whether the entity is working at this station.
    #[must_use]
    pub fn is_serving(&self, entity: EntityId) -> bool {
        self.workers.contains_key(&entity)
    }

    fn tick(&mut self, dt: Duration, out: &mut Vec<WorkAction>) {
        if let Some(remaining) = self.cooldown_remaining {
            let remaining = remaining.saturating_sub(dt);
            self.cooldown_remaining = (!remaining.is_zero()).then_some(remaining);
        }

        let mut finished = Vec::new();
        for (entity, remaining) in &mut self.workers {
            *remaining = remaining.saturating_sub(dt);
            if remaining.is_zero() {
                finished.push(*entity);
            }
        }

        for entity in finished {
            let _ = self.workers.remove(&entity);
            out.push(WorkAction::ResumeMovement { entity });
            self.cooldown_remaining = Some(self.cooldown).filter(|cooldown| !cooldown.is_zero());
        }
    }
}

/// Registry of every work station in the level.
#[derive(Debug, Default)]
pub struct WorkStations {
    stations: BTreeMap<StationId, WorkStation>,
    next_station_id: u32,
}

impl WorkStations {
    /// Registers a station that plays `emote_index` and cools down for `cooldown`.
    pub fn add(&mut self, emote_index: usize, cooldown: Duration) -> StationId {
        let id = StationId::new(self.next_station_id);
        self.next_station_id = self.next_station_id.saturating_add(1);
        let _ = self
            .stations
            .insert(id, WorkStation::new(emote_index, cooldown));
        id
    }

    /// Looks up a station by identifier.
    #[must_use]
    pub fn station(&self, id: StationId) -> Option<&WorkStation> {
        self.stations.get(&id)
    }

    /// Handles an entity entering the station's trigger.
    ///
    /// `animation_lengths` lists the entity's emote durations, indexed by emote.
    /// Untagged entities, disabled stations and entities already working there
    /// produce no actions.
    pub fn enter(
        &mut self,
        id: StationId,
        entity: EntityId,
        tag: EntityTag,
        animation_lengths: &[Duration],
    ) -> Result<Vec<WorkAction>, WorkError> {
        let station = self
            .stations
            .get_mut(&id)
            .ok_or(WorkError::UnknownStation(id))?;

        if !tag.triggers_work() || !station.is_enabled() || station.is_serving(entity) {
            return Ok(Vec::new());
        }

        let emote_index = station.emote_index;
        let length = animation_lengths
            .get(emote_index)
            .copied()
            .ok_or(WorkError::MissingAnimation {
                emote_index,
                available: animation_lengths.len(),
            })?;

        tracing::debug!(
            station = id.get(),
            entity = entity.get(),
            ?length,
            "entity started working"
        );
        let _ = station.workers.insert(entity, length);
        Ok(vec![
            WorkAction::StopMovement { entity },
            WorkAction::PlayEmote {
                entity,
                emote_index,
            },
        ])
    }

    /// Advances every work timer and cooldown by `dt`.
    pub fn tick(&mut self, dt: Duration) -> Vec<WorkAction> {
        let mut actions = Vec::new();
        for station in self.stations.values_mut() {
            station.tick(dt, &mut actions);
        }
        actions
    }
}
