//! Player health, score and checkpoint state.

use std::time::Duration;

use glam::Vec3;
use gridwalk_core::VitalsEvent;

/// Health and maximum health assigned when the player starts up.
pub const STARTING_HEALTH: u32 = 3;

/// Delay between a non-lethal health change and the return to the checkpoint.
pub const RESPAWN_DELAY: Duration = Duration::from_secs(2);

/// Health, score and respawn bookkeeping for the player.
///
/// Every mutation returns the notifications it produced instead of publishing
/// them; callers decide how to deliver them.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerVitals {
    health: u32,
    max_health: u32,
    score: u32,
    last_checkpoint: Vec3,
    pending_respawns: Vec<Duration>,
}

impl PlayerVitals {
    /// Creates vitals initialised with the starting health and a zero score.
    #[must_use]
    pub fn startup() -> Self {
        tracing::info!("player vitals starting");
        let mut vitals = Self {
            health: 0,
            max_health: 0,
            score: 0,
            last_checkpoint: Vec3::ZERO,
            pending_respawns: Vec::new(),
        };
        vitals.update_data(STARTING_HEALTH, STARTING_HEALTH);
        vitals
    }

    /// Overwrites the current and maximum health.
    pub fn update_data(&mut self, health: u32, max_health: u32) {
        self.health = health;
        self.max_health = max_health;
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Upper bound for health.
    #[must_use]
    pub const fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Current score.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Position of the most recently activated checkpoint.
    #[must_use]
    pub const fn last_checkpoint(&self) -> Vec3 {
        self.last_checkpoint
    }

    /// Time left on each pending respawn, soonest first.
    #[must_use]
    pub fn pending_respawns(&self) -> &[Duration] {
        &self.pending_respawns
    }

    /// Adds `delta` to the score, clamping at zero.
    ///
    /// A score of zero after the change fails the level.
    pub fn change_score(&mut self, delta: i32) -> Vec<VitalsEvent> {
        self.score = self.score.saturating_add_signed(delta);

        let mut events = vec![VitalsEvent::ScoreUpdated { score: self.score }];
        if self.score == 0 {
            tracing::info!("score depleted");
            events.push(VitalsEvent::LevelFailed);
        }
        events
    }

    /// Adds `delta` to the health, clamping to `0..=max_health`.
    ///
    /// Zero health fails the level; any other result schedules a respawn,
    /// healing included. Respawns scheduled by earlier changes stay pending
    /// and fire on their own. `HealthUpdated` is always reported last.
    pub fn change_health(&mut self, delta: i32) -> Vec<VitalsEvent> {
        self.health = self
            .health
            .saturating_add_signed(delta)
            .min(self.max_health);

        let mut events = Vec::with_capacity(2);
        if self.health == 0 {
            tracing::info!("health depleted");
            events.push(VitalsEvent::LevelFailed);
        } else {
            tracing::debug!(health = self.health, "respawn scheduled");
            self.pending_respawns.push(RESPAWN_DELAY);
        }
        events.push(VitalsEvent::HealthUpdated {
            health: self.health,
        });
        events
    }

    /// Stores the position of the checkpoint the player just activated.
    pub fn update_checkpoint(&mut self, position: Vec3) -> VitalsEvent {
        self.last_checkpoint = position;
        VitalsEvent::CheckpointUpdated { position }
    }

    /// Restores health to its maximum.
    pub fn respawn_full(&mut self) -> VitalsEvent {
        self.update_data(self.max_health, self.max_health);
        VitalsEvent::HealthUpdated {
            health: self.health,
        }
    }

    /// Advances every pending respawn by `dt`.
    ///
    /// Each respawn that elapses yields its own `ReturnToCheckpoint`.
    pub fn tick(&mut self, dt: Duration) -> Vec<VitalsEvent> {
        let position = self.last_checkpoint;
        let mut events = Vec::new();
        self.pending_respawns.retain_mut(|remaining| {
            *remaining = remaining.saturating_sub(dt);
            if !remaining.is_zero() {
                return true;
            }
            tracing::debug!(checkpoint = ?position, "returning to checkpoint");
            events.push(VitalsEvent::ReturnToCheckpoint { position });
            false
        });
        events
    }
}

impl Default for PlayerVitals {
    fn default() -> Self {
        Self::startup()
    }
}
