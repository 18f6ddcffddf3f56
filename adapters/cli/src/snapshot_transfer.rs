use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use glam::Vec3;
use gridwalk_core::{CellCoord, ConfigError, EntityId, GridConfig};
use gridwalk_world::GridTracker;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "grid";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "grid:v1";
/// Delimiter used to separate the prefix, version and payload.
const FIELD_DELIMITER: char = ':';

/// Snapshot of the tracker's occupancy and entity positions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct OccupancySnapshot {
    /// World-space origin of the grid.
    pub(crate) origin: [f32; 3],
    /// Edge length of a cell in world units.
    pub(crate) cell_size: f32,
    /// Occupied cells in ascending order.
    pub(crate) occupied: Vec<CellCoord>,
    /// Last recorded cell per entity, ordered by entity.
    pub(crate) last: Vec<(EntityId, CellCoord)>,
    /// Next recorded cell per entity, ordered by entity.
    pub(crate) next: Vec<(EntityId, CellCoord)>,
}

impl OccupancySnapshot {
    /// Captures the current state of the tracker.
    #[must_use]
    pub(crate) fn capture(tracker: &GridTracker) -> Self {
        let config = tracker.config();
        Self {
            origin: config.origin().to_array(),
            cell_size: config.cell_size(),
            occupied: tracker.occupied_cells(),
            last: tracker.last_positions(),
            next: tracker.next_positions(),
        }
    }

    /// Rebuilds a tracker holding exactly the captured state.
    pub(crate) fn restore(&self) -> Result<GridTracker, SnapshotTransferError> {
        let config = GridConfig::new(Vec3::from_array(self.origin), self.cell_size)?;
        let mut tracker = GridTracker::new(config);
        for cell in &self.occupied {
            let _ = tracker.occupy(*cell);
        }
        for (entity, cell) in &self.last {
            tracker.set_last_position(*entity, *cell);
        }
        for (entity, cell) in &self.next {
            tracker.set_next_position(*entity, *cell);
        }
        Ok(tracker)
    }

    /// Encodes the snapshot into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, SnapshotTransferError> {
        let json = serde_json::to_vec(self).map_err(SnapshotTransferError::Serialization)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!("{SNAPSHOT_HEADER}{FIELD_DELIMITER}{encoded}"))
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, SnapshotTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SnapshotTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(SnapshotTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(SnapshotTransferError::MissingVersion)?;
        let payload = parts.next().ok_or(SnapshotTransferError::MissingPayload)?;
        if parts.next().is_some() {
            return Err(SnapshotTransferError::TrailingData);
        }

        if domain != SNAPSHOT_DOMAIN {
            return Err(SnapshotTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(SnapshotTransferError::UnsupportedVersion(version.to_owned()));
        }

        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(SnapshotTransferError::InvalidEncoding)?;
        serde_json::from_slice(&bytes).map_err(SnapshotTransferError::InvalidPayload)
    }
}

/// Errors that can occur while transferring occupancy snapshots.
#[derive(Debug, Error)]
pub(crate) enum SnapshotTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("snapshot payload was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    #[error("snapshot string is missing the prefix")]
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    #[error("snapshot string is missing the version")]
    MissingVersion,
    /// The encoded snapshot did not include the payload segment.
    #[error("snapshot string is missing the payload")]
    MissingPayload,
    /// Extra segments followed the payload.
    #[error("snapshot string has unexpected data after the payload")]
    TrailingData,
    /// The encoded snapshot used an unexpected prefix segment.
    #[error("snapshot prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    #[error("snapshot version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode snapshot payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse snapshot payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    /// The snapshot could not be serialised.
    #[error("could not serialise snapshot: {0}")]
    Serialization(#[source] serde_json::Error),
    /// The snapshot described a degenerate grid.
    #[error("snapshot grid is invalid: {0}")]
    InvalidGrid(#[from] ConfigError),
}
