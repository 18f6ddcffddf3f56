//! File-based configuration for the command-line adapter.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glam::Vec3;
use gridwalk_core::GridConfig;
use gridwalk_system_movement::DEFAULT_SPEED;
use serde::Deserialize;

/// Configuration file looked up in the working directory when none is given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "gridwalk.toml";

const DEFAULT_LOG_FILTER: &str = "info";

/// Settings read from the TOML configuration file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CliConfig {
    /// Placement and scale of the grid.
    pub(crate) grid: GridSection,
    /// Movement system tuning.
    pub(crate) movement: MovementSection,
    /// Log output settings.
    pub(crate) logging: LoggingSection,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GridSection {
    pub(crate) origin: [f32; 3],
    pub(crate) cell_size: f32,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            origin: [0.0; 3],
            cell_size: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MovementSection {
    /// World units travelled per second.
    pub(crate) speed: f32,
}

impl Default for MovementSection {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LoggingSection {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub(crate) filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

impl CliConfig {
    /// Loads the configuration.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] is read
    /// if present and defaults are used otherwise.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read configuration at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Parses configuration from TOML text.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse configuration toml contents")
    }

    /// Validated grid geometry described by the `[grid]` section.
    pub(crate) fn grid_config(&self) -> Result<GridConfig> {
        GridConfig::new(Vec3::from_array(self.grid.origin), self.grid.cell_size)
            .context("invalid [grid] section")
    }
}
