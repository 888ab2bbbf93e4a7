//! Configuration system for the architectural state core.
//!
//! This module defines the settings the core reads when a [`crate::sim::Machine`] is built.
//! It provides:
//! 1. **Defaults:** Baseline values (memory layout, hart count, undo depth).
//! 2. **Structures:** Hierarchical config for general behaviour, memory and reservations.
//! 3. **Errors:** [`ConfigError`], shared with the memory layout registry.
//!
//! Configuration is supplied as JSON (`Config::from_json`, `Config::from_file`) or built
//! with `Config::default()`. Additional memory layouts may be declared inline under
//! `memory.layouts` and are registered alongside the built-in ones.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::soc::memory::configuration::MemoryConfiguration;

/// Default configuration constants for the core.
mod defaults {
    /// Identifier of the memory layout selected at start-up.
    pub const MEMORY_CONFIGURATION: &str = "Default";

    /// Number of harts owning a reservation table.
    pub const HARTS: usize = 1;

    /// Maximum number of undo records kept when backstepping is enabled.
    pub const BACKSTEP_LIMIT: usize = 2000;
}

/// Error raised while building or loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A range whose high address lies below its low address.
    #[error("invalid range {low:#010x}..={high:#010x}")]
    InvalidRange {
        /// Lower bound.
        low: u32,
        /// Upper bound.
        high: u32,
    },

    /// A layout lacks one of the required sections.
    #[error("memory configuration `{identifier}` has no `{section}` section")]
    MissingSection {
        /// Layout identifier.
        identifier: String,
        /// Missing section name.
        section: &'static str,
    },

    /// A section does not start on a word boundary.
    #[error("memory configuration `{identifier}`: section `{section}` starts at unaligned {address:#010x}")]
    UnalignedSection {
        /// Layout identifier.
        identifier: String,
        /// Section name.
        section: &'static str,
        /// Section start.
        address: u32,
    },

    /// A pointer derived from `.data` falls outside the `.data` section.
    #[error("memory configuration `{identifier}`: {what} {address:#x} lies outside .data")]
    OutsideData {
        /// Layout identifier.
        identifier: String,
        /// Which derived pointer is wrong.
        what: &'static str,
        /// The derived address.
        address: u64,
    },

    /// No layout with this identifier is registered.
    #[error("unknown memory configuration `{0}`")]
    UnknownConfiguration(String),

    /// A layout with this identifier is already registered.
    #[error("memory configuration `{0}` is already registered")]
    DuplicateConfiguration(String),

    /// An address literal could not be parsed.
    #[error("invalid address literal `{0}`")]
    InvalidAddress(String),

    /// The hart count was zero.
    #[error("at least one hart is required")]
    NoHarts,

    /// Malformed JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// General behaviour.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Memory layout selection.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Reservation tables.
    #[serde(default)]
    pub reservations: ReservationConfig,
}

impl Config {
    /// Parses a configuration from JSON text.
    ///
    /// # Arguments
    ///
    /// * `json` - Configuration document; omitted sections take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.reservations.harts == 0 {
            return Err(ConfigError::NoHarts);
        }
        Ok(())
    }
}

/// General behaviour switches.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Start execution at the global `main` label when it is defined.
    #[serde(default)]
    pub start_at_main: bool,

    /// Allow programs to read and write the text segment.
    #[serde(default)]
    pub self_modifying_code: bool,

    /// Record undo steps.
    #[serde(default)]
    pub backstep: bool,

    /// Maximum number of undo records kept.
    #[serde(default = "GeneralConfig::default_backstep_limit")]
    pub backstep_limit: usize,
}

impl GeneralConfig {
    fn default_backstep_limit() -> usize {
        defaults::BACKSTEP_LIMIT
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            start_at_main: false,
            self_modifying_code: false,
            backstep: false,
            backstep_limit: Self::default_backstep_limit(),
        }
    }
}

/// Memory layout selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Identifier of the layout selected at start-up.
    #[serde(default = "MemoryConfig::default_configuration")]
    pub configuration: String,

    /// Additional layouts registered next to the built-in ones.
    #[serde(default)]
    pub layouts: Vec<MemoryConfiguration>,
}

impl MemoryConfig {
    fn default_configuration() -> String {
        defaults::MEMORY_CONFIGURATION.to_owned()
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            configuration: Self::default_configuration(),
            layouts: Vec::new(),
        }
    }
}

/// Reservation table sizing.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReservationConfig {
    /// Number of harts, one reservation table each.
    #[serde(default = "ReservationConfig::default_harts")]
    pub harts: usize,
}

impl ReservationConfig {
    fn default_harts() -> usize {
        defaults::HARTS
    }
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            harts: Self::default_harts(),
        }
    }
}
