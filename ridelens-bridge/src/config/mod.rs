//! Settings file loading
//!
//! The host keeps the bridge settings and the active display profile in a
//! TOML file. It is parsed with `serde` into the file structs in [`file`]
//! and converted into the bounded core types.

pub mod file;

pub use file::load_settings;

use core::fmt;

use ridelens_core::config::{BridgeSettings, DisplayProfile};

/// Settings file errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Not valid TOML or wrong value types
    Parse,
    /// Sink address is not `AA:BB:CC:DD:EE:FF`
    InvalidAddress,
    /// A name, id or unit exceeds its bound
    LabelTooLong,
    /// More fields than the profile can hold
    TooManyFields,
    /// Field assigned to a zone the template does not have
    ZoneOutOfRange(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse => write!(f, "settings file is not valid"),
            ConfigError::InvalidAddress => write!(f, "invalid sink address"),
            ConfigError::LabelTooLong => write!(f, "label too long"),
            ConfigError::TooManyFields => write!(f, "too many fields"),
            ConfigError::ZoneOutOfRange(zone) => write!(f, "zone {} out of range", zone),
        }
    }
}

/// Everything read from the settings file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadedConfig {
    pub settings: BridgeSettings,
    /// `None` selects the legacy layout
    pub profile: Option<DisplayProfile>,
}
