//! Session configuration: room size, measured anchor distances, and
//! tracking options, stored as a RON file so a rig setup can be reused
//! between runs.

use serde::{Deserialize, Serialize};

use crate::layout::{compute_layout, AnchorLayout, LayoutError, RoomBounds};
use crate::measurement::Id;

use std::{fmt, fs, path::Path};

/// Everything needed to reproduce a tracking session, minus the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// The room the rig is set up in.
    pub room: RoomBounds,
    /// Measured distance between anchors 0 and 1, meters.
    pub d01: f64,
    /// Measured distance between anchors 0 and 2, meters.
    pub d02: f64,
    /// Measured distance between anchors 1 and 2, meters.
    pub d12: f64,
    /// Auxiliary anchor to classify proximity against, if any.
    pub aux_anchor: Option<Id>,
    /// How often the tracking loop polls for complete sets, per second.
    pub update_hz: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            room: RoomBounds {
                width: 10.0,
                height: 8.0,
            },
            d01: 6.0,
            d02: 6.0,
            d12: 6.0,
            aux_anchor: Some(3),
            update_hz: 20.0,
        }
    }
}

impl SessionConfig {
    /// Read a config from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(ron::from_str(&text)?)
    }

    /// Write the config out as pretty-printed RON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Derive the anchor layout this config describes.
    pub fn layout(&self) -> Result<AnchorLayout, LayoutError> {
        compute_layout(self.d01, self.d02, self.d12, &self.room)
    }
}

/// A nice little error for everything that can go wrong while reading or
/// writing a [`SessionConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// Returned when io fails when reading or writing the file.
    IoError(std::io::Error),
    /// Returned when serialization fails.
    RonError(ron::Error),
    /// Returned when deserialization fails.
    RonSpannedError(ron::de::SpannedError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::IoError(error) => write!(f, "io error: {}", error),
            ConfigError::RonError(error) => write!(f, "ron error: {}", error),
            ConfigError::RonSpannedError(error) => write!(f, "ron parse error: {}", error),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::IoError(value)
    }
}

impl From<ron::Error> for ConfigError {
    fn from(value: ron::Error) -> Self {
        Self::RonError(value)
    }
}

impl From<ron::de::SpannedError> for ConfigError {
    fn from(value: ron::de::SpannedError) -> Self {
        Self::RonSpannedError(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.ron");

        let config = SessionConfig {
            d12: 4.5,
            aux_anchor: None,
            ..SessionConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = SessionConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn garbage_file_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.ron");
        fs::write(&path, "(room: what").unwrap();

        match SessionConfig::load(&path) {
            Err(ConfigError::RonSpannedError(_)) => {}
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn default_config_produces_a_layout() {
        let layout = SessionConfig::default().layout().unwrap();
        assert!((layout.d01 - 6.0).abs() < 1e-12);
    }
}
