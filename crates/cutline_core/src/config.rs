//! Engine configuration, loaded from a JSON file.

use crate::error::Result;
use crate::session::{preset_720p, NormalizeTarget, SessionSettings};
use crate::timeline::DEFAULT_MIN_DURATION;
use crate::types::{default_track_specs, TimeUs, TrackSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Floor for the timeline's total duration, in seconds.
    pub min_duration_secs: f64,

    /// Tracks created at session start, in order.
    pub tracks: Vec<TrackSpec>,

    /// Format every exported segment is normalized to.
    pub export: NormalizeTarget,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "cutline_core=debug,warn".
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: DEFAULT_MIN_DURATION.as_seconds(),
            tracks: default_track_specs(),
            export: preset_720p(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&data)?;
        Ok(config)
    }

    /// Load `path` if given and present; otherwise defaults. A file that
    /// exists but does not parse is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load_from_file(p),
            Some(p) => {
                tracing::warn!("config {:?} not found, using defaults", p);
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            min_duration: TimeUs::from_seconds(self.min_duration_secs),
            tracks: self.tracks.clone(),
            export: self.export.clone(),
        }
    }
}
