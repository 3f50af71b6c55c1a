// SPDX-License-Identifier: GPL-3.0-only

//! Booth configuration
//!
//! Read from an optional JSON file; command-line flags override individual
//! fields afterwards. Every field has a default, so partial files are fine.

use crate::constants::{capture, export, negotiation, sequencer, strip};
use crate::errors::ConfigError;
use crate::filters::FilterId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoothConfig {
    /// Filter active when the booth starts
    pub filter: FilterId,
    /// Mirror the preview and the captured photos (selfie mode)
    pub mirror: bool,
    /// Length of one countdown tick in milliseconds
    pub time_unit_ms: u64,
    /// How many ticks a camera may take to start playing
    pub ready_timeout_units: f64,
    /// Multiplier applied to the strip's logical geometry
    pub strip_scale: f32,
    /// First caption line
    pub title: String,
    /// Where saved strips go; `~/Pictures/Photobooth` when unset
    pub output_dir: Option<PathBuf>,
    /// Fixed capture device (e.g. /dev/video2); first device when unset
    pub device: Option<String>,
    pub capture_quality: u8,
    pub export_quality: u8,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            filter: FilterId::Original,
            mirror: true,
            time_unit_ms: sequencer::DEFAULT_TIME_UNIT.as_millis() as u64,
            ready_timeout_units: negotiation::READY_TIMEOUT_UNITS,
            strip_scale: 1.0,
            title: strip::CAPTION_TITLE.to_string(),
            output_dir: None,
            device: None,
            capture_quality: capture::JPEG_QUALITY,
            export_quality: export::JPEG_QUALITY,
        }
    }
}

impl BoothConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load from `path` if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Countdown tick; never zero
    pub fn time_unit(&self) -> Duration {
        Duration::from_millis(self.time_unit_ms.max(1))
    }

    pub fn ready_timeout(&self) -> Duration {
        let units = if self.ready_timeout_units.is_finite() {
            self.ready_timeout_units.max(0.0)
        } else {
            negotiation::READY_TIMEOUT_UNITS
        };
        Duration::try_from_secs_f64(self.time_unit().as_secs_f64() * units)
            .unwrap_or(Duration::MAX)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(crate::storage::default_output_dir)
    }
}
