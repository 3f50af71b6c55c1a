// SPDX-License-Identifier: GPL-3.0-only

// Shared types for camera backend abstraction

//! Shared types for camera backends

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors reported by a camera platform
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Backend is not available on this system
    #[error("Backend not available: {0}")]
    NotAvailable(String),
    /// Camera device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    /// Access to the device was refused
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// Another application holds the device
    #[error("Camera is busy: {0}")]
    Busy(String),
    /// The device cannot satisfy the requested constraints
    #[error("Format not supported: {0}")]
    FormatNotSupported(String),
    /// General I/O error
    #[error("I/O error: {0}")]
    IoError(String),
    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

impl BackendError {
    /// Classify an I/O error raised while touching `path`
    pub fn from_io(path: &str, err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::NotFound => BackendError::DeviceNotFound(path.to_string()),
            ErrorKind::PermissionDenied => BackendError::PermissionDenied(path.to_string()),
            ErrorKind::ResourceBusy => BackendError::Busy(path.to_string()),
            _ if err.raw_os_error() == Some(16) => BackendError::Busy(path.to_string()),
            _ => BackendError::IoError(format!("{}: {}", path, err)),
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    /// Device path (e.g. /dev/video0) or file path for still-image sources
    pub path: String,
    /// Driver name, when the platform reports one
    pub driver: Option<String>,
}

/// Which way the camera should face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacingMode {
    /// Towards the user (selfie camera)
    User,
    /// Away from the user
    Environment,
}

/// A size or rate constraint: a preferred value and an optional hard floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub ideal: u32,
    pub min: Option<u32>,
}

impl Constraint {
    pub const fn ideal(ideal: u32) -> Self {
        Self { ideal, min: None }
    }

    pub const fn at_least(ideal: u32, min: u32) -> Self {
        Self {
            ideal,
            min: Some(min),
        }
    }

    /// Whether `value` satisfies the hard floor
    pub fn accepts(&self, value: u32) -> bool {
        self.min.is_none_or(|min| value >= min)
    }
}

/// One entry of the descending-quality fallback list used when opening a camera
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintProfile {
    pub width: Constraint,
    pub height: Constraint,
    pub facing: Option<FacingMode>,
    pub frame_rate: Option<Constraint>,
    /// Audio is never requested by the booth
    pub audio: bool,
}

impl ConstraintProfile {
    /// The default fallback chain, best quality first
    pub fn default_fallbacks() -> Vec<ConstraintProfile> {
        vec![
            ConstraintProfile {
                width: Constraint::at_least(1920, 1280),
                height: Constraint::at_least(1080, 720),
                facing: Some(FacingMode::User),
                frame_rate: Some(Constraint::at_least(30, 15)),
                audio: false,
            },
            ConstraintProfile {
                width: Constraint::at_least(1280, 960),
                height: Constraint::at_least(720, 540),
                facing: Some(FacingMode::User),
                frame_rate: Some(Constraint::ideal(30)),
                audio: false,
            },
            ConstraintProfile {
                width: Constraint::ideal(960),
                height: Constraint::ideal(720),
                facing: Some(FacingMode::User),
                frame_rate: None,
                audio: false,
            },
            ConstraintProfile {
                width: Constraint::ideal(640),
                height: Constraint::ideal(480),
                facing: None,
                frame_rate: None,
                audio: false,
            },
        ]
    }

    /// Whether a format satisfies every hard floor of this profile
    pub fn accepts(&self, format: &CameraFormat) -> bool {
        self.width.accepts(format.width)
            && self.height.accepts(format.height)
            && match (self.frame_rate, format.framerate) {
                (Some(rate), Some(fps)) => rate.accepts(fps),
                (Some(rate), None) => rate.min.is_none(),
                (None, _) => true,
            }
    }

    /// Distance from the ideal values; smaller is better
    pub fn distance(&self, format: &CameraFormat) -> u64 {
        let dw = (format.width as i64 - self.width.ideal as i64).unsigned_abs();
        let dh = (format.height as i64 - self.height.ideal as i64).unsigned_abs();
        let dfps = match (self.frame_rate, format.framerate) {
            (Some(rate), Some(fps)) => (fps as i64 - rate.ideal as i64).unsigned_abs(),
            _ => 0,
        };
        // Resolution dominates frame rate
        (dw + dh) * 100 + dfps
    }

    /// Best format for this profile out of what a device offers
    pub fn select_format(&self, formats: &[CameraFormat]) -> Option<CameraFormat> {
        formats
            .iter()
            .filter(|f| self.accepts(f))
            .min_by_key(|f| self.distance(f))
            .cloned()
    }
}

impl std::fmt::Display for ConstraintProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width.ideal, self.height.ideal)?;
        if let Some(rate) = self.frame_rate {
            write!(f, "@{}fps", rate.ideal)?;
        }
        if let Some(facing) = self.facing {
            write!(f, " ({:?})", facing)?;
        }
        Ok(())
    }
}

/// A concrete capture format offered by a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub framerate: Option<u32>,
    /// FourCC code (e.g., "MJPG", "YUYV")
    pub pixel_format: String,
}

impl std::fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(fps) = &self.framerate {
            write!(
                f,
                "{}x{} @ {}fps {}",
                self.width, self.height, fps, self.pixel_format
            )
        } else {
            write!(f, "{}x{} {}", self.width, self.height, self.pixel_format)
        }
    }
}

/// A decoded live frame in RGBA8, tightly packed
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    /// When the frame left the device
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Wrap tightly packed RGBA pixels; `None` if the buffer size does not match
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || data.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            data: Arc::from(data),
            captured_at: Instant::now(),
        })
    }

    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: Arc::from(image.into_raw()),
            captured_at: Instant::now(),
        }
    }

    /// Copy the pixels into an owned image
    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.to_vec())
    }
}
