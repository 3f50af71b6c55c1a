// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the photo booth

use crate::backends::camera::BackendError;
use thiserror::Error;

/// Result type alias using BoothError
pub type BoothResult<T> = Result<T, BoothError>;

/// Main error type
#[derive(Debug, Error)]
pub enum BoothError {
    /// Camera acquisition failed; fatal to the session
    #[error("Camera error: {0}")]
    Acquire(#[from] AcquireError),
    /// A single capture produced no image; recoverable
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),
    /// Strip composition failed
    #[error("Strip error: {0}")]
    Strip(#[from] StripError),
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Storage/filesystem errors
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// Failures while negotiating the live video source
///
/// All variants are fatal to the session and should be shown to the user
/// together with [`AcquireError::user_guidance`].
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The platform offers no camera-access capability at all
    #[error("Camera not supported on this system")]
    DeviceUnavailable,
    /// Every constraint profile was rejected
    #[error("Could not access camera after {attempts} attempts: {last}")]
    AllProfilesFailed { attempts: usize, last: BackendError },
    /// The source was bound but never started playing
    #[error("Video loading timeout")]
    SourceReadyTimeout,
    /// The stream reported an error before it started playing
    #[error("Video source failed: {0}")]
    SourceFailed(String),
}

impl AcquireError {
    /// Remediation text shown alongside the error
    pub fn user_guidance(&self) -> &'static str {
        "Please:\n1. Allow camera permissions\n2. Make sure no other app is using the camera\n3. Try again"
    }

    /// Underlying backend error, if any
    pub fn last_cause(&self) -> Option<&BackendError> {
        match self {
            AcquireError::AllProfilesFailed { last, .. } => Some(last),
            _ => None,
        }
    }
}

/// Photo capture errors
#[derive(Debug, Error)]
pub enum PhotoError {
    /// No frame available for capture (source not attached or not playing)
    #[error("No frame available for capture")]
    FrameUnavailable,
    /// Encoding failed
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

/// Strip composition errors
#[derive(Debug, Error)]
pub enum StripError {
    /// Composition needs exactly one photo per slot
    #[error("A strip needs exactly {expected} photos, got {actual}")]
    PhotoCount { expected: usize, actual: usize },
    /// A captured photo could not be decoded
    #[error("Failed to decode photo {index}: {reason}")]
    Decode { index: usize, reason: String },
    /// Canvas or text rendering failed
    #[error("Render failed: {0}")]
    Render(String),
    /// Final encoding failed
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_profiles_failed_keeps_cause() {
        let err = AcquireError::AllProfilesFailed {
            attempts: 4,
            last: BackendError::PermissionDenied("/dev/video0".to_string()),
        };
        assert!(matches!(
            err.last_cause(),
            Some(BackendError::PermissionDenied(_))
        ));
        assert!(err.to_string().contains("4 attempts"));
    }

    #[test]
    fn test_acquire_error_converts_to_booth_error() {
        let err: BoothError = AcquireError::SourceReadyTimeout.into();
        assert!(matches!(
            err,
            BoothError::Acquire(AcquireError::SourceReadyTimeout)
        ));
        assert_eq!(err.to_string(), "Camera error: Video loading timeout");
    }

    #[test]
    fn test_guidance_mentions_permissions() {
        assert!(
            AcquireError::DeviceUnavailable
                .user_guidance()
                .contains("camera permissions")
        );
    }
}
