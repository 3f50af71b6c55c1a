// SPDX-License-Identifier: GPL-3.0-only

//! Capture device negotiation
//!
//! Walks the constraint fallback list until a platform accepts a profile,
//! binds the resulting stream to a fresh [`PreviewSink`] and waits for it to
//! start playing.

use super::{
    BackendError, CameraDevice, CameraFormat, CameraFrame, CameraPlatform, ConstraintProfile,
    LiveSource, LiveStream, PreviewSink,
};
use crate::errors::AcquireError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A playing live source; dropping it releases the device
pub struct VideoSourceHandle {
    stream: Box<dyn LiveStream>,
    sink: PreviewSink,
    profile: ConstraintProfile,
    released: bool,
}

impl VideoSourceHandle {
    pub fn sink(&self) -> &PreviewSink {
        &self.sink
    }

    /// Profile the platform accepted
    pub fn profile(&self) -> &ConstraintProfile {
        &self.profile
    }

    pub fn format(&self) -> &CameraFormat {
        self.stream.format()
    }

    pub fn device(&self) -> &CameraDevice {
        self.stream.device()
    }

    pub fn is_active(&self) -> bool {
        !self.released && self.stream.is_active()
    }

    /// Stop the stream; later calls are no-ops
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        info!(device = %self.stream.device().path, "Releasing video source");
        self.stream.stop();
        self.sink.fail("released");
    }
}

impl LiveSource for VideoSourceHandle {
    fn current_frame(&self) -> Option<Arc<CameraFrame>> {
        if self.released {
            return None;
        }
        self.sink.latest_frame()
    }
}

impl Drop for VideoSourceHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for VideoSourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoSourceHandle")
            .field("device", self.stream.device())
            .field("format", self.stream.format())
            .field("released", &self.released)
            .finish()
    }
}

/// Acquire a playing live source
///
/// Profiles are tried strictly in order and the first one the platform
/// accepts wins. The bound source must publish a frame within
/// `ready_timeout`, otherwise the stream is stopped and
/// [`AcquireError::SourceReadyTimeout`] is returned.
pub async fn acquire_video_source(
    platform: &dyn CameraPlatform,
    profiles: &[ConstraintProfile],
    ready_timeout: Duration,
) -> Result<VideoSourceHandle, AcquireError> {
    if !platform.is_available() {
        warn!(platform = platform.name(), "Camera access not available");
        return Err(AcquireError::DeviceUnavailable);
    }

    let mut last_error = None;
    let mut opened = None;
    for (attempt, profile) in profiles.iter().enumerate() {
        debug!(attempt = attempt + 1, %profile, "Trying constraint profile");
        match platform.open(profile) {
            Ok(stream) => {
                info!(
                    attempt = attempt + 1,
                    %profile,
                    format = %stream.format(),
                    "Camera accepted profile"
                );
                opened = Some((stream, profile.clone()));
                break;
            }
            Err(e) => {
                warn!(attempt = attempt + 1, %profile, error = %e, "Camera rejected profile");
                last_error = Some(e);
            }
        }
    }

    let Some((mut stream, profile)) = opened else {
        return Err(AcquireError::AllProfilesFailed {
            attempts: profiles.len(),
            last: last_error
                .unwrap_or_else(|| BackendError::Other("no constraint profiles".to_string())),
        });
    };

    let sink = PreviewSink::new();
    if let Err(e) = stream.attach(sink.clone()) {
        stream.stop();
        return Err(AcquireError::SourceFailed(e.to_string()));
    }

    match tokio::time::timeout(ready_timeout, sink.wait_until_playing()).await {
        Ok(Ok(())) => {
            info!(device = %stream.device().path, "Video source playing");
            Ok(VideoSourceHandle {
                stream,
                sink,
                profile,
                released: false,
            })
        }
        Ok(Err(reason)) => {
            stream.stop();
            Err(AcquireError::SourceFailed(reason))
        }
        Err(_) => {
            warn!(timeout = ?ready_timeout, "Video source never started playing");
            stream.stop();
            Err(AcquireError::SourceReadyTimeout)
        }
    }
}
