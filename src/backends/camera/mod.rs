// SPDX-License-Identifier: GPL-3.0-only

//! Camera platform abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │  PhotoBooth / CLI   │
//! └──────────┬──────────┘
//!            │ acquire_video_source(profiles)
//!            ▼
//! ┌─────────────────────┐
//! │     Negotiator      │  ← fallback chain, readiness timeout
//! └──────────┬──────────┘
//!            │ open(profile)
//!            ▼
//! ┌─────────────────────┐
//! │ CameraPlatform trait│
//! └──────────┬──────────┘
//!       ┌────┴─────┐
//!       ▼          ▼
//!    ┌──────┐  ┌────────────┐
//!    │ V4L2 │  │ Still image│
//!    └──────┘  └────────────┘
//! ```

pub mod format_converters;
pub mod frame_loop;
pub mod negotiator;
pub mod sink;
pub mod types;
pub mod v4l2;

pub use negotiator::{VideoSourceHandle, acquire_video_source};
pub use sink::{PreviewSink, SinkState};
pub use types::*;
pub use v4l2::V4l2Platform;

use std::sync::Arc;

/// Something that can hand out live camera streams
///
/// Implementations must not block for long in `open`; frame delivery happens
/// on the stream's own thread after [`LiveStream::attach`].
pub trait CameraPlatform: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Whether this system offers camera access at all
    ///
    /// `false` means no device could ever be opened, as opposed to a device
    /// refusing a particular profile.
    fn is_available(&self) -> bool;

    /// Cameras this platform can see
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Open a stream satisfying `profile`, or explain why not
    fn open(&self, profile: &ConstraintProfile) -> BackendResult<Box<dyn LiveStream>>;
}

/// An opened but not yet playing camera stream
pub trait LiveStream: Send + Sync {
    /// Device the stream was opened on
    fn device(&self) -> &CameraDevice;

    /// Negotiated format
    fn format(&self) -> &CameraFormat;

    /// Bind the stream to a sink and start delivering frames
    fn attach(&mut self, sink: PreviewSink) -> BackendResult<()>;

    /// Stop delivering frames and release the device; idempotent
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}

/// Read side of a live source: whatever frame is current right now
pub trait LiveSource: Send + Sync {
    fn current_frame(&self) -> Option<Arc<CameraFrame>>;
}

impl LiveSource for PreviewSink {
    fn current_frame(&self) -> Option<Arc<CameraFrame>> {
        self.latest_frame()
    }
}
