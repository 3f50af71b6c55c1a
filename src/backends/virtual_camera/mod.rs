// SPDX-License-Identifier: GPL-3.0-only

//! Still-image camera
//!
//! Plays a single image as if it were a webcam: the frame is republished at
//! a fixed interval so readers see a live source. Used for demos, headless
//! runs and tests where no capture device exists.

pub mod file_source;

pub use file_source::load_image_as_frame;

use crate::backends::camera::frame_loop::{CaptureLoop, LoopAction};
use crate::backends::camera::{
    BackendError, BackendResult, CameraDevice, CameraFormat, CameraFrame, CameraPlatform,
    ConstraintProfile, LiveStream, PreviewSink,
};
use crate::constants::timing;
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{debug, info};

/// Nominal frame rate reported for still sources
const STILL_FRAMERATE: u32 = 30;

#[derive(Debug, Clone)]
enum StillSource {
    File(PathBuf),
    Frame(CameraFrame),
}

/// Camera platform backed by one image
#[derive(Debug, Clone)]
pub struct StillImagePlatform {
    name: String,
    source: StillSource,
}

impl StillImagePlatform {
    /// Use an image file as the camera; it is decoded on every open
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "still image".to_string()),
            source: StillSource::File(path),
        }
    }

    /// Use an in-memory image as the camera
    pub fn from_image(name: &str, image: RgbaImage) -> Self {
        Self {
            name: name.to_string(),
            source: StillSource::Frame(CameraFrame::from_image(image)),
        }
    }

    fn device(&self) -> CameraDevice {
        CameraDevice {
            name: self.name.clone(),
            path: match &self.source {
                StillSource::File(path) => path.display().to_string(),
                StillSource::Frame(_) => format!("memory:{}", self.name),
            },
            driver: None,
        }
    }

    fn load(&self) -> BackendResult<CameraFrame> {
        match &self.source {
            StillSource::File(path) => load_image_as_frame(path),
            StillSource::Frame(frame) => Ok(frame.clone()),
        }
    }
}

impl CameraPlatform for StillImagePlatform {
    fn name(&self) -> &str {
        "still-image"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![self.device()]
    }

    fn open(&self, profile: &ConstraintProfile) -> BackendResult<Box<dyn LiveStream>> {
        let frame = self.load()?;
        let format = CameraFormat {
            width: frame.width,
            height: frame.height,
            framerate: Some(STILL_FRAMERATE),
            pixel_format: "RGBA".to_string(),
        };
        if !profile.accepts(&format) {
            return Err(BackendError::FormatNotSupported(format!(
                "{} is {}x{}, profile needs {}",
                self.name, frame.width, frame.height, profile
            )));
        }

        Ok(Box::new(StillImageStream {
            device: self.device(),
            format,
            frame,
            capture: None,
        }))
    }
}

struct StillImageStream {
    device: CameraDevice,
    format: CameraFormat,
    frame: CameraFrame,
    capture: Option<CaptureLoop>,
}

impl LiveStream for StillImageStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn format(&self) -> &CameraFormat {
        &self.format
    }

    fn attach(&mut self, sink: PreviewSink) -> BackendResult<()> {
        if self.capture.is_some() {
            return Err(BackendError::Other("stream already attached".to_string()));
        }
        let frame = self.frame.clone();
        info!(device = %self.device.path, format = %self.format, "Streaming still image");

        let capture = CaptureLoop::spawn(
            "still-image",
            || Ok(0u64),
            move |count, stop| {
                let mut next = frame.clone();
                next.captured_at = Instant::now();
                sink.publish(next);
                if *count % timing::FRAME_LOG_INTERVAL == 0 {
                    debug!(frame = *count, "Still frame published");
                }
                *count += 1;
                if stop.load(Ordering::SeqCst) {
                    return LoopAction::Stop;
                }
                std::thread::sleep(timing::STILL_FRAME_INTERVAL);
                LoopAction::Continue
            },
        )
        .map_err(|e| BackendError::IoError(e.to_string()))?;

        self.capture = Some(capture);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            capture.stop();
        }
    }

    fn is_active(&self) -> bool {
        self.capture.as_ref().is_some_and(|c| c.is_running())
    }
}
