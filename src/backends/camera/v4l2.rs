// SPDX-License-Identifier: GPL-3.0-only

//! Direct V4L2 webcam capture
//!
//! Devices are opened with the v4l crate, a format is negotiated per
//! constraint profile, and frames are pulled from an mmap stream on a
//! capture thread and published to the preview sink as RGBA.

use super::format_converters::{SUPPORTED_FOURCCS, to_rgba};
use super::frame_loop::{CaptureLoop, LoopAction};
use super::{
    BackendError, BackendResult, CameraDevice, CameraFormat, CameraFrame, CameraPlatform,
    ConstraintProfile, LiveStream, PreviewSink,
};
use crate::constants::{V4L2_BUFFER_COUNT, timing};
use std::path::Path;
use std::sync::atomic::Ordering;
use tracing::{debug, error, info, warn};
use v4l::buffer::Type;
use v4l::frameinterval::FrameIntervalEnum;
use v4l::framesize::FrameSizeEnum;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::video::capture::Parameters;

/// Where the kernel lists V4L2 devices; absent means no V4L2 support at all
const V4L2_SYSFS_CLASS: &str = "/sys/class/video4linux";

/// V4L2 camera platform
#[derive(Debug, Clone, Default)]
pub struct V4l2Platform {
    /// Fixed device path; the first capture device otherwise
    device_path: Option<String>,
}

impl V4l2Platform {
    pub fn new(device_path: Option<String>) -> Self {
        Self { device_path }
    }

    fn select_device(&self) -> BackendResult<CameraDevice> {
        if let Some(path) = &self.device_path {
            return probe_device(Path::new(path)).map_err(|e| BackendError::from_io(path, e));
        }
        self.enumerate_cameras()
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::DeviceNotFound("no V4L2 capture device".to_string()))
    }

    /// Formats a device offers in a pixel format we can convert
    pub fn formats(&self, device: &CameraDevice) -> BackendResult<Vec<CameraFormat>> {
        let dev = Device::with_path(&device.path)
            .map_err(|e| BackendError::from_io(&device.path, e))?;
        Ok(enumerate_formats(&dev))
    }
}

impl CameraPlatform for V4l2Platform {
    fn name(&self) -> &str {
        "v4l2"
    }

    fn is_available(&self) -> bool {
        Path::new(V4L2_SYSFS_CLASS).exists() || self.device_path.is_some()
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        let mut paths: Vec<_> = std::fs::read_dir("/dev")
            .into_iter()
            .flatten()
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("video"))
            })
            .collect();
        paths.sort();

        paths
            .iter()
            .filter_map(|path| match probe_device(path) {
                Ok(device) => Some(device),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping V4L2 node");
                    None
                }
            })
            .collect()
    }

    fn open(&self, profile: &ConstraintProfile) -> BackendResult<Box<dyn LiveStream>> {
        let device = self.select_device()?;
        let dev = Device::with_path(&device.path)
            .map_err(|e| BackendError::from_io(&device.path, e))?;

        let formats = enumerate_formats(&dev);
        debug!(device = %device.path, count = formats.len(), "Enumerated formats");

        let format = profile.select_format(&formats).ok_or_else(|| {
            BackendError::FormatNotSupported(format!("{} cannot satisfy {}", device.name, profile))
        })?;

        let requested = v4l::Format::new(
            format.width,
            format.height,
            v4l::FourCC::new(&fourcc_bytes(&format.pixel_format)),
        );
        let applied = dev
            .set_format(&requested)
            .map_err(|e| BackendError::from_io(&device.path, e))?;
        if applied.width != format.width || applied.height != format.height {
            return Err(BackendError::FormatNotSupported(format!(
                "driver adjusted {}x{} to {}x{}",
                format.width, format.height, applied.width, applied.height
            )));
        }

        if let Some(fps) = format.framerate
            && let Err(e) = dev.set_params(&Parameters::with_fps(fps))
        {
            warn!(fps, error = %e, "Could not set frame rate, keeping driver default");
        }

        info!(device = %device.path, %format, "Opened V4L2 device");

        Ok(Box::new(V4l2Stream {
            device,
            format,
            dev: Some(dev),
            capture: None,
        }))
    }
}

/// Open a node and keep it if it is a video capture device
fn probe_device(path: &Path) -> std::io::Result<CameraDevice> {
    let dev = Device::with_path(path)?;
    let caps = dev.query_caps()?;
    if !caps
        .capabilities
        .contains(v4l::capability::Flags::VIDEO_CAPTURE)
    {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "not a capture device",
        ));
    }
    Ok(CameraDevice {
        name: caps.card.clone(),
        path: path.to_string_lossy().to_string(),
        driver: Some(caps.driver.clone()),
    })
}

/// All (size, rate) combinations the device offers in a supported pixel format
fn enumerate_formats(dev: &Device) -> Vec<CameraFormat> {
    let mut formats = Vec::new();

    for desc in dev.enum_formats().into_iter().flatten() {
        let Ok(fourcc) = desc.fourcc.str() else {
            continue;
        };
        if !SUPPORTED_FOURCCS.contains(&fourcc) {
            continue;
        }

        for size in dev.enum_framesizes(desc.fourcc).into_iter().flatten() {
            let sizes: Vec<(u32, u32)> = match size.size {
                FrameSizeEnum::Discrete(d) => vec![(d.width, d.height)],
                // Stepwise devices: offer the bounds
                FrameSizeEnum::Stepwise(s) => {
                    vec![(s.min_width, s.min_height), (s.max_width, s.max_height)]
                }
            };

            for (width, height) in sizes {
                let rates: Vec<Option<u32>> = dev
                    .enum_frameintervals(desc.fourcc, width, height)
                    .into_iter()
                    .flatten()
                    .map(|interval| match interval.interval {
                        FrameIntervalEnum::Discrete(frac) if frac.numerator > 0 => {
                            Some(frac.denominator / frac.numerator)
                        }
                        _ => None,
                    })
                    .collect();
                let rates = if rates.is_empty() { vec![None] } else { rates };

                for framerate in rates {
                    formats.push(CameraFormat {
                        width,
                        height,
                        framerate,
                        pixel_format: fourcc.to_string(),
                    });
                }
            }
        }
    }

    formats
}

fn fourcc_bytes(code: &str) -> [u8; 4] {
    let mut out = [b' '; 4];
    for (slot, byte) in out.iter_mut().zip(code.bytes()) {
        *slot = byte;
    }
    out
}

/// An opened V4L2 device; frames flow once attached
struct V4l2Stream {
    device: CameraDevice,
    format: CameraFormat,
    /// Moved into the capture thread on attach
    dev: Option<Device>,
    capture: Option<CaptureLoop>,
}

impl LiveStream for V4l2Stream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn format(&self) -> &CameraFormat {
        &self.format
    }

    fn attach(&mut self, sink: PreviewSink) -> BackendResult<()> {
        let dev = self
            .dev
            .take()
            .ok_or_else(|| BackendError::Other("stream already attached".to_string()))?;
        let format = self.format.clone();
        let init_sink = sink.clone();
        let path = self.device.path.clone();

        let capture = CaptureLoop::spawn(
            "v4l2-capture",
            move || {
                let stream =
                    MmapStream::with_buffers(&dev, Type::VideoCapture, V4L2_BUFFER_COUNT)
                        .map_err(|e| {
                            let reason = BackendError::from_io(&path, e).to_string();
                            init_sink.fail(reason.clone());
                            reason
                        })?;
                info!(device = %path, "V4L2 capture stream started");
                Ok((dev, stream, 0u64))
            },
            move |(_dev, stream, frame_num), stop| match stream.next() {
                Ok((buf, _meta)) => {
                    match to_rgba(&format.pixel_format, buf, format.width, format.height) {
                        Ok(rgba) => {
                            if let Some(frame) =
                                CameraFrame::from_rgba(format.width, format.height, rgba)
                            {
                                sink.publish(frame);
                            }
                        }
                        Err(e) => {
                            if *frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                                warn!(frame = *frame_num, error = %e, "Dropping frame");
                            }
                        }
                    }
                    if *frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                        debug!(frame = *frame_num, size = buf.len(), "Frame captured");
                    }
                    *frame_num += 1;
                    LoopAction::Continue
                }
                Err(e) => {
                    if stop.load(Ordering::SeqCst) {
                        return LoopAction::Stop;
                    }
                    // ENODEV
                    if e.raw_os_error() == Some(19) {
                        error!(error = %e, "Camera disconnected");
                        sink.fail(e.to_string());
                        return LoopAction::Stop;
                    }
                    warn!(error = %e, "Failed to dequeue frame");
                    std::thread::sleep(timing::DEQUEUE_RETRY_DELAY);
                    LoopAction::Continue
                }
            },
        )
        .map_err(|e| BackendError::IoError(e.to_string()))?;

        self.capture = Some(capture);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            info!(device = %self.device.path, "Stopping V4L2 capture");
            capture.stop();
        }
        self.dev = None;
    }

    fn is_active(&self) -> bool {
        self.capture.as_ref().is_some_and(|c| c.is_running())
    }
}
