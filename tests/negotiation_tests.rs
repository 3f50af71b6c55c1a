// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for capture device negotiation

use image::RgbaImage;
use photobooth::backends::camera::{
    BackendError, BackendResult, CameraDevice, CameraFormat, CameraFrame, CameraPlatform,
    ConstraintProfile, LiveSource, LiveStream, PreviewSink, acquire_video_source,
};
use photobooth::errors::AcquireError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const READY_TIMEOUT: Duration = Duration::from_secs(10);

/// What a stream does once attached
#[derive(Debug, Clone, Copy)]
enum OnAttach {
    Publish,
    Silent,
    Fail,
    Refuse,
}

/// Platform that rejects a fixed number of profiles before opening
struct ScriptedPlatform {
    available: bool,
    rejections: Mutex<Vec<BackendError>>,
    on_attach: OnAttach,
    opened_profiles: Mutex<Vec<ConstraintProfile>>,
    attempts: AtomicUsize,
    stopped: Arc<AtomicBool>,
}

impl ScriptedPlatform {
    fn new(rejections: Vec<BackendError>, on_attach: OnAttach) -> Self {
        Self {
            available: true,
            rejections: Mutex::new(rejections),
            on_attach,
            opened_profiles: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl CameraPlatform for ScriptedPlatform {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        Vec::new()
    }

    fn open(&self, profile: &ConstraintProfile) -> BackendResult<Box<dyn LiveStream>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let mut rejections = self.rejections.lock().unwrap();
        if !rejections.is_empty() {
            return Err(rejections.remove(0));
        }
        self.opened_profiles.lock().unwrap().push(profile.clone());
        Ok(Box::new(ScriptedStream {
            device: CameraDevice {
                name: "Scripted".to_string(),
                path: "/dev/scripted0".to_string(),
                driver: None,
            },
            format: CameraFormat {
                width: profile.width.ideal,
                height: profile.height.ideal,
                framerate: None,
                pixel_format: "RGBA".to_string(),
            },
            on_attach: self.on_attach,
            stopped: Arc::clone(&self.stopped),
        }))
    }
}

struct ScriptedStream {
    device: CameraDevice,
    format: CameraFormat,
    on_attach: OnAttach,
    stopped: Arc<AtomicBool>,
}

impl LiveStream for ScriptedStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn format(&self) -> &CameraFormat {
        &self.format
    }

    fn attach(&mut self, sink: PreviewSink) -> BackendResult<()> {
        match self.on_attach {
            OnAttach::Publish => {
                sink.publish(CameraFrame::from_image(RgbaImage::new(
                    self.format.width,
                    self.format.height,
                )));
                Ok(())
            }
            OnAttach::Silent => Ok(()),
            OnAttach::Fail => {
                sink.fail("device unplugged");
                Ok(())
            }
            OnAttach::Refuse => Err(BackendError::Busy("already streaming".to_string())),
        }
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }
}

fn rejected(n: usize) -> Vec<BackendError> {
    (0..n)
        .map(|i| BackendError::FormatNotSupported(format!("profile {i}")))
        .collect()
}

#[tokio::test]
async fn test_first_accepted_profile_wins() {
    let platform = ScriptedPlatform::new(rejected(3), OnAttach::Publish);
    let profiles = ConstraintProfile::default_fallbacks();

    let handle = acquire_video_source(&platform, &profiles, READY_TIMEOUT)
        .await
        .unwrap();

    assert_eq!(platform.attempts.load(Ordering::SeqCst), 4);
    assert_eq!(handle.profile(), &profiles[3]);
    assert_eq!(handle.format().width, 640);
    assert!(handle.is_active());
    assert!(handle.current_frame().is_some());
}

#[tokio::test]
async fn test_best_profile_used_when_accepted() {
    let platform = ScriptedPlatform::new(Vec::new(), OnAttach::Publish);
    let profiles = ConstraintProfile::default_fallbacks();

    let handle = acquire_video_source(&platform, &profiles, READY_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(platform.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(handle.format().width, 1920);
    assert!(!profiles[0].audio);
}

#[tokio::test]
async fn test_all_profiles_failing_reports_last_error() {
    let mut errors = rejected(3);
    errors.push(BackendError::PermissionDenied("/dev/video0".to_string()));
    let platform = ScriptedPlatform::new(errors, OnAttach::Publish);

    let err = acquire_video_source(&platform, &ConstraintProfile::default_fallbacks(), READY_TIMEOUT)
        .await
        .unwrap_err();

    match &err {
        AcquireError::AllProfilesFailed { attempts, last } => {
            assert_eq!(*attempts, 4);
            assert!(matches!(last, BackendError::PermissionDenied(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.user_guidance().contains("camera permissions"));
    assert!(platform.opened_profiles.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unavailable_platform_is_not_tried() {
    let mut platform = ScriptedPlatform::new(Vec::new(), OnAttach::Publish);
    platform.available = false;

    let err = acquire_video_source(&platform, &ConstraintProfile::default_fallbacks(), READY_TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, AcquireError::DeviceUnavailable));
    assert_eq!(platform.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_silent_source_times_out_and_is_stopped() {
    let platform = ScriptedPlatform::new(Vec::new(), OnAttach::Silent);
    let start = tokio::time::Instant::now();

    let err = acquire_video_source(&platform, &ConstraintProfile::default_fallbacks(), READY_TIMEOUT)
        .await
        .unwrap_err();

    assert!(matches!(err, AcquireError::SourceReadyTimeout));
    assert_eq!(start.elapsed(), READY_TIMEOUT);
    assert!(platform.stopped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_stream_error_before_playing() {
    let platform = ScriptedPlatform::new(Vec::new(), OnAttach::Fail);

    let err = acquire_video_source(&platform, &ConstraintProfile::default_fallbacks(), READY_TIMEOUT)
        .await
        .unwrap_err();
    match err {
        AcquireError::SourceFailed(reason) => assert_eq!(reason, "device unplugged"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(platform.stopped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_attach_refusal_is_a_source_failure() {
    let platform = ScriptedPlatform::new(Vec::new(), OnAttach::Refuse);

    let err = acquire_video_source(&platform, &ConstraintProfile::default_fallbacks(), READY_TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, AcquireError::SourceFailed(_)));
    assert!(platform.stopped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_dropping_handle_stops_stream() {
    let platform = ScriptedPlatform::new(Vec::new(), OnAttach::Publish);
    let handle = acquire_video_source(&platform, &ConstraintProfile::default_fallbacks(), READY_TIMEOUT)
        .await
        .unwrap();
    let sink = handle.sink().clone();

    drop(handle);
    assert!(platform.stopped.load(Ordering::SeqCst));
    assert!(sink.latest_frame().is_none());
}

#[tokio::test]
async fn test_release_is_idempotent() {
    let platform = ScriptedPlatform::new(Vec::new(), OnAttach::Publish);
    let mut handle =
        acquire_video_source(&platform, &ConstraintProfile::default_fallbacks(), READY_TIMEOUT)
            .await
            .unwrap();

    handle.release();
    handle.release();
    assert!(!handle.is_active());
    assert!(handle.current_frame().is_none());
}
