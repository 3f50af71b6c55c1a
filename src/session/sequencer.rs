// SPDX-License-Identifier: GPL-3.0-only

//! Capture sequencer
//!
//! Runs the countdown for each accepted capture request, rasterizes the
//! live frame when it ends and collects the photos of one session.
//!
//! ```text
//! Idle ─request─▶ Counting ("3..." "2..." "1..." "Smile...")
//!   ▲                  │
//!   │                  ▼
//!   └──── (< 3) ── Capturing ── (= 3) ──▶ Full ─(0.5 unit)─▶ strip ready
//! ```
//!
//! Every piece of spawned work carries the session generation it was
//! started under. A reset bumps the generation and aborts the tasks, so
//! nothing started before it can touch the new session.

use super::state::{SessionPhase, SessionSnapshot, SessionState};
use crate::constants::{SESSION_PHOTO_COUNT, sequencer};
use crate::filters::FilterId;
use crate::pipelines::photo::{CapturedPhoto, PhotoPipeline, RasterOptions};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Notifications for presentation layers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Countdown label changed; `None` once it is cleared
    Countdown(Option<&'static str>),
    /// A photo was appended at `index`
    PhotoCaptured { index: usize, count: usize },
    /// The live source had no frame; nothing was appended
    CaptureDropped,
    /// A full session settled and the strip can be composed
    StripReady,
    Reset,
}

struct Inner {
    state: Mutex<SessionState>,
    pipeline: PhotoPipeline,
    time_unit: Duration,
    events: mpsc::UnboundedSender<SessionEvent>,
}

/// Drives countdowns and captures for one booth
///
/// Cloning shares the same session. Methods that start work must be called
/// from within a Tokio runtime.
#[derive(Clone)]
pub struct CaptureSequencer {
    inner: Arc<Inner>,
}

impl CaptureSequencer {
    /// Create a sequencer and the receiver for its events
    pub fn new(
        pipeline: PhotoPipeline,
        time_unit: Duration,
        filter: FilterId,
        mirror: bool,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let sequencer = Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SessionState::new(filter, mirror)),
                pipeline,
                time_unit,
                events,
            }),
        };
        (sequencer, receiver)
    }

    /// Set the JPEG quality for captures accepted from now on
    pub fn set_jpeg_quality(&self, quality: u8) {
        self.inner.lock().jpeg_quality = quality.clamp(1, 100);
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.inner.lock().jpeg_quality
    }

    pub fn time_unit(&self) -> Duration {
        self.inner.time_unit
    }

    /// Start a countdown and capture
    ///
    /// Ignored (returns `false`) while a countdown or capture is running or
    /// once the session holds three photos. The filter and mirror setting
    /// are fixed at the moment the request is accepted.
    pub fn request_capture(&self) -> bool {
        let mut state = self.inner.lock();
        if state.phase != SessionPhase::Idle || state.is_full() {
            debug!(phase = ?state.phase, photos = state.photos.len(), "Capture request ignored");
            return false;
        }

        let options = RasterOptions {
            filter: state.filter,
            mirror: state.mirror,
            jpeg_quality: state.jpeg_quality,
        };
        let generation = state.generation;
        state.phase = SessionPhase::Counting;

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(inner.run_capture(generation, options));
        state.countdown_task = Some(task.abort_handle());

        info!(
            photo = state.photos.len() + 1,
            filter = %options.filter,
            mirror = options.mirror,
            "Capture requested"
        );
        true
    }

    /// Start a new session
    ///
    /// Cancels any running countdown or pending strip-ready notification and
    /// discards every photo. A capture already rasterizing is dropped when
    /// it finishes.
    pub fn reset(&self) {
        let mut state = self.inner.lock();
        if let Some(task) = state.countdown_task.take() {
            task.abort();
        }
        if let Some(task) = state.strip_ready_task.take() {
            task.abort();
        }
        state.generation = state.generation.wrapping_add(1);
        state.photos.clear();
        state.countdown = None;
        state.strip_ready = false;
        state.phase = SessionPhase::Idle;
        info!(generation = state.generation, "Session reset");
        self.inner.emit(SessionEvent::Reset);
    }

    /// Select the filter for later capture requests
    pub fn set_filter(&self, filter: FilterId) {
        let mut state = self.inner.lock();
        if state.filter != filter {
            debug!(from = %state.filter, to = %filter, "Filter changed");
            state.filter = filter;
        }
    }

    pub fn filter(&self) -> FilterId {
        self.inner.lock().filter
    }

    pub fn set_mirror(&self, mirror: bool) {
        self.inner.lock().mirror = mirror;
    }

    pub fn mirror(&self) -> bool {
        self.inner.lock().mirror
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn photos(&self) -> Vec<CapturedPhoto> {
        self.inner.lock().photos.clone()
    }

    pub fn is_strip_ready(&self) -> bool {
        self.inner.lock().strip_ready
    }
}

impl std::fmt::Debug for CaptureSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSequencer")
            .field("time_unit", &self.inner.time_unit)
            .field("state", &self.snapshot())
            .finish()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // A panic while holding the lock leaves plain data behind; keep going
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    /// Apply `update` if the session is still on `generation`
    fn update_if_current(&self, generation: u64, update: impl FnOnce(&mut SessionState)) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            return false;
        }
        update(&mut state);
        true
    }

    async fn run_capture(self: Arc<Self>, generation: u64, options: RasterOptions) {
        for label in sequencer::COUNTDOWN_LABELS {
            if !self.update_if_current(generation, |state| state.countdown = Some(label)) {
                return;
            }
            debug!(label, "Countdown");
            self.emit(SessionEvent::Countdown(Some(label)));
            tokio::time::sleep(self.time_unit).await;
        }

        let entered = self.update_if_current(generation, |state| {
            state.countdown = None;
            state.phase = SessionPhase::Capturing;
        });
        if !entered {
            return;
        }
        self.emit(SessionEvent::Countdown(None));

        let photo = self.pipeline.capture(options).await;
        self.finish_capture(generation, photo);
    }

    fn finish_capture(self: &Arc<Self>, generation: u64, photo: Option<CapturedPhoto>) {
        let mut state = self.lock();
        if state.generation != generation {
            debug!("Discarding capture from a previous session");
            return;
        }
        state.countdown_task = None;

        let Some(photo) = photo else {
            warn!("No frame available, capture dropped");
            state.phase = SessionPhase::Idle;
            self.emit(SessionEvent::CaptureDropped);
            return;
        };

        let index = state.photos.len();
        state.photos.push(photo);
        let count = state.photos.len();
        info!(index, count, "Photo added to session");
        self.emit(SessionEvent::PhotoCaptured { index, count });

        if count >= SESSION_PHOTO_COUNT {
            state.phase = SessionPhase::Full;
            let inner = Arc::clone(self);
            let task = tokio::spawn(inner.mark_strip_ready(generation));
            state.strip_ready_task = Some(task.abort_handle());
        } else {
            state.phase = SessionPhase::Idle;
        }
    }

    async fn mark_strip_ready(self: Arc<Self>, generation: u64) {
        let delay = self.time_unit.mul_f64(sequencer::STRIP_READY_DELAY_UNITS);
        tokio::time::sleep(delay).await;

        let mut state = self.lock();
        if state.generation != generation
            || state.photos.len() < SESSION_PHOTO_COUNT
            || state.strip_ready
        {
            return;
        }
        state.strip_ready = true;
        state.strip_ready_task = None;
        info!("Strip ready");
        self.emit(SessionEvent::StripReady);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{CameraFrame, PreviewSink};
    use crate::constants::capture;
    use image::{Rgba, RgbaImage};

    fn sequencer_with_frame() -> (CaptureSequencer, mpsc::UnboundedReceiver<SessionEvent>) {
        let sink = PreviewSink::new();
        sink.publish(CameraFrame::from_image(RgbaImage::from_pixel(
            32,
            24,
            Rgba([10, 20, 30, 255]),
        )));
        CaptureSequencer::new(
            PhotoPipeline::new(Arc::new(sink)),
            Duration::from_millis(100),
            FilterId::Original,
            true,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_is_rejected_while_counting() {
        let (sequencer, _events) = sequencer_with_frame();
        assert!(sequencer.request_capture());
        assert!(!sequencer.request_capture());
        assert_eq!(sequencer.snapshot().phase, SessionPhase::Counting);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_label_is_set_after_acceptance() {
        let (sequencer, mut events) = sequencer_with_frame();
        sequencer.request_capture();
        assert_eq!(
            events.recv().await,
            Some(SessionEvent::Countdown(Some("3...")))
        );
        assert_eq!(sequencer.snapshot().countdown, Some("3..."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quality_override_is_clamped() {
        let (sequencer, _events) = sequencer_with_frame();
        assert_eq!(sequencer.jpeg_quality(), capture::JPEG_QUALITY);
        sequencer.set_jpeg_quality(0);
        assert_eq!(sequencer.jpeg_quality(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quality_override_reaches_shared_clones() {
        let (sequencer, _events) = sequencer_with_frame();
        let observer = sequencer.clone();
        sequencer.set_jpeg_quality(70);
        assert_eq!(observer.jpeg_quality(), 70);
    }
}
