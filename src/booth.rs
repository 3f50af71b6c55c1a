// SPDX-License-Identifier: GPL-3.0-only

//! Photo booth façade
//!
//! Wires a negotiated live source, the capture sequencer, the strip
//! compositor and export together behind one handle. Dropping the booth
//! releases the camera.
//!
//! The strip is composed once the session reports it ready and kept until
//! the next reset; saving encodes the kept strip.

use crate::backends::camera::{
    CameraPlatform, ConstraintProfile, PreviewSink, VideoSourceHandle, acquire_video_source,
};
use crate::config::BoothConfig;
use crate::errors::{BoothResult, StripError};
use crate::pipelines::photo::PhotoPipeline;
use crate::pipelines::strip::{StripCompositor, StripLayout};
use crate::session::{CaptureSequencer, SessionEvent, SessionSnapshot};
use crate::storage::{DownloadAsset, export_strip};
use chrono::NaiveDate;
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Strip composed for one session generation
struct ComposedStrip {
    generation: u64,
    image: RgbaImage,
}

pub struct PhotoBooth {
    source: VideoSourceHandle,
    sequencer: CaptureSequencer,
    events: Option<mpsc::UnboundedReceiver<SessionEvent>>,
    compositor: StripCompositor,
    strip: Option<ComposedStrip>,
    config: BoothConfig,
}

impl PhotoBooth {
    /// Negotiate a camera on `platform` and set up a fresh session
    pub async fn acquire(platform: &dyn CameraPlatform, config: BoothConfig) -> BoothResult<Self> {
        let profiles = ConstraintProfile::default_fallbacks();
        let source = acquire_video_source(platform, &profiles, config.ready_timeout()).await?;
        info!(
            device = %source.device().path,
            format = %source.format(),
            "Booth camera ready"
        );
        Ok(Self::with_source(source, config))
    }

    /// Build a booth around an already playing source
    pub fn with_source(source: VideoSourceHandle, config: BoothConfig) -> Self {
        let pipeline = PhotoPipeline::new(Arc::new(source.sink().clone()));
        let (sequencer, events) =
            CaptureSequencer::new(pipeline, config.time_unit(), config.filter, config.mirror);
        sequencer.set_jpeg_quality(config.capture_quality);
        let compositor =
            StripCompositor::new(StripLayout::new(config.strip_scale), config.title.clone());

        Self {
            source,
            sequencer,
            events: Some(events),
            compositor,
            strip: None,
            config,
        }
    }

    pub fn sequencer(&self) -> &CaptureSequencer {
        &self.sequencer
    }

    /// Sink the preview reads frames from
    pub fn preview(&self) -> &PreviewSink {
        self.source.sink()
    }

    pub fn source(&self) -> &VideoSourceHandle {
        &self.source
    }

    pub fn config(&self) -> &BoothConfig {
        &self.config
    }

    /// Take the session event receiver; only the first call gets it
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.events.take()
    }

    pub fn request_capture(&self) -> bool {
        self.sequencer.request_capture()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.sequencer.snapshot()
    }

    /// Compose the current session into a strip dated `date`
    pub async fn compose_strip(&self, date: NaiveDate) -> Result<RgbaImage, StripError> {
        let photos = self.sequencer.photos();
        self.compositor.compose(&photos, date).await
    }

    /// Strip of the current session, if it was composed already
    pub fn strip(&self) -> Option<&RgbaImage> {
        let generation = self.sequencer.snapshot().generation;
        self.strip
            .as_ref()
            .filter(|strip| strip.generation == generation)
            .map(|strip| &strip.image)
    }

    /// Compose the current session's strip, dated today, unless it already is
    ///
    /// Called when the session reports [`SessionEvent::StripReady`]. A strip
    /// composed before a reset is never returned for the new session.
    pub async fn finalize_strip(&mut self) -> Result<&RgbaImage, StripError> {
        let snapshot = self.sequencer.snapshot();
        let cached = self
            .strip
            .as_ref()
            .is_some_and(|strip| strip.generation == snapshot.generation);

        if !cached {
            let date = chrono::Local::now().date_naive();
            let image = self.compositor.compose(&snapshot.photos, date).await?;
            info!(generation = snapshot.generation, "Strip composed");
            self.strip = Some(ComposedStrip {
                generation: snapshot.generation,
                image,
            });
        }

        match &self.strip {
            Some(strip) => Ok(&strip.image),
            None => Err(StripError::Render("strip missing after composition".to_string())),
        }
    }

    /// Encode the session's strip for download
    pub async fn export(&mut self) -> BoothResult<DownloadAsset> {
        let strip = self.finalize_strip().await?.clone();
        let quality = self.config.export_quality;
        let asset = tokio::task::spawn_blocking(move || {
            export_strip(&strip, chrono::Utc::now(), quality)
        })
        .await
        .map_err(|e| StripError::Encoding(e.to_string()))??;
        Ok(asset)
    }

    /// Export and write the strip to the configured output folder
    pub async fn save(&mut self) -> BoothResult<PathBuf> {
        let asset = self.export().await?;
        let path = asset.save_to(&self.config.output_dir()).await?;
        Ok(path)
    }

    /// Discard the session and start over
    pub fn reset(&self) {
        self.sequencer.reset();
    }

    /// Stop the session and release the camera
    pub fn teardown(&mut self) {
        if self.source.is_active() {
            self.sequencer.reset();
        }
        self.source.release();
    }

    /// Wait for the next session event
    ///
    /// A [`SessionEvent::StripReady`] composes the strip before it is
    /// returned. `None` once the receiver was taken or the sequencer is gone.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let event = match self.events.as_mut() {
            Some(events) => events.recv().await,
            None => {
                warn!("Session events already taken");
                None
            }
        }?;
        if event == SessionEvent::StripReady
            && let Err(e) = self.finalize_strip().await
        {
            warn!(error = %e, "Failed to compose strip");
        }
        Some(event)
    }
}

impl Drop for PhotoBooth {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for PhotoBooth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoBooth")
            .field("source", &self.source)
            .field("sequencer", &self.sequencer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_camera::StillImagePlatform;
    use crate::session::SessionPhase;
    use image::Rgba;

    fn platform() -> StillImagePlatform {
        StillImagePlatform::from_image("test", RgbaImage::from_pixel(640, 480, Rgba([90, 120, 150, 255])))
    }

    fn fast_config() -> BoothConfig {
        BoothConfig {
            time_unit_ms: 10,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_acquire_and_fill_session() {
        let mut booth = PhotoBooth::acquire(&platform(), fast_config()).await.unwrap();
        assert!(booth.source().is_active());

        for _ in 0..3 {
            assert!(booth.request_capture());
            loop {
                match booth.next_event().await {
                    Some(SessionEvent::PhotoCaptured { .. }) => break,
                    Some(SessionEvent::CaptureDropped) | None => panic!("capture failed"),
                    Some(_) => {}
                }
            }
        }
        assert_eq!(booth.snapshot().phase, SessionPhase::Full);

        while booth.next_event().await != Some(SessionEvent::StripReady) {}
        let strip = booth.compose_strip(NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()).await.unwrap();
        assert_eq!(strip.dimensions(), (600, 1400));
    }

    async fn fill_session(booth: &mut PhotoBooth) {
        for _ in 0..3 {
            assert!(booth.request_capture());
            while !matches!(booth.next_event().await, Some(SessionEvent::PhotoCaptured { .. })) {}
        }
    }

    #[tokio::test]
    async fn test_strip_is_composed_when_ready() {
        let mut booth = PhotoBooth::acquire(&platform(), fast_config()).await.unwrap();
        fill_session(&mut booth).await;
        assert!(booth.strip().is_none());

        while booth.next_event().await != Some(SessionEvent::StripReady) {}
        let strip = booth.strip().expect("strip composed on ready");
        assert_eq!(strip.dimensions(), (600, 1400));
    }

    #[tokio::test]
    async fn test_reset_forgets_composed_strip() {
        let mut booth = PhotoBooth::acquire(&platform(), fast_config()).await.unwrap();
        fill_session(&mut booth).await;
        while booth.next_event().await != Some(SessionEvent::StripReady) {}
        assert!(booth.strip().is_some());

        booth.reset();
        assert!(booth.strip().is_none());
        assert!(matches!(
            booth.finalize_strip().await,
            Err(StripError::PhotoCount { actual: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_export_encodes_composed_strip() {
        let mut booth = PhotoBooth::acquire(&platform(), fast_config()).await.unwrap();
        fill_session(&mut booth).await;
        while booth.next_event().await != Some(SessionEvent::StripReady) {}

        let asset = booth.export().await.unwrap();
        let decoded = asset.image.decode().unwrap();
        assert_eq!(decoded.dimensions(), (600, 1400));
        assert_eq!(asset.image.quality, 98);
    }

    #[tokio::test]
    async fn test_teardown_releases_camera() {
        let mut booth = PhotoBooth::acquire(&platform(), fast_config()).await.unwrap();
        booth.teardown();
        assert!(!booth.source().is_active());
        assert!(booth.preview().latest_frame().is_none());
        booth.teardown();
    }
}
