// SPDX-License-Identifier: GPL-3.0-only

//! Async single-photo capture
//!
//! ```text
//! Live source → Rasterize (scale, filter, mirror) → JPEG q95 → CapturedPhoto
//!       ↓
//! Preview continues uninterrupted
//! ```
//!
//! Rasterizing runs on a blocking worker so the countdown task and the
//! preview never stall on it.

pub mod encoding;
pub mod rasterizer;

pub use encoding::{EncodedImage, PhotoEncoder};
pub use rasterizer::{RasterOptions, capture_frame, render_frame};

use crate::backends::camera::LiveSource;
use std::sync::Arc;
use tracing::{info, warn};

/// One snapshot taken during a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPhoto {
    pub image: EncodedImage,
    /// Milliseconds since the Unix epoch
    pub captured_at: i64,
}

/// Captures photos from a shared live source
#[derive(Clone)]
pub struct PhotoPipeline {
    source: Arc<dyn LiveSource>,
}

impl PhotoPipeline {
    pub fn new(source: Arc<dyn LiveSource>) -> Self {
        Self { source }
    }

    /// Rasterize the current frame on a blocking worker
    ///
    /// `None` if the source had no frame or encoding failed.
    pub async fn capture(&self, options: RasterOptions) -> Option<CapturedPhoto> {
        let source = Arc::clone(&self.source);
        let result =
            tokio::task::spawn_blocking(move || capture_frame(source.as_ref(), options)).await;

        match result {
            Ok(Some(image)) => {
                info!(
                    width = image.width,
                    height = image.height,
                    size = image.len(),
                    filter = %options.filter,
                    "Photo captured"
                );
                Some(CapturedPhoto {
                    image,
                    captured_at: chrono::Utc::now().timestamp_millis(),
                })
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Capture task failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for PhotoPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoPipeline").finish_non_exhaustive()
    }
}
