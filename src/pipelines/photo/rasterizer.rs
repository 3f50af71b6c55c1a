// SPDX-License-Identifier: GPL-3.0-only

//! Frame rasterizer
//!
//! Turns whatever frame the live source is showing into a still JPEG:
//! upscale toward the target width, render the filter chain onto the
//! output surface, mirror to match the self-view, encode.

use super::encoding::{EncodedImage, PhotoEncoder};
use crate::backends::camera::LiveSource;
use crate::constants::capture;
use crate::errors::PhotoError;
use crate::filters::{FilterId, apply_adjustments};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use tracing::{debug, warn};

/// Options for one capture
#[derive(Debug, Clone, Copy)]
pub struct RasterOptions {
    pub filter: FilterId,
    pub mirror: bool,
    pub jpeg_quality: u8,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            filter: FilterId::Original,
            mirror: true,
            jpeg_quality: capture::JPEG_QUALITY,
        }
    }
}

/// Upscale factor for a frame of the given width
///
/// `clamp(1920 / width, 1, 2)`: frames are never shrunk and never more than
/// doubled.
pub fn scale_factor(source_width: u32) -> f64 {
    if source_width == 0 {
        return capture::MIN_SCALE;
    }
    (capture::TARGET_WIDTH as f64 / source_width as f64).clamp(capture::MIN_SCALE, capture::MAX_SCALE)
}

/// Output dimensions for a source frame
pub fn output_size(width: u32, height: u32) -> (u32, u32) {
    let factor = scale_factor(width);
    (
        ((width as f64 * factor).round() as u32).max(1),
        ((height as f64 * factor).round() as u32).max(1),
    )
}

/// Render a frame into the output surface without encoding
pub fn render_frame(frame: &RgbaImage, filter: FilterId, mirror: bool) -> RgbaImage {
    let (width, height) = frame.dimensions();
    let (out_w, out_h) = output_size(width, height);

    let mut surface = if (out_w, out_h) == (width, height) {
        frame.clone()
    } else {
        imageops::resize(frame, out_w, out_h, FilterType::CatmullRom)
    };

    apply_adjustments(&mut surface, filter.descriptor().adjustments);

    if mirror {
        imageops::flip_horizontal_in_place(&mut surface);
    }
    surface
}

/// Capture the live source's current frame as a JPEG
///
/// Returns `None` when the source has no frame yet or encoding fails; the
/// live frame itself is never modified.
pub fn capture_frame(source: &dyn LiveSource, options: RasterOptions) -> Option<EncodedImage> {
    match try_capture_frame(source, options) {
        Ok(encoded) => Some(encoded),
        Err(e) => {
            warn!(error = %e, "Capture produced no image");
            None
        }
    }
}

/// Like [`capture_frame`], but says why nothing was produced
pub fn try_capture_frame(
    source: &dyn LiveSource,
    options: RasterOptions,
) -> Result<EncodedImage, PhotoError> {
    let frame = source.current_frame().ok_or(PhotoError::FrameUnavailable)?;
    let image = frame.to_image().ok_or(PhotoError::FrameUnavailable)?;

    let surface = render_frame(&image, options.filter, options.mirror);
    debug!(
        source_width = frame.width,
        source_height = frame.height,
        width = surface.width(),
        height = surface.height(),
        filter = %options.filter,
        mirror = options.mirror,
        "Frame rasterized"
    );

    PhotoEncoder::new(options.jpeg_quality).encode(&surface)
}
