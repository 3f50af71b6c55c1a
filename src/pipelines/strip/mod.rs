// SPDX-License-Identifier: GPL-3.0-only

//! Strip compositor
//!
//! Lays three captured photos out vertically on a 600×1400 (logical) strip
//! and adds a two-line caption in the band at the bottom.
//!
//! ```text
//! ┌──────────────┐
//! │ ┌──────────┐ │  ← slot 0
//! │ └──────────┘ │
//! │ ┌──────────┐ │  ← slot 1
//! │ └──────────┘ │
//! │ ┌──────────┐ │  ← slot 2
//! │ └──────────┘ │
//! │    title     │  ← caption band
//! │     date     │
//! └──────────────┘
//! ```
//!
//! Photos are decoded on blocking workers and drawn in whichever order the
//! decodes finish; the caption is drawn only after all three are on the
//! canvas.

pub mod canvas;
pub mod caption;
pub mod layout;
pub mod text;

pub use canvas::{RasterCanvas, StripCanvas};
pub use caption::{Caption, date_start_size, fit_font_size, format_caption_date};
pub use layout::{Rect, StripLayout};
pub use text::TextRenderer;

use crate::constants::{SESSION_PHOTO_COUNT, strip};
use crate::errors::StripError;
use crate::pipelines::photo::{CapturedPhoto, EncodedImage};
use chrono::NaiveDate;
use image::RgbaImage;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Decodes the photo in one slot
pub trait PhotoDecoder: Send + Sync + Clone + 'static {
    fn decode(&self, index: usize, image: &EncodedImage) -> Result<RgbaImage, String>;
}

/// JPEG decoding through the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegDecoder;

impl PhotoDecoder for JpegDecoder {
    fn decode(&self, _index: usize, image: &EncodedImage) -> Result<RgbaImage, String> {
        image.decode().map_err(|e| e.to_string())
    }
}

/// Composes captured photos into a strip
#[derive(Debug, Clone)]
pub struct StripCompositor {
    layout: StripLayout,
    title: String,
}

impl Default for StripCompositor {
    fn default() -> Self {
        Self::new(StripLayout::default(), strip::CAPTION_TITLE)
    }
}

impl StripCompositor {
    pub fn new(layout: StripLayout, title: impl Into<String>) -> Self {
        Self {
            layout,
            title: title.into(),
        }
    }

    pub fn layout(&self) -> &StripLayout {
        &self.layout
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// A blank raster canvas of the strip's size using the system fonts
    pub fn raster_canvas(&self) -> RasterCanvas {
        RasterCanvas::new(
            self.layout.width(),
            self.layout.height(),
            TextRenderer::system(strip::CAPTION_FONT_FAMILY, true),
        )
    }

    /// Compose a session's photos into an RGBA strip
    pub async fn compose(
        &self,
        photos: &[CapturedPhoto],
        date: NaiveDate,
    ) -> Result<RgbaImage, StripError> {
        let images = photos.iter().map(|p| p.image.clone()).collect();
        let mut canvas = self.raster_canvas();
        self.compose_onto(&mut canvas, images, date, JpegDecoder)
            .await?;
        Ok(canvas.into_image())
    }

    /// Draw a strip onto any canvas
    ///
    /// Returns the slot indices in the order they were drawn.
    pub async fn compose_onto<C, D>(
        &self,
        canvas: &mut C,
        images: Vec<EncodedImage>,
        date: NaiveDate,
        decoder: D,
    ) -> Result<Vec<usize>, StripError>
    where
        C: StripCanvas + Send,
        D: PhotoDecoder,
    {
        if images.len() != SESSION_PHOTO_COUNT {
            return Err(StripError::PhotoCount {
                expected: SESSION_PHOTO_COUNT,
                actual: images.len(),
            });
        }

        self.draw_background(canvas);

        let mut decodes = JoinSet::new();
        for (index, image) in images.into_iter().enumerate() {
            let decoder = decoder.clone();
            decodes.spawn_blocking(move || (index, decoder.decode(index, &image)));
        }

        let mut drawn = Vec::with_capacity(SESSION_PHOTO_COUNT);
        while let Some(joined) = decodes.join_next().await {
            let (index, decoded) = joined.map_err(|e| StripError::Render(e.to_string()))?;
            let photo = decoded.map_err(|reason| StripError::Decode { index, reason })?;
            self.draw_photo(canvas, index, &photo);
            drawn.push(index);
            debug!(slot = index, drawn = drawn.len(), "Photo drawn onto strip");
        }

        // Caption waits for every slot
        if drawn.len() == SESSION_PHOTO_COUNT {
            self.draw_caption(canvas, &Caption::new(self.title.clone(), date))?;
        }

        info!(
            width = self.layout.width(),
            height = self.layout.height(),
            order = ?drawn,
            "Strip composed"
        );
        Ok(drawn)
    }

    fn draw_background<C: StripCanvas>(&self, canvas: &mut C) {
        canvas.fill_vertical_gradient(strip::BACKGROUND_TOP, strip::BACKGROUND_BOTTOM);
        canvas.stroke_rect(
            self.layout.border_rect(),
            self.layout.line_width(),
            strip::STRIP_BORDER_COLOR,
        );
    }

    fn draw_photo<C: StripCanvas>(&self, canvas: &mut C, index: usize, photo: &RgbaImage) {
        let frame = self.layout.frame_rect(index);
        let cell = self.layout.photo_rect(index);
        let offset = self.layout.shadow_offset();
        let blur = self.layout.shadow_blur();

        // The shadow is active for both the frame and the photo
        canvas.draw_shadow(frame, offset, blur, strip::SHADOW_ALPHA);
        canvas.fill_rect(frame, strip::FRAME_COLOR);
        canvas.draw_shadow(cell, offset, blur, strip::SHADOW_ALPHA);
        canvas.draw_image(photo, cell);
        canvas.stroke_rect(cell, self.layout.line_width(), strip::CELL_BORDER_COLOR);
    }

    fn draw_caption<C: StripCanvas>(
        &self,
        canvas: &mut C,
        caption: &Caption,
    ) -> Result<(), StripError> {
        let layout = self.layout;
        let max_width = layout.max_text_width();
        let center_x = layout.center_x();

        let title_size = fit_font_size(
            |size| canvas.measure_text(&caption.title, layout.px(size as f32)),
            strip::TITLE_FONT_SIZE,
            max_width,
            strip::MIN_FONT_SIZE,
        );
        canvas.fill_text_centered(
            &caption.title,
            center_x,
            layout.title_y(),
            layout.px(title_size as f32),
            strip::CAPTION_COLOR,
        )?;

        let date_size = fit_font_size(
            |size| canvas.measure_text(&caption.date, layout.px(size as f32)),
            date_start_size(title_size),
            max_width,
            strip::MIN_FONT_SIZE,
        );
        canvas.fill_text_centered(
            &caption.date,
            center_x,
            layout.date_y(),
            layout.px(date_size as f32),
            strip::CAPTION_COLOR,
        )?;

        debug!(title_size, date_size, date = %caption.date, "Caption drawn");
        Ok(())
    }
}

/// Compose with the default layout and title
pub async fn compose_strip(
    photos: &[CapturedPhoto],
    date: NaiveDate,
) -> Result<RgbaImage, StripError> {
    StripCompositor::default().compose(photos, date).await
}
