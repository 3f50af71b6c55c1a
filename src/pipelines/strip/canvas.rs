// SPDX-License-Identifier: GPL-3.0-only

//! Drawing surface for strips

use super::layout::Rect;
use super::text::TextRenderer;
use crate::errors::StripError;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgba, RgbaImage};

/// The drawing operations the compositor needs
///
/// Coordinates are pixels. Text positions are the horizontal center and the
/// vertical middle of the line.
pub trait StripCanvas {
    fn size(&self) -> (u32, u32);

    /// Fill the whole canvas with a top-to-bottom gradient
    fn fill_vertical_gradient(&mut self, top: [u8; 3], bottom: [u8; 3]);

    fn fill_rect(&mut self, rect: Rect, color: [u8; 3]);

    /// Stroke centered on the rectangle's edges
    fn stroke_rect(&mut self, rect: Rect, line_width: u32, color: [u8; 3]);

    /// Soft black shadow of `rect`, shifted by `offset` on both axes
    fn draw_shadow(&mut self, rect: Rect, offset: i32, blur: f32, alpha: f32);

    /// Draw `image` scaled to exactly fill `rect`
    fn draw_image(&mut self, image: &RgbaImage, rect: Rect);

    /// Width of `text` at `size` pixels
    fn measure_text(&mut self, text: &str, size: f32) -> f32;

    fn fill_text_centered(
        &mut self,
        text: &str,
        center_x: f32,
        middle_y: f32,
        size: f32,
        color: [u8; 3],
    ) -> Result<(), StripError>;
}

/// CPU canvas backed by an RGBA image
#[derive(Debug)]
pub struct RasterCanvas {
    image: RgbaImage,
    text: TextRenderer,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32, text: TextRenderer) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])),
            text,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Clip a rect to the canvas; `None` if nothing is left
    fn clip(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let x0 = rect.x.max(0);
        let y0 = rect.y.max(0);
        let x1 = rect.right().min(self.image.width() as i32);
        let y1 = rect.bottom().min(self.image.height() as i32);
        (x0 < x1 && y0 < y1).then_some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    fn blend_pixel(&mut self, x: u32, y: u32, color: [u8; 3], alpha: f32) {
        let dst = self.image.get_pixel_mut(x, y);
        for c in 0..3 {
            let v = color[c] as f32 * alpha + dst[c] as f32 * (1.0 - alpha);
            dst[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
}

impl StripCanvas for RasterCanvas {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn fill_vertical_gradient(&mut self, top: [u8; 3], bottom: [u8; 3]) {
        let height = self.image.height();
        let span = height.saturating_sub(1).max(1) as f32;
        for (y, row) in self.image.enumerate_rows_mut() {
            let t = y as f32 / span;
            let mut color = [0u8; 3];
            for c in 0..3 {
                color[c] = (top[c] as f32 + (bottom[c] as f32 - top[c] as f32) * t).round() as u8;
            }
            for (_, _, pixel) in row {
                *pixel = Rgba([color[0], color[1], color[2], 255]);
            }
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: [u8; 3]) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                self.image
                    .put_pixel(x, y, Rgba([color[0], color[1], color[2], 255]));
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, line_width: u32, color: [u8; 3]) {
        let half_out = (line_width / 2) as i32;
        let half_in = line_width as i32 - half_out;
        let outer = rect.outset(half_out);
        let inner = rect.outset(-half_in);
        let Some((x0, y0, x1, y1)) = self.clip(outer) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                if !inner.contains(x as i32, y as i32) {
                    self.image
                        .put_pixel(x, y, Rgba([color[0], color[1], color[2], 255]));
                }
            }
        }
    }

    fn draw_shadow(&mut self, rect: Rect, offset: i32, blur: f32, alpha: f32) {
        // Canvas shadow blur is twice the Gaussian sigma
        let sigma = (blur / 2.0).max(0.0);
        let pad = (sigma * 3.0).ceil() as i32;
        let shadow = rect.translate(offset, offset);
        let area = shadow.outset(pad);

        let mut mask = GrayImage::new(area.width, area.height);
        for y in pad..pad + shadow.height as i32 {
            for x in pad..pad + shadow.width as i32 {
                mask.put_pixel(x as u32, y as u32, Luma([255]));
            }
        }
        let mask = if sigma > 0.0 {
            imageops::blur(&mask, sigma)
        } else {
            mask
        };

        let Some((x0, y0, x1, y1)) = self.clip(area) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let m = mask.get_pixel((x as i32 - area.x) as u32, (y as i32 - area.y) as u32)[0];
                if m > 0 {
                    self.blend_pixel(x, y, [0, 0, 0], alpha * m as f32 / 255.0);
                }
            }
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, rect: Rect) {
        if rect.width == 0 || rect.height == 0 {
            return;
        }
        let scaled;
        let source = if image.dimensions() == (rect.width, rect.height) {
            image
        } else {
            scaled = imageops::resize(image, rect.width, rect.height, FilterType::CatmullRom);
            &scaled
        };
        imageops::overlay(&mut self.image, source, rect.x as i64, rect.y as i64);
    }

    fn measure_text(&mut self, text: &str, size: f32) -> f32 {
        self.text.measure(text, size)
    }

    fn fill_text_centered(
        &mut self,
        text: &str,
        center_x: f32,
        middle_y: f32,
        size: f32,
        color: [u8; 3],
    ) -> Result<(), StripError> {
        self.text
            .draw_centered(&mut self.image, text, center_x, middle_y, size, color)
    }
}
