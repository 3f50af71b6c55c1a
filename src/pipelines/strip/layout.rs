// SPDX-License-Identifier: GPL-3.0-only

//! Strip geometry
//!
//! All constants are logical units; [`StripLayout::scale`] multiplies them
//! into pixels.

use crate::constants::{SESSION_PHOTO_COUNT, strip};

/// Integer pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Grow on every side by `amount` (shrink if negative)
    pub fn outset(&self, amount: i32) -> Self {
        Self {
            x: self.x - amount,
            y: self.y - amount,
            width: (self.width as i32 + 2 * amount).max(0) as u32,
            height: (self.height as i32 + 2 * amount).max(0) as u32,
        }
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Pixel geometry of a strip at a given scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripLayout {
    scale: f32,
}

impl Default for StripLayout {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl StripLayout {
    /// Non-positive or non-finite scales fall back to 1
    pub fn new(scale: f32) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        Self { scale }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Logical units to pixels
    pub fn px(&self, units: f32) -> f32 {
        units * self.scale
    }

    fn px_i(&self, units: f32) -> i32 {
        self.px(units).round() as i32
    }

    fn px_u(&self, units: u32) -> u32 {
        self.px(units as f32).round() as u32
    }

    pub fn width(&self) -> u32 {
        self.px_u(strip::WIDTH)
    }

    pub fn height(&self) -> u32 {
        self.px_u(strip::HEIGHT)
    }

    /// Offset of the first slot: photos are centered in the area above the
    /// caption band, but never closer to the edge than the margin
    pub fn top_offset(&self) -> f32 {
        let available = (strip::HEIGHT - strip::CAPTION_BAND_HEIGHT) as f32;
        let photos = SESSION_PHOTO_COUNT as f32 * strip::PHOTO_HEIGHT as f32
            + (SESSION_PHOTO_COUNT as f32 - 1.0) * strip::PHOTO_SPACING as f32;
        (strip::MARGIN as f32).max((available - photos) / 2.0)
    }

    /// Cell the photo at `index` is drawn into
    pub fn photo_rect(&self, index: usize) -> Rect {
        let y = self.top_offset()
            + index as f32 * (strip::PHOTO_HEIGHT + strip::PHOTO_SPACING) as f32;
        Rect::new(
            self.px_i(strip::MARGIN as f32),
            self.px_i(y),
            self.px_u(strip::PHOTO_WIDTH),
            self.px_u(strip::PHOTO_HEIGHT),
        )
    }

    /// White frame behind the photo at `index`
    pub fn frame_rect(&self, index: usize) -> Rect {
        self.photo_rect(index)
            .outset(self.px_i(strip::FRAME_INSET as f32))
    }

    /// Outer border, inset so a centered stroke stays on the canvas
    pub fn border_rect(&self) -> Rect {
        let inset = self.px_i(strip::BORDER_WIDTH as f32 / 2.0);
        Rect::new(0, 0, self.width(), self.height()).outset(-inset)
    }

    pub fn line_width(&self) -> u32 {
        self.px_u(strip::BORDER_WIDTH).max(1)
    }

    pub fn caption_band_top(&self) -> f32 {
        self.px((strip::HEIGHT - strip::CAPTION_BAND_HEIGHT) as f32)
    }

    pub fn title_y(&self) -> f32 {
        self.caption_band_top() + self.px(strip::TITLE_OFFSET as f32)
    }

    pub fn date_y(&self) -> f32 {
        self.caption_band_top() + self.px(strip::DATE_OFFSET as f32)
    }

    pub fn center_x(&self) -> f32 {
        self.width() as f32 / 2.0
    }

    /// Widest a caption line may be
    pub fn max_text_width(&self) -> f32 {
        self.px((strip::WIDTH - strip::CAPTION_PADDING) as f32)
    }

    pub fn shadow_offset(&self) -> i32 {
        self.px_i(strip::SHADOW_OFFSET as f32)
    }

    pub fn shadow_blur(&self) -> f32 {
        self.px(strip::SHADOW_BLUR)
    }
}
