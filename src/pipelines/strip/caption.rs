// SPDX-License-Identifier: GPL-3.0-only

//! Caption text and font fitting

use crate::constants::strip;
use chrono::NaiveDate;

/// Largest size, starting at `base` and stepping down by 1, at which
/// `measure(size)` fits in `max_width`; never below `floor`
pub fn fit_font_size(mut measure: impl FnMut(u32) -> f32, base: u32, max_width: f32, floor: u32) -> u32 {
    let mut size = base;
    while size > floor && measure(size) > max_width {
        size -= 1;
    }
    size
}

/// Starting size of the date line, derived from the fitted title size
pub fn date_start_size(title_size: u32) -> u32 {
    title_size
        .saturating_sub(strip::DATE_FONT_STEP)
        .max(strip::DATE_MIN_START)
}

/// Long-form caption date, e.g. "October 15, 2026"
pub fn format_caption_date(date: NaiveDate) -> String {
    date.format(strip::DATE_FORMAT).to_string()
}

/// The two caption lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub title: String,
    pub date: String,
}

impl Caption {
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            date: format_caption_date(date),
        }
    }
}
