// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use photobooth::constants::{SESSION_PHOTO_COUNT, capture, export, file_formats, sequencer, strip};

#[test]
fn test_countdown_labels_in_order() {
    assert_eq!(
        sequencer::COUNTDOWN_LABELS,
        ["3...", "2...", "1...", "Smile..."]
    );
}

#[test]
fn test_photos_end_above_the_title_line() {
    // With the margin clamp the last slot reaches slightly into the caption
    // band, but must stay clear of the title text
    let photos = SESSION_PHOTO_COUNT as u32 * strip::PHOTO_HEIGHT
        + (SESSION_PHOTO_COUNT as u32 - 1) * strip::PHOTO_SPACING;
    let last_bottom = strip::MARGIN + photos;
    let title_line = strip::HEIGHT - strip::CAPTION_BAND_HEIGHT + strip::TITLE_OFFSET;
    assert!(last_bottom + strip::FRAME_INSET < title_line - strip::TITLE_FONT_SIZE / 2);
    assert!(strip::PHOTO_WIDTH + 2 * strip::MARGIN <= strip::WIDTH);
}

#[test]
fn test_caption_fonts_stay_above_floor() {
    assert!(strip::TITLE_FONT_SIZE > strip::MIN_FONT_SIZE);
    assert!(strip::DATE_MIN_START > strip::MIN_FONT_SIZE);
}

#[test]
fn test_jpeg_qualities() {
    // Final strip is encoded at a higher quality than single captures
    assert_eq!(capture::JPEG_QUALITY, 95);
    assert_eq!(export::JPEG_QUALITY, 98);
    assert!(export::JPEG_QUALITY > capture::JPEG_QUALITY);
}

#[test]
fn test_upscale_bounds() {
    assert!(capture::MIN_SCALE <= capture::MAX_SCALE);
    assert_eq!(capture::TARGET_WIDTH, 1920);
}

#[test]
fn test_image_extensions_case_insensitive() {
    assert!(file_formats::is_image_extension("JPG"));
    assert!(file_formats::is_image_extension("png"));
    assert!(!file_formats::is_image_extension("mp4"));
}
