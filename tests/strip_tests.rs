// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for strip composition order and caption layout

use chrono::NaiveDate;
use image::{Rgba, RgbaImage};
use photobooth::errors::StripError;
use photobooth::pipelines::photo::{EncodedImage, PhotoEncoder};
use photobooth::pipelines::strip::{
    PhotoDecoder, Rect, StripCanvas, StripCompositor, StripLayout,
};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Gradient,
    Fill(Rect),
    Stroke(Rect),
    Shadow(Rect),
    Image(Rect),
    Text { text: String, y: f32, size: f32 },
}

/// Canvas that records draw calls; text is 0.6 em per character wide
#[derive(Default)]
struct RecordingCanvas {
    ops: Vec<Op>,
    measured: Vec<(String, f32)>,
}

impl StripCanvas for RecordingCanvas {
    fn size(&self) -> (u32, u32) {
        (600, 1400)
    }

    fn fill_vertical_gradient(&mut self, _top: [u8; 3], _bottom: [u8; 3]) {
        self.ops.push(Op::Gradient);
    }

    fn fill_rect(&mut self, rect: Rect, _color: [u8; 3]) {
        self.ops.push(Op::Fill(rect));
    }

    fn stroke_rect(&mut self, rect: Rect, _line_width: u32, _color: [u8; 3]) {
        self.ops.push(Op::Stroke(rect));
    }

    fn draw_shadow(&mut self, rect: Rect, _offset: i32, _blur: f32, _alpha: f32) {
        self.ops.push(Op::Shadow(rect));
    }

    fn draw_image(&mut self, _image: &RgbaImage, rect: Rect) {
        self.ops.push(Op::Image(rect));
    }

    fn measure_text(&mut self, text: &str, size: f32) -> f32 {
        self.measured.push((text.to_string(), size));
        text.chars().count() as f32 * size * 0.6
    }

    fn fill_text_centered(
        &mut self,
        text: &str,
        _center_x: f32,
        middle_y: f32,
        size: f32,
        _color: [u8; 3],
    ) -> Result<(), StripError> {
        self.ops.push(Op::Text {
            text: text.to_string(),
            y: middle_y,
            size,
        });
        Ok(())
    }
}

impl RecordingCanvas {
    fn image_slots(&self, layout: &StripLayout) -> Vec<usize> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Image(rect) => (0..3).find(|&i| layout.photo_rect(i) == *rect),
                _ => None,
            })
            .collect()
    }

    fn texts(&self) -> Vec<(String, f32, f32)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text { text, y, size } => Some((text.clone(), *y, *size)),
                _ => None,
            })
            .collect()
    }
}

/// Decoder that takes a per-slot amount of time, or fails for one slot
#[derive(Clone)]
struct ScriptedDecoder {
    delays_ms: [u64; 3],
    fail_slot: Option<usize>,
}

impl PhotoDecoder for ScriptedDecoder {
    fn decode(&self, index: usize, _image: &EncodedImage) -> Result<RgbaImage, String> {
        std::thread::sleep(Duration::from_millis(self.delays_ms[index]));
        if self.fail_slot == Some(index) {
            return Err("corrupt data".to_string());
        }
        Ok(RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255])))
    }
}

fn encoded() -> Vec<EncodedImage> {
    let image = RgbaImage::from_pixel(8, 6, Rgba([100, 100, 100, 255]));
    let encoded = PhotoEncoder::new(95).encode(&image).unwrap();
    vec![encoded.clone(), encoded.clone(), encoded]
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
}

#[tokio::test]
async fn test_photos_drawn_in_decode_completion_order() {
    let compositor = StripCompositor::default();
    let mut canvas = RecordingCanvas::default();
    let decoder = ScriptedDecoder {
        delays_ms: [600, 0, 300],
        fail_slot: None,
    };

    let order = compositor
        .compose_onto(&mut canvas, encoded(), date(), decoder)
        .await
        .unwrap();

    assert_eq!(order, vec![1, 2, 0]);
    assert_eq!(canvas.image_slots(compositor.layout()), vec![1, 2, 0]);
}

#[tokio::test]
async fn test_each_photo_gets_shadow_frame_and_border() {
    let compositor = StripCompositor::default();
    let layout = *compositor.layout();
    let mut canvas = RecordingCanvas::default();
    let decoder = ScriptedDecoder {
        delays_ms: [0, 200, 400],
        fail_slot: None,
    };
    compositor
        .compose_onto(&mut canvas, encoded(), date(), decoder)
        .await
        .unwrap();

    // Background first: gradient, then the outer border
    assert_eq!(canvas.ops[0], Op::Gradient);
    assert_eq!(canvas.ops[1], Op::Stroke(layout.border_rect()));

    let slot0 = &canvas.ops[2..7];
    assert_eq!(
        slot0,
        &[
            Op::Shadow(layout.frame_rect(0)),
            Op::Fill(layout.frame_rect(0)),
            Op::Shadow(layout.photo_rect(0)),
            Op::Image(layout.photo_rect(0)),
            Op::Stroke(layout.photo_rect(0)),
        ]
    );
}

#[tokio::test]
async fn test_caption_waits_for_all_photos() {
    let compositor = StripCompositor::default();
    let mut canvas = RecordingCanvas::default();
    let decoder = ScriptedDecoder {
        delays_ms: [200, 0, 100],
        fail_slot: None,
    };
    compositor
        .compose_onto(&mut canvas, encoded(), date(), decoder)
        .await
        .unwrap();

    let last_image = canvas
        .ops
        .iter()
        .rposition(|op| matches!(op, Op::Image(_)))
        .unwrap();
    let first_text = canvas
        .ops
        .iter()
        .position(|op| matches!(op, Op::Text { .. }))
        .unwrap();
    assert!(first_text > last_image);

    let texts = canvas.texts();
    assert_eq!(
        texts,
        vec![
            ("📸 College Wishlist".to_string(), 1270.0, 36.0),
            ("October 15, 2026".to_string(), 1330.0, 30.0),
        ]
    );
}

#[tokio::test]
async fn test_long_title_shrinks_to_floor() {
    let compositor = StripCompositor::new(StripLayout::default(), "x".repeat(60));
    let mut canvas = RecordingCanvas::default();
    let decoder = ScriptedDecoder {
        delays_ms: [0, 0, 0],
        fail_slot: None,
    };
    compositor
        .compose_onto(&mut canvas, encoded(), date(), decoder)
        .await
        .unwrap();

    let texts = canvas.texts();
    assert_eq!(texts[0].2, 16.0);
    // Date starts at max(16 - 6, 24) and fits
    assert_eq!(texts[1].2, 24.0);

    // One point at a time; the floor itself is never measured
    let title_sizes: Vec<f32> = canvas
        .measured
        .iter()
        .filter(|(text, _)| text.starts_with('x'))
        .map(|(_, size)| *size)
        .collect();
    let expected: Vec<f32> = (17..=36).rev().map(|size| size as f32).collect();
    assert_eq!(title_sizes, expected);

    let date_sizes: Vec<f32> = canvas
        .measured
        .iter()
        .filter(|(text, _)| text == "October 15, 2026")
        .map(|(_, size)| *size)
        .collect();
    assert_eq!(date_sizes, vec![24.0]);
}

#[tokio::test]
async fn test_decode_failure_skips_caption() {
    let compositor = StripCompositor::default();
    let mut canvas = RecordingCanvas::default();
    let decoder = ScriptedDecoder {
        delays_ms: [0, 0, 0],
        fail_slot: Some(2),
    };
    let err = compositor
        .compose_onto(&mut canvas, encoded(), date(), decoder)
        .await
        .unwrap_err();

    assert!(matches!(err, StripError::Decode { index: 2, .. }));
    assert!(canvas.texts().is_empty());
}

#[tokio::test]
async fn test_wrong_photo_count_draws_nothing() {
    let compositor = StripCompositor::default();
    let mut canvas = RecordingCanvas::default();
    let decoder = ScriptedDecoder {
        delays_ms: [0, 0, 0],
        fail_slot: None,
    };
    let mut photos = encoded();
    photos.pop();

    let err = compositor
        .compose_onto(&mut canvas, photos, date(), decoder)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StripError::PhotoCount {
            expected: 3,
            actual: 2
        }
    ));
    assert!(canvas.ops.is_empty());
}

#[tokio::test]
async fn test_scaled_strip_doubles_caption_geometry() {
    let compositor = StripCompositor::new(StripLayout::new(2.0), "Booth");
    let mut canvas = RecordingCanvas::default();
    let decoder = ScriptedDecoder {
        delays_ms: [0, 0, 0],
        fail_slot: None,
    };
    compositor
        .compose_onto(&mut canvas, encoded(), date(), decoder)
        .await
        .unwrap();

    let texts = canvas.texts();
    assert_eq!(texts[0], ("Booth".to_string(), 2540.0, 72.0));
}
