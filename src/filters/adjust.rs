// SPDX-License-Identifier: GPL-3.0-only

//! CPU rendering of adjustment chains onto RGBA images
//!
//! Colour steps use the Filter Effects colour matrices and transfer
//! functions, clamped to [0, 1] after every step. Consecutive colour steps are
//! applied in one pass over the pixels; blur breaks the pass.

use super::Adjustment;
use image::RgbaImage;
use tracing::debug;

/// A per-pixel colour operation on normalized RGB
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorOp {
    Matrix([[f32; 3]; 3]),
    /// `v * slope + intercept` on every channel
    Linear { slope: f32, intercept: f32 },
}

impl Adjustment {
    /// Per-pixel form of this adjustment; `None` for blur
    pub fn color_op(&self) -> Option<ColorOp> {
        match *self {
            Adjustment::Grayscale(amount) => {
                let g = 1.0 - amount.clamp(0.0, 1.0);
                Some(ColorOp::Matrix([
                    [0.2126 + 0.7874 * g, 0.7152 - 0.7152 * g, 0.0722 - 0.0722 * g],
                    [0.2126 - 0.2126 * g, 0.7152 + 0.2848 * g, 0.0722 - 0.0722 * g],
                    [0.2126 - 0.2126 * g, 0.7152 - 0.7152 * g, 0.0722 + 0.9278 * g],
                ]))
            }
            Adjustment::Sepia(amount) => {
                let s = 1.0 - amount.clamp(0.0, 1.0);
                Some(ColorOp::Matrix([
                    [0.393 + 0.607 * s, 0.769 - 0.769 * s, 0.189 - 0.189 * s],
                    [0.349 - 0.349 * s, 0.686 + 0.314 * s, 0.168 - 0.168 * s],
                    [0.272 - 0.272 * s, 0.534 - 0.534 * s, 0.131 + 0.869 * s],
                ]))
            }
            Adjustment::Saturate(s) => {
                let s = s.max(0.0);
                Some(ColorOp::Matrix([
                    [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
                    [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
                    [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
                ]))
            }
            Adjustment::HueRotate(degrees) => {
                let (sin, cos) = degrees.to_radians().sin_cos();
                Some(ColorOp::Matrix([
                    [
                        0.213 + cos * 0.787 - sin * 0.213,
                        0.715 - cos * 0.715 - sin * 0.715,
                        0.072 - cos * 0.072 + sin * 0.928,
                    ],
                    [
                        0.213 - cos * 0.213 + sin * 0.143,
                        0.715 + cos * 0.285 + sin * 0.140,
                        0.072 - cos * 0.072 - sin * 0.283,
                    ],
                    [
                        0.213 - cos * 0.213 - sin * 0.787,
                        0.715 - cos * 0.715 + sin * 0.715,
                        0.072 + cos * 0.928 + sin * 0.072,
                    ],
                ]))
            }
            Adjustment::Brightness(b) => Some(ColorOp::Linear {
                slope: b.max(0.0),
                intercept: 0.0,
            }),
            Adjustment::Contrast(c) => {
                let c = c.max(0.0);
                Some(ColorOp::Linear {
                    slope: c,
                    intercept: 0.5 - 0.5 * c,
                })
            }
            Adjustment::Invert(amount) => {
                let a = amount.clamp(0.0, 1.0);
                Some(ColorOp::Linear {
                    slope: 1.0 - 2.0 * a,
                    intercept: a,
                })
            }
            Adjustment::Blur(_) => None,
        }
    }
}

/// Apply one colour operation to a normalized RGB triple, clamping the result
pub fn apply_color_op(rgb: [f32; 3], op: &ColorOp) -> [f32; 3] {
    let out = match op {
        ColorOp::Matrix(m) => [
            m[0][0] * rgb[0] + m[0][1] * rgb[1] + m[0][2] * rgb[2],
            m[1][0] * rgb[0] + m[1][1] * rgb[1] + m[1][2] * rgb[2],
            m[2][0] * rgb[0] + m[2][1] * rgb[1] + m[2][2] * rgb[2],
        ],
        ColorOp::Linear { slope, intercept } => [
            rgb[0] * slope + intercept,
            rgb[1] * slope + intercept,
            rgb[2] * slope + intercept,
        ],
    };
    out.map(|v| v.clamp(0.0, 1.0))
}

/// Render an adjustment chain onto `image` in place
pub fn apply_adjustments(image: &mut RgbaImage, adjustments: &[Adjustment]) {
    if adjustments.is_empty() {
        return;
    }

    let mut run: Vec<ColorOp> = Vec::with_capacity(adjustments.len());
    for adjustment in adjustments {
        match adjustment.color_op() {
            Some(op) => run.push(op),
            None => {
                apply_color_run(image, &run);
                run.clear();
                if let Adjustment::Blur(radius) = adjustment
                    && *radius > 0.0
                {
                    *image = image::imageops::blur(&*image, *radius);
                }
            }
        }
    }
    apply_color_run(image, &run);

    debug!(
        width = image.width(),
        height = image.height(),
        steps = adjustments.len(),
        "Adjustments applied"
    );
}

fn apply_color_run(image: &mut RgbaImage, run: &[ColorOp]) {
    if run.is_empty() {
        return;
    }
    for pixel in image.pixels_mut() {
        let mut rgb = [
            pixel[0] as f32 / 255.0,
            pixel[1] as f32 / 255.0,
            pixel[2] as f32 / 255.0,
        ];
        for op in run {
            rgb = apply_color_op(rgb, op);
        }
        pixel[0] = (rgb[0] * 255.0).round() as u8;
        pixel[1] = (rgb[1] * 255.0).round() as u8;
        pixel[2] = (rgb[2] * 255.0).round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterId;
    use image::Rgba;

    fn solid(r: u8, g: u8, b: u8) -> RgbaImage {
        RgbaImage::from_pixel(4, 4, Rgba([r, g, b, 255]))
    }

    #[test]
    fn test_original_leaves_pixels_untouched() {
        let mut image = solid(10, 120, 240);
        apply_adjustments(&mut image, FilterId::Original.descriptor().adjustments);
        assert_eq!(image.get_pixel(0, 0).0, [10, 120, 240, 255]);
    }

    #[test]
    fn test_full_grayscale_equalizes_channels() {
        let mut image = solid(200, 50, 10);
        apply_adjustments(&mut image, &[Adjustment::Grayscale(1.0)]);
        let p = image.get_pixel(1, 1).0;
        assert!((p[0] as i32 - p[1] as i32).abs() <= 1);
        assert!((p[1] as i32 - p[2] as i32).abs() <= 1);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn test_full_invert() {
        let mut image = solid(0, 255, 100);
        apply_adjustments(&mut image, &[Adjustment::Invert(1.0)]);
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 155, 255]);
    }

    #[test]
    fn test_brightness_clamps() {
        let mut image = solid(200, 100, 0);
        apply_adjustments(&mut image, &[Adjustment::Brightness(1.5)]);
        assert_eq!(image.get_pixel(0, 0).0, [255, 150, 0, 255]);
    }

    #[test]
    fn test_contrast_keeps_mid_gray() {
        let rgb = apply_color_op(
            [0.5, 0.5, 0.5],
            &Adjustment::Contrast(2.0).color_op().unwrap(),
        );
        assert!(rgb.iter().all(|v| (v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_zero_hue_rotation_is_identity() {
        let op = Adjustment::HueRotate(0.0).color_op().unwrap();
        let rgb = apply_color_op([0.2, 0.4, 0.6], &op);
        for (a, b) in rgb.iter().zip([0.2, 0.4, 0.6]) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_sepia_warms_gray() {
        let mut image = solid(128, 128, 128);
        apply_adjustments(&mut image, &[Adjustment::Sepia(1.0)]);
        let p = image.get_pixel(0, 0).0;
        assert!(p[0] > p[1] && p[1] > p[2]);
    }

    #[test]
    fn test_blur_softens_edges() {
        let mut image = RgbaImage::from_fn(16, 16, |x, _| {
            if x < 8 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        apply_adjustments(&mut image, &[Adjustment::Blur(2.0)]);
        let left = image.get_pixel(7, 8).0[0];
        let right = image.get_pixel(8, 8).0[0];
        assert!(left > 0 && right < 255);
        assert_eq!(image.dimensions(), (16, 16));
    }
}
