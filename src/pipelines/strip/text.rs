// SPDX-License-Identifier: GPL-3.0-only

//! Caption text through usvg/resvg
//!
//! Each call builds a small SVG document, lets usvg shape it against the
//! font database and either reads the shaped width back or rasterizes it
//! with resvg. Text that no available font can shape yields no text node
//! and therefore measures 0 and draws nothing.

use crate::errors::StripError;
use image::RgbaImage;
use std::sync::{Arc, OnceLock};
use tracing::debug;
use usvg::Node;

/// Font database with the system fonts, loaded once per process
fn system_fonts() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    Arc::clone(FONTS.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        debug!(faces = db.len(), "Loaded system fonts");
        Arc::new(db)
    }))
}

/// Shapes, measures and draws single lines of text in one font family
#[derive(Clone)]
pub struct TextRenderer {
    fontdb: Arc<usvg::fontdb::Database>,
    family: String,
    bold: bool,
}

impl TextRenderer {
    /// Renderer over the system fonts
    pub fn system(family: &str, bold: bool) -> Self {
        Self::with_database(system_fonts(), family, bold)
    }

    pub fn with_database(fontdb: Arc<usvg::fontdb::Database>, family: &str, bold: bool) -> Self {
        Self {
            fontdb,
            family: family.to_string(),
            bold,
        }
    }

    pub fn face_count(&self) -> usize {
        self.fontdb.len()
    }

    fn parse(&self, svg: &str) -> Result<usvg::Tree, StripError> {
        let options = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..Default::default()
        };
        usvg::Tree::from_str(svg, &options).map_err(|e| StripError::Render(e.to_string()))
    }

    fn text_element(&self, text: &str, x: f32, y: f32, size: f32, anchor: &str, fill: &str) -> String {
        format!(
            r#"<text xml:space="preserve" x="{x}" y="{y}" font-family="{family}" font-size="{size}" font-weight="{weight}" text-anchor="{anchor}" dominant-baseline="middle" fill="{fill}">{text}</text>"#,
            family = escape_xml(&self.family),
            weight = if self.bold { "bold" } else { "normal" },
            text = escape_xml(text),
        )
    }

    /// Advance width of `text` at `size` pixels
    ///
    /// The same line is laid out anchored at its start and at its end on one
    /// x position. Both copies have identical ink, so the shift between their
    /// bounding boxes is the advance, side bearings and trailing spaces
    /// included.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        if text.is_empty() || size <= 0.0 {
            return 0.0;
        }
        let anchor_x = (size * text.chars().count() as f32 * 2.0).ceil().max(1.0);
        let width = anchor_x * 2.0;
        let height = (size * 3.0).ceil();
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}">{}{}</svg>"#,
            self.text_element(text, anchor_x, size * 1.5, size, "start", "black"),
            self.text_element(text, anchor_x, size * 1.5, size, "end", "black"),
        );

        let tree = match self.parse(&svg) {
            Ok(tree) => tree,
            Err(e) => {
                debug!(error = %e, "Text measurement failed");
                return 0.0;
            }
        };
        let mut lefts = Vec::with_capacity(2);
        collect_text_lefts(tree.root(), &mut lefts);
        match lefts[..] {
            [start, end] => (start - end).max(0.0),
            _ => 0.0,
        }
    }

    /// Draw `text` centered on `center_x`, vertically centered on `middle_y`
    pub fn draw_centered(
        &self,
        target: &mut RgbaImage,
        text: &str,
        center_x: f32,
        middle_y: f32,
        size: f32,
        color: [u8; 3],
    ) -> Result<(), StripError> {
        if text.is_empty() || size <= 0.0 {
            return Ok(());
        }

        // Render only a horizontal band around the line
        let band_top = (middle_y - size * 1.5).floor().max(0.0);
        let band_height = ((size * 3.0).ceil() as u32)
            .min(target.height().saturating_sub(band_top as u32));
        let width = target.width();
        if band_height == 0 || width == 0 {
            return Ok(());
        }

        let fill = format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2]);
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{band_height}">{}</svg>"#,
            self.text_element(text, center_x, middle_y - band_top, size, "middle", &fill),
        );
        let tree = self.parse(&svg)?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, band_height)
            .ok_or_else(|| StripError::Render("failed to allocate text pixmap".to_string()))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::default(),
            &mut pixmap.as_mut(),
        );

        composite_premultiplied(target, pixmap.data(), width, band_height, band_top as u32);
        Ok(())
    }
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("family", &self.family)
            .field("bold", &self.bold)
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

/// Left edges of the text nodes under `group`, in document order
fn collect_text_lefts(group: &usvg::Group, lefts: &mut Vec<f32>) {
    for child in group.children() {
        match child {
            Node::Group(g) => collect_text_lefts(g.as_ref(), lefts),
            Node::Text(t) => lefts.push(t.bounding_box().x()),
            Node::Path(_) | Node::Image(_) => {}
        }
    }
}

/// Source-over blend of a premultiplied RGBA band onto an opaque target
fn composite_premultiplied(target: &mut RgbaImage, src: &[u8], width: u32, height: u32, top: u32) {
    for y in 0..height {
        let ty = top + y;
        if ty >= target.height() {
            break;
        }
        for x in 0..width.min(target.width()) {
            let i = ((y * width + x) * 4) as usize;
            let alpha = src[i + 3];
            if alpha == 0 {
                continue;
            }
            let inv = 255 - alpha as u16;
            let dst = target.get_pixel_mut(x, ty);
            for c in 0..3 {
                let blended = src[i + c] as u16 + (dst[c] as u16 * inv + 127) / 255;
                dst[c] = blended.min(255) as u8;
            }
            dst[3] = (alpha as u16 + (dst[3] as u16 * inv + 127) / 255).min(255) as u8;
        }
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_no_fonts_measures_zero() {
        let renderer =
            TextRenderer::with_database(Arc::new(usvg::fontdb::Database::new()), "Arial", true);
        assert_eq!(renderer.measure("College Wishlist", 36.0), 0.0);
    }

    #[test]
    fn test_no_fonts_draws_nothing() {
        let renderer =
            TextRenderer::with_database(Arc::new(usvg::fontdb::Database::new()), "Arial", true);
        let mut image = RgbaImage::from_pixel(100, 60, image::Rgba([255, 255, 255, 255]));
        renderer
            .draw_centered(&mut image, "Hi", 50.0, 30.0, 20.0, [0, 0, 0])
            .unwrap();
        assert!(image.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_composite_blends_over_white() {
        let mut image = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        // 50% black, premultiplied
        composite_premultiplied(&mut image, &[0, 0, 0, 128], 1, 1, 0);
        let p = image.get_pixel(0, 0).0;
        assert!((126..=128).contains(&p[0]));
        assert_eq!(p[3], 255);
    }

    #[test]
    fn test_system_measure_grows_with_size() {
        let renderer = TextRenderer::system("Arial, sans-serif", true);
        if renderer.face_count() == 0 {
            return;
        }
        let small = renderer.measure("October 15, 2026", 16.0);
        let large = renderer.measure("October 15, 2026", 32.0);
        assert!(large > small);
    }

    #[test]
    fn test_system_measure_counts_trailing_space() {
        let renderer = TextRenderer::system("Arial, sans-serif", true);
        if renderer.face_count() == 0 || renderer.measure("Booth", 36.0) == 0.0 {
            return;
        }
        // Ink is the same; only the advance grows
        assert!(renderer.measure("Booth ", 36.0) > renderer.measure("Booth", 36.0));
    }
}
