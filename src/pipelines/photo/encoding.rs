// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding and decoding of captured images
//!
//! Both outputs of the booth (single captures and the final strip) are JPEG.
//! Encoding is CPU-bound; async callers go through [`PhotoEncoder::encode_async`].

use crate::errors::PhotoError;
use image::{DynamicImage, RgbaImage};
use std::sync::Arc;
use tracing::debug;

/// MIME type of every encoded image the booth produces
pub const JPEG_MIME: &str = "image/jpeg";

/// Encoded image data ready for display or saving
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: Arc<[u8]>,
    /// JPEG quality used (1-100)
    pub quality: u8,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn mime_type(&self) -> &'static str {
        JPEG_MIME
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decode back to RGBA
    pub fn decode(&self) -> image::ImageResult<RgbaImage> {
        Ok(
            image::load_from_memory_with_format(&self.data, image::ImageFormat::Jpeg)?
                .to_rgba8(),
        )
    }
}

/// JPEG encoder with a fixed quality
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    quality: u8,
}

impl PhotoEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode an RGBA image; alpha is dropped
    pub fn encode(&self, image: &RgbaImage) -> Result<EncodedImage, PhotoError> {
        let (width, height) = image.dimensions();
        let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();

        let mut buffer = Vec::new();
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, self.quality);
        encoder
            .encode(
                rgb.as_raw(),
                width,
                height,
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| PhotoError::Encoding(format!("JPEG encoding failed: {}", e)))?;

        debug!(width, height, quality = self.quality, size = buffer.len(), "Encoding complete");

        Ok(EncodedImage {
            data: Arc::from(buffer),
            quality: self.quality,
            width,
            height,
        })
    }

    /// Encode on a blocking worker
    pub async fn encode_async(&self, image: RgbaImage) -> Result<EncodedImage, PhotoError> {
        let encoder = *self;
        tokio::task::spawn_blocking(move || encoder.encode(&image))
            .await
            .map_err(|e| PhotoError::Encoding(format!("Encoding task error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(PhotoEncoder::new(0).quality(), 1);
        assert_eq!(PhotoEncoder::new(250).quality(), 100);
    }

    #[test]
    fn test_encode_produces_jpeg() {
        let image = RgbaImage::from_pixel(16, 8, image::Rgba([200, 10, 10, 255]));
        let encoded = PhotoEncoder::new(95).encode(&image).unwrap();
        assert_eq!((encoded.width, encoded.height), (16, 8));
        assert_eq!(encoded.quality, 95);
        assert_eq!(&encoded.data[..2], &[0xFF, 0xD8]);
        assert_eq!(encoded.mime_type(), "image/jpeg");

        let decoded = encoded.decode().unwrap();
        assert_eq!(decoded.dimensions(), (16, 8));
        assert!(decoded.get_pixel(4, 4)[0] > 150);
    }

    #[tokio::test]
    async fn test_encode_async() {
        let image = RgbaImage::new(4, 4);
        let encoded = PhotoEncoder::new(80).encode_async(image).await.unwrap();
        assert!(!encoded.is_empty());
    }
}
