// SPDX-License-Identifier: GPL-3.0-only

//! Pixel format conversion for raw camera buffers
//!
//! Everything downstream of a platform works on tightly packed RGBA8; these
//! helpers turn the formats V4L2 webcams commonly deliver into that.

use super::{BackendError, BackendResult};

/// Pixel formats a live stream can be negotiated in, in order of preference
pub const SUPPORTED_FOURCCS: [&str; 3] = ["YUYV", "MJPG", "UYVY"];

/// Convert YUYV (YUV 4:2:2) to RGBA
///
/// YUYV format: Y0 U0 Y1 V0 - each 4-byte group encodes 2 pixels.
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    packed_422_to_rgba(data, width, height, [0, 1, 2, 3])
}

/// Convert UYVY (YUV 4:2:2) to RGBA
///
/// UYVY format: U0 Y0 V0 Y1.
pub fn uyvy_to_rgba(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    packed_422_to_rgba(data, width, height, [1, 0, 3, 2])
}

/// Shared 4:2:2 decoder; `layout` gives the byte offsets of Y0, U, Y1, V
fn packed_422_to_rgba(data: &[u8], width: u32, height: u32, layout: [usize; 4]) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    for chunk in data.chunks_exact(4) {
        let y0 = chunk[layout[0]] as f32;
        let u = chunk[layout[1]] as f32 - 128.0;
        let y1 = chunk[layout[2]] as f32;
        let v = chunk[layout[3]] as f32 - 128.0;

        // BT.601
        for y in [y0, y1] {
            if rgba.len() >= pixel_count * 4 {
                break;
            }
            rgba.push((y + 1.402 * v).clamp(0.0, 255.0) as u8);
            rgba.push((y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8);
            rgba.push((y + 1.772 * u).clamp(0.0, 255.0) as u8);
            rgba.push(255);
        }
    }

    rgba
}

/// Decode one MJPEG frame to RGBA
pub fn mjpeg_to_rgba(data: &[u8]) -> BackendResult<(u32, u32, Vec<u8>)> {
    let image = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map_err(|e| BackendError::Other(format!("MJPEG decode failed: {}", e)))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok((width, height, image.into_raw()))
}

/// Convert a raw buffer in `fourcc` to RGBA of the given size
pub fn to_rgba(fourcc: &str, data: &[u8], width: u32, height: u32) -> BackendResult<Vec<u8>> {
    let expected = (width as usize) * (height as usize) * 4;
    let rgba = match fourcc {
        "YUYV" => yuyv_to_rgba(data, width, height),
        "UYVY" => uyvy_to_rgba(data, width, height),
        "MJPG" => {
            let (w, h, rgba) = mjpeg_to_rgba(data)?;
            if (w, h) != (width, height) {
                return Err(BackendError::Other(format!(
                    "MJPEG frame is {}x{}, expected {}x{}",
                    w, h, width, height
                )));
            }
            rgba
        }
        other => return Err(BackendError::FormatNotSupported(other.to_string())),
    };

    if rgba.len() != expected {
        return Err(BackendError::Other(format!(
            "Short {} frame: {} of {} bytes",
            fourcc,
            rgba.len(),
            expected
        )));
    }
    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_to_rgba() {
        // Y=128, U=128, V=128 is mid gray for both pixels
        let data = [128, 128, 128, 128];
        let rgba = yuyv_to_rgba(&data, 2, 1);
        assert_eq!(rgba, vec![128, 128, 128, 255, 128, 128, 128, 255]);
    }

    #[test]
    fn test_yuyv_and_uyvy_agree() {
        let yuyv = [200, 90, 40, 160];
        let uyvy = [90, 200, 160, 40];
        assert_eq!(yuyv_to_rgba(&yuyv, 2, 1), uyvy_to_rgba(&uyvy, 2, 1));
    }

    #[test]
    fn test_to_rgba_rejects_short_frames() {
        assert!(to_rgba("YUYV", &[128; 4], 4, 1).is_err());
        assert!(matches!(
            to_rgba("GREY", &[0; 4], 2, 2),
            Err(BackendError::FormatNotSupported(_))
        ));
    }

    #[test]
    fn test_mjpeg_round_trip_size() {
        let image = image::RgbImage::from_pixel(8, 4, image::Rgb([10, 200, 30]));
        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 90)
            .encode_image(&image)
            .unwrap();
        let rgba = to_rgba("MJPG", &jpeg, 8, 4).unwrap();
        assert_eq!(rgba.len(), 8 * 4 * 4);
        assert!(to_rgba("MJPG", &jpeg, 4, 4).is_err());
    }
}
