// SPDX-License-Identifier: GPL-3.0-only

//! Image files as camera frames

use crate::backends::camera::{BackendError, BackendResult, CameraFrame};
use crate::constants::file_formats;
use std::path::Path;
use tracing::info;

/// Load an image file and convert it to a CameraFrame
///
/// Supports common image formats: PNG, JPEG, GIF, BMP, WebP
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if !file_formats::is_image_extension(&extension) {
        return Err(BackendError::FormatNotSupported(format!(
            "Unsupported file format: {}",
            path.display()
        )));
    }
    if !path.exists() {
        return Err(BackendError::DeviceNotFound(path.display().to_string()));
    }

    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        BackendError::Other(format!("Failed to load image '{}': {}", path.display(), e))
    })?;
    let frame = CameraFrame::from_image(img.to_rgba8());

    info!(
        width = frame.width,
        height = frame.height,
        "Image loaded successfully"
    );
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unknown_extension() {
        assert!(matches!(
            load_image_as_frame(Path::new("/tmp/clip.mp4")),
            Err(BackendError::FormatNotSupported(_))
        ));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        assert!(matches!(
            load_image_as_frame(Path::new("/nonexistent/photo.png")),
            Err(BackendError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_loads_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        image::RgbaImage::from_pixel(6, 4, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();

        let frame = load_image_as_frame(&path).unwrap();
        assert_eq!((frame.width, frame.height), (6, 4));
        assert_eq!(&frame.data[..4], &[1, 2, 3, 255]);
    }
}
