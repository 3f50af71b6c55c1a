// SPDX-License-Identifier: GPL-3.0-only

//! Strip export and file storage

use crate::constants::export;
use crate::errors::{PhotoError, StripError};
use crate::pipelines::photo::{EncodedImage, PhotoEncoder};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, info};

/// Last timestamp handed out to an export in this process
static LAST_EXPORT_MILLIS: AtomicI64 = AtomicI64::new(i64::MIN);

/// A strip ready to be downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadAsset {
    pub file_name: String,
    pub image: EncodedImage,
}

impl DownloadAsset {
    /// Write the asset into `dir`, creating it if needed
    pub async fn save_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.image.data[..]).await?;
        info!(path = %path.display(), size = self.image.len(), "Strip saved");
        Ok(path)
    }
}

/// A timestamp strictly greater than any previously returned one
///
/// Two exports within the same millisecond get consecutive values.
pub fn unique_export_millis(now_millis: i64) -> i64 {
    let mut previous = LAST_EXPORT_MILLIS.load(Ordering::SeqCst);
    loop {
        let candidate = now_millis.max(previous.saturating_add(1));
        match LAST_EXPORT_MILLIS.compare_exchange(
            previous,
            candidate,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => return candidate,
            Err(actual) => previous = actual,
        }
    }
}

/// `college-wishlist-photos-<millis>.jpg`
pub fn export_file_name(millis: i64) -> String {
    format!(
        "{}-{}.{}",
        export::FILE_PREFIX,
        millis,
        export::FILE_EXTENSION
    )
}

/// Encode a composed strip for download
pub fn export_strip(
    strip: &RgbaImage,
    now: chrono::DateTime<chrono::Utc>,
    quality: u8,
) -> Result<DownloadAsset, StripError> {
    let image = PhotoEncoder::new(quality)
        .encode(strip)
        .map_err(|e| match e {
            PhotoError::Encoding(reason) => StripError::Encoding(reason),
            other => StripError::Encoding(other.to_string()),
        })?;
    let millis = unique_export_millis(now.timestamp_millis());
    let file_name = export_file_name(millis);
    debug!(file_name = %file_name, quality, "Strip exported");
    Ok(DownloadAsset { file_name, image })
}

/// Default output folder: `~/Pictures/Photobooth`
///
/// Falls back to the home directory, then the working directory, when the
/// platform has no pictures folder.
pub fn default_output_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(export::DEFAULT_SAVE_FOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_pattern() {
        assert_eq!(
            export_file_name(1_760_000_000_123),
            "college-wishlist-photos-1760000000123.jpg"
        );
    }

    #[test]
    fn test_unique_millis_never_repeat() {
        let a = unique_export_millis(5_000);
        let b = unique_export_millis(5_000);
        let c = unique_export_millis(1);
        assert!(b > a);
        assert!(c > b);
    }

    #[test]
    fn test_export_uses_quality_98() {
        let strip = RgbaImage::from_pixel(60, 140, image::Rgba([240, 240, 240, 255]));
        let asset = export_strip(&strip, chrono::Utc::now(), export::JPEG_QUALITY).unwrap();
        assert_eq!(asset.image.quality, 98);
        assert!(asset.file_name.starts_with("college-wishlist-photos-"));
        assert!(asset.file_name.ends_with(".jpg"));
    }

    #[test]
    fn test_unencodable_strip_is_a_strip_error() {
        // Baseline JPEG tops out at 65535 pixels per side
        let strip = RgbaImage::new(65_536, 1);
        let err = export_strip(&strip, chrono::Utc::now(), 98).unwrap_err();
        assert!(matches!(err, StripError::Encoding(_)));
    }

    #[tokio::test]
    async fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("out");
        let strip = RgbaImage::new(8, 8);
        let asset = export_strip(&strip, chrono::Utc::now(), 90).unwrap();

        let path = asset.save_to(&target).await.unwrap();
        assert_eq!(path, target.join(&asset.file_name));
        assert_eq!(std::fs::read(&path).unwrap(), asset.image.data.to_vec());
    }

    #[test]
    fn test_default_output_dir_ends_with_folder() {
        assert!(default_output_dir().ends_with("Photobooth"));
    }
}
