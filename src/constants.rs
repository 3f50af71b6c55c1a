// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Number of photos in one session (and one strip)
pub const SESSION_PHOTO_COUNT: usize = 3;

/// Capture sequencer timing and labels
pub mod sequencer {
    use super::Duration;

    /// Countdown labels, each held for one time unit
    pub const COUNTDOWN_LABELS: [&str; 4] = ["3...", "2...", "1...", "Smile..."];

    /// Default length of one time unit
    pub const DEFAULT_TIME_UNIT: Duration = Duration::from_secs(1);

    /// Settle delay before a full session is marked "strip ready", in time units
    pub const STRIP_READY_DELAY_UNITS: f64 = 0.5;
}

/// Device negotiation
pub mod negotiation {
    /// How long a bound source may take to start playing, in time units
    pub const READY_TIMEOUT_UNITS: f64 = 10.0;
}

/// Frame rasterizer
pub mod capture {
    /// Width the rasterizer tries to reach when upscaling a live frame
    pub const TARGET_WIDTH: u32 = 1920;

    /// Upscale factor bounds
    pub const MIN_SCALE: f64 = 1.0;
    pub const MAX_SCALE: f64 = 2.0;

    /// JPEG quality for live captures (0.95)
    pub const JPEG_QUALITY: u8 = 95;
}

/// Strip geometry and styling, in logical units
pub mod strip {
    pub const WIDTH: u32 = 600;
    pub const HEIGHT: u32 = 1400;
    pub const PHOTO_WIDTH: u32 = 500;
    pub const PHOTO_HEIGHT: u32 = 370;
    pub const MARGIN: u32 = 30;
    pub const PHOTO_SPACING: u32 = 40;
    pub const CAPTION_BAND_HEIGHT: u32 = 200;

    /// White frame drawn around each photo, per side
    pub const FRAME_INSET: u32 = 10;

    pub const BORDER_WIDTH: u32 = 2;

    /// Gradient stops (top, bottom)
    pub const BACKGROUND_TOP: [u8; 3] = [0xff, 0xff, 0xff];
    pub const BACKGROUND_BOTTOM: [u8; 3] = [0xf8, 0xf9, 0xfa];

    pub const STRIP_BORDER_COLOR: [u8; 3] = [0xe9, 0xec, 0xef];
    pub const CELL_BORDER_COLOR: [u8; 3] = [0xde, 0xe2, 0xe6];
    pub const FRAME_COLOR: [u8; 3] = [0xff, 0xff, 0xff];

    /// rgba(0,0,0,0.15), blur 16, offset (6, 6)
    pub const SHADOW_ALPHA: f32 = 0.15;
    pub const SHADOW_BLUR: f32 = 16.0;
    pub const SHADOW_OFFSET: i32 = 6;

    pub const CAPTION_COLOR: [u8; 3] = [0x49, 0x50, 0x57];
    pub const CAPTION_FONT_FAMILY: &str = "Arial, sans-serif";
    pub const CAPTION_TITLE: &str = "📸 College Wishlist";

    /// Horizontal padding subtracted from the strip width when fitting caption lines
    pub const CAPTION_PADDING: u32 = 100;

    /// Caption line baselines, relative to the top of the caption band
    pub const TITLE_OFFSET: u32 = 70;
    pub const DATE_OFFSET: u32 = 130;

    pub const TITLE_FONT_SIZE: u32 = 36;
    pub const MIN_FONT_SIZE: u32 = 16;

    /// Date line starts at `max(title - DATE_FONT_STEP, DATE_MIN_START)`
    pub const DATE_FONT_STEP: u32 = 6;
    pub const DATE_MIN_START: u32 = 24;

    /// `chrono` format for the long-form caption date ("October 15, 2026")
    pub const DATE_FORMAT: &str = "%B %-d, %Y";
}

/// Final strip export
pub mod export {
    /// JPEG quality for the downloadable strip (0.98)
    pub const JPEG_QUALITY: u8 = 98;

    pub const FILE_PREFIX: &str = "college-wishlist-photos";
    pub const FILE_EXTENSION: &str = "jpg";

    /// Folder created under the pictures directory
    pub const DEFAULT_SAVE_FOLDER: &str = "Photobooth";
}

/// Live source timing
pub mod timing {
    use super::Duration;

    /// Frame interval for still-image sources (~30fps)
    pub const STILL_FRAME_INTERVAL: Duration = Duration::from_millis(33);

    /// Log every Nth frame from capture threads
    pub const FRAME_LOG_INTERVAL: u64 = 60;

    /// Pause before retrying a failed V4L2 dequeue
    pub const DEQUEUE_RETRY_DELAY: Duration = Duration::from_millis(10);

    /// Terminal UI redraw / input poll interval
    pub const TERMINAL_POLL_INTERVAL: Duration = Duration::from_millis(33);
}

/// Number of mmap buffers requested from V4L2 devices
pub const V4L2_BUFFER_COUNT: u32 = 4;

/// Preview-only zoom applied to the Fisheye filter
pub const FISHEYE_PREVIEW_ZOOM: f32 = 1.1;

/// Supported file formats for still-image sources
pub mod file_formats {
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if an extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Application information
pub mod app_info {
    /// Version string including the git revision (set by build.rs)
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }

    pub const APP_NAME: &str = "photobooth";
}
