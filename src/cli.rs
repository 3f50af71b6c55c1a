// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for booth operations
//!
//! This module provides command-line functionality for:
//! - Running the terminal booth
//! - Listing cameras and filters
//! - Headless three-photo sessions
//! - Composing strips from existing images

use clap::Args;
use photobooth::backends::camera::{CameraPlatform, V4l2Platform};
use photobooth::backends::virtual_camera::StillImagePlatform;
use photobooth::booth::PhotoBooth;
use photobooth::config::BoothConfig;
use photobooth::constants::SESSION_PHOTO_COUNT;
use photobooth::filters::FilterId;
use photobooth::pipelines::photo::{CapturedPhoto, PhotoEncoder, render_frame};
use photobooth::pipelines::strip::{StripCompositor, StripLayout};
use photobooth::session::SessionEvent;
use photobooth::storage::export_strip;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Capture device (e.g. /dev/video0)
    #[arg(short, long, global = true)]
    pub device: Option<String>,

    /// Use a still image as the camera
    #[arg(long, global = true, conflicts_with = "device")]
    pub image: Option<PathBuf>,

    /// Filter to start with (see `photobooth filters`)
    #[arg(short, long, global = true)]
    pub filter: Option<FilterId>,

    /// Do not mirror the preview and photos
    #[arg(long, global = true)]
    pub no_mirror: bool,

    /// Folder for saved strips (default: ~/Pictures/Photobooth)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Open the saved strip with the default image viewer
    #[arg(long, global = true)]
    pub open: bool,
}

impl GlobalOptions {
    /// Load the config file, then apply flag overrides
    pub fn resolve_config(&self) -> Result<BoothConfig, Box<dyn std::error::Error>> {
        let mut config = BoothConfig::load_or_default(self.config.as_deref())?;
        if let Some(filter) = self.filter {
            config.filter = filter;
        }
        if self.no_mirror {
            config.mirror = false;
        }
        if let Some(output) = &self.output {
            config.output_dir = Some(output.clone());
        }
        if let Some(device) = &self.device {
            config.device = Some(device.clone());
        }
        Ok(config)
    }

    fn platform(&self, config: &BoothConfig) -> Box<dyn CameraPlatform> {
        match &self.image {
            Some(path) => Box::new(StillImagePlatform::from_path(path.clone())),
            None => Box::new(V4l2Platform::new(config.device.clone())),
        }
    }
}

/// Acquire a camera and run the terminal booth
pub fn run_booth(options: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = options.resolve_config()?;
    let platform = options.platform(&config);
    let rt = tokio::runtime::Runtime::new()?;

    println!("Starting camera...");
    let mut booth = acquire(&rt, platform.as_ref(), config)?;
    let result = photobooth::terminal::run(rt.handle(), &mut booth, options.open);
    booth.teardown();
    result
}

/// List all available cameras
pub fn list_cameras(options: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &options.image {
        println!("Still image: {}", path.display());
        return Ok(());
    }

    let platform = V4l2Platform::new(None);
    if !platform.is_available() {
        println!("Camera access is not available on this system.");
        return Ok(());
    }

    let cameras = platform.enumerate_cameras();
    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for camera in &cameras {
        println!("  {} ({})", camera.name, camera.path);
        if let Some(driver) = &camera.driver {
            println!("      Driver: {}", driver);
        }

        match platform.formats(camera) {
            Ok(formats) if !formats.is_empty() => {
                // Best framerate per resolution
                let mut resolutions: Vec<(u32, u32, u32)> = Vec::new();
                for format in &formats {
                    let fps = format.framerate.unwrap_or(30);
                    if let Some(existing) = resolutions
                        .iter_mut()
                        .find(|(w, h, _)| *w == format.width && *h == format.height)
                    {
                        existing.2 = existing.2.max(fps);
                    } else {
                        resolutions.push((format.width, format.height, fps));
                    }
                }

                // Sort by resolution (highest first)
                resolutions.sort_by(|a, b| (b.0 * b.1).cmp(&(a.0 * a.1)));

                let res_strs: Vec<String> = resolutions
                    .iter()
                    .take(3)
                    .map(|(w, h, fps)| format!("{}x{}@{}fps", w, h, fps))
                    .collect();
                println!("      Formats: {}", res_strs.join(", "));
            }
            Ok(_) => println!("      Formats: none supported"),
            Err(e) => println!("      Formats: unavailable ({})", e),
        }
        println!();
    }

    Ok(())
}

/// Print the filter catalog, marking `current`
pub fn list_filters(current: FilterId) {
    println!("Filters:");
    println!();
    for id in FilterId::ALL {
        let descriptor = id.descriptor();
        let marker = if id == current { "*" } else { " " };
        println!(
            " {} {} {:<12} {}",
            marker,
            descriptor.icon,
            descriptor.label,
            descriptor.expression()
        );
    }
}

/// Run a full session without a preview and save the strip
pub fn shoot(options: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = options.resolve_config()?;
    let platform = options.platform(&config);
    let rt = tokio::runtime::Runtime::new()?;

    let mut booth = acquire(&rt, platform.as_ref(), config)?;
    println!(
        "Using camera: {} ({})",
        booth.source().device().name,
        booth.source().format()
    );

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    let result = rt.block_on(async {
        let mut taken = 0;
        while taken < SESSION_PHOTO_COUNT {
            if stop_flag.load(Ordering::SeqCst) {
                return Err("Interrupted".into());
            }
            let _ = booth.request_capture();

            match next_event(&mut booth, &stop_flag).await {
                Some(SessionEvent::Countdown(Some(label))) => println!("  {}", label),
                Some(SessionEvent::PhotoCaptured { count, .. }) => {
                    taken = count;
                    println!("Photo {}/{}", count, SESSION_PHOTO_COUNT);
                }
                Some(SessionEvent::CaptureDropped) => println!("No frame yet, retrying..."),
                Some(_) => {}
                None => return Err("Interrupted".into()),
            }
        }

        while !booth.sequencer().is_strip_ready() {
            if next_event(&mut booth, &stop_flag).await.is_none() {
                return Err("Interrupted".into());
            }
        }

        let path = booth.save().await?;
        Ok::<PathBuf, Box<dyn std::error::Error>>(path)
    });

    // Ctrl+C and errors go through the same teardown
    booth.teardown();
    let path = result?;
    println!("Strip saved: {}", path.display());
    open_if_requested(options, &path);
    Ok(())
}

/// Compose a strip from three image files
pub fn compose_from_files(
    options: &GlobalOptions,
    images: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    if images.len() != SESSION_PHOTO_COUNT {
        return Err(format!("Expected {} images, got {}", SESSION_PHOTO_COUNT, images.len()).into());
    }
    let config = options.resolve_config()?;
    let rt = tokio::runtime::Runtime::new()?;

    let path = rt.block_on(async {
        let photos = futures::future::try_join_all(
            images
                .iter()
                .map(|path| load_photo(path.clone(), config.filter, config.capture_quality)),
        )
        .await?;

        let compositor =
            StripCompositor::new(StripLayout::new(config.strip_scale), config.title.clone());
        let strip = compositor
            .compose(&photos, chrono::Local::now().date_naive())
            .await?;
        let asset = export_strip(&strip, chrono::Utc::now(), config.export_quality)?;
        let path = asset.save_to(&config.output_dir()).await?;
        Ok::<PathBuf, Box<dyn std::error::Error>>(path)
    })?;

    println!("Strip saved: {}", path.display());
    open_if_requested(options, &path);
    Ok(())
}

fn acquire(
    rt: &tokio::runtime::Runtime,
    platform: &dyn CameraPlatform,
    config: BoothConfig,
) -> Result<PhotoBooth, Box<dyn std::error::Error>> {
    match rt.block_on(PhotoBooth::acquire(platform, config)) {
        Ok(booth) => Ok(booth),
        Err(photobooth::BoothError::Acquire(e)) => {
            eprintln!("{}", e);
            eprintln!("{}", e.user_guidance());
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Next session event, or `None` when interrupted
async fn next_event(booth: &mut PhotoBooth, stop_flag: &AtomicBool) -> Option<SessionEvent> {
    loop {
        if stop_flag.load(Ordering::SeqCst) {
            return None;
        }
        let tick = tokio::time::sleep(std::time::Duration::from_millis(100));
        tokio::select! {
            event = booth.next_event() => return event,
            _ = tick => {}
        }
    }
}

/// Decode an image file and run it through the rasterizer's filter path
async fn load_photo(
    path: PathBuf,
    filter: FilterId,
    quality: u8,
) -> Result<CapturedPhoto, Box<dyn std::error::Error>> {
    let image = tokio::task::spawn_blocking(move || {
        image::open(&path)
            .map(|img| render_frame(&img.to_rgba8(), filter, false))
            .map_err(|e| format!("{}: {}", path.display(), e))
    })
    .await??;

    let encoded = PhotoEncoder::new(quality).encode_async(image).await?;
    Ok(CapturedPhoto {
        image: encoded,
        captured_at: chrono::Utc::now().timestamp_millis(),
    })
}

fn open_if_requested(options: &GlobalOptions, path: &Path) {
    if options.open
        && let Err(e) = open::that(path)
    {
        warn!(error = %e, path = %path.display(), "Failed to open strip");
        eprintln!("Could not open {}: {}", path.display(), e);
    }
}
