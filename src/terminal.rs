// SPDX-License-Identifier: GPL-3.0-only

//! Terminal photo booth
//!
//! Renders the live preview to the terminal using Unicode half-block
//! characters for improved vertical resolution, with the selected filter
//! applied and the countdown drawn on top.

use crate::booth::PhotoBooth;
use crate::constants::{FISHEYE_PREVIEW_ZOOM, app_info, timing};
use crate::filters::{FilterId, apply_adjustments};
use crate::session::{SessionEvent, SessionSnapshot};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    style::Style, widgets::Widget,
};
use std::borrow::Cow;
use std::io::{self, stdout};
use std::path::PathBuf;
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{error, info, warn};

/// Where terminal mode writes its log, so it does not corrupt the screen
pub fn log_file_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(app_info::APP_NAME)
        .join("photobooth.log")
}

/// Run the terminal booth until the user quits
///
/// The booth's background work runs on `runtime`; this function blocks the
/// calling thread with the UI loop.
pub fn run(
    runtime: &Handle,
    booth: &mut PhotoBooth,
    open_saved: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, runtime, booth, open_saved);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    runtime: &Handle,
    booth: &mut PhotoBooth,
    open_saved: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut events = booth.take_events();
    let mut notice: Option<String> = None;
    let mut show_help = false;

    info!(device = %booth.source().device().path, "Terminal booth started");

    loop {
        // Drain session events without blocking the UI
        while let Some(receiver) = events.as_mut() {
            match receiver.try_recv() {
                Ok(event) => {
                    if event == SessionEvent::StripReady
                        && let Err(e) = runtime.block_on(booth.finalize_strip())
                    {
                        error!(error = %e, "Failed to compose strip");
                    }
                    if let Some(text) = event_notice(&event) {
                        notice = Some(text);
                    } else if matches!(event, SessionEvent::Countdown(Some(_))) {
                        notice = None;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    events = None;
                }
            }
        }

        let snapshot = booth.snapshot();
        let status = if show_help {
            HELP_TEXT.to_string()
        } else {
            status_text(&snapshot, notice.as_deref())
        };

        // A finished strip replaces the live preview until reset
        let preview = match booth.strip() {
            Some(strip) => PreviewWidget {
                frame: Some(Cow::Borrowed(strip)),
                filter: FilterId::Original,
                mirror: false,
            },
            None => PreviewWidget {
                frame: booth
                    .preview()
                    .latest_frame()
                    .and_then(|f| f.to_image())
                    .map(Cow::Owned),
                filter: snapshot.filter,
                mirror: snapshot.mirror,
            },
        };

        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let preview_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };
            f.render_widget(&preview, preview_area);

            if let Some(label) = snapshot.countdown {
                f.render_widget(CountdownOverlay { label }, preview_area);
            }

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            f.render_widget(StatusBar { message: &status }, status_area);
        })?;
        drop(preview);

        // Handle input with timeout for frame updates
        if event::poll(timing::TERMINAL_POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // Raw mode swallows SIGINT
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => {
                    show_help = false;
                    let _guard = runtime.enter();
                    if !booth.request_capture() {
                        notice = Some("Busy, wait for the countdown".to_string());
                    }
                }
                KeyCode::Char('f') | KeyCode::Right => {
                    let sequencer = booth.sequencer();
                    sequencer.set_filter(sequencer.filter().next());
                }
                KeyCode::Char('F') | KeyCode::Left => {
                    let sequencer = booth.sequencer();
                    sequencer.set_filter(sequencer.filter().previous());
                }
                KeyCode::Char('m') => {
                    let sequencer = booth.sequencer();
                    sequencer.set_mirror(!sequencer.mirror());
                }
                KeyCode::Char('s') => {
                    show_help = false;
                    notice = Some(save_strip(runtime, booth, &snapshot, open_saved));
                }
                KeyCode::Char('r') => {
                    show_help = false;
                    booth.reset();
                    notice = None;
                }
                KeyCode::Char('h') => show_help = !show_help,
                KeyCode::Char('q') | KeyCode::Esc => break,
                _ => {}
            }
        }
    }

    Ok(())
}

const HELP_TEXT: &str =
    "space: Capture | f/F: Filter | m: Mirror | s: Save strip | r: Reset | h: Help | q: Quit";

fn event_notice(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::CaptureDropped => Some("No frame from the camera, try again".to_string()),
        SessionEvent::StripReady => {
            Some("Strip ready! Press 's' to save or 'r' to retake".to_string())
        }
        _ => None,
    }
}

fn status_text(snapshot: &SessionSnapshot, notice: Option<&str>) -> String {
    let message = notice.unwrap_or_else(|| snapshot.status_message());
    format!(
        " {} | {}{} | {} | 'h' help",
        snapshot.counter_label(),
        snapshot.filter.label(),
        if snapshot.mirror { " (mirrored)" } else { "" },
        message
    )
}

fn save_strip(
    runtime: &Handle,
    booth: &mut PhotoBooth,
    snapshot: &SessionSnapshot,
    open_saved: bool,
) -> String {
    if !snapshot.strip_ready {
        return format!("Take {} photos first", crate::constants::SESSION_PHOTO_COUNT);
    }
    match runtime.block_on(booth.save()) {
        Ok(path) => {
            if open_saved && let Err(e) = open::that(&path) {
                warn!(error = %e, path = %path.display(), "Failed to open strip");
            }
            format!("Saved: {}", path.display())
        }
        Err(e) => {
            error!(error = %e, "Failed to save strip");
            format!("Error: {e}")
        }
    }
}

/// Downscale a frame to `(width, height)` preview pixels with the filter applied
///
/// Works on the small image so the filter chain stays cheap at preview rates.
pub fn render_preview(
    frame: &RgbaImage,
    width: u32,
    height: u32,
    filter: FilterId,
    mirror: bool,
) -> RgbaImage {
    let zoomed;
    let source = if filter == FilterId::Fisheye {
        zoomed = center_zoom(frame, FISHEYE_PREVIEW_ZOOM);
        &zoomed
    } else {
        frame
    };

    let mut preview = imageops::resize(source, width.max(1), height.max(1), FilterType::Triangle);
    apply_adjustments(&mut preview, &filter.descriptor().adjustments);
    if mirror {
        imageops::flip_horizontal_in_place(&mut preview);
    }
    preview
}

/// Crop the centre `1 / zoom` of a frame
fn center_zoom(frame: &RgbaImage, zoom: f32) -> RgbaImage {
    let (w, h) = frame.dimensions();
    let crop_w = ((w as f32 / zoom).round() as u32).clamp(1, w.max(1));
    let crop_h = ((h as f32 / zoom).round() as u32).clamp(1, h.max(1));
    let x = (w - crop_w) / 2;
    let y = (h - crop_h) / 2;
    imageops::crop_imm(frame, x, y, crop_w, crop_h).to_image()
}

/// Terminal cells that fit a frame into an area, keeping its aspect ratio
///
/// Each cell shows two vertical pixels.
pub fn fit_cells(frame_width: u32, frame_height: u32, area_width: u16, area_height: u16) -> (u16, u16) {
    if frame_width == 0 || frame_height == 0 {
        return (0, 0);
    }
    let frame_aspect = frame_width as f64 / frame_height as f64;
    let term_width = area_width as f64;
    let term_height = (area_height as f64) * 2.0;

    if term_width / term_height.max(1.0) > frame_aspect {
        // Terminal is wider - fit to height
        let w = term_height * frame_aspect;
        (w as u16, area_height)
    } else {
        // Terminal is taller - fit to width
        let h = term_width / frame_aspect;
        (area_width, (h / 2.0) as u16)
    }
}

/// Live preview or finished strip rendered with half-block characters
struct PreviewWidget<'a> {
    frame: Option<Cow<'a, RgbaImage>>,
    filter: FilterId,
    mirror: bool,
}

impl Widget for &PreviewWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame else {
            // No frame yet - show placeholder
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        let (cols, rows) = fit_cells(frame.width(), frame.height(), area.width, area.height);
        if cols == 0 || rows == 0 {
            return;
        }
        let preview = render_preview(frame, cols as u32, rows as u32 * 2, self.filter, self.mirror);

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(cols)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(rows)) / 2;

        // Upper half (▀) takes the fg colour, lower half the bg colour
        for ty in 0..rows {
            for tx in 0..cols {
                let top = preview.get_pixel(tx as u32, ty as u32 * 2);
                let bottom = preview.get_pixel(tx as u32, ty as u32 * 2 + 1);
                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(Color::Rgb(top[0], top[1], top[2]));
                    cell.set_bg(Color::Rgb(bottom[0], bottom[1], bottom[2]));
                }
            }
        }
    }
}

/// Countdown label boxed in the middle of the preview
struct CountdownOverlay {
    label: &'static str,
}

impl Widget for CountdownOverlay {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text = format!("  {}  ", self.label);
        let width = text.chars().count() as u16;
        if area.width < width || area.height < 3 {
            return;
        }
        let x = area.x + (area.width - width) / 2;
        let y = area.y + area.height / 2;
        let style = Style::default().fg(Color::White).bg(Color::Black);
        let blank = " ".repeat(width as usize);
        buf.set_string(x, y - 1, &blank, style);
        buf.set_string(x, y, &text, style);
        buf.set_string(x, y + 1, &blank, style);
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        // Truncate on a char boundary
        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_fit_cells_wide_terminal() {
        // 4:3 frame in a 100x20 terminal: height bound, 40 px tall -> 53 cols
        assert_eq!(fit_cells(640, 480, 100, 20), (53, 20));
    }

    #[test]
    fn test_fit_cells_tall_terminal() {
        assert_eq!(fit_cells(640, 480, 40, 100), (40, 15));
    }

    #[test]
    fn test_fit_cells_empty_frame() {
        assert_eq!(fit_cells(0, 480, 40, 100), (0, 0));
    }

    #[test]
    fn test_preview_mirrors_and_filters() {
        let mut frame = RgbaImage::from_pixel(8, 4, Rgba([0, 0, 0, 255]));
        for y in 0..4 {
            frame.put_pixel(0, y, Rgba([255, 255, 255, 255]));
        }
        let preview = render_preview(&frame, 8, 4, FilterId::Original, true);
        assert_eq!(preview.get_pixel(7, 0)[0], 255);

        let inverted = render_preview(&frame, 8, 4, FilterId::Invert, false);
        assert_eq!(inverted.get_pixel(7, 0)[0], 255);
        assert_eq!(inverted.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_preview_widget_draws_borrowed_strip() {
        let strip = RgbaImage::from_pixel(60, 140, Rgba([200, 10, 10, 255]));
        let widget = PreviewWidget {
            frame: Some(Cow::Borrowed(&strip)),
            filter: FilterId::Original,
            mirror: false,
        };
        let area = Rect::new(0, 0, 20, 10);
        let mut buf = Buffer::empty(area);
        (&widget).render(area, &mut buf);

        // 60x140 in 20x10 cells is height bound: 8 columns centred
        let cell = &buf[(10, 5)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(200, 10, 10));
        assert_eq!(buf[(0, 5)].symbol(), " ");
    }

    #[test]
    fn test_center_zoom_crops() {
        let frame = RgbaImage::new(110, 55);
        assert_eq!(center_zoom(&frame, 1.1).dimensions(), (100, 50));
    }

    #[test]
    fn test_status_text_shows_counter_and_filter() {
        let snapshot = SessionSnapshot {
            phase: crate::session::SessionPhase::Idle,
            photos: Vec::new(),
            countdown: None,
            strip_ready: false,
            filter: FilterId::Noir,
            mirror: true,
            generation: 0,
        };
        let text = status_text(&snapshot, None);
        assert!(text.contains("0/3"));
        assert!(text.contains("(mirrored)"));
        assert!(text.contains("Ready to capture your first moment"));
    }
}
