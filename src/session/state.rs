// SPDX-License-Identifier: GPL-3.0-only

//! Session state and read-only snapshots

use crate::constants::{SESSION_PHOTO_COUNT, capture};
use crate::filters::FilterId;
use crate::pipelines::photo::CapturedPhoto;
use tokio::task::AbortHandle;

/// Where the sequencer is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Ready for a capture request
    #[default]
    Idle,
    /// Countdown running
    Counting,
    /// Rasterizing the frame
    Capturing,
    /// All photos taken
    Full,
}

/// Mutable session state, only touched under the sequencer lock
#[derive(Debug)]
pub(crate) struct SessionState {
    pub phase: SessionPhase,
    pub photos: Vec<CapturedPhoto>,
    pub countdown: Option<&'static str>,
    pub strip_ready: bool,
    pub filter: FilterId,
    pub mirror: bool,
    pub jpeg_quality: u8,
    /// Bumped on every reset; work started under an older value is discarded
    pub generation: u64,
    pub countdown_task: Option<AbortHandle>,
    pub strip_ready_task: Option<AbortHandle>,
}

impl SessionState {
    pub fn new(filter: FilterId, mirror: bool) -> Self {
        Self {
            phase: SessionPhase::Idle,
            photos: Vec::new(),
            countdown: None,
            strip_ready: false,
            filter,
            mirror,
            jpeg_quality: capture::JPEG_QUALITY,
            generation: 0,
            countdown_task: None,
            strip_ready_task: None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.photos.len() >= SESSION_PHOTO_COUNT
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            photos: self.photos.clone(),
            countdown: self.countdown,
            strip_ready: self.strip_ready,
            filter: self.filter,
            mirror: self.mirror,
            generation: self.generation,
        }
    }
}

/// Point-in-time copy of the session for presentation
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub photos: Vec<CapturedPhoto>,
    pub countdown: Option<&'static str>,
    pub strip_ready: bool,
    pub filter: FilterId,
    pub mirror: bool,
    pub generation: u64,
}

impl SessionSnapshot {
    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    /// Whether a capture request would be accepted right now
    pub fn can_capture(&self) -> bool {
        self.phase == SessionPhase::Idle && self.photos.len() < SESSION_PHOTO_COUNT
    }

    pub fn status_message(&self) -> &'static str {
        status_message(self.photos.len())
    }

    pub fn counter_label(&self) -> String {
        counter_label(self.photos.len())
    }
}

/// Status line for a given number of photos taken
pub fn status_message(photo_count: usize) -> &'static str {
    match photo_count {
        0 => "Ready to capture your first moment",
        1 => "Amazing! Two more to go",
        2 => "One final shot!",
        _ => "Perfect! Your strip is ready",
    }
}

/// "n/3"
pub fn counter_label(photo_count: usize) -> String {
    format!("{}/{}", photo_count.min(SESSION_PHOTO_COUNT), SESSION_PHOTO_COUNT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        assert_eq!(status_message(0), "Ready to capture your first moment");
        assert_eq!(status_message(1), "Amazing! Two more to go");
        assert_eq!(status_message(2), "One final shot!");
        assert_eq!(status_message(3), "Perfect! Your strip is ready");
    }

    #[test]
    fn test_counter_label() {
        assert_eq!(counter_label(0), "0/3");
        assert_eq!(counter_label(3), "3/3");
    }

    #[test]
    fn test_fresh_snapshot_can_capture() {
        let state = SessionState::new(FilterId::Noir, true);
        let snapshot = state.snapshot();
        assert!(snapshot.can_capture());
        assert_eq!(snapshot.filter, FilterId::Noir);
        assert_eq!(snapshot.counter_label(), "0/3");
    }
}
