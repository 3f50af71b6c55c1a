// SPDX-License-Identifier: GPL-3.0-only

//! Preview sink
//!
//! The surface a live stream is bound to. Capture threads publish decoded
//! frames into it; the preview and the rasterizer read the latest one. The
//! sink counts as "playing" from the first published frame onward.

use super::CameraFrame;
use std::sync::Arc;
use tokio::sync::watch;

/// Playback state of a sink
#[derive(Debug, Clone, Default)]
pub enum SinkState {
    /// Bound, no frame yet
    #[default]
    Waiting,
    Playing(Arc<CameraFrame>),
    /// The stream reported an error
    Failed(String),
}

/// Latest-frame slot shared between a capture thread and its readers
#[derive(Debug, Clone)]
pub struct PreviewSink {
    state: Arc<watch::Sender<SinkState>>,
}

impl Default for PreviewSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewSink {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SinkState::Waiting);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Replace the current frame
    pub fn publish(&self, frame: CameraFrame) {
        self.state.send_replace(SinkState::Playing(Arc::new(frame)));
    }

    /// Mark the stream as failed; readers stop seeing frames
    pub fn fail(&self, reason: impl Into<String>) {
        self.state.send_replace(SinkState::Failed(reason.into()));
    }

    /// Most recent frame, if the stream is playing
    pub fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        match &*self.state.borrow() {
            SinkState::Playing(frame) => Some(Arc::clone(frame)),
            _ => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(&*self.state.borrow(), SinkState::Playing(_))
    }

    /// Receiver notified on every published frame
    pub fn subscribe(&self) -> watch::Receiver<SinkState> {
        self.state.subscribe()
    }

    /// Resolve once the first frame arrives, or with the failure reason
    pub async fn wait_until_playing(&self) -> Result<(), String> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|state| !matches!(state, SinkState::Waiting))
            .await
            .map_err(|_| "preview sink closed".to_string())?;
        match &*state {
            SinkState::Failed(reason) => Err(reason.clone()),
            _ => Ok(()),
        }
    }
}
