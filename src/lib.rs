// SPDX-License-Identifier: GPL-3.0-only

//! Photo booth
//!
//! Captures live camera video, applies a cosmetic filter, takes a sequence
//! of three countdown snapshots and composes them into a printable photo
//! strip.
//!
//! # Architecture
//!
//! - [`filters`]: Filter catalog and colour adjustments
//! - [`backends`]: Camera platforms and device negotiation
//! - [`pipelines`]: Frame rasterizer and strip compositor
//! - [`session`]: Countdown and capture state machine
//! - [`storage`]: Strip export and saving
//! - [`booth`]: Façade tying the pieces together
//! - [`config`]: User configuration
//! - [`terminal`]: Terminal front-end
//!
//! # Example
//!
//! ```ignore
//! let booth = PhotoBooth::acquire(&V4l2Platform::new(None), BoothConfig::default()).await?;
//! booth.request_capture();
//! ```

pub mod backends;
pub mod booth;
pub mod config;
pub mod constants;
pub mod errors;
pub mod filters;
pub mod pipelines;
pub mod session;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use booth::PhotoBooth;
pub use config::BoothConfig;
pub use errors::{AcquireError, BoothError, BoothResult};
pub use filters::FilterId;
pub use session::{CaptureSequencer, SessionEvent, SessionSnapshot};
