// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines for captures and strips
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Live frame   │ ──▶ │  Photo Pipeline   │ ──▶ │  JPEG q95    │
//! │   (RGBA)     │     │  - upscale        │     │ CapturedPhoto│
//! │              │     │  - filter, mirror │     │              │
//! └──────────────┘     └───────────────────┘     └──────┬───────┘
//!                                                      │ ×3
//!                      ┌───────────────────┐     ┌──────▼───────┐
//!                      │  Strip Compositor │ ◀── │   Session    │
//!                      │  - layout, shadow │     └──────────────┘
//!                      │  - caption text   │ ──▶  JPEG q98 download
//!                      └───────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: rasterizing live frames into captured photos
//! - [`strip`]: composing three photos into the printable strip

pub mod photo;
pub mod strip;
