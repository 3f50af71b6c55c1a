// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera capture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            Booth / Session Layer             │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌─────────────────┐  ┌──────────────────┐  │
//! │  │     Camera      │  │   Still image    │  │
//! │  │ (V4L2 + negot.) │  │ (virtual camera) │  │
//! │  └─────────────────┘  └──────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! - [`camera`]: Platform trait, constraint profiles, V4L2 capture and the
//!   device negotiator
//! - [`virtual_camera`]: An image file or in-memory image played as a camera

pub mod camera;
pub mod virtual_camera;
