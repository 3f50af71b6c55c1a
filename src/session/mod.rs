// SPDX-License-Identifier: GPL-3.0-only

//! Photo session: countdown, capture and the three-photo collection

mod sequencer;
mod state;

pub use sequencer::{CaptureSequencer, SessionEvent};
pub use state::{SessionPhase, SessionSnapshot, counter_label, status_message};
