//! Timing constants for the simulator.
//!
//! These use `std::time::Duration`, which the `no_std` engine crate cannot, so
//! they live here rather than next to the engine's own thresholds.

use std::time::Duration;

/// Target loop period (~50 Hz). The main loop sleeps if a tick finishes early.
pub const TICK_TIME: Duration = Duration::from_millis(20);

/// Simulated latency of one HTTPS request.
pub const REQUEST_LATENCY: Duration = Duration::from_millis(30);

/// How often the fake host pushes a system monitor sample while enabled.
pub const SYSMON_PERIOD: Duration = Duration::from_secs(3);

/// Window scale: one matrix pixel becomes a square of this many screen pixels.
pub const PIXEL_SCALE: u32 = 20;

/// Gap between matrix pixels on screen.
pub const PIXEL_SPACING: u32 = 3;
