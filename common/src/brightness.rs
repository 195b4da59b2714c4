//! Brightness policy: night window, then ambient light, then the manual level.

use crate::clock::WallClock;
use crate::config::Config;

/// Night window check. A window whose start is after its end wraps midnight.
pub const fn in_night_window(
    hour: u8,
    start: u8,
    end: u8,
) -> bool {
    if start > end { hour >= start || hour < end } else { hour >= start && hour < end }
}

/// Night mode is on and the local hour is inside the window.
pub fn is_night(
    cfg: &Config,
    clock: Option<&WallClock>,
) -> bool {
    cfg.night_mode_enabled
        && clock.is_some_and(|c| in_night_window(c.hour, cfg.night_start_hour, cfg.night_end_hour))
}

/// Brightness in effect for the next frame.
pub fn effective_brightness(
    cfg: &Config,
    clock: Option<&WallClock>,
    auto_level: u8,
) -> u8 {
    if is_night(cfg, clock) {
        cfg.night_brightness
    } else if cfg.auto_brightness {
        auto_level
    } else {
        cfg.brightness
    }
}

/// Soft-stale dimming: a third of the normal level, never fully dark.
pub const fn dimmed(level: u8) -> u8 {
    let d = level / 3;
    if d == 0 { 1 } else { d }
}

/// Next manual level for the middle button: 10 -> 40 -> 100 -> 200 -> 10.
/// Levels in between snap to the step above their band.
pub const fn next_brightness_step(current: u8) -> u8 {
    match current {
        0..20 => 40,
        20..60 => 100,
        60..150 => 200,
        _ => 10,
    }
}
