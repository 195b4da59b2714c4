//! Fixed timing and failure thresholds for the display engine.
//!
//! User-tunable values (stale timeout, poll interval, alert limits) live in
//! [`crate::config::Config`]. Everything here is a compile-time constant with
//! ordering assertions, so an inconsistent edit fails the build instead of
//! producing a confusing precedence at runtime.
//!
//! All durations are milliseconds of monotonic uptime unless the name says otherwise.

// =============================================================================
// Freshness & Failure Classification
// =============================================================================

/// Reading age at which the glucose view dims and shows the `!` indicator.
/// Does not replace the number; the hard STALE screen comes from the config timeout.
pub const SOFT_STALE_MS: u64 = 10 * 60 * 1000;

/// Consecutive fetch failures that force the STALE screen regardless of age.
pub const STALE_FAILURES: u32 = 5;

/// Consecutive fetch failures that force the NO DATA screen.
pub const NO_DATA_FAILURES: u32 = 10;

/// Grace period after boot before NO DATA may be shown.
/// Gives the first poll a chance to complete.
pub const NO_DATA_GRACE_MS: u64 = 5_000;

const _: () = assert!(STALE_FAILURES < NO_DATA_FAILURES);

// =============================================================================
// Display Engine Timing
// =============================================================================

/// Boot splash duration.
pub const BOOT_SPLASH_MS: u64 = 2_000;

/// Minimum time between two rendered frames (~10 FPS).
pub const RENDER_INTERVAL_MS: u64 = 100;

/// Toggle order rebuild period (picks up sysmon data appearing or going stale).
pub const TOGGLE_REBUILD_MS: u64 = 5_000;

/// How long the "+N" / "-N" delta glyph replaces a changed glucose value.
pub const DELTA_FLASH_MS: u64 = 3_000;

/// Time view alternates between clock and date at this period.
pub const DATE_ALTERNATE_MS: u64 = 5_000;

/// NO DATA and NO WIFI alternate between their two words at this period.
pub const FAULT_ALTERNATE_MS: u64 = 2_000;

/// Paused timer and stopwatch digits blink at this period.
pub const PAUSE_BLINK_MS: u64 = 500;

/// Scrolling text advances one pixel per step.
pub const SCROLL_STEP_MS: u64 = 100;

/// Auto-cycle interval bounds in seconds.
pub const AUTO_CYCLE_MIN_SEC: u32 = 3;
pub const AUTO_CYCLE_MAX_SEC: u32 = 300;

const _: () = assert!(BOOT_SPLASH_MS < NO_DATA_GRACE_MS);
const _: () = assert!(RENDER_INTERVAL_MS < PAUSE_BLINK_MS);
const _: () = assert!(RENDER_INTERVAL_MS < TOGGLE_REBUILD_MS);
const _: () = assert!(AUTO_CYCLE_MIN_SEC < AUTO_CYCLE_MAX_SEC);

// =============================================================================
// Alerts
// =============================================================================

/// Minimum spacing between two out-of-range beep bursts.
pub const ALERT_INTERVAL_MS: u64 = 10_000;

// =============================================================================
// Auxiliary Feeds
// =============================================================================

/// A pushed system metric is considered gone after this long without an update.
pub const SYSMON_STALE_MS: u64 = 30_000;

// =============================================================================
// Polling
// =============================================================================

/// Floor for the glucose poll interval, in seconds.
pub const MIN_POLL_INTERVAL_SEC: u32 = 15;

/// Floor for the weather poll interval, in minutes.
pub const MIN_WEATHER_POLL_MIN: u32 = 5;

/// Share sessions are re-established after this long.
pub const SHARE_SESSION_LIFETIME_MS: u64 = 60 * 60 * 1000;

// =============================================================================
// Connectivity
// =============================================================================

/// A WiFi join attempt is abandoned after this long.
pub const WIFI_CONNECT_TIMEOUT_MS: u64 = 15_000;

/// Period between WiFi join attempts while disconnected.
pub const WIFI_RETRY_INTERVAL_MS: u64 = 30_000;

const _: () = assert!(WIFI_CONNECT_TIMEOUT_MS < WIFI_RETRY_INTERVAL_MS);

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::assertions_on_constants)] // Intentional compile-time validation of threshold ordering
mod tests {
    use super::*;

    #[test]
    fn test_failure_threshold_ordering() {
        assert!(STALE_FAILURES < NO_DATA_FAILURES);
    }

    #[test]
    fn test_boot_splash_inside_grace() {
        assert!(BOOT_SPLASH_MS < NO_DATA_GRACE_MS);
    }

    #[test]
    fn test_soft_stale_shorter_than_default_timeout() {
        // Default stale timeout is 20 minutes.
        assert!(SOFT_STALE_MS < 20 * 60 * 1000);
    }
}
