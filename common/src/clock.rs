//! Wall-clock snapshot supplied by the time collaborator.
//!
//! The engine itself only tracks monotonic uptime. Local time comes from
//! outside (SNTP on hardware, the host clock in the simulator) and is
//! `None` until the first sync.

use core::fmt::Write;

use heapless::String;

const MONTHS: [&str; 12] = ["JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC"];

/// Broken-down local time.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct WallClock {
    /// 0-23
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// 1-31
    pub day: u8,
    /// 1-12
    pub month: u8,
    pub year: u16,
    /// Seconds since the unix epoch.
    pub unix: i64,
}

impl WallClock {
    /// Three-letter month abbreviation, `"???"` when out of range.
    pub fn month_abbrev(&self) -> &'static str {
        MONTHS.get(usize::from(self.month).wrapping_sub(1)).copied().unwrap_or("???")
    }

    /// Hour on a 12-hour dial: 0 and 12 both read 12.
    pub const fn hour_12(&self) -> u8 {
        match self.hour % 12 {
            0 => 12,
            h => h,
        }
    }

    /// Hour as displayed for the configured dial.
    pub const fn display_hour(
        &self,
        use_24h: bool,
    ) -> u8 {
        if use_24h { self.hour } else { self.hour_12() }
    }

    /// ISO-ish stamp for diagnostics, e.g. `2026-03-05 14:07:09`.
    pub fn stamp(&self) -> String<24> {
        let mut out = String::new();
        write!(
            out,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
        .ok();
        out
    }
}

/// Source of local time.
pub trait TimeSource {
    /// Current local time, or `None` until synced.
    fn now(&mut self) -> Option<WallClock>;
}

// =============================================================================
// Unit Tests
// =============================================================================
