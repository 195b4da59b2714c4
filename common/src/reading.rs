//! Reading records produced by the data-source clients.
//!
//! Each client owns exactly one [`GlucoseReading`] or [`WeatherReading`] slot
//! and overwrites it in place on every fetch; the engine only reads them.
//! Accepted glucose values are also appended to a bounded [`GlucoseHistory`]
//! together with their delta from the previous value.

use heapless::{Deque, String};
use serde::Serialize;

use crate::text::bounded;

// =============================================================================
// Trend
// =============================================================================

/// Direction and rate of glucose change.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub enum Trend {
    RisingFast,
    Rising,
    Flat,
    Falling,
    FallingFast,
    #[default]
    Unknown,
}

impl Trend {
    /// Map a textual trend label. Accepts both the engine's own names and the
    /// vendor arrow names, case-insensitively. Anything unrecognized is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        const LABELS: [(&str, Trend); 11] = [
            ("RisingFast", Trend::RisingFast),
            ("DoubleUp", Trend::RisingFast),
            ("Rising", Trend::Rising),
            ("SingleUp", Trend::Rising),
            ("FortyFiveUp", Trend::Rising),
            ("Flat", Trend::Flat),
            ("FortyFiveDown", Trend::Falling),
            ("Falling", Trend::Falling),
            ("SingleDown", Trend::Falling),
            ("FallingFast", Trend::FallingFast),
            ("DoubleDown", Trend::FallingFast),
        ];
        let label = label.trim();
        LABELS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(label))
            .map_or(Self::Unknown, |&(_, trend)| trend)
    }

    /// Map the legacy numeric vendor code (1 = double up ... 7 = double down).
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::RisingFast,
            2 | 3 => Self::Rising,
            4 => Self::Flat,
            5 | 6 => Self::Falling,
            7 => Self::FallingFast,
            _ => Self::Unknown,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::RisingFast => "RisingFast",
            Self::Rising => "Rising",
            Self::Flat => "Flat",
            Self::Falling => "Falling",
            Self::FallingFast => "FallingFast",
            Self::Unknown => "Unknown",
        }
    }
}

// =============================================================================
// Glucose Reading
// =============================================================================

/// Capacity of a server-pushed message.
pub const MESSAGE_LEN: usize = 127;

/// Latest glucose sample as last fetched.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct GlucoseReading {
    /// mg/dL; 0 means invalid or unset.
    pub value: i32,
    pub trend: Trend,
    /// Free text pushed by the server. Empty when absent.
    pub message: String<MESSAGE_LEN>,
    /// Server-directed display state index, unvalidated.
    pub force_mode: Option<i32>,
    /// Source timestamp, unix seconds.
    pub timestamp: u64,
    /// Local receipt time, uptime milliseconds.
    pub received_at_ms: u64,
    pub valid: bool,
}

impl GlucoseReading {
    /// Build a reading; validity follows from the value.
    pub fn new(
        value: i32,
        trend: Trend,
        received_at_ms: u64,
    ) -> Self {
        Self {
            value,
            trend,
            message: String::new(),
            force_mode: None,
            timestamp: 0,
            received_at_ms,
            valid: value > 0,
        }
    }

    pub fn with_message(
        mut self,
        message: &str,
    ) -> Self {
        self.message = bounded(message);
        self
    }

    pub const fn with_force_mode(
        mut self,
        index: i32,
    ) -> Self {
        self.force_mode = if index >= 0 { Some(index) } else { None };
        self
    }

    pub const fn with_timestamp(
        mut self,
        unix_secs: u64,
    ) -> Self {
        self.timestamp = unix_secs;
        self
    }
}

// =============================================================================
// Weather Reading
// =============================================================================

/// Precipitation class derived from the provider's condition id.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub enum WeatherCondition {
    #[default]
    Clear,
    Thunderstorm,
    Drizzle,
    Rain,
    Snow,
}

impl WeatherCondition {
    /// Classify by hundreds: 2xx thunder, 3xx drizzle, 5xx rain, 6xx snow.
    pub const fn from_id(id: i32) -> Self {
        match id / 100 {
            2 => Self::Thunderstorm,
            3 => Self::Drizzle,
            5 => Self::Rain,
            6 => Self::Snow,
            _ => Self::Clear,
        }
    }

    /// Fallback when only the short description is available.
    pub fn from_description(desc: &str) -> Self {
        let desc = desc.trim();
        if desc.eq_ignore_ascii_case("Thunderstorm") {
            Self::Thunderstorm
        } else if desc.eq_ignore_ascii_case("Drizzle") {
            Self::Drizzle
        } else if desc.eq_ignore_ascii_case("Rain") {
            Self::Rain
        } else if desc.eq_ignore_ascii_case("Snow") {
            Self::Snow
        } else {
            Self::Clear
        }
    }
}

/// Capacity of the weather description.
pub const WEATHER_DESC_LEN: usize = 31;

/// Latest weather sample.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct WeatherReading {
    /// Degrees in whatever unit was requested.
    pub temp: f32,
    pub description: String<WEATHER_DESC_LEN>,
    pub humidity: i32,
    pub condition_id: i32,
    pub condition: WeatherCondition,
    pub received_at_ms: u64,
    pub valid: bool,
}

// =============================================================================
// History
// =============================================================================

/// Number of accepted readings kept for graphs and trend consumers.
pub const HISTORY_CAPACITY: usize = 48;

/// One accepted reading.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct HistoryEntry {
    pub value: i32,
    pub delta: i32,
    pub timestamp_ms: u64,
}

/// Ring buffer of accepted readings. Oldest entries are dropped once full.
pub struct GlucoseHistory {
    entries: Deque<HistoryEntry, HISTORY_CAPACITY>,
    previous: Option<i32>,
    delta: i32,
}

impl GlucoseHistory {
    pub const fn new() -> Self {
        Self {
            entries: Deque::new(),
            previous: None,
            delta: 0,
        }
    }

    /// Record an accepted value and return its delta from the previous one
    /// (0 for the very first value).
    pub fn record(
        &mut self,
        value: i32,
        now_ms: u64,
    ) -> i32 {
        self.delta = self.previous.map_or(0, |prev| value - prev);
        self.previous = Some(value);

        if self.entries.is_full() {
            self.entries.pop_front();
        }
        self.entries
            .push_back(HistoryEntry {
                value,
                delta: self.delta,
                timestamp_ms: now_ms,
            })
            .ok();
        self.delta
    }

    /// Delta of the most recent value.
    #[inline]
    pub const fn delta(&self) -> i32 { self.delta }

    #[inline]
    pub fn len(&self) -> usize { self.entries.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// The most recent `max` entries, oldest first.
    pub fn recent(
        &self,
        max: usize,
    ) -> impl Iterator<Item = &HistoryEntry> {
        let skip = self.entries.len().saturating_sub(max);
        self.entries.iter().skip(skip)
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&HistoryEntry> { self.entries.back() }
}

impl Default for GlucoseHistory {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Unit Tests
// =============================================================================
