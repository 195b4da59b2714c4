//! Display state engine and matrix renderer.
//!
//! All drawing is generic over `DrawTarget<Color = Rgb888>`, so the same code
//! renders into the in-memory [`Frame`] on hardware, in the simulator window
//! and in tests.

mod engine;
mod frame;
mod glyphs;
mod render;
mod toggle;
mod weather_fx;

pub use engine::{DisplayEngine, EngineInputs};
pub use frame::Frame;
pub use glyphs::{
    GLYPH_ADVANCE,
    centered_x,
    draw_bar,
    draw_centered,
    draw_text,
    draw_trend,
    text_width,
    trend_bitmap,
};
pub use render::{RenderContext, Renderer, StopwatchView, TimerView};
pub use toggle::ToggleOrder;
pub use weather_fx::WeatherFx;

/// Panel width in pixels.
pub const MATRIX_WIDTH: u32 = 32;

/// Panel height in pixels.
pub const MATRIX_HEIGHT: u32 = 8;

// =============================================================================
// Display State
// =============================================================================

/// What the panel shows. Exactly one state is current at any instant.
///
/// The discriminant is the wire index used by the server's `force_mode`
/// field and by the forced-state API.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DisplayState {
    #[default]
    Boot,
    Glucose,
    Time,
    Weather,
    Timer,
    Stopwatch,
    Sysmon,
    Countdown,
    Trend,
    Message,
    Notify,
    Stale,
    NoData,
    NoWifi,
    NoConfig,
}

impl DisplayState {
    pub const ALL: [Self; 15] = [
        Self::Boot,
        Self::Glucose,
        Self::Time,
        Self::Weather,
        Self::Timer,
        Self::Stopwatch,
        Self::Sysmon,
        Self::Countdown,
        Self::Trend,
        Self::Message,
        Self::Notify,
        Self::Stale,
        Self::NoData,
        Self::NoWifi,
        Self::NoConfig,
    ];

    /// Look up a wire index. Out-of-range indices yield `None`.
    pub const fn from_index(index: i32) -> Option<Self> {
        if index >= 0 && (index as usize) < Self::ALL.len() { Some(Self::ALL[index as usize]) } else { None }
    }

    #[inline]
    pub const fn index(self) -> u8 { self as u8 }

    /// Look up a state by its status name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|s| s.name().eq_ignore_ascii_case(name))
    }

    /// Status name reported to the configuration surface.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boot => "BOOT",
            Self::Glucose => "GLUCOSE",
            Self::Time => "TIME",
            Self::Weather => "WEATHER",
            Self::Timer => "TIMER",
            Self::Stopwatch => "STOPWATCH",
            Self::Sysmon => "SYSMON",
            Self::Countdown => "COUNTDOWN",
            Self::Trend => "TREND",
            Self::Message => "MESSAGE",
            Self::Notify => "NOTIFY",
            Self::Stale => "STALE",
            Self::NoData => "NO_DATA",
            Self::NoWifi => "NO_WIFI",
            Self::NoConfig => "NO_CFG",
        }
    }

    /// Boot mode selected by the `default_mode` setting (0 glucose, 1 time, 2 weather).
    pub const fn from_default_mode(mode: u8) -> Self {
        match mode {
            1 => Self::Time,
            2 => Self::Weather,
            _ => Self::Glucose,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
