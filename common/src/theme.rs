//! Glucose color policy.
//!
//! A reading falls into one of five bands decided by four thresholds. Each
//! band has its own user-configurable color. Values exactly on a threshold
//! belong to the less severe band: `urgent_low` itself is "low", `low` and
//! `high` themselves are "in range", and `urgent_high` itself is "high".

use embedded_graphics::pixelcolor::Rgb888;
use serde::{Deserialize, Serialize};

use crate::colors::from_packed;

// =============================================================================
// Bands
// =============================================================================

/// Severity band of a glucose value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GlucoseBand {
    UrgentLow,
    Low,
    InRange,
    High,
    UrgentHigh,
}

impl GlucoseBand {
    /// Stable name used by the diagnostics surface.
    pub const fn name(self) -> &'static str {
        match self {
            Self::UrgentLow => "urgent-low",
            Self::Low => "low",
            Self::InRange => "in-range",
            Self::High => "high",
            Self::UrgentHigh => "urgent-high",
        }
    }
}

// =============================================================================
// Thresholds
// =============================================================================

/// Band boundaries in mg/dL.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct GlucoseThresholds {
    pub urgent_low: i32,
    pub low: i32,
    pub high: i32,
    pub urgent_high: i32,
}

impl GlucoseThresholds {
    pub const fn new() -> Self {
        Self {
            urgent_low: 70,
            low: 80,
            high: 180,
            urgent_high: 250,
        }
    }

    /// Classify a value. Pure function of the value and the four thresholds.
    pub const fn band(
        &self,
        mg_dl: i32,
    ) -> GlucoseBand {
        if mg_dl < self.urgent_low {
            GlucoseBand::UrgentLow
        } else if mg_dl < self.low {
            GlucoseBand::Low
        } else if mg_dl <= self.high {
            GlucoseBand::InRange
        } else if mg_dl <= self.urgent_high {
            GlucoseBand::High
        } else {
            GlucoseBand::UrgentHigh
        }
    }
}

impl Default for GlucoseThresholds {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Theme Colors
// =============================================================================

/// Packed `0xRRGGBB` color per band.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ThemeColors {
    pub urgent_low: u32,
    pub low: u32,
    pub in_range: u32,
    pub high: u32,
    pub urgent_high: u32,
}

impl ThemeColors {
    pub const fn new() -> Self {
        Self {
            urgent_low: 0xEA4335,
            low: 0xFBBC04,
            in_range: 0x34A853,
            high: 0xFBBC04,
            urgent_high: 0xEA4335,
        }
    }

    /// Packed color configured for a band.
    pub const fn packed(
        &self,
        band: GlucoseBand,
    ) -> u32 {
        match band {
            GlucoseBand::UrgentLow => self.urgent_low,
            GlucoseBand::Low => self.low,
            GlucoseBand::InRange => self.in_range,
            GlucoseBand::High => self.high,
            GlucoseBand::UrgentHigh => self.urgent_high,
        }
    }
}

impl Default for ThemeColors {
    fn default() -> Self { Self::new() }
}

/// Display color for a glucose value.
#[inline]
pub const fn themed_color(
    mg_dl: i32,
    thresholds: &GlucoseThresholds,
    theme: &ThemeColors,
) -> Rgb888 {
    from_packed(theme.packed(thresholds.band(mg_dl)))
}

// =============================================================================
// Unit Tests
// =============================================================================
