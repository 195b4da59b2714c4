//! Color constants for the SugarClock LED matrix.
//!
//! The TC001 panel is a chain of WS2812 pixels, so colors are plain 24-bit
//! `Rgb888`. User-configurable colors are stored in the config record as
//! packed `0xRRGGBB` integers and converted here at render time.

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

// =============================================================================
// Standard Colors
// =============================================================================

/// All channels off.
pub const BLACK: Rgb888 = Rgb888::BLACK;

/// Notifications, messages and the SETUP glyph.
pub const WHITE: Rgb888 = Rgb888::WHITE;

/// Fault glyphs (NO DATA, NO WIFI), urgent notifications, sysmon critical.
pub const RED: Rgb888 = Rgb888::RED;

/// Stopwatch digits, timer DONE, countdown NOW, sysmon normal.
pub const GREEN: Rgb888 = Rgb888::GREEN;

/// STALE glyph, soft-stale indicator, sysmon warning.
pub const YELLOW: Rgb888 = Rgb888::YELLOW;

/// Default clock and weather color.
pub const CYAN: Rgb888 = Rgb888::CYAN;

// =============================================================================
// Custom Colors
// =============================================================================

/// Running pomodoro digits and short countdowns.
pub const ORANGE: Rgb888 = Rgb888::new(255, 165, 0);

/// Boot splash, pomodoro break, weather placeholder.
pub const TEAL: Rgb888 = Rgb888::new(0, 200, 200);

/// Placeholder glyphs for missing data ("---", "--:--", "SYS..").
pub const GRAY: Rgb888 = Rgb888::new(100, 100, 100);

/// Unfilled part of the sysmon bar.
pub const DIM: Rgb888 = Rgb888::new(30, 30, 30);

/// Rain and drizzle particles.
pub const RAIN_BLUE: Rgb888 = Rgb888::new(40, 90, 255);

/// Snow particles.
pub const SNOW_WHITE: Rgb888 = Rgb888::new(200, 200, 220);

// =============================================================================
// Packed Color Conversion
// =============================================================================

/// Convert a packed `0xRRGGBB` value into a pixel color. The top byte is ignored.
#[inline]
pub const fn from_packed(packed: u32) -> Rgb888 {
    Rgb888::new(
        ((packed >> 16) & 0xFF) as u8,
        ((packed >> 8) & 0xFF) as u8,
        (packed & 0xFF) as u8,
    )
}

/// Pack a pixel color back into `0xRRGGBB`.
#[inline]
pub fn to_packed(color: Rgb888) -> u32 { (u32::from(color.r()) << 16) | (u32::from(color.g()) << 8) | u32::from(color.b()) }

/// Parse a `#rrggbb` web color. Returns `None` for anything else.
pub fn parse_hex(text: &str) -> Option<u32> {
    let digits = text.strip_prefix('#')?;
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_packed_channels() {
        let c = from_packed(0xEA4335);
        assert_eq!((c.r(), c.g(), c.b()), (0xEA, 0x43, 0x35));
    }

    #[test]
    fn test_from_packed_ignores_top_byte() {
        assert_eq!(from_packed(0xFF00_FF00), Rgb888::new(0, 0xFF, 0));
    }

    #[test]
    fn test_packed_round_trip() {
        assert_eq!(to_packed(from_packed(0x34A853)), 0x34A853);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#fbbc04"), Some(0xFBBC04));
        assert_eq!(parse_hex("#FFFFFF"), Some(0xFFFFFF));
        assert_eq!(parse_hex("fbbc04"), None);
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("#zzzzzz"), None);
    }
}
