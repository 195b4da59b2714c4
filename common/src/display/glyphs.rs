//! Text, trend arrow and bar primitives for the 8-pixel-high panel.
//!
//! Text uses a 5x7 font with one column of spacing, so every character
//! advances six pixels and a line is exactly seven pixels tall from the top
//! row. Layout math everywhere else relies on that fixed advance.

use embedded_graphics::mono_font::ascii::FONT_5X7;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

use super::MATRIX_WIDTH;
use crate::colors::DIM;
use crate::reading::Trend;

/// Horizontal advance of one character.
pub const GLYPH_ADVANCE: i32 = 6;

const MATRIX_FONT: MonoFont<'static> = MonoFont {
    character_spacing: 1,
    ..FONT_5X7
};

const _: () = assert!(MATRIX_FONT.character_size.width as i32 + MATRIX_FONT.character_spacing as i32 == GLYPH_ADVANCE);

// =============================================================================
// Text
// =============================================================================

/// Rendered width of `text` in pixels.
pub fn text_width(text: &str) -> i32 { text.chars().count() as i32 * GLYPH_ADVANCE }

/// Left edge that centers `text` on the panel. Negative when it does not fit.
pub fn centered_x(text: &str) -> i32 { (MATRIX_WIDTH as i32 - text_width(text)) / 2 }

/// Draw `text` with its top row at `y`.
pub fn draw_text<D>(
    display: &mut D,
    text: &str,
    x: i32,
    y: i32,
    color: Rgb888,
) where
    D: DrawTarget<Color = Rgb888>,
{
    Text::with_baseline(text, Point::new(x, y), MonoTextStyle::new(&MATRIX_FONT, color), Baseline::Top)
        .draw(display)
        .ok();
}

/// Draw `text` horizontally centered on the top row.
pub fn draw_centered<D>(
    display: &mut D,
    text: &str,
    color: Rgb888,
) where
    D: DrawTarget<Color = Rgb888>,
{
    draw_text(display, text, centered_x(text), 0, color);
}

// =============================================================================
// Trend Arrows
// =============================================================================

// 5x7 bitmaps, one byte per row, bit 4 is the leftmost column.

const RISING_FAST: [u8; 7] = [0b01010, 0b11111, 0b01010, 0b01010, 0b01010, 0b01010, 0b01010];
const RISING: [u8; 7] = [0b00100, 0b01110, 0b10101, 0b00100, 0b00100, 0b00100, 0b00100];
const FLAT: [u8; 7] = [0b00000, 0b00100, 0b00010, 0b11111, 0b00010, 0b00100, 0b00000];
const FALLING: [u8; 7] = [0b00100, 0b00100, 0b00100, 0b00100, 0b10101, 0b01110, 0b00100];
const FALLING_FAST: [u8; 7] = [0b01010, 0b01010, 0b01010, 0b01010, 0b01010, 0b11111, 0b01010];

/// Arrow bitmap for a trend; `None` for [`Trend::Unknown`].
pub const fn trend_bitmap(trend: Trend) -> Option<&'static [u8; 7]> {
    match trend {
        Trend::RisingFast => Some(&RISING_FAST),
        Trend::Rising => Some(&RISING),
        Trend::Flat => Some(&FLAT),
        Trend::Falling => Some(&FALLING),
        Trend::FallingFast => Some(&FALLING_FAST),
        Trend::Unknown => None,
    }
}

/// Draw the 5x7 arrow for `trend` with its top-left corner at `(x, y)`.
/// Unknown trends draw nothing.
pub fn draw_trend<D>(
    display: &mut D,
    trend: Trend,
    x: i32,
    y: i32,
    color: Rgb888,
) where
    D: DrawTarget<Color = Rgb888>,
{
    let Some(bitmap) = trend_bitmap(trend) else {
        return;
    };
    let pixels = bitmap.iter().enumerate().flat_map(move |(row, bits)| {
        (0..5)
            .filter(move |col| bits & (1 << (4 - col)) != 0)
            .map(move |col| Pixel(Point::new(x + col, y + row as i32), color))
    });
    display.draw_iter(pixels).ok();
}

// =============================================================================
// Bar
// =============================================================================

/// First row of the proportional bar.
const BAR_TOP: i32 = 5;

/// Proportional bar on the bottom three rows. The unfilled remainder keeps a
/// dim outline on its top and bottom rows so the scale stays visible.
pub fn draw_bar<D>(
    display: &mut D,
    value: i32,
    max: i32,
    color: Rgb888,
) where
    D: DrawTarget<Color = Rgb888>,
{
    let width = MATRIX_WIDTH as i32;
    let fill = if max > 0 { (i64::from(value) * i64::from(width) / i64::from(max)).clamp(0, i64::from(width)) as i32 } else { 0 };

    if fill > 0 {
        Rectangle::new(Point::new(0, BAR_TOP), Size::new(fill as u32, 3))
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(display)
            .ok();
    }
    let outline = (fill..width).flat_map(|x| [Pixel(Point::new(x, BAR_TOP), DIM), Pixel(Point::new(x, BAR_TOP + 2), DIM)]);
    display.draw_iter(outline).ok();
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_graphics::pixelcolor::RgbColor;

    use super::*;
    use crate::display::Frame;

    #[test]
    fn test_centering() {
        assert_eq!(text_width("120"), 18);
        assert_eq!(centered_x("120"), 7);
        assert_eq!(centered_x("12:34"), 1);
        assert_eq!(centered_x(""), 16);
        assert!(centered_x("A LONG MESSAGE") < 0);
    }

    #[test]
    fn test_text_stays_in_its_cells() {
        let mut f = Frame::new();
        draw_text(&mut f, "88", 4, 0, Rgb888::GREEN);
        let (first, last) = f.lit_columns().unwrap();
        assert!(first >= 4);
        assert!(last < 4 + 2 * GLYPH_ADVANCE);
        assert!((0..32).all(|x| !f.is_lit(x, 7)));
    }

    #[test]
    fn test_trend_arrow_pixels() {
        let mut f = Frame::new();
        draw_trend(&mut f, Trend::Flat, 10, 0, Rgb888::RED);
        // Shaft of the flat arrow fills row 3.
        assert!((10..15).all(|x| f.is_lit(x, 3)));
        assert!(!f.is_lit(10, 0));
        assert_eq!(f.lit_count(), 9);
    }

    #[test]
    fn test_unknown_trend_draws_nothing() {
        let mut f = Frame::new();
        draw_trend(&mut f, Trend::Unknown, 0, 0, Rgb888::RED);
        assert_eq!(f.lit_count(), 0);
    }

    #[test]
    fn test_every_known_trend_has_an_arrow() {
        for trend in [Trend::RisingFast, Trend::Rising, Trend::Flat, Trend::Falling, Trend::FallingFast] {
            let bitmap = trend_bitmap(trend).unwrap();
            assert!(bitmap.iter().all(|row| *row < 0b100000));
            assert!(bitmap.iter().any(|row| *row != 0));
        }
    }

    #[test]
    fn test_bar_half_full() {
        let mut f = Frame::new();
        draw_bar(&mut f, 50, 100, Rgb888::GREEN);
        assert_eq!(f.pixel(15, 6), Rgb888::GREEN);
        assert_eq!(f.pixel(16, 5), DIM);
        assert_eq!(f.pixel(16, 7), DIM);
        assert!(!f.is_lit(16, 6));
        assert!(!f.is_lit(0, 4));
    }

    #[test]
    fn test_bar_clamps() {
        let mut f = Frame::new();
        draw_bar(&mut f, 250, 100, Rgb888::RED);
        assert_eq!(f.pixel(31, 7), Rgb888::RED);
        let mut f = Frame::new();
        draw_bar(&mut f, -5, 100, Rgb888::RED);
        assert!(!f.contains_color(Rgb888::RED));
        assert_eq!(f.pixel(0, 5), DIM);
    }
}
