//! In-memory framebuffer for the 32x8 matrix.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;

use super::{MATRIX_HEIGHT, MATRIX_WIDTH};

const W: usize = MATRIX_WIDTH as usize;
const H: usize = MATRIX_HEIGHT as usize;

/// One full panel of pixels. Drawing outside the panel is clipped silently.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Frame {
    pixels: [[Rgb888; W]; H],
}

impl Frame {
    pub const fn new() -> Self { Self { pixels: [[Rgb888::BLACK; W]; H] } }

    /// Color at `(x, y)`; black outside the panel.
    pub fn pixel(
        &self,
        x: i32,
        y: i32,
    ) -> Rgb888 {
        if (0..W as i32).contains(&x) && (0..H as i32).contains(&y) {
            self.pixels[y as usize][x as usize]
        } else {
            Rgb888::BLACK
        }
    }

    #[inline]
    pub fn is_lit(
        &self,
        x: i32,
        y: i32,
    ) -> bool {
        self.pixel(x, y) != Rgb888::BLACK
    }

    /// Number of non-black pixels.
    pub fn lit_count(&self) -> usize { self.pixels.iter().flatten().filter(|&&c| c != Rgb888::BLACK).count() }

    /// Leftmost and rightmost lit column, if anything is lit.
    pub fn lit_columns(&self) -> Option<(i32, i32)> {
        let lit = |x: &usize| (0..H).any(|y| self.pixels[y][*x] != Rgb888::BLACK);
        let first = (0..W).find(lit)?;
        let last = (0..W).rev().find(lit)?;
        Some((first as i32, last as i32))
    }

    /// True if any pixel has exactly this color.
    pub fn contains_color(
        &self,
        color: Rgb888,
    ) -> bool {
        self.pixels.iter().flatten().any(|&c| c == color)
    }

    /// Copy the frame onto another target, scaling every channel by `brightness / 255`.
    pub fn blit<D>(
        &self,
        target: &mut D,
        brightness: u8,
    ) where
        D: DrawTarget<Color = Rgb888>,
    {
        let scale = |v: u8| ((u16::from(v) * (u16::from(brightness) + 1)) >> 8) as u8;
        let pixels = self.pixels.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().map(move |(x, c)| {
                Pixel(Point::new(x as i32, y as i32), Rgb888::new(scale(c.r()), scale(c.g()), scale(c.b())))
            })
        });
        target.draw_iter(pixels).ok();
    }
}

impl Default for Frame {
    fn default() -> Self { Self::new() }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size { Size::new(MATRIX_WIDTH, MATRIX_HEIGHT) }
}

impl DrawTarget for Frame {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if (0..W as i32).contains(&point.x) && (0..H as i32).contains(&point.y) {
                self.pixels[point.y as usize][point.x as usize] = color;
            }
        }
        Ok(())
    }

    fn clear(
        &mut self,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        self.pixels = [[color; W]; H];
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    use super::*;

    #[test]
    fn test_out_of_bounds_is_clipped() {
        let mut f = Frame::new();
        Rectangle::new(Point::new(-5, -5), Size::new(100, 100))
            .into_styled(PrimitiveStyle::with_fill(Rgb888::RED))
            .draw(&mut f)
            .ok();
        assert_eq!(f.lit_count(), 32 * 8);
        assert_eq!(f.pixel(40, 2), Rgb888::BLACK);
    }

    #[test]
    fn test_lit_columns() {
        let mut f = Frame::new();
        assert_eq!(f.lit_columns(), None);
        Pixel(Point::new(3, 7), Rgb888::GREEN).draw(&mut f).ok();
        Pixel(Point::new(20, 0), Rgb888::GREEN).draw(&mut f).ok();
        assert_eq!(f.lit_columns(), Some((3, 20)));
    }

    #[test]
    fn test_blit_scales_brightness() {
        let mut src = Frame::new();
        Pixel(Point::new(0, 0), Rgb888::new(200, 100, 0)).draw(&mut src).ok();
        let mut full = Frame::new();
        src.blit(&mut full, 255);
        assert_eq!(full.pixel(0, 0), Rgb888::new(200, 100, 0));
        let mut dim = Frame::new();
        src.blit(&mut dim, 127);
        assert_eq!(dim.pixel(0, 0), Rgb888::new(100, 50, 0));
    }
}
