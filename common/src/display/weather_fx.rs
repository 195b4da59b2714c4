//! Precipitation particles and thunder flashes behind the weather readout.
//!
//! Animation is time-based: particles advance one row per step of a
//! condition-specific period, however often the renderer is called.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use oorandom::Rand32;

use super::{MATRIX_HEIGHT, MATRIX_WIDTH};
use crate::colors::{RAIN_BLUE, SNOW_WHITE, WHITE};
use crate::reading::WeatherCondition;

/// Maximum number of live particles.
const PARTICLES: usize = 10;

/// Length of one thunder flash.
const FLASH_MS: u64 = 120;

/// Random gap between two thunder flashes.
const FLASH_GAP_MIN_MS: u32 = 3_000;
const FLASH_GAP_MAX_MS: u32 = 8_000;

#[derive(Clone, Copy, Debug, Default)]
struct Particle {
    x: i32,
    y: i32,
    live: bool,
}

/// Animation state for the weather screen.
pub struct WeatherFx {
    rng: Rand32,
    particles: [Particle; PARTICLES],
    condition: WeatherCondition,
    last_step_ms: u64,
    flash_until_ms: u64,
    next_flash_ms: Option<u64>,
}

impl WeatherFx {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rand32::new(seed),
            particles: [Particle::default(); PARTICLES],
            condition: WeatherCondition::Clear,
            last_step_ms: 0,
            flash_until_ms: 0,
            next_flash_ms: None,
        }
    }

    /// Milliseconds per row of fall, or `None` when the condition has no particles.
    const fn step_ms(condition: WeatherCondition) -> Option<u64> {
        match condition {
            WeatherCondition::Rain | WeatherCondition::Thunderstorm => Some(80),
            WeatherCondition::Drizzle => Some(160),
            WeatherCondition::Snow => Some(300),
            WeatherCondition::Clear => None,
        }
    }

    const fn color(condition: WeatherCondition) -> Rgb888 {
        match condition {
            WeatherCondition::Snow => SNOW_WHITE,
            _ => RAIN_BLUE,
        }
    }

    /// Drizzle spawns sparsely, rain densely.
    const fn spawn_chance(condition: WeatherCondition) -> u32 {
        match condition {
            WeatherCondition::Drizzle => 2,
            WeatherCondition::Snow => 3,
            _ => 6,
        }
    }

    /// Advance the animation to `now_ms`.
    pub fn update(
        &mut self,
        now_ms: u64,
        condition: WeatherCondition,
    ) {
        if condition != self.condition {
            self.condition = condition;
            self.particles = [Particle::default(); PARTICLES];
            self.next_flash_ms = None;
            self.flash_until_ms = 0;
        }

        if condition == WeatherCondition::Thunderstorm {
            match self.next_flash_ms {
                None => self.schedule_flash(now_ms),
                Some(at) if now_ms >= at => {
                    self.flash_until_ms = now_ms + FLASH_MS;
                    self.schedule_flash(now_ms);
                }
                Some(_) => {}
            }
        }

        let Some(step) = Self::step_ms(condition) else {
            return;
        };
        if now_ms.saturating_sub(self.last_step_ms) < step {
            return;
        }
        self.last_step_ms = now_ms;

        for p in self.particles.iter_mut().filter(|p| p.live) {
            p.y += 1;
            if condition == WeatherCondition::Snow && self.rng.rand_range(0..4) == 0 {
                p.x += if self.rng.rand_range(0..2) == 0 { -1 } else { 1 };
            }
            if p.y >= MATRIX_HEIGHT as i32 || !(0..MATRIX_WIDTH as i32).contains(&p.x) {
                p.live = false;
            }
        }

        for _ in 0..Self::spawn_chance(condition) {
            if self.rng.rand_range(0..10) < 4
                && let Some(free) = self.particles.iter_mut().find(|p| !p.live)
            {
                *free = Particle {
                    x: self.rng.rand_range(0..MATRIX_WIDTH) as i32,
                    y: 0,
                    live: true,
                };
            }
        }
    }

    fn schedule_flash(
        &mut self,
        now_ms: u64,
    ) {
        let gap = self.rng.rand_range(FLASH_GAP_MIN_MS..FLASH_GAP_MAX_MS);
        self.next_flash_ms = Some(now_ms + u64::from(gap));
    }

    /// A thunder flash is lighting the panel.
    #[inline]
    pub const fn is_flashing(
        &self,
        now_ms: u64,
    ) -> bool {
        now_ms < self.flash_until_ms
    }

    pub fn live_particles(&self) -> usize { self.particles.iter().filter(|p| p.live).count() }

    /// Draw the background layer. Text is drawn on top by the caller.
    pub fn draw<D>(
        &self,
        display: &mut D,
        now_ms: u64,
    ) where
        D: DrawTarget<Color = Rgb888>,
    {
        if self.is_flashing(now_ms) {
            display.clear(WHITE).ok();
            return;
        }
        let color = Self::color(self.condition);
        let pixels = self.particles.iter().filter(|p| p.live).map(|p| Pixel(Point::new(p.x, p.y), color));
        display.draw_iter(pixels).ok();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Frame;

    #[test]
    fn test_clear_sky_has_no_particles() {
        let mut fx = WeatherFx::new(7);
        for t in (0..5_000).step_by(50) {
            fx.update(t, WeatherCondition::Clear);
        }
        assert_eq!(fx.live_particles(), 0);
        let mut f = Frame::new();
        fx.draw(&mut f, 5_000);
        assert_eq!(f.lit_count(), 0);
    }

    #[test]
    fn test_rain_spawns_and_draws() {
        let mut fx = WeatherFx::new(7);
        for t in (0..2_000).step_by(20) {
            fx.update(t, WeatherCondition::Rain);
        }
        assert!(fx.live_particles() > 0);
        let mut f = Frame::new();
        fx.draw(&mut f, 2_000);
        assert!(f.contains_color(RAIN_BLUE));
    }

    #[test]
    fn test_thunderstorm_flashes_within_gap() {
        let mut fx = WeatherFx::new(42);
        let mut flashed = false;
        for t in (0..9_000).step_by(10) {
            fx.update(t, WeatherCondition::Thunderstorm);
            flashed |= fx.is_flashing(t);
        }
        assert!(flashed);
    }

    #[test]
    fn test_flash_fills_panel() {
        let mut fx = WeatherFx::new(1);
        fx.update(0, WeatherCondition::Thunderstorm);
        fx.flash_until_ms = 500;
        let mut f = Frame::new();
        fx.draw(&mut f, 100);
        assert_eq!(f.lit_count(), 32 * 8);
    }

    #[test]
    fn test_condition_change_resets_particles() {
        let mut fx = WeatherFx::new(3);
        for t in (0..2_000).step_by(20) {
            fx.update(t, WeatherCondition::Rain);
        }
        fx.update(2_010, WeatherCondition::Clear);
        assert_eq!(fx.live_particles(), 0);
    }
}
