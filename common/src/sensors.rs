//! Ambient light and battery sensing.
//!
//! Both sensors are 12-bit ADC channels sampled by the device every two
//! seconds. The light level is smoothed with a short rolling average before
//! it is mapped to a panel brightness.

use log::trace;

/// Sampling period of both channels.
pub const SENSOR_SAMPLE_MS: u64 = 2_000;

/// Rolling average window of the light sensor.
pub const LDR_SAMPLES: usize = 10;

/// Brightness range produced by auto-brightness.
pub const AUTO_BRIGHTNESS_MIN: u8 = 5;
pub const AUTO_BRIGHTNESS_MAX: u8 = 200;

const ADC_MAX: f32 = 4095.0;
const ADC_REF_VOLTS: f32 = 3.3;
const BATTERY_DIVIDER: f32 = 2.0;
const BATTERY_EMPTY_VOLTS: f32 = 3.0;
const BATTERY_FULL_VOLTS: f32 = 4.2;

/// Raw ADC counts sampled by the host.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SensorSample {
    pub ldr_raw: u16,
    pub battery_raw: u16,
}

/// Light and battery readings.
pub struct Sensors {
    ldr: [u16; LDR_SAMPLES],
    ldr_index: usize,
    ldr_count: usize,
    ldr_average: u16,
    battery_volts: f32,
}

impl Sensors {
    pub const fn new() -> Self {
        Self {
            ldr: [0; LDR_SAMPLES],
            ldr_index: 0,
            ldr_count: 0,
            ldr_average: 2048,
            battery_volts: 0.0,
        }
    }

    /// Add one sample to both channels.
    pub fn sample(
        &mut self,
        sample: SensorSample,
    ) {
        self.ldr[self.ldr_index] = sample.ldr_raw.min(4095);
        self.ldr_index = (self.ldr_index + 1) % LDR_SAMPLES;
        self.ldr_count = (self.ldr_count + 1).min(LDR_SAMPLES);
        let sum: u32 = self.ldr[..self.ldr_count].iter().map(|&v| u32::from(v)).sum();
        self.ldr_average = (sum / self.ldr_count as u32) as u16;

        self.battery_volts = f32::from(sample.battery_raw) / ADC_MAX * ADC_REF_VOLTS * BATTERY_DIVIDER;
        trace!("sensors: ldr avg {} battery {:.2}V", self.ldr_average, self.battery_volts);
    }

    /// Smoothed light level, 0 (dark) to 4095 (bright).
    #[inline]
    pub const fn ldr_average(&self) -> u16 { self.ldr_average }

    /// Panel brightness for the current ambient light.
    pub const fn auto_brightness(&self) -> u8 { map_ldr(self.ldr_average) }

    #[inline]
    pub const fn battery_volts(&self) -> f32 { self.battery_volts }

    /// LiPo charge estimate, `None` when no battery voltage is measured.
    pub fn battery_percent(&self) -> Option<u8> { battery_percent(self.battery_volts) }
}

impl Default for Sensors {
    fn default() -> Self { Self::new() }
}

/// Map a light level linearly onto the auto-brightness range.
pub const fn map_ldr(raw: u16) -> u8 {
    let raw = if raw > 4095 { 4095 } else { raw as u32 };
    let span = (AUTO_BRIGHTNESS_MAX - AUTO_BRIGHTNESS_MIN) as u32;
    (AUTO_BRIGHTNESS_MIN as u32 + raw * span / 4095) as u8
}

/// Linear 3.0V..4.2V estimate, clamped to 0..=100.
pub fn battery_percent(volts: f32) -> Option<u8> {
    if volts <= 0.0 {
        return None;
    }
    let pct = (volts - BATTERY_EMPTY_VOLTS) / (BATTERY_FULL_VOLTS - BATTERY_EMPTY_VOLTS) * 100.0;
    Some(pct.clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_ldr_endpoints() {
        assert_eq!(map_ldr(0), AUTO_BRIGHTNESS_MIN);
        assert_eq!(map_ldr(4095), AUTO_BRIGHTNESS_MAX);
        assert_eq!(map_ldr(9999), AUTO_BRIGHTNESS_MAX);
        assert!(map_ldr(2048) > 90 && map_ldr(2048) < 115);
    }

    #[test]
    fn test_rolling_average() {
        let mut s = Sensors::new();
        s.sample(SensorSample {
            ldr_raw: 1000,
            battery_raw: 0,
        });
        assert_eq!(s.ldr_average(), 1000);
        s.sample(SensorSample {
            ldr_raw: 3000,
            battery_raw: 0,
        });
        assert_eq!(s.ldr_average(), 2000);
        for _ in 0..LDR_SAMPLES {
            s.sample(SensorSample {
                ldr_raw: 100,
                battery_raw: 0,
            });
        }
        assert_eq!(s.ldr_average(), 100);
    }

    #[test]
    fn test_battery() {
        assert_eq!(battery_percent(0.0), None);
        assert_eq!(battery_percent(2.5), Some(0));
        assert!(matches!(battery_percent(3.6), Some(49..=50)));
        assert_eq!(battery_percent(4.5), Some(100));

        let mut s = Sensors::new();
        s.sample(SensorSample {
            ldr_raw: 0,
            battery_raw: 2482,
        });
        assert!((s.battery_volts() - 4.0).abs() < 0.01);
    }
}
