//! Out-of-range glucose alerting with snooze.

use log::info;

use crate::buzzer::{ALERT_BEEP, Beep};
use crate::config::Config;
use crate::reading::GlucoseReading;
use crate::thresholds::ALERT_INTERVAL_MS;

pub struct AlertMonitor {
    snoozed_until_ms: u64,
    last_beep_ms: Option<u64>,
}

impl AlertMonitor {
    pub const fn new() -> Self {
        Self {
            snoozed_until_ms: 0,
            last_beep_ms: None,
        }
    }

    /// Returns a burst to play when the reading is outside the alert band,
    /// alerts are on, nothing is snoozed and the repeat interval has passed.
    pub fn check(
        &mut self,
        now_ms: u64,
        cfg: &Config,
        reading: &GlucoseReading,
    ) -> Option<Beep> {
        if !cfg.alert_enabled || !reading.valid || self.is_snoozed(now_ms) {
            return None;
        }
        if reading.value >= cfg.alert_low && reading.value <= cfg.alert_high {
            return None;
        }
        if self.last_beep_ms.is_some_and(|at| now_ms.saturating_sub(at) < ALERT_INTERVAL_MS) {
            return None;
        }
        self.last_beep_ms = Some(now_ms);
        Some(ALERT_BEEP)
    }

    /// Silence alerts for the configured snooze length.
    pub fn snooze(
        &mut self,
        now_ms: u64,
        cfg: &Config,
    ) {
        self.snoozed_until_ms = now_ms + cfg.alert_snooze_ms();
        info!("alerts: snoozed for {} min", cfg.alert_snooze_min);
    }

    #[inline]
    pub const fn is_snoozed(
        &self,
        now_ms: u64,
    ) -> bool {
        now_ms < self.snoozed_until_ms
    }

    #[inline]
    pub const fn snoozed_until_ms(&self) -> u64 { self.snoozed_until_ms }
}

impl Default for AlertMonitor {
    fn default() -> Self { Self::new() }
}
