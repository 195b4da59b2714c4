//! Desktop stand-ins for the device's hardware collaborators.

use std::time::Instant;

use jiff::Zoned;
use log::{debug, info};
use sugarclock_common::buzzer::ToneOutput;
use sugarclock_common::clock::{TimeSource, WallClock};
use sugarclock_common::config::{ConfigError, ConfigStore};
use sugarclock_common::wifi::WifiRadio;

/// Time a join takes before the fake radio reports a link.
const JOIN_DELAY_MS: u128 = 1_200;

// =============================================================================
// Radio
// =============================================================================

/// Radio that joins any network after a short delay unless switched off.
pub struct SimRadio {
    /// Toggled from the keyboard to simulate an outage.
    pub enabled: bool,
    joining_since: Option<Instant>,
}

impl SimRadio {
    pub const fn new() -> Self {
        Self {
            enabled: true,
            joining_since: None,
        }
    }
}

impl WifiRadio for SimRadio {
    fn begin(
        &mut self,
        ssid: &str,
        _password: &str,
    ) {
        info!("radio: joining '{ssid}'");
        self.joining_since = Some(Instant::now());
    }

    fn is_connected(&self) -> bool {
        self.enabled && self.joining_since.is_some_and(|at| at.elapsed().as_millis() >= JOIN_DELAY_MS)
    }

    fn start_access_point(
        &mut self,
        name: &str,
    ) {
        info!("radio: access point '{name}' up");
    }

    fn disconnect(&mut self) { self.joining_since = None; }
}

// =============================================================================
// Buzzer
// =============================================================================

/// Prints tones instead of playing them.
pub struct ConsoleTone {
    sounding: bool,
}

impl ConsoleTone {
    pub const fn new() -> Self { Self { sounding: false } }
}

impl ToneOutput for ConsoleTone {
    fn tone(
        &mut self,
        freq_hz: u32,
    ) {
        info!("buzzer: BEEP {freq_hz} Hz");
        self.sounding = true;
    }

    fn silence(&mut self) {
        if self.sounding {
            debug!("buzzer: off");
        }
        self.sounding = false;
    }
}

// =============================================================================
// Storage
// =============================================================================

/// Non-volatile storage that lasts as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    blob: Option<Vec<u8>>,
}

impl ConfigStore for MemoryStore {
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> Result<usize, ConfigError> {
        let blob = self.blob.as_ref().ok_or(ConfigError::Missing)?;
        let len = blob.len().min(buf.len());
        buf[..len].copy_from_slice(&blob[..len]);
        Ok(len)
    }

    fn write(
        &mut self,
        bytes: &[u8],
    ) -> Result<(), ConfigError> {
        debug!("store: wrote {} bytes", bytes.len());
        self.blob = Some(bytes.to_vec());
        Ok(())
    }
}

// =============================================================================
// Clock
// =============================================================================

/// Host wall clock in the system time zone.
pub struct LocalClock;

impl TimeSource for LocalClock {
    fn now(&mut self) -> Option<WallClock> {
        let now = Zoned::now();
        Some(WallClock {
            hour: now.hour() as u8,
            minute: now.minute() as u8,
            second: now.second() as u8,
            day: now.day() as u8,
            month: now.month() as u8,
            year: now.year() as u16,
            unix: now.timestamp().as_second(),
        })
    }
}
