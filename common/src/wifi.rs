//! Connectivity manager.
//!
//! Drives the radio through join, timeout and retry without ever waiting on
//! it: every call to [`WifiManager::tick`] looks at the radio once and
//! decides whether a new attempt is due.

use log::{info, warn};

use crate::config::Config;
use crate::thresholds::{WIFI_CONNECT_TIMEOUT_MS, WIFI_RETRY_INTERVAL_MS};

/// Name of the configuration access point.
pub const SETUP_AP_NAME: &str = "SugarClock-Setup";

/// Radio collaborator.
pub trait WifiRadio {
    /// Start joining a network. Returns immediately.
    fn begin(
        &mut self,
        ssid: &str,
        password: &str,
    );

    fn is_connected(&self) -> bool;

    /// Bring up an open access point for setup.
    fn start_access_point(
        &mut self,
        name: &str,
    );

    fn disconnect(&mut self);
}

/// Connection lifecycle.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum WifiStatus {
    #[default]
    Idle,
    /// No credentials; serving the setup access point.
    AccessPoint,
    Connecting,
    Connected,
    /// Last attempt timed out; waiting for the retry slot.
    TimedOut,
    /// Was connected, link dropped.
    Reconnecting,
}

impl WifiStatus {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::AccessPoint => "AP MODE",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::TimedOut => "TIMEOUT",
            Self::Reconnecting => "RECONNECTING",
        }
    }
}

pub struct WifiManager {
    status: WifiStatus,
    connecting: bool,
    last_attempt_ms: u64,
}

impl WifiManager {
    pub const fn new() -> Self {
        Self {
            status: WifiStatus::Idle,
            connecting: false,
            last_attempt_ms: 0,
        }
    }

    /// Initial bring-up: join the configured network or fall back to the setup AP.
    pub fn start<R: WifiRadio>(
        &mut self,
        now_ms: u64,
        cfg: &Config,
        radio: &mut R,
    ) {
        if !cfg.has_wifi() {
            info!("wifi: no credentials, starting access point {SETUP_AP_NAME}");
            radio.start_access_point(SETUP_AP_NAME);
            self.status = WifiStatus::AccessPoint;
            self.connecting = false;
            return;
        }
        info!("wifi: connecting to '{}'", cfg.wifi_ssid);
        radio.begin(&cfg.wifi_ssid, &cfg.wifi_password);
        self.connecting = true;
        self.last_attempt_ms = now_ms;
        self.status = WifiStatus::Connecting;
    }

    /// Restart the sequence after the credentials changed.
    pub fn reconnect<R: WifiRadio>(
        &mut self,
        now_ms: u64,
        cfg: &Config,
        radio: &mut R,
    ) {
        info!("wifi: credentials changed, reconnecting");
        radio.disconnect();
        self.start(now_ms, cfg, radio);
    }

    /// One non-blocking step.
    pub fn tick<R: WifiRadio>(
        &mut self,
        now_ms: u64,
        cfg: &Config,
        radio: &mut R,
    ) {
        if self.status == WifiStatus::AccessPoint || !cfg.has_wifi() {
            return;
        }

        if radio.is_connected() {
            if self.status != WifiStatus::Connected {
                info!("wifi: connected");
                self.status = WifiStatus::Connected;
                self.connecting = false;
            }
            return;
        }

        if self.status == WifiStatus::Connected {
            warn!("wifi: connection lost");
            self.status = WifiStatus::Reconnecting;
        }

        let since_attempt = now_ms.saturating_sub(self.last_attempt_ms);
        if self.connecting && since_attempt > WIFI_CONNECT_TIMEOUT_MS {
            warn!("wifi: connection timeout");
            self.connecting = false;
            self.status = WifiStatus::TimedOut;
        }

        if !self.connecting && since_attempt > WIFI_RETRY_INTERVAL_MS {
            info!("wifi: retrying '{}'", cfg.wifi_ssid);
            radio.disconnect();
            radio.begin(&cfg.wifi_ssid, &cfg.wifi_password);
            self.connecting = true;
            self.last_attempt_ms = now_ms;
            self.status = WifiStatus::Connecting;
        }
    }

    #[inline]
    pub const fn status(&self) -> WifiStatus { self.status }

    #[inline]
    pub const fn is_connected(&self) -> bool { matches!(self.status, WifiStatus::Connected) }
}

impl Default for WifiManager {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::assign;

    #[derive(Default)]
    struct FakeRadio {
        connected: bool,
        begins: usize,
        disconnects: usize,
        ap: Option<std::string::String>,
    }

    impl WifiRadio for FakeRadio {
        fn begin(
            &mut self,
            _ssid: &str,
            _password: &str,
        ) {
            self.begins += 1;
        }

        fn is_connected(&self) -> bool { self.connected }

        fn start_access_point(
            &mut self,
            name: &str,
        ) {
            self.ap = Some(name.into());
        }

        fn disconnect(&mut self) { self.disconnects += 1; }
    }

    fn configured() -> Config {
        let mut cfg = Config::default();
        assign(&mut cfg.wifi_ssid, "home");
        cfg
    }

    #[test]
    fn test_no_credentials_starts_access_point() {
        let mut radio = FakeRadio::default();
        let mut wifi = WifiManager::new();
        wifi.start(0, &Config::default(), &mut radio);
        assert_eq!(wifi.status(), WifiStatus::AccessPoint);
        assert_eq!(radio.ap.as_deref(), Some(SETUP_AP_NAME));
        assert_eq!(radio.begins, 0);
    }

    #[test]
    fn test_connects() {
        let cfg = configured();
        let mut radio = FakeRadio::default();
        let mut wifi = WifiManager::new();
        wifi.start(0, &cfg, &mut radio);
        assert_eq!(wifi.status(), WifiStatus::Connecting);
        radio.connected = true;
        wifi.tick(100, &cfg, &mut radio);
        assert!(wifi.is_connected());
    }

    #[test]
    fn test_timeout_then_retry() {
        let cfg = configured();
        let mut radio = FakeRadio::default();
        let mut wifi = WifiManager::new();
        wifi.start(0, &cfg, &mut radio);
        wifi.tick(15_000, &cfg, &mut radio);
        assert_eq!(wifi.status(), WifiStatus::Connecting);
        wifi.tick(15_001, &cfg, &mut radio);
        assert_eq!(wifi.status(), WifiStatus::TimedOut);
        wifi.tick(30_000, &cfg, &mut radio);
        assert_eq!(radio.begins, 1);
        wifi.tick(30_001, &cfg, &mut radio);
        assert_eq!(wifi.status(), WifiStatus::Connecting);
        assert_eq!(radio.begins, 2);
        assert_eq!(radio.disconnects, 1);
    }

    #[test]
    fn test_lost_connection_reconnects() {
        let cfg = configured();
        let mut radio = FakeRadio {
            connected: true,
            ..FakeRadio::default()
        };
        let mut wifi = WifiManager::new();
        wifi.start(0, &cfg, &mut radio);
        wifi.tick(10, &cfg, &mut radio);
        radio.connected = false;
        wifi.tick(60_000, &cfg, &mut radio);
        // Not connecting any more, retry slot has long passed.
        assert_eq!(wifi.status(), WifiStatus::Connecting);
        assert_eq!(radio.begins, 2);
    }

    #[test]
    fn test_reconnect_after_config_change() {
        let cfg = configured();
        let mut radio = FakeRadio::default();
        let mut wifi = WifiManager::new();
        wifi.start(0, &Config::default(), &mut radio);
        assert_eq!(wifi.status(), WifiStatus::AccessPoint);
        wifi.reconnect(5, &cfg, &mut radio);
        assert_eq!(wifi.status(), WifiStatus::Connecting);
        assert_eq!(radio.begins, 1);
    }
}
