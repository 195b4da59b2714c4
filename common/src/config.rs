//! Persistent configuration record.
//!
//! [`Config`] is the single source of truth for thresholds, intervals, colors,
//! feature toggles and credentials. It is persisted as a 4-byte magic marker
//! followed by a `postcard` body; anything that fails to decode falls back to
//! factory defaults.
//!
//! Writes arrive as a [`ConfigPatch`] (every field optional, JSON-friendly
//! types). Numeric fields are clamped while the patch is applied and never on
//! read. Secrets are masked when the record is handed out for display, and a
//! masked or empty secret in a patch leaves the stored value untouched.

use alloc::string::String as AllocString;

use heapless::String;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::colors::parse_hex;
use crate::text::{assign, bounded};
use crate::theme::{GlucoseThresholds, ThemeColors};
use crate::thresholds::{AUTO_CYCLE_MAX_SEC, AUTO_CYCLE_MIN_SEC, MIN_POLL_INTERVAL_SEC, MIN_WEATHER_POLL_MIN};

// =============================================================================
// Persistence Layout
// =============================================================================

/// Marker written in front of every persisted record ("GLUC").
pub const CONFIG_MAGIC: u32 = 0x474C_5543;

/// Upper bound of an encoded record, magic included.
pub const CONFIG_BLOB_SIZE: usize = 2048;

/// Placeholder shown instead of a stored secret.
pub const SECRET_MASK: &str = "****";

/// Configuration persistence and validation failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no stored configuration")]
    Missing,
    #[error("stored configuration has bad magic {0:#010x}")]
    BadMagic(u32),
    #[error("configuration does not fit the storage buffer")]
    Encode,
    #[error("stored configuration is corrupt")]
    Decode,
    #[error("configuration storage failed")]
    Storage,
    #[error("configuration update is malformed")]
    Patch,
}

/// Non-volatile storage collaborator holding the encoded record.
pub trait ConfigStore {
    /// Read the stored blob into `buf`, returning its length. `Ok(0)` means nothing is stored.
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> Result<usize, ConfigError>;

    /// Replace the stored blob.
    fn write(
        &mut self,
        bytes: &[u8],
    ) -> Result<(), ConfigError>;
}

// =============================================================================
// Enumerated Settings
// =============================================================================

/// Where glucose readings come from.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum DataSource {
    /// Any HTTPS endpoint returning the generic JSON reading.
    #[default]
    Generic,
    /// The vendor Share service (username/password login).
    Share,
}

impl DataSource {
    /// Map the wire index (0 generic, 1 Share). Anything else is generic.
    pub const fn from_index(index: i64) -> Self {
        match index {
            1 => Self::Share,
            _ => Self::Generic,
        }
    }
}

/// Date layout on the time screen.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum DateFormat {
    /// `M/D`
    #[default]
    MonthDay,
    /// `MMMD`, e.g. `JAN5`
    MonthNameDay,
    /// `D/M`
    DayMonth,
}

impl DateFormat {
    /// Map the wire index, clamping to the known formats.
    pub const fn from_index(index: i64) -> Self {
        match index {
            i64::MIN..=0 => Self::MonthDay,
            1 => Self::MonthNameDay,
            _ => Self::DayMonth,
        }
    }
}

/// Rendering style of the system monitor screen.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum SysmonStyle {
    /// Label followed by the value.
    #[default]
    Text,
    /// Label over a proportional bar.
    Bar,
}

impl SysmonStyle {
    pub const fn from_index(index: i64) -> Self {
        if index >= 1 { Self::Bar } else { Self::Text }
    }
}

// =============================================================================
// Config Record
// =============================================================================

/// Every user setting. Field capacities match the persisted layout.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Config {
    // WiFi
    pub wifi_ssid: String<63>,
    pub wifi_password: String<63>,

    // Data source
    pub data_source: DataSource,
    pub server_url: String<255>,
    pub auth_token: String<255>,
    pub dexcom_username: String<63>,
    pub dexcom_password: String<63>,
    /// US Share servers when true, international otherwise.
    pub dexcom_us: bool,
    pub poll_interval_sec: u32,

    // Display
    pub brightness: u8,
    pub auto_brightness: bool,
    pub show_delta: bool,
    pub use_mmol: bool,
    pub thresholds: GlucoseThresholds,
    pub theme: ThemeColors,
    pub clock_color: u32,
    pub weather_color: u32,

    // Time
    /// POSIX TZ string handed to the time collaborator.
    pub timezone: String<63>,
    pub use_24h: bool,
    /// Mode selected at boot: 0 glucose, 1 time, 2 weather.
    pub default_mode: u8,
    pub date_on_time_screen: bool,
    pub date_format: DateFormat,

    // Alerts
    pub alert_enabled: bool,
    pub alert_low: i32,
    pub alert_high: i32,
    pub alert_snooze_min: u32,

    // Night mode
    pub night_mode_enabled: bool,
    pub night_start_hour: u8,
    pub night_end_hour: u8,
    pub night_brightness: u8,

    // Freshness
    pub stale_timeout_min: u32,

    // Weather
    pub weather_enabled: bool,
    pub weather_api_key: String<47>,
    pub weather_city: String<63>,
    pub weather_use_f: bool,
    pub weather_poll_min: u32,

    // Pomodoro timer
    pub timer_enabled: bool,
    pub timer_work_min: u32,
    pub timer_break_min: u32,
    pub timer_long_break_min: u32,
    pub timer_sessions: u32,
    pub timer_buzzer: bool,

    // Stopwatch
    pub stopwatch_enabled: bool,

    // Notifications
    pub notify_enabled: bool,
    pub notify_default_duration: u32,
    pub notify_allow_buzzer: bool,

    // System monitor
    pub sysmon_enabled: bool,
    pub sysmon_label: String<7>,
    pub sysmon_display_mode: SysmonStyle,
    pub sysmon_warn_pct: u8,
    pub sysmon_crit_pct: u8,

    // Auto-cycle
    pub auto_cycle_enabled: bool,
    pub auto_cycle_sec: u32,

    // Countdown
    pub countdown_enabled: bool,
    pub countdown_name: String<15>,
    /// Unix seconds.
    pub countdown_target: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wifi_ssid: String::new(),
            wifi_password: String::new(),
            data_source: DataSource::Generic,
            server_url: String::new(),
            auth_token: String::new(),
            dexcom_username: String::new(),
            dexcom_password: String::new(),
            dexcom_us: true,
            poll_interval_sec: 60,
            brightness: 40,
            auto_brightness: true,
            show_delta: false,
            use_mmol: false,
            thresholds: GlucoseThresholds::new(),
            theme: ThemeColors::new(),
            clock_color: 0x00FFFF,
            weather_color: 0x00FFFF,
            timezone: bounded("EST5EDT,M3.2.0,M11.1.0"),
            use_24h: false,
            default_mode: 0,
            date_on_time_screen: true,
            date_format: DateFormat::MonthDay,
            alert_enabled: false,
            alert_low: 70,
            alert_high: 250,
            alert_snooze_min: 15,
            night_mode_enabled: false,
            night_start_hour: 22,
            night_end_hour: 7,
            night_brightness: 10,
            stale_timeout_min: 20,
            weather_enabled: false,
            weather_api_key: String::new(),
            weather_city: bounded("New York,US"),
            weather_use_f: true,
            weather_poll_min: 15,
            timer_enabled: true,
            timer_work_min: 25,
            timer_break_min: 5,
            timer_long_break_min: 15,
            timer_sessions: 4,
            timer_buzzer: true,
            stopwatch_enabled: true,
            notify_enabled: true,
            notify_default_duration: 60,
            notify_allow_buzzer: true,
            sysmon_enabled: true,
            sysmon_label: bounded("CPU"),
            sysmon_display_mode: SysmonStyle::Text,
            sysmon_warn_pct: 50,
            sysmon_crit_pct: 80,
            auto_cycle_enabled: true,
            auto_cycle_sec: 10,
            countdown_enabled: false,
            countdown_name: String::new(),
            countdown_target: 0,
        }
    }
}

impl Config {
    // -------------------------------------------------------------------------
    // Derived queries
    // -------------------------------------------------------------------------

    /// WiFi credentials are present.
    pub fn has_wifi(&self) -> bool { !self.wifi_ssid.is_empty() }

    /// Share login credentials are present.
    pub fn has_share(&self) -> bool { !self.dexcom_username.is_empty() && !self.dexcom_password.is_empty() }

    /// The selected data source has everything it needs to poll.
    pub fn has_server(&self) -> bool {
        match self.data_source {
            DataSource::Share => self.has_share(),
            DataSource::Generic => !self.server_url.is_empty(),
        }
    }

    /// Glucose poll period, never below the 15s floor.
    pub fn poll_interval_ms(&self) -> u64 { u64::from(self.poll_interval_sec.max(MIN_POLL_INTERVAL_SEC)) * 1000 }

    /// Weather poll period, never below the 5 minute floor.
    pub fn weather_poll_ms(&self) -> u64 { u64::from(self.weather_poll_min.max(MIN_WEATHER_POLL_MIN)) * 60_000 }

    /// Reading age at which the STALE screen takes over.
    pub fn stale_timeout_ms(&self) -> u64 { u64::from(self.stale_timeout_min) * 60_000 }

    /// Auto-cycle period, clamped to its legal range.
    pub fn auto_cycle_ms(&self) -> u64 {
        u64::from(self.auto_cycle_sec.clamp(AUTO_CYCLE_MIN_SEC, AUTO_CYCLE_MAX_SEC)) * 1000
    }

    /// Length of an alert snooze.
    pub fn alert_snooze_ms(&self) -> u64 { u64::from(self.alert_snooze_min) * 60_000 }

    // -------------------------------------------------------------------------
    // Display copy
    // -------------------------------------------------------------------------

    /// Copy of the record with every non-empty secret replaced by [`SECRET_MASK`].
    pub fn masked(&self) -> Self {
        let mut out = self.clone();
        mask(&mut out.wifi_password);
        mask(&mut out.auth_token);
        mask(&mut out.dexcom_password);
        mask(&mut out.weather_api_key);
        out
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    /// Encode magic + record into `buf`, returning the number of bytes used.
    pub fn encode(
        &self,
        buf: &mut [u8],
    ) -> Result<usize, ConfigError> {
        if buf.len() < 4 {
            return Err(ConfigError::Encode);
        }
        let (head, body) = buf.split_at_mut(4);
        head.copy_from_slice(&CONFIG_MAGIC.to_le_bytes());
        let used = postcard::to_slice(self, body).map_err(|_| ConfigError::Encode)?;
        Ok(4 + used.len())
    }

    /// Decode a blob produced by [`Config::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, ConfigError> {
        let (head, body) = bytes.split_first_chunk::<4>().ok_or(ConfigError::Missing)?;
        let magic = u32::from_le_bytes(*head);
        if magic != CONFIG_MAGIC {
            return Err(ConfigError::BadMagic(magic));
        }
        postcard::from_bytes(body).map_err(|_| ConfigError::Decode)
    }

    // -------------------------------------------------------------------------
    // Validated writes
    // -------------------------------------------------------------------------

    /// Apply a patch, clamping every numeric field into its legal range.
    pub fn apply(
        &mut self,
        patch: &ConfigPatch,
    ) -> ConfigChanges {
        let mut changes = ConfigChanges::default();

        // WiFi
        if let Some(ssid) = patch.wifi_ssid.as_deref()
            && ssid != self.wifi_ssid.as_str()
        {
            assign(&mut self.wifi_ssid, ssid);
            changes.wifi = true;
        }
        if let Some(pass) = patch.wifi_password.as_deref() {
            changes.wifi |= set_secret(&mut self.wifi_password, pass);
        }

        // Data source
        if let Some(source) = patch.data_source {
            let source = DataSource::from_index(source);
            changes.share |= source != self.data_source;
            self.data_source = source;
        }
        if let Some(url) = patch.server_url.as_deref() {
            assign(&mut self.server_url, url);
        }
        if let Some(token) = patch.auth_token.as_deref() {
            set_secret(&mut self.auth_token, token);
        }
        if let Some(user) = patch.dexcom_username.as_deref()
            && user != self.dexcom_username.as_str()
        {
            assign(&mut self.dexcom_username, user);
            changes.share = true;
        }
        if let Some(pass) = patch.dexcom_password.as_deref() {
            changes.share |= set_secret(&mut self.dexcom_password, pass);
        }
        if let Some(us) = patch.dexcom_us {
            changes.share |= us != self.dexcom_us;
            self.dexcom_us = us;
        }
        if let Some(secs) = patch.poll_interval {
            self.poll_interval_sec = clamp_u32(secs, i64::from(MIN_POLL_INTERVAL_SEC), 86_400);
        }

        // Display
        if let Some(level) = patch.brightness {
            self.brightness = clamp_u8(level, 1, 255);
        }
        set(&mut self.auto_brightness, patch.auto_brightness);
        set(&mut self.show_delta, patch.show_delta);
        set(&mut self.use_mmol, patch.use_mmol);
        set_threshold(&mut self.thresholds.urgent_low, patch.thresh_urgent_low);
        set_threshold(&mut self.thresholds.low, patch.thresh_low);
        set_threshold(&mut self.thresholds.high, patch.thresh_high);
        set_threshold(&mut self.thresholds.urgent_high, patch.thresh_urgent_high);
        set_color(&mut self.theme.urgent_low, patch.color_urgent_low.as_deref());
        set_color(&mut self.theme.low, patch.color_low.as_deref());
        set_color(&mut self.theme.in_range, patch.color_in_range.as_deref());
        set_color(&mut self.theme.high, patch.color_high.as_deref());
        set_color(&mut self.theme.urgent_high, patch.color_urgent_high.as_deref());
        set_color(&mut self.clock_color, patch.clock_color.as_deref());
        set_color(&mut self.weather_color, patch.weather_color.as_deref());

        // Time
        if let Some(tz) = patch.timezone.as_deref() {
            assign(&mut self.timezone, tz);
        }
        set(&mut self.use_24h, patch.use_24h);
        if let Some(mode) = patch.default_mode {
            let mode = clamp_u8(mode, 0, 2);
            changes.default_mode = mode != self.default_mode;
            self.default_mode = mode;
        }
        set(&mut self.date_on_time_screen, patch.date_on_time_screen);
        if let Some(format) = patch.date_format {
            self.date_format = DateFormat::from_index(format);
        }

        // Alerts
        set(&mut self.alert_enabled, patch.alert_enabled);
        set_threshold(&mut self.alert_low, patch.alert_low);
        set_threshold(&mut self.alert_high, patch.alert_high);
        if let Some(minutes) = patch.alert_snooze_min {
            self.alert_snooze_min = clamp_u32(minutes, 1, 120);
        }

        // Night mode
        set(&mut self.night_mode_enabled, patch.night_mode_enabled);
        if let Some(hour) = patch.night_start_hour {
            self.night_start_hour = clamp_u8(hour, 0, 23);
        }
        if let Some(hour) = patch.night_end_hour {
            self.night_end_hour = clamp_u8(hour, 0, 23);
        }
        if let Some(level) = patch.night_brightness {
            self.night_brightness = clamp_u8(level, 1, 255);
        }

        // Freshness
        if let Some(minutes) = patch.stale_timeout_min {
            self.stale_timeout_min = clamp_u32(minutes, 5, 60);
        }

        // Weather
        set(&mut self.weather_enabled, patch.weather_enabled);
        if let Some(key) = patch.weather_api_key.as_deref() {
            set_secret(&mut self.weather_api_key, key);
        }
        if let Some(city) = patch.weather_city.as_deref() {
            assign(&mut self.weather_city, city);
        }
        set(&mut self.weather_use_f, patch.weather_use_f);
        if let Some(minutes) = patch.weather_poll_min {
            self.weather_poll_min = clamp_u32(minutes, i64::from(MIN_WEATHER_POLL_MIN), 60);
        }

        // Timer
        set(&mut self.timer_enabled, patch.timer_enabled);
        if let Some(minutes) = patch.timer_work_min {
            self.timer_work_min = clamp_u32(minutes, 1, 120);
        }
        if let Some(minutes) = patch.timer_break_min {
            self.timer_break_min = clamp_u32(minutes, 1, 120);
        }
        if let Some(minutes) = patch.timer_long_break_min {
            self.timer_long_break_min = clamp_u32(minutes, 1, 120);
        }
        if let Some(sessions) = patch.timer_sessions {
            self.timer_sessions = clamp_u32(sessions, 1, 12);
        }
        set(&mut self.timer_buzzer, patch.timer_buzzer);

        set(&mut self.stopwatch_enabled, patch.stopwatch_enabled);

        // Notifications
        set(&mut self.notify_enabled, patch.notify_enabled);
        if let Some(secs) = patch.notify_default_duration {
            self.notify_default_duration = clamp_u32(secs, 1, 3600);
        }
        set(&mut self.notify_allow_buzzer, patch.notify_allow_buzzer);

        // System monitor
        set(&mut self.sysmon_enabled, patch.sysmon_enabled);
        if let Some(label) = patch.sysmon_label.as_deref() {
            assign(&mut self.sysmon_label, label);
        }
        if let Some(style) = patch.sysmon_display_mode {
            self.sysmon_display_mode = SysmonStyle::from_index(style);
        }
        if let Some(pct) = patch.sysmon_warn_pct {
            self.sysmon_warn_pct = clamp_u8(pct, 0, 100);
        }
        if let Some(pct) = patch.sysmon_crit_pct {
            self.sysmon_crit_pct = clamp_u8(pct, 0, 100);
        }

        // Auto-cycle
        set(&mut self.auto_cycle_enabled, patch.auto_cycle_enabled);
        if let Some(secs) = patch.auto_cycle_sec {
            self.auto_cycle_sec = clamp_u32(secs, i64::from(AUTO_CYCLE_MIN_SEC), i64::from(AUTO_CYCLE_MAX_SEC));
        }

        // Countdown
        set(&mut self.countdown_enabled, patch.countdown_enabled);
        if let Some(name) = patch.countdown_name.as_deref() {
            assign(&mut self.countdown_name, name);
        }
        if let Some(target) = patch.countdown_target {
            self.countdown_target = target.max(0) as u64;
        }

        changes
    }
}

// =============================================================================
// Patch
// =============================================================================

/// A partial update as submitted by the web layer. Absent fields are left alone.
///
/// Field names follow the HTTP API, so a request body can be deserialized
/// directly with [`ConfigPatch::from_json`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    pub wifi_ssid: Option<AllocString>,
    pub wifi_password: Option<AllocString>,
    pub data_source: Option<i64>,
    pub server_url: Option<AllocString>,
    pub auth_token: Option<AllocString>,
    pub dexcom_username: Option<AllocString>,
    pub dexcom_password: Option<AllocString>,
    pub dexcom_us: Option<bool>,
    pub poll_interval: Option<i64>,
    pub brightness: Option<i64>,
    pub auto_brightness: Option<bool>,
    pub show_delta: Option<bool>,
    pub use_mmol: Option<bool>,
    pub thresh_urgent_low: Option<i64>,
    pub thresh_low: Option<i64>,
    pub thresh_high: Option<i64>,
    pub thresh_urgent_high: Option<i64>,
    pub color_urgent_low: Option<AllocString>,
    pub color_low: Option<AllocString>,
    pub color_in_range: Option<AllocString>,
    pub color_high: Option<AllocString>,
    pub color_urgent_high: Option<AllocString>,
    pub clock_color: Option<AllocString>,
    pub weather_color: Option<AllocString>,
    pub timezone: Option<AllocString>,
    pub use_24h: Option<bool>,
    pub default_mode: Option<i64>,
    pub date_on_time_screen: Option<bool>,
    pub date_format: Option<i64>,
    pub alert_enabled: Option<bool>,
    pub alert_low: Option<i64>,
    pub alert_high: Option<i64>,
    pub alert_snooze_min: Option<i64>,
    pub night_mode_enabled: Option<bool>,
    pub night_start_hour: Option<i64>,
    pub night_end_hour: Option<i64>,
    pub night_brightness: Option<i64>,
    pub stale_timeout_min: Option<i64>,
    pub weather_enabled: Option<bool>,
    pub weather_api_key: Option<AllocString>,
    pub weather_city: Option<AllocString>,
    pub weather_use_f: Option<bool>,
    pub weather_poll_min: Option<i64>,
    pub timer_enabled: Option<bool>,
    pub timer_work_min: Option<i64>,
    pub timer_break_min: Option<i64>,
    pub timer_long_break_min: Option<i64>,
    pub timer_sessions: Option<i64>,
    pub timer_buzzer: Option<bool>,
    pub stopwatch_enabled: Option<bool>,
    pub notify_enabled: Option<bool>,
    pub notify_default_duration: Option<i64>,
    pub notify_allow_buzzer: Option<bool>,
    pub sysmon_enabled: Option<bool>,
    pub sysmon_label: Option<AllocString>,
    pub sysmon_display_mode: Option<i64>,
    pub sysmon_warn_pct: Option<i64>,
    pub sysmon_crit_pct: Option<i64>,
    pub auto_cycle_enabled: Option<bool>,
    pub auto_cycle_sec: Option<i64>,
    pub countdown_enabled: Option<bool>,
    pub countdown_name: Option<AllocString>,
    pub countdown_target: Option<i64>,
}

impl ConfigPatch {
    /// Parse an HTTP request body. A body with wrongly typed fields is rejected as a whole.
    pub fn from_json(body: &str) -> Result<Self, ConfigError> { serde_json::from_str(body).map_err(|_| ConfigError::Patch) }
}

/// What a patch touched that other components must react to.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ConfigChanges {
    /// SSID or password changed; the connectivity manager must rejoin.
    pub wifi: bool,
    /// Boot mode changed; the engine adopts it as the current user mode.
    pub default_mode: bool,
    /// Dexcom account, region or data source changed; any Share session is void.
    pub share: bool,
}

// =============================================================================
// Manager
// =============================================================================

/// Whether the live record came from storage or from factory defaults.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConfigOrigin {
    Defaults,
    Loaded,
}

/// Owns the live record and moves it in and out of storage.
pub struct ConfigManager {
    config: Config,
    origin: ConfigOrigin,
}

impl ConfigManager {
    /// Manager holding factory defaults, not yet persisted.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            origin: ConfigOrigin::Defaults,
        }
    }

    /// Load the stored record. Missing or corrupt storage falls back to defaults,
    /// which are written back immediately.
    pub fn load<S: ConfigStore>(store: &mut S) -> Self {
        let mut buf = [0u8; CONFIG_BLOB_SIZE];
        let stored = store.read(&mut buf).and_then(|len| Config::decode(&buf[..len.min(buf.len())]));
        match stored {
            Ok(config) => {
                info!("config: loaded from storage");
                Self {
                    config,
                    origin: ConfigOrigin::Loaded,
                }
            }
            Err(err) => {
                warn!("config: {err}, using defaults");
                let manager = Self::new();
                if let Err(err) = manager.save(store) {
                    warn!("config: could not persist defaults: {err}");
                }
                manager
            }
        }
    }

    /// Current record.
    #[inline]
    pub const fn get(&self) -> &Config { &self.config }

    #[inline]
    pub const fn origin(&self) -> ConfigOrigin { self.origin }

    /// Persist the current record.
    pub fn save<S: ConfigStore>(
        &self,
        store: &mut S,
    ) -> Result<(), ConfigError> {
        let mut buf = [0u8; CONFIG_BLOB_SIZE];
        let len = self.config.encode(&mut buf)?;
        store.write(&buf[..len])
    }

    /// Apply a validated patch to the live record. Call [`ConfigManager::save`] afterwards.
    pub fn update(
        &mut self,
        patch: &ConfigPatch,
    ) -> ConfigChanges {
        let changes = self.config.apply(patch);
        info!("config: updated (wifi changed: {})", changes.wifi);
        changes
    }

    /// Manual brightness from the button cycle. Turns auto-brightness off.
    pub fn set_manual_brightness(
        &mut self,
        level: u8,
    ) {
        self.config.brightness = level.max(1);
        self.config.auto_brightness = false;
    }

    /// Restore factory defaults in memory.
    pub fn reset(&mut self) {
        self.config = Config::default();
        self.origin = ConfigOrigin::Defaults;
        warn!("config: factory reset");
    }
}

impl Default for ConfigManager {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Helpers
// =============================================================================

fn mask<const N: usize>(secret: &mut String<N>) {
    if !secret.is_empty() {
        assign(secret, SECRET_MASK);
    }
}

/// Store a secret unless the submitted value is empty or the mask placeholder.
fn set_secret<const N: usize>(
    dst: &mut String<N>,
    src: &str,
) -> bool {
    if src.is_empty() || src == SECRET_MASK || src == dst.as_str() {
        return false;
    }
    assign(dst, src);
    true
}

fn set<T: Copy>(
    dst: &mut T,
    src: Option<T>,
) {
    if let Some(value) = src {
        *dst = value;
    }
}

fn set_threshold(
    dst: &mut i32,
    src: Option<i64>,
) {
    if let Some(value) = src {
        *dst = value.clamp(20, 600) as i32;
    }
}

fn set_color(
    dst: &mut u32,
    src: Option<&str>,
) {
    if let Some(packed) = src.and_then(parse_hex) {
        *dst = packed;
    }
}

fn clamp_u8(
    value: i64,
    lo: i64,
    hi: i64,
) -> u8 {
    value.clamp(lo, hi) as u8
}

fn clamp_u32(
    value: i64,
    lo: i64,
    hi: i64,
) -> u32 {
    value.clamp(lo, hi) as u32
}

// =============================================================================
// Unit Tests
// =============================================================================
