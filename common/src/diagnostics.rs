//! Serializable device snapshot for the status page.

use alloc::string::String as AllocString;
use alloc::vec::Vec as AllocVec;

use serde::Serialize;

use crate::log_buffer::LogEntry;
use crate::reading::Trend;

/// Everything the status endpoint reports, borrowed from the live device.
#[derive(Debug, Serialize)]
pub struct Diagnostics<'a> {
    pub state: &'static str,
    pub user_mode: &'static str,
    pub forced_state: Option<&'static str>,
    pub failure_count: u32,
    /// HTTP status of the last glucose exchange, -1 for transport errors.
    pub last_response_code: i32,
    pub last_response_body: &'a str,
    pub ever_received: bool,
    pub data_age_ms: Option<u64>,
    pub glucose: i32,
    pub trend: Trend,
    pub delta: i32,
    pub weather_temp: Option<f32>,
    pub weather_description: &'a str,
    pub wifi: &'static str,
    pub brightness: u8,
    pub ldr_average: u16,
    pub battery_volts: f32,
    pub battery_percent: Option<u8>,
    pub alerts_snoozed: bool,
    pub uptime_ms: u64,
    /// Event log, oldest first.
    pub events: AllocVec<&'a LogEntry>,
}

impl Diagnostics<'_> {
    pub fn to_json(&self) -> AllocString { serde_json::to_string(self).unwrap_or_default() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_buffer::{EventLog, LogLevel};

    #[test]
    fn test_json_shape() {
        let mut log = EventLog::new();
        log.record(LogLevel::Warn, 42, format_args!("glucose: HTTP 500"));
        let diag = Diagnostics {
            state: "STALE",
            user_mode: "GLUCOSE",
            forced_state: None,
            failure_count: 5,
            last_response_code: 500,
            last_response_body: "HTTP 500",
            ever_received: true,
            data_age_ms: Some(1_500_000),
            glucose: 140,
            trend: Trend::Rising,
            delta: 4,
            weather_temp: None,
            weather_description: "",
            wifi: "CONNECTED",
            brightness: 40,
            ldr_average: 0,
            battery_volts: 0.0,
            battery_percent: None,
            alerts_snoozed: false,
            uptime_ms: 2_000_000,
            events: log.iter().collect(),
        };
        let json = diag.to_json();
        assert!(json.contains("\"state\":\"STALE\""));
        assert!(json.contains("\"forced_state\":null"));
        assert!(json.contains("\"trend\":\"Rising\""));
        assert!(json.contains("\"message\":\"glucose: HTTP 500\""));
    }
}
