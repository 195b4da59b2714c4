//! Weather client (current conditions endpoint).

use alloc::string::String as AllocString;
use core::fmt::Write;

use log::{info, warn};
use serde_json::Value;

use super::{FetchError, FetchLog, Transport, exchange};
use crate::config::Config;
use crate::reading::{WeatherCondition, WeatherReading};
use crate::text::bounded;

const WEATHER_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Percent-encode a query value (RFC 3986 unreserved characters pass through).
fn encode_query(value: &str) -> AllocString {
    let mut out = AllocString::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~' | b',') {
            out.push(char::from(byte));
        } else {
            write!(out, "%{byte:02X}").ok();
        }
    }
    out
}

/// Request URL for the configured city, key and unit system.
pub fn weather_url(cfg: &Config) -> AllocString {
    let units = if cfg.weather_use_f { "imperial" } else { "metric" };
    alloc::format!(
        "{WEATHER_ENDPOINT}?q={}&appid={}&units={units}",
        encode_query(&cfg.weather_city),
        encode_query(&cfg.weather_api_key)
    )
}

fn parse_weather(
    body: &str,
    now_ms: u64,
) -> Result<WeatherReading, FetchError> {
    let doc: Value = serde_json::from_str(body).map_err(|_| FetchError::Json)?;
    let main = doc.get("main");
    let temp = main.and_then(|m| m.get("temp")).and_then(Value::as_f64).unwrap_or(0.0);
    let humidity = main.and_then(|m| m.get("humidity")).and_then(Value::as_i64).unwrap_or(0);
    let first = doc.get("weather").and_then(|w| w.get(0));
    let description = first.and_then(|w| w.get("main")).and_then(Value::as_str).unwrap_or("Unknown");
    let condition_id = first.and_then(|w| w.get("id")).and_then(Value::as_i64).unwrap_or(0) as i32;

    let condition = if condition_id > 0 {
        WeatherCondition::from_id(condition_id)
    } else {
        WeatherCondition::from_description(description)
    };
    Ok(WeatherReading {
        temp: temp as f32,
        description: bounded(description),
        humidity: humidity.clamp(0, 100) as i32,
        condition_id,
        condition,
        received_at_ms: now_ms,
        valid: true,
    })
}

/// Owns the weather slot and its diagnostics.
pub struct WeatherClient {
    reading: WeatherReading,
    ever_received: bool,
    log: FetchLog,
}

impl WeatherClient {
    pub fn new() -> Self {
        Self {
            reading: WeatherReading::default(),
            ever_received: false,
            log: FetchLog::new(),
        }
    }

    /// Fetch current conditions. A failure leaves the previous reading in place.
    pub fn fetch<T: Transport>(
        &mut self,
        now_ms: u64,
        cfg: &Config,
        transport: &mut T,
    ) -> Result<(), FetchError> {
        info!("weather: fetching {}", cfg.weather_city);
        let result = exchange(&mut self.log, transport.get(&weather_url(cfg), None))
            .and_then(|response| parse_weather(&response.body, now_ms));
        match result {
            Ok(reading) => {
                info!(
                    "weather: {:.1}{} {} {}%",
                    reading.temp,
                    if cfg.weather_use_f { 'F' } else { 'C' },
                    reading.description,
                    reading.humidity
                );
                self.reading = reading;
                self.ever_received = true;
                Ok(())
            }
            Err(err) => {
                warn!("weather: {err}");
                Err(err)
            }
        }
    }

    /// Inject a reading without touching the network (animation testing).
    pub fn set_mock(
        &mut self,
        temp: f32,
        description: &str,
        condition_id: i32,
        now_ms: u64,
    ) {
        self.reading = WeatherReading {
            temp,
            description: bounded(description),
            humidity: 50,
            condition_id,
            condition: WeatherCondition::from_id(condition_id),
            received_at_ms: now_ms,
            valid: true,
        };
        self.ever_received = true;
        info!("weather: mock {description} ({condition_id})");
    }

    #[inline]
    pub const fn reading(&self) -> &WeatherReading { &self.reading }

    /// A valid reading has been received at least once.
    #[inline]
    pub const fn has_data(&self) -> bool { self.ever_received && self.reading.valid }

    #[inline]
    pub const fn last_response_code(&self) -> i32 { self.log.code() }

    #[inline]
    pub fn last_response_body(&self) -> &str { self.log.body() }
}

impl Default for WeatherClient {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fake::{Call, ScriptedTransport};
    use crate::text::assign;

    const SAMPLE: &str = r#"{"weather":[{"id":502,"main":"Rain","description":"heavy rain"}],"main":{"temp":54.3,"humidity":91}}"#;

    fn config() -> Config {
        let mut cfg = Config::default();
        cfg.weather_enabled = true;
        assign(&mut cfg.weather_api_key, "key123");
        cfg
    }

    #[test]
    fn test_url_encodes_city_and_units() {
        let mut cfg = config();
        assert_eq!(
            weather_url(&cfg),
            "https://api.openweathermap.org/data/2.5/weather?q=New%20York,US&appid=key123&units=imperial"
        );
        cfg.weather_use_f = false;
        assert!(weather_url(&cfg).ends_with("&units=metric"));
    }

    #[test]
    fn test_fetch_parses_reading() {
        let cfg = config();
        let mut client = WeatherClient::new();
        let mut t = ScriptedTransport::default().reply(200, SAMPLE);
        client.fetch(5, &cfg, &mut t).unwrap();
        let r = client.reading();
        assert!((r.temp - 54.3).abs() < 0.01);
        assert_eq!(r.humidity, 91);
        assert_eq!(r.description.as_str(), "Rain");
        assert_eq!(r.condition, WeatherCondition::Rain);
        assert_eq!(r.received_at_ms, 5);
        assert!(client.has_data());
        assert!(matches!(&t.calls[0], Call::Get { bearer: None, .. }));
    }

    #[test]
    fn test_failure_keeps_previous_reading() {
        let cfg = config();
        let mut client = WeatherClient::new();
        let mut t = ScriptedTransport::default().reply(200, SAMPLE).reply(401, "{}");
        client.fetch(0, &cfg, &mut t).unwrap();
        assert_eq!(client.fetch(1, &cfg, &mut t), Err(FetchError::Status(401)));
        assert_eq!(client.reading().humidity, 91);
        assert_eq!(client.last_response_code(), 401);
    }

    #[test]
    fn test_no_data_until_first_success() {
        let client = WeatherClient::new();
        assert!(!client.has_data());
    }

    #[test]
    fn test_mock_reading() {
        let mut client = WeatherClient::new();
        client.set_mock(30.0, "Snow", 601, 0);
        assert!(client.has_data());
        assert_eq!(client.reading().condition, WeatherCondition::Snow);
    }
}
