//! Scripted glucose and weather servers behind the `Transport` trait.
//!
//! Glucose follows a slow sine wave so every color band and trend arrow
//! shows up within a few minutes. The outage mode can be cycled from the
//! keyboard to exercise the STALE and NO DATA paths.

use std::f32::consts::TAU;
use std::thread;
use std::time::Instant;

use log::info;
use sugarclock_common::source::{HttpResponse, Transport, TransportError};

use crate::timing::REQUEST_LATENCY;

/// One full glucose swing.
const WAVE_PERIOD_SECS: f32 = 240.0;

/// Canned Share credentials.
const SHARE_ACCOUNT: &str = "\"5f1a2b3c-0000-4000-8000-000000000001\"";
const SHARE_SESSION: &str = "\"9e8d7c6b-0000-4000-8000-000000000002\"";

/// How the fake server misbehaves.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outage {
    None,
    /// Every request answers HTTP 500.
    ServerError,
    /// Every request times out.
    Timeout,
    /// HTTP 200 with a zero reading.
    InvalidReading,
}

impl Outage {
    pub const fn next(self) -> Self {
        match self {
            Self::None => Self::ServerError,
            Self::ServerError => Self::Timeout,
            Self::Timeout => Self::InvalidReading,
            Self::InvalidReading => Self::None,
        }
    }
}

/// Weather conditions the feed cycles through: (id, main, temperature).
pub const WEATHER_PRESETS: [(i32, &str, f32); 5] = [
    (800, "Clear", 72.4),
    (501, "Rain", 58.1),
    (301, "Drizzle", 61.0),
    (211, "Thunderstorm", 66.7),
    (601, "Snow", 28.3),
];

pub struct DemoFeed {
    started: Instant,
    pub outage: Outage,
    pub weather_preset: usize,
    /// Sent once with the next reading, then cleared.
    pub pending_message: Option<String>,
}

impl DemoFeed {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            outage: Outage::None,
            weather_preset: 0,
            pending_message: None,
        }
    }

    fn phase(&self) -> f32 { (self.started.elapsed().as_secs_f32() / WAVE_PERIOD_SECS) * TAU }

    /// Current value and Dexcom-style trend label.
    fn glucose(&self) -> (i32, &'static str) {
        let phase = self.phase();
        let value = 150.0 + 110.0 * phase.sin();
        // Derivative of the wave picks the arrow
        let slope = phase.cos();
        let trend = match slope {
            s if s > 0.8 => "DoubleUp",
            s if s > 0.3 => "SingleUp",
            s if s > -0.3 => "Flat",
            s if s > -0.8 => "SingleDown",
            _ => "DoubleDown",
        };
        (value.round() as i32, trend)
    }

    fn outage_response(&self) -> Option<Result<HttpResponse, TransportError>> {
        match self.outage {
            Outage::None | Outage::InvalidReading => None,
            Outage::ServerError => Some(Ok(HttpResponse::new(500, "internal error"))),
            Outage::Timeout => Some(Err(TransportError::Timeout)),
        }
    }

    fn generic_body(&mut self) -> String {
        let (value, trend) = if self.outage == Outage::InvalidReading { (0, "Flat") } else { self.glucose() };
        let timestamp = jiff::Timestamp::now().as_second();
        let message = self.pending_message.take().unwrap_or_default();
        format!(r#"{{"glucose":{value},"trend":"{trend}","timestamp":{timestamp},"message":"{message}"}}"#)
    }

    fn share_body(&self) -> String {
        let (value, trend) = if self.outage == Outage::InvalidReading { (0, "Flat") } else { self.glucose() };
        let ms = jiff::Timestamp::now().as_millisecond();
        format!(r#"[{{"WT":"Date({ms})","ST":"Date({ms})","Value":{value},"Trend":"{trend}"}}]"#)
    }

    fn weather_body(&self) -> String {
        let (id, main, temp) = WEATHER_PRESETS[self.weather_preset % WEATHER_PRESETS.len()];
        format!(r#"{{"weather":[{{"id":{id},"main":"{main}"}}],"main":{{"temp":{temp},"humidity":64}}}}"#)
    }
}

impl Transport for DemoFeed {
    fn get(
        &mut self,
        url: &str,
        bearer: Option<&str>,
    ) -> Result<HttpResponse, TransportError> {
        thread::sleep(REQUEST_LATENCY);
        if url.contains("openweathermap") {
            return Ok(HttpResponse::new(200, &self.weather_body()));
        }
        if let Some(response) = self.outage_response() {
            info!("feed: GET {url} -> {:?}", self.outage);
            return response;
        }
        if bearer.is_some() {
            info!("feed: GET {url} (authorized)");
        }
        Ok(HttpResponse::new(200, &self.generic_body()))
    }

    fn post_json(
        &mut self,
        url: &str,
        _body: &str,
    ) -> Result<HttpResponse, TransportError> {
        thread::sleep(REQUEST_LATENCY);
        if let Some(response) = self.outage_response() {
            return response;
        }
        let body = if url.contains("AuthenticatePublisherAccount") {
            SHARE_ACCOUNT.to_owned()
        } else if url.contains("LoginPublisherAccountById") {
            SHARE_SESSION.to_owned()
        } else {
            self.share_body()
        };
        Ok(HttpResponse::new(200, &body))
    }
}
