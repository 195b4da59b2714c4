//! Glucose data-source client.
//!
//! Two flows feed the same reading slot:
//!
//! - **Generic**: GET a user-supplied URL returning a flat JSON object
//!   (`glucose`, `timestamp`, `trend`, `force_mode`, `message`).
//! - **Share**: the vendor's two-step publisher login yields a session id
//!   that is reused for an hour; readings are POSTed for with that session.
//!
//! Parsing is lenient: missing fields take defaults and only a non-positive
//! glucose value makes a reading invalid. A fetch counts as a success only
//! when it yields a valid reading.

use alloc::string::String as AllocString;

use heapless::String;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use super::{FetchError, FetchLog, Transport, exchange};
use crate::config::{Config, DataSource};
use crate::reading::{GlucoseHistory, GlucoseReading, Trend};
use crate::text::bounded;
use crate::thresholds::SHARE_SESSION_LIFETIME_MS;

// =============================================================================
// Share Protocol
// =============================================================================

const SHARE_APP_ID: &str = "d89443d2-327c-4a6f-89e5-496bbb0317db";
const SHARE_NULL_SESSION: &str = "00000000-0000-0000-0000-000000000000";
const SHARE_AUTH_PATH: &str = "/General/AuthenticatePublisherAccount";
const SHARE_LOGIN_PATH: &str = "/General/LoginPublisherAccountById";
const SHARE_READ_PATH: &str = "/Publisher/ReadPublisherLatestGlucoseValues";

/// Share server region.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShareRegion {
    Us,
    Outside,
}

impl ShareRegion {
    pub const fn from_us(us: bool) -> Self {
        if us { Self::Us } else { Self::Outside }
    }

    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Us => "https://share2.dexcom.com/ShareWebServices/Services",
            Self::Outside => "https://shareous1.dexcom.com/ShareWebServices/Services",
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthRequest<'a> {
    account_name: &'a str,
    password: &'a str,
    application_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    account_id: &'a str,
    password: &'a str,
    application_id: &'a str,
}

/// Live Share login.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ShareSession {
    id: String<63>,
    obtained_ms: u64,
}

impl ShareSession {
    fn expired(
        &self,
        now_ms: u64,
    ) -> bool {
        now_ms.saturating_sub(self.obtained_ms) > SHARE_SESSION_LIFETIME_MS
    }
}

/// Strip surrounding whitespace and every double quote.
fn unquote(body: &str) -> AllocString { body.trim().chars().filter(|&c| c != '"').collect() }

/// Extract unix seconds from `Date(1700000000000)` or `/Date(1700000000000-0500)/`.
fn parse_share_date(raw: &str) -> Option<u64> {
    let start = raw.find('(')? + 1;
    let digits = raw[start..].split(|c: char| !c.is_ascii_digit()).next()?;
    digits.parse::<u64>().ok().map(|ms| ms / 1000)
}

// =============================================================================
// Response Parsing
// =============================================================================

/// Parse the generic endpoint's JSON object.
fn parse_generic(
    body: &str,
    now_ms: u64,
) -> Result<GlucoseReading, FetchError> {
    let doc: Value = serde_json::from_str(body).map_err(|_| FetchError::Json)?;
    let glucose = doc.get("glucose").and_then(Value::as_i64).unwrap_or(0);
    let trend = doc.get("trend").and_then(Value::as_str).unwrap_or("Unknown");
    let message = doc.get("message").and_then(Value::as_str).unwrap_or("");
    let force_mode = doc.get("force_mode").and_then(Value::as_i64).unwrap_or(-1);
    let timestamp = doc.get("timestamp").and_then(Value::as_u64).unwrap_or(0);

    Ok(GlucoseReading::new(clamp_glucose(glucose), Trend::from_label(trend), now_ms)
        .with_message(message)
        .with_force_mode(force_mode.clamp(-1, i64::from(i32::MAX)) as i32)
        .with_timestamp(timestamp))
}

/// Parse the Share reading array; only element 0 is used.
fn parse_share(
    body: &str,
    now_ms: u64,
) -> Result<GlucoseReading, FetchError> {
    let doc: Value = serde_json::from_str(body).map_err(|_| FetchError::Json)?;
    let first = doc.as_array().and_then(|arr| arr.first()).ok_or(FetchError::EmptyArray)?;

    let glucose = first.get("Value").and_then(Value::as_i64).unwrap_or(0);
    let trend = match first.get("Trend") {
        Some(Value::Number(n)) => n.as_i64().map_or(Trend::Unknown, Trend::from_code),
        Some(Value::String(s)) => Trend::from_label(s),
        _ => Trend::Unknown,
    };
    let timestamp = first
        .get("WT")
        .or_else(|| first.get("ST"))
        .and_then(Value::as_str)
        .and_then(parse_share_date)
        .unwrap_or(0);

    Ok(GlucoseReading::new(clamp_glucose(glucose), trend, now_ms).with_timestamp(timestamp))
}

fn clamp_glucose(value: i64) -> i32 { value.clamp(0, 999) as i32 }

// =============================================================================
// Client
// =============================================================================

/// Owns the glucose slot, its history and fetch diagnostics.
pub struct GlucoseClient {
    reading: GlucoseReading,
    history: GlucoseHistory,
    failures: u32,
    ever_received: bool,
    last_success_ms: Option<u64>,
    log: FetchLog,
    session: Option<ShareSession>,
}

impl GlucoseClient {
    pub const fn new() -> Self {
        Self {
            reading: GlucoseReading {
                value: 0,
                trend: Trend::Unknown,
                message: String::new(),
                force_mode: None,
                timestamp: 0,
                received_at_ms: 0,
                valid: false,
            },
            history: GlucoseHistory::new(),
            failures: 0,
            ever_received: false,
            last_success_ms: None,
            log: FetchLog::new(),
            session: None,
        }
    }

    /// Run one fetch with the configured data source.
    pub fn fetch<T: Transport>(
        &mut self,
        now_ms: u64,
        cfg: &Config,
        transport: &mut T,
    ) -> Result<(), FetchError> {
        let parsed = match cfg.data_source {
            DataSource::Generic => self.fetch_generic(now_ms, cfg, transport),
            DataSource::Share => self.fetch_share(now_ms, cfg, transport),
        };
        match parsed {
            Ok(reading) => self.accept(reading, now_ms),
            Err(err) => {
                self.failures = self.failures.saturating_add(1);
                warn!("glucose: fetch failed ({err}), failures={}", self.failures);
                Err(err)
            }
        }
    }

    /// Overwrite the slot. Only a valid reading resets the failure counter.
    fn accept(
        &mut self,
        reading: GlucoseReading,
        now_ms: u64,
    ) -> Result<(), FetchError> {
        self.reading = reading;
        if !self.reading.valid {
            self.failures = self.failures.saturating_add(1);
            warn!("glucose: invalid value, failures={}", self.failures);
            return Err(FetchError::InvalidGlucose);
        }
        let delta = self.history.record(self.reading.value, now_ms);
        self.failures = 0;
        self.ever_received = true;
        self.last_success_ms = Some(now_ms);
        info!("glucose: {} {} ({:+})", self.reading.value, self.reading.trend.name(), delta);
        Ok(())
    }

    fn fetch_generic<T: Transport>(
        &mut self,
        now_ms: u64,
        cfg: &Config,
        transport: &mut T,
    ) -> Result<GlucoseReading, FetchError> {
        debug!("glucose: GET {}", cfg.server_url);
        let token = Some(cfg.auth_token.as_str()).filter(|t| !t.is_empty());
        let response = exchange(&mut self.log, transport.get(&cfg.server_url, token))?;
        parse_generic(&response.body, now_ms)
    }

    fn fetch_share<T: Transport>(
        &mut self,
        now_ms: u64,
        cfg: &Config,
        transport: &mut T,
    ) -> Result<GlucoseReading, FetchError> {
        let base = ShareRegion::from_us(cfg.dexcom_us).base_url();
        if self.session.as_ref().is_none_or(|s| s.expired(now_ms)) {
            self.session = None;
            self.share_login(base, now_ms, cfg, transport)?;
        }
        let Some(session) = self.session.as_ref() else {
            return Err(FetchError::NullSession);
        };

        let url = alloc::format!("{base}{SHARE_READ_PATH}?sessionId={}&minutes=10&maxCount=1", session.id);
        match exchange(&mut self.log, transport.post_json(&url, "")) {
            Ok(response) => parse_share(&response.body, now_ms),
            Err(FetchError::Status(500)) => {
                info!("glucose: share session expired");
                self.session = None;
                Err(FetchError::Status(500))
            }
            Err(err) => Err(err),
        }
    }

    /// Publisher login: account name -> account id -> session id.
    fn share_login<T: Transport>(
        &mut self,
        base: &str,
        now_ms: u64,
        cfg: &Config,
        transport: &mut T,
    ) -> Result<(), FetchError> {
        info!("glucose: share login as '{}'", cfg.dexcom_username);
        let auth = AuthRequest {
            account_name: &cfg.dexcom_username,
            password: &cfg.dexcom_password,
            application_id: SHARE_APP_ID,
        };
        let body = serde_json::to_string(&auth).map_err(|_| FetchError::Json)?;
        let url = alloc::format!("{base}{SHARE_AUTH_PATH}");
        let account_id = unquote(&exchange(&mut self.log, transport.post_json(&url, &body))?.body);

        let login = LoginRequest {
            account_id: &account_id,
            password: &cfg.dexcom_password,
            application_id: SHARE_APP_ID,
        };
        let body = serde_json::to_string(&login).map_err(|_| FetchError::Json)?;
        let url = alloc::format!("{base}{SHARE_LOGIN_PATH}");
        let session_id = unquote(&exchange(&mut self.log, transport.post_json(&url, &body))?.body);

        if session_id == SHARE_NULL_SESSION || session_id.len() < 10 {
            self.log.note("null session, enable sharing in the app");
            return Err(FetchError::NullSession);
        }
        self.session = Some(ShareSession {
            id: bounded(&session_id),
            obtained_ms: now_ms,
        });
        info!("glucose: share session {}...", session_id.get(..8).unwrap_or(""));
        Ok(())
    }

    /// Drop any Share login (e.g. after the credentials changed).
    pub fn invalidate_session(&mut self) { self.session = None; }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[inline]
    pub const fn reading(&self) -> &GlucoseReading { &self.reading }

    #[inline]
    pub const fn history(&self) -> &GlucoseHistory { &self.history }

    /// Consecutive failed fetches.
    #[inline]
    pub const fn failure_count(&self) -> u32 { self.failures }

    #[inline]
    pub const fn has_ever_received(&self) -> bool { self.ever_received }

    /// Age of the last valid reading, `None` if there never was one.
    pub fn time_since_last_success(
        &self,
        now_ms: u64,
    ) -> Option<u64> {
        self.last_success_ms.map(|at| now_ms.saturating_sub(at))
    }

    /// Delta of the most recent valid reading.
    #[inline]
    pub const fn delta(&self) -> i32 { self.history.delta() }

    #[inline]
    pub const fn last_response_code(&self) -> i32 { self.log.code() }

    #[inline]
    pub fn last_response_body(&self) -> &str { self.log.body() }

    /// A Share session is currently held.
    #[inline]
    pub const fn has_session(&self) -> bool { self.session.is_some() }
}

impl Default for GlucoseClient {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::TransportError;
    use crate::source::fake::{Call, ScriptedTransport};
    use crate::text::assign;

    fn generic_config() -> Config {
        let mut cfg = Config::default();
        assign(&mut cfg.server_url, "https://example.org/cgm");
        cfg
    }

    fn share_config() -> Config {
        let mut cfg = Config::default();
        cfg.data_source = DataSource::Share;
        assign(&mut cfg.dexcom_username, "alice");
        assign(&mut cfg.dexcom_password, "pw");
        cfg
    }

    const ACCOUNT: &str = "\"1e2d3c4b-0000-1111-2222-333344445555\"";
    const SESSION: &str = "\"aaaabbbb-cccc-dddd-eeee-ffff00001111\"";

    #[test]
    fn test_generic_success() {
        let cfg = generic_config();
        let mut client = GlucoseClient::new();
        let mut t = ScriptedTransport::default()
            .reply(200, r#"{"glucose": 123, "trend": "SingleDown", "timestamp": 1700000000, "message": "hi"}"#);

        assert!(client.fetch(1_000, &cfg, &mut t).is_ok());
        let r = client.reading();
        assert_eq!(r.value, 123);
        assert_eq!(r.trend, Trend::Falling);
        assert_eq!(r.timestamp, 1_700_000_000);
        assert_eq!(r.message.as_str(), "hi");
        assert_eq!(r.force_mode, None);
        assert!(r.valid);
        assert!(client.has_ever_received());
        assert_eq!(client.failure_count(), 0);
        assert_eq!(client.time_since_last_success(4_000), Some(3_000));
        assert_eq!(client.history().len(), 1);
    }

    #[test]
    fn test_generic_sends_bearer_only_when_set() {
        let mut cfg = generic_config();
        let mut client = GlucoseClient::new();
        let mut t = ScriptedTransport::default().reply(200, r#"{"glucose": 100}"#).reply(200, r#"{"glucose": 100}"#);
        client.fetch(0, &cfg, &mut t).ok();
        assign(&mut cfg.auth_token, "tok");
        client.fetch(1, &cfg, &mut t).ok();
        assert_eq!(t.calls[0], Call::Get {
            url: "https://example.org/cgm".into(),
            bearer: None,
        });
        assert_eq!(t.calls[1], Call::Get {
            url: "https://example.org/cgm".into(),
            bearer: Some("tok".into()),
        });
    }

    #[test]
    fn test_generic_force_mode_and_defaults() {
        let cfg = generic_config();
        let mut client = GlucoseClient::new();
        let mut t = ScriptedTransport::default().reply(200, r#"{"glucose": 90, "force_mode": 2}"#);
        client.fetch(0, &cfg, &mut t).unwrap();
        assert_eq!(client.reading().force_mode, Some(2));
        assert_eq!(client.reading().trend, Trend::Unknown);
        assert!(client.reading().message.is_empty());
    }

    #[test]
    fn test_invalid_value_overwrites_slot_and_counts_failure() {
        let cfg = generic_config();
        let mut client = GlucoseClient::new();
        let mut t = ScriptedTransport::default().reply(200, r#"{"glucose": 150}"#).reply(200, r#"{"glucose": 0}"#);
        client.fetch(0, &cfg, &mut t).unwrap();
        assert_eq!(client.fetch(60_000, &cfg, &mut t), Err(FetchError::InvalidGlucose));
        assert!(!client.reading().valid);
        assert_eq!(client.failure_count(), 1);
        // Age keeps counting from the last valid reading.
        assert_eq!(client.time_since_last_success(60_000), Some(60_000));
        assert!(client.has_ever_received());
    }

    #[test]
    fn test_malformed_json_keeps_previous_reading() {
        let cfg = generic_config();
        let mut client = GlucoseClient::new();
        let mut t = ScriptedTransport::default().reply(200, r#"{"glucose": 150}"#).reply(200, "not json");
        client.fetch(0, &cfg, &mut t).unwrap();
        assert_eq!(client.fetch(1, &cfg, &mut t), Err(FetchError::Json));
        assert_eq!(client.reading().value, 150);
        assert_eq!(client.failure_count(), 1);
        assert_eq!(client.last_response_body(), "not json");
    }

    #[test]
    fn test_http_error_and_transport_error() {
        let cfg = generic_config();
        let mut client = GlucoseClient::new();
        let mut t = ScriptedTransport::default().reply(404, "missing").fail(TransportError::Timeout);
        assert_eq!(client.fetch(0, &cfg, &mut t), Err(FetchError::Status(404)));
        assert_eq!(client.last_response_code(), 404);
        assert_eq!(client.last_response_body(), "HTTP 404");
        assert!(client.fetch(1, &cfg, &mut t).is_err());
        assert_eq!(client.last_response_code(), -1);
        assert_eq!(client.failure_count(), 2);
        assert!(!client.has_ever_received());
        assert_eq!(client.time_since_last_success(10), None);
    }

    #[test]
    fn test_deltas_follow_history() {
        let cfg = generic_config();
        let mut client = GlucoseClient::new();
        let mut t = ScriptedTransport::default().reply(200, r#"{"glucose": 100}"#).reply(200, r#"{"glucose": 112}"#);
        client.fetch(0, &cfg, &mut t).unwrap();
        assert_eq!(client.delta(), 0);
        client.fetch(1, &cfg, &mut t).unwrap();
        assert_eq!(client.delta(), 12);
    }

    #[test]
    fn test_share_login_and_read() {
        let cfg = share_config();
        let mut client = GlucoseClient::new();
        let mut t = ScriptedTransport::default()
            .reply(200, ACCOUNT)
            .reply(200, SESSION)
            .reply(200, r#"[{"WT":"Date(1700000000000)","ST":"Date(1700000000000)","Value":145,"Trend":"Flat"}]"#);

        client.fetch(0, &cfg, &mut t).unwrap();
        assert_eq!(client.reading().value, 145);
        assert_eq!(client.reading().trend, Trend::Flat);
        assert_eq!(client.reading().timestamp, 1_700_000_000);
        assert!(client.has_session());

        let Call::Post { url, body } = &t.calls[0] else { panic!("expected POST") };
        assert!(url.starts_with("https://share2.dexcom.com/"));
        assert!(url.ends_with(SHARE_AUTH_PATH));
        assert!(body.contains("\"accountName\":\"alice\""));
        assert!(body.contains(SHARE_APP_ID));

        let Call::Post { body, .. } = &t.calls[1] else { panic!("expected POST") };
        assert!(body.contains("\"accountId\":\"1e2d3c4b-0000-1111-2222-333344445555\""));

        let Call::Post { url, .. } = &t.calls[2] else { panic!("expected POST") };
        assert!(url.contains("sessionId=aaaabbbb-cccc-dddd-eeee-ffff00001111&minutes=10&maxCount=1"));
    }

    #[test]
    fn test_share_session_is_reused_then_refreshed() {
        let cfg = share_config();
        let mut client = GlucoseClient::new();
        let reading = r#"[{"Value":100,"Trend":4}]"#;
        let mut t = ScriptedTransport::default()
            .reply(200, ACCOUNT)
            .reply(200, SESSION)
            .reply(200, reading)
            .reply(200, reading)
            .reply(200, ACCOUNT)
            .reply(200, SESSION)
            .reply(200, reading);
        client.fetch(0, &cfg, &mut t).unwrap();
        client.fetch(60_000, &cfg, &mut t).unwrap();
        assert_eq!(t.calls.len(), 4);
        client.fetch(SHARE_SESSION_LIFETIME_MS + 1, &cfg, &mut t).unwrap();
        assert_eq!(t.calls.len(), 7);
        assert_eq!(client.reading().trend, Trend::Flat);
    }

    #[test]
    fn test_share_null_session() {
        let cfg = share_config();
        let mut client = GlucoseClient::new();
        let mut t = ScriptedTransport::default()
            .reply(200, ACCOUNT)
            .reply(200, "\"00000000-0000-0000-0000-000000000000\"");
        assert_eq!(client.fetch(0, &cfg, &mut t), Err(FetchError::NullSession));
        assert!(!client.has_session());
        assert_eq!(client.failure_count(), 1);
    }

    #[test]
    fn test_share_500_clears_session() {
        let cfg = share_config();
        let mut client = GlucoseClient::new();
        let mut t = ScriptedTransport::default()
            .reply(200, ACCOUNT)
            .reply(200, SESSION)
            .reply(500, "SessionNotValid");
        assert_eq!(client.fetch(0, &cfg, &mut t), Err(FetchError::Status(500)));
        assert!(!client.has_session());
    }

    #[test]
    fn test_share_empty_array() {
        let cfg = share_config();
        let mut client = GlucoseClient::new();
        let mut t = ScriptedTransport::default().reply(200, ACCOUNT).reply(200, SESSION).reply(200, "[]");
        assert_eq!(client.fetch(0, &cfg, &mut t), Err(FetchError::EmptyArray));
    }

    #[test]
    fn test_share_outside_us_base() {
        let mut cfg = share_config();
        cfg.dexcom_us = false;
        let mut client = GlucoseClient::new();
        let mut t = ScriptedTransport::default().fail(TransportError::Connect);
        client.fetch(0, &cfg, &mut t).ok();
        let Call::Post { url, .. } = &t.calls[0] else { panic!("expected POST") };
        assert!(url.starts_with("https://shareous1.dexcom.com/"));
    }

    #[test]
    fn test_share_date_parsing() {
        assert_eq!(parse_share_date("Date(1700000000000)"), Some(1_700_000_000));
        assert_eq!(parse_share_date("/Date(1700000000000-0500)/"), Some(1_700_000_000));
        assert_eq!(parse_share_date("garbage"), None);
    }
}
