//! Data-source clients.
//!
//! Each client owns one reading slot and a [`FetchLog`] with the last raw
//! response for diagnostics. Network access goes through the [`Transport`]
//! collaborator; a call is one bounded, timeout-guarded request and is the
//! only blocking operation allowed inside a tick.
//!
//! Clients never surface errors to the display engine. A failed fetch is
//! folded into the client's failure counter and the error is returned to the
//! caller only so it can be logged.

pub mod glucose;
pub mod weather;

use alloc::string::String as AllocString;

use heapless::String;
use thiserror::Error;

use crate::text::assign;

pub use glucose::{GlucoseClient, ShareRegion};
pub use weather::WeatherClient;

/// Failure reported by the transport collaborator.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed")]
    Connect,
    #[error("TLS handshake failed")]
    Tls,
    #[error("response body too large")]
    Overflow,
}

/// Raw HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: i32,
    pub body: AllocString,
}

impl HttpResponse {
    pub fn new(
        status: i32,
        body: &str,
    ) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[inline]
    pub const fn is_ok(&self) -> bool { self.status == 200 }
}

/// HTTPS client collaborator.
pub trait Transport {
    /// GET `url`, with `Authorization: Bearer <token>` when a token is given.
    fn get(
        &mut self,
        url: &str,
        bearer: Option<&str>,
    ) -> Result<HttpResponse, TransportError>;

    /// POST a JSON body to `url`.
    fn post_json(
        &mut self,
        url: &str,
        body: &str,
    ) -> Result<HttpResponse, TransportError>;
}

/// Why a fetch did not produce a usable reading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    #[error("HTTP {0}")]
    Status(i32),
    #[error("malformed JSON")]
    Json,
    #[error("empty reading array")]
    EmptyArray,
    #[error("invalid glucose value")]
    InvalidGlucose,
    #[error("share login returned a null session")]
    NullSession,
}

/// Capacity of the stored response body.
pub const RESPONSE_LEN: usize = 511;

/// Last response seen by a client.
pub struct FetchLog {
    code: i32,
    body: String<RESPONSE_LEN>,
}

impl FetchLog {
    pub const fn new() -> Self {
        Self {
            code: 0,
            body: String::new(),
        }
    }

    /// Remember a completed HTTP exchange. Non-200 bodies are replaced by `HTTP <code>`.
    pub fn response(
        &mut self,
        response: &HttpResponse,
    ) {
        self.code = response.status;
        if response.is_ok() {
            assign(&mut self.body, &response.body);
        } else {
            self.status_only(response.status);
        }
    }

    /// Remember a transport failure (code -1).
    pub fn transport_error(
        &mut self,
        err: TransportError,
    ) {
        use core::fmt::Write;
        self.code = -1;
        self.body.clear();
        write!(self.body, "{err}").ok();
    }

    /// Replace the stored body with a human-readable explanation.
    pub fn note(
        &mut self,
        text: &str,
    ) {
        assign(&mut self.body, text);
    }

    fn status_only(
        &mut self,
        status: i32,
    ) {
        use core::fmt::Write;
        self.body.clear();
        write!(self.body, "HTTP {status}").ok();
    }

    /// Last HTTP status, -1 for a transport error, 0 before any request.
    #[inline]
    pub const fn code(&self) -> i32 { self.code }

    #[inline]
    pub fn body(&self) -> &str { self.body.as_str() }
}

impl Default for FetchLog {
    fn default() -> Self { Self::new() }
}

/// Run one request and record it. Only a 200 is returned as `Ok`.
pub(crate) fn exchange(
    log: &mut FetchLog,
    result: Result<HttpResponse, TransportError>,
) -> Result<HttpResponse, FetchError> {
    match result {
        Ok(response) => {
            log.response(&response);
            if response.is_ok() { Ok(response) } else { Err(FetchError::Status(response.status)) }
        }
        Err(err) => {
            log.transport_error(err);
            Err(err.into())
        }
    }
}

// =============================================================================
// Test Support
// =============================================================================

/// Scripted transport shared by the client tests.
#[cfg(test)]
pub(crate) mod fake {
    use std::collections::VecDeque;
    use std::string::String;
    use std::vec::Vec;

    use super::{HttpResponse, Transport, TransportError};

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Call {
        Get { url: String, bearer: Option<String> },
        Post { url: String, body: String },
    }

    #[derive(Default)]
    pub struct ScriptedTransport {
        pub replies: VecDeque<Result<HttpResponse, TransportError>>,
        pub calls: Vec<Call>,
    }

    impl ScriptedTransport {
        pub fn reply(
            mut self,
            status: i32,
            body: &str,
        ) -> Self {
            self.replies.push_back(Ok(HttpResponse::new(status, body)));
            self
        }

        pub fn fail(
            mut self,
            err: TransportError,
        ) -> Self {
            self.replies.push_back(Err(err));
            self
        }

        fn next(&mut self) -> Result<HttpResponse, TransportError> {
            self.replies.pop_front().unwrap_or(Err(TransportError::Connect))
        }
    }

    impl Transport for ScriptedTransport {
        fn get(
            &mut self,
            url: &str,
            bearer: Option<&str>,
        ) -> Result<HttpResponse, TransportError> {
            self.calls.push(Call::Get {
                url: url.into(),
                bearer: bearer.map(Into::into),
            });
            self.next()
        }

        fn post_json(
            &mut self,
            url: &str,
            body: &str,
        ) -> Result<HttpResponse, TransportError> {
            self.calls.push(Call::Post {
                url: url.into(),
                body: body.into(),
            });
            self.next()
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_log_non_200_keeps_status_only() {
        let mut log = FetchLog::new();
        log.response(&HttpResponse::new(503, "<html>busy</html>"));
        assert_eq!(log.code(), 503);
        assert_eq!(log.body(), "HTTP 503");
    }

    #[test]
    fn test_fetch_log_transport_error() {
        let mut log = FetchLog::new();
        log.transport_error(TransportError::Timeout);
        assert_eq!(log.code(), -1);
        assert_eq!(log.body(), "request timed out");
    }

    #[test]
    fn test_fetch_log_truncates_body() {
        let mut log = FetchLog::new();
        let big = "x".repeat(2000);
        log.response(&HttpResponse::new(200, &big));
        assert_eq!(log.body().len(), RESPONSE_LEN);
    }

    #[test]
    fn test_exchange_maps_status() {
        let mut log = FetchLog::new();
        let err = exchange(&mut log, Ok(HttpResponse::new(401, ""))).unwrap_err();
        assert_eq!(err, FetchError::Status(401));
        let err = exchange(&mut log, Err(TransportError::Tls)).unwrap_err();
        assert_eq!(err, FetchError::Transport(TransportError::Tls));
    }
}
