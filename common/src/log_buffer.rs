//! On-device event log.
//!
//! A small circular buffer of recent events kept alongside the `log` facade
//! output, so the diagnostics endpoint can show what happened without a
//! serial console attached. Oldest entries are overwritten once full.

use core::fmt::{self, Write};

use heapless::String;
use serde::Serialize;

/// Number of entries kept.
pub const LOG_ENTRIES: usize = 14;

/// Characters kept per message.
pub const LOG_MSG_LEN: usize = 40;

/// Severity of an event.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 1,
    #[default]
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    /// Single-character tag.
    pub const fn prefix(self) -> char {
        match self {
            Self::Debug => 'D',
            Self::Info => 'I',
            Self::Warn => 'W',
            Self::Error => 'E',
        }
    }
}

/// One event.
#[derive(Clone, Debug, Default, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String<LOG_MSG_LEN>,
    /// Uptime milliseconds.
    pub timestamp_ms: u64,
}

/// Formatter sink that silently drops whatever does not fit.
struct Truncating<'a>(&'a mut String<LOG_MSG_LEN>);

impl Write for Truncating<'_> {
    fn write_str(
        &mut self,
        s: &str,
    ) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Circular buffer of events.
pub struct EventLog {
    entries: [LogEntry; LOG_ENTRIES],
    head: usize,
    count: usize,
}

impl EventLog {
    pub const fn new() -> Self {
        Self {
            entries: [const {
                LogEntry {
                    level: LogLevel::Info,
                    message: String::new(),
                    timestamp_ms: 0,
                }
            }; LOG_ENTRIES],
            head: 0,
            count: 0,
        }
    }

    /// Record a formatted event, truncating the message to [`LOG_MSG_LEN`].
    pub fn record(
        &mut self,
        level: LogLevel,
        now_ms: u64,
        args: fmt::Arguments<'_>,
    ) {
        let mut message = String::new();
        Truncating(&mut message).write_fmt(args).ok();
        self.entries[self.head] = LogEntry {
            level,
            message,
            timestamp_ms: now_ms,
        };
        self.head = (self.head + 1) % LOG_ENTRIES;
        if self.count < LOG_ENTRIES {
            self.count += 1;
        }
    }

    #[inline]
    pub const fn len(&self) -> usize { self.count }

    #[inline]
    pub const fn is_empty(&self) -> bool { self.count == 0 }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        let start = if self.count < LOG_ENTRIES { 0 } else { self.head };
        (0..self.count).map(move |i| &self.entries[(start + i) % LOG_ENTRIES])
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&LogEntry> {
        if self.count == 0 {
            None
        } else {
            Some(&self.entries[(self.head + LOG_ENTRIES - 1) % LOG_ENTRIES])
        }
    }
}

impl Default for EventLog {
    fn default() -> Self { Self::new() }
}

/// Forward an event to the `log` facade and record it in an [`EventLog`].
#[macro_export]
macro_rules! event {
    ($events:expr, $now:expr, $level:ident, $($arg:tt)*) => {{
        $crate::__event_forward!($level, $($arg)*);
        $events.record($crate::log_buffer::LogLevel::$level, $now, format_args!($($arg)*));
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __event_forward {
    (Debug, $($arg:tt)*) => { ::log::debug!($($arg)*) };
    (Info, $($arg:tt)*) => { ::log::info!($($arg)*) };
    (Warn, $($arg:tt)*) => { ::log::warn!($($arg)*) };
    (Error, $($arg:tt)*) => { ::log::error!($($arg)*) };
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let log = EventLog::new();
        assert!(log.is_empty());
        assert!(log.latest().is_none());
        assert_eq!(log.iter().count(), 0);
    }

    #[test]
    fn test_order_oldest_first() {
        let mut log = EventLog::new();
        for i in 0..3u64 {
            log.record(LogLevel::Info, i, format_args!("event {i}"));
        }
        let msgs: std::vec::Vec<&str> = log.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(msgs, ["event 0", "event 1", "event 2"]);
        assert_eq!(log.latest().map(|e| e.timestamp_ms), Some(2));
    }

    #[test]
    fn test_wraps_and_drops_oldest() {
        let mut log = EventLog::new();
        for i in 0..(LOG_ENTRIES as u64 + 3) {
            log.record(LogLevel::Warn, i, format_args!("{i}"));
        }
        assert_eq!(log.len(), LOG_ENTRIES);
        assert_eq!(log.iter().next().map(|e| e.timestamp_ms), Some(3));
        assert_eq!(log.latest().map(|e| e.timestamp_ms), Some(LOG_ENTRIES as u64 + 2));
    }

    #[test]
    fn test_long_messages_truncate() {
        let mut log = EventLog::new();
        log.record(LogLevel::Error, 0, format_args!("{}", "x".repeat(100)));
        assert_eq!(log.latest().map(|e| e.message.len()), Some(LOG_MSG_LEN));
    }

    #[test]
    fn test_event_macro_records() {
        let mut events = EventLog::new();
        crate::event!(events, 42, Warn, "glucose: HTTP {}", 500);
        let entry = events.latest().unwrap();
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.message.as_str(), "glucose: HTTP 500");
        assert_eq!(entry.timestamp_ms, 42);
    }

    #[test]
    fn test_level_prefixes() {
        assert_eq!(LogLevel::Error.prefix(), 'E');
        assert_eq!(LogLevel::Debug.prefix(), 'D');
    }
}
