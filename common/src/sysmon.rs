//! Externally pushed system metric (e.g. host CPU load).

use heapless::String;
use log::debug;

use crate::text::bounded;
use crate::thresholds::SYSMON_STALE_MS;

/// Label capacity.
pub const SYSMON_LABEL_LEN: usize = 7;

pub struct Sysmon {
    label: String<SYSMON_LABEL_LEN>,
    value: i32,
    max: i32,
    last_push_ms: Option<u64>,
}

impl Sysmon {
    pub const fn new() -> Self {
        Self {
            label: String::new(),
            value: 0,
            max: 100,
            last_push_ms: None,
        }
    }

    /// Record a sample. A non-positive `max` means percent.
    pub fn push(
        &mut self,
        label: &str,
        value: i32,
        max: i32,
        now_ms: u64,
    ) {
        self.label = bounded(label);
        self.value = value;
        self.max = if max > 0 { max } else { 100 };
        self.last_push_ms = Some(now_ms);
        debug!("sysmon: {}={}/{}", self.label, self.value, self.max);
    }

    /// A sample arrived within the last 30 seconds.
    pub fn has_data(
        &self,
        now_ms: u64,
    ) -> bool {
        self.last_push_ms.is_some_and(|at| now_ms.saturating_sub(at) < SYSMON_STALE_MS)
    }

    #[inline]
    pub fn label(&self) -> &str { self.label.as_str() }

    #[inline]
    pub const fn value(&self) -> i32 { self.value }

    #[inline]
    pub const fn max(&self) -> i32 { self.max }

    /// Value as a percentage of max.
    pub const fn percent(&self) -> i32 { (self.value as i64 * 100 / self.max as i64) as i32 }
}

impl Default for Sysmon {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_staleness() {
        let mut s = Sysmon::new();
        assert!(!s.has_data(0));
        s.push("GPU", 40, 80, 1_000);
        assert!(s.has_data(30_999));
        assert!(!s.has_data(31_000));
        assert_eq!(s.percent(), 50);
    }

    #[test]
    fn test_label_truncated_and_max_defaulted() {
        let mut s = Sysmon::new();
        s.push("MEMORYUSE", 12, 0, 0);
        assert_eq!(s.label(), "MEMORYU");
        assert_eq!(s.max(), 100);
        s.push("X", 5, -3, 0);
        assert_eq!(s.max(), 100);
    }
}
