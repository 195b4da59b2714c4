//! Freshness and failure classification.
//!
//! Turns the age of the last valid glucose reading and the consecutive
//! failure counter into a single severity. The checks form a precedence
//! table: NO DATA is tested first, then the hard STALE condition, then the
//! soft warning window. At most one outcome wins.

use crate::thresholds::{NO_DATA_FAILURES, NO_DATA_GRACE_MS, SOFT_STALE_MS, STALE_FAILURES};

/// Result of the classification.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Freshness {
    /// Normal display.
    Fresh,
    /// Dimmed glucose view with a `!` indicator. Content is not replaced.
    SoftStale,
    /// STALE screen replaces everything below it in precedence.
    HardStale,
    /// NO DATA screen.
    NoData,
}

/// Everything the classifier looks at.
#[derive(Clone, Copy, Debug)]
pub struct FreshnessInput {
    /// Time since the last valid reading; `None` if there never was one.
    pub age_ms: Option<u64>,
    pub consecutive_failures: u32,
    pub ever_received: bool,
    /// NO DATA only applies when something is configured to poll.
    pub server_configured: bool,
    pub since_boot_ms: u64,
    pub stale_timeout_ms: u64,
}

impl FreshnessInput {
    /// NO DATA condition, including the post-boot grace period.
    pub const fn is_no_data(&self) -> bool {
        let starved = self.consecutive_failures >= NO_DATA_FAILURES || !self.ever_received;
        starved && self.server_configured && self.since_boot_ms > NO_DATA_GRACE_MS
    }

    /// Hard STALE condition. A missing reading counts as infinitely old.
    pub const fn is_hard_stale(&self) -> bool {
        let too_old = match self.age_ms {
            Some(age) => age >= self.stale_timeout_ms,
            None => true,
        };
        too_old || self.consecutive_failures >= STALE_FAILURES
    }

    /// Soft warning window between 10 minutes and the hard timeout.
    pub const fn is_soft_stale(&self) -> bool {
        match self.age_ms {
            Some(age) => age >= SOFT_STALE_MS && age < self.stale_timeout_ms,
            None => false,
        }
    }
}

/// Classify. NO DATA beats STALE, STALE beats the soft warning.
pub const fn classify(input: &FreshnessInput) -> Freshness {
    if input.is_no_data() {
        Freshness::NoData
    } else if input.is_hard_stale() {
        Freshness::HardStale
    } else if input.is_soft_stale() {
        Freshness::SoftStale
    } else {
        Freshness::Fresh
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
