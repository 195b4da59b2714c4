//! Notification pool.
//!
//! Three slots. A push takes the first free slot; when all are busy the pool
//! shifts left, dropping the oldest, and the new one lands in the last slot.
//! The display always shows the highest-indexed active slot.

use heapless::String;
use log::{debug, info};

use crate::text::bounded;

pub const NOTIFY_SLOTS: usize = 3;

/// Text capacity.
pub const NOTIFY_TEXT_LEN: usize = 63;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Notification {
    pub text: String<NOTIFY_TEXT_LEN>,
    pub expires_ms: u64,
    pub urgent: bool,
    pub active: bool,
}

pub struct NotifyQueue {
    slots: [Notification; NOTIFY_SLOTS],
}

impl NotifyQueue {
    pub const fn new() -> Self {
        Self {
            slots: [const {
                Notification {
                    text: String::new(),
                    expires_ms: 0,
                    urgent: false,
                    active: false,
                }
            }; NOTIFY_SLOTS],
        }
    }

    /// Queue a notification for `duration_secs`.
    pub fn push(
        &mut self,
        text: &str,
        duration_secs: u32,
        urgent: bool,
        now_ms: u64,
    ) {
        let slot = match self.slots.iter().position(|n| !n.active) {
            Some(free) => free,
            None => {
                self.slots.rotate_left(1);
                NOTIFY_SLOTS - 1
            }
        };
        self.slots[slot] = Notification {
            text: bounded(text),
            expires_ms: now_ms + u64::from(duration_secs) * 1000,
            urgent,
            active: true,
        };
        info!("notify: \"{text}\" for {duration_secs}s (urgent: {urgent})");
    }

    /// Deactivate expired slots.
    pub fn tick(
        &mut self,
        now_ms: u64,
    ) {
        for (i, n) in self.slots.iter_mut().enumerate() {
            if n.active && now_ms >= n.expires_ms {
                n.active = false;
                debug!("notify: slot {i} expired");
            }
        }
    }

    pub fn dismiss(&mut self) {
        for n in &mut self.slots {
            n.active = false;
        }
        info!("notify: dismissed");
    }

    pub fn has_active(&self) -> bool { self.slots.iter().any(|n| n.active) }

    /// Notification currently on screen.
    pub fn current(&self) -> Option<&Notification> { self.slots.iter().rev().find(|n| n.active) }
}

impl Default for NotifyQueue {
    fn default() -> Self { Self::new() }
}
