//! Screens reachable by navigation and auto-cycle.

use heapless::Vec;
use log::debug;

use super::DisplayState;
use crate::config::Config;

/// Upper bound of the cycle: glucose, time and five optional screens.
const TOGGLE_CAPACITY: usize = 8;

/// Ordered cycle of user-selectable screens plus the cursor into it.
pub struct ToggleOrder {
    states: Vec<DisplayState, TOGGLE_CAPACITY>,
    index: usize,
}

impl ToggleOrder {
    /// Glucose and time only, cursor on glucose.
    pub fn new() -> Self {
        let mut states = Vec::new();
        states.push(DisplayState::Glucose).ok();
        states.push(DisplayState::Time).ok();
        Self { states, index: 0 }
    }

    /// Recompute the cycle from feature flags and data availability, then put
    /// the cursor back on `user_mode` (or the first entry if it dropped out).
    pub fn rebuild(
        &mut self,
        cfg: &Config,
        sysmon_available: bool,
        user_mode: DisplayState,
    ) {
        let optional = [
            (DisplayState::Weather, cfg.weather_enabled),
            (DisplayState::Timer, cfg.timer_enabled),
            (DisplayState::Stopwatch, cfg.stopwatch_enabled),
            (DisplayState::Sysmon, cfg.sysmon_enabled && sysmon_available),
            (DisplayState::Countdown, cfg.countdown_enabled),
        ];

        self.states.clear();
        self.states.push(DisplayState::Glucose).ok();
        self.states.push(DisplayState::Time).ok();
        for (state, enabled) in optional {
            if enabled {
                self.states.push(state).ok();
            }
        }

        self.index = self.states.iter().position(|&s| s == user_mode).unwrap_or(0);
        debug!("engine: toggle order has {} screens", self.states.len());
    }

    /// Put the cursor on `state` if it is part of the cycle.
    pub fn select(
        &mut self,
        state: DisplayState,
    ) -> bool {
        match self.states.iter().position(|&s| s == state) {
            Some(i) => {
                self.index = i;
                true
            }
            None => false,
        }
    }

    /// Move forward, wrapping, and return the new screen.
    pub fn next(&mut self) -> DisplayState {
        self.index = (self.index + 1) % self.states.len();
        self.states[self.index]
    }

    /// Move backward, wrapping, and return the new screen.
    pub fn prev(&mut self) -> DisplayState {
        self.index = (self.index + self.states.len() - 1) % self.states.len();
        self.states[self.index]
    }

    #[inline]
    pub fn len(&self) -> usize { self.states.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.states.is_empty() }

    #[inline]
    pub fn as_slice(&self) -> &[DisplayState] { &self.states }

    #[inline]
    pub fn contains(
        &self,
        state: DisplayState,
    ) -> bool {
        self.states.contains(&state)
    }
}

impl Default for ToggleOrder {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Unit Tests
// =============================================================================
