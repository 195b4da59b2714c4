//! Display state machine.
//!
//! The current state is recomputed from scratch on every step by walking a
//! fixed precedence table: boot splash, connectivity, configuration,
//! notifications, data health, then the overrides, and only then the screen
//! the user picked. Nothing about the previous state is carried over except
//! for logging the transition.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use heapless::String;
use log::{debug, info};

use super::render::{RenderContext, Renderer};
use super::toggle::ToggleOrder;
use super::DisplayState;
use crate::config::Config;
use crate::freshness::Freshness;
use crate::reading::{GlucoseReading, MESSAGE_LEN};
use crate::text::assign;
use crate::thresholds::BOOT_SPLASH_MS;

/// System condition the precedence table looks at.
pub struct EngineInputs<'a> {
    pub now_ms: u64,
    pub config: &'a Config,
    pub wifi_connected: bool,
    pub freshness: Freshness,
    pub notification_active: bool,
    pub reading: &'a GlucoseReading,
}

pub struct DisplayEngine {
    boot_ms: u64,
    current: DisplayState,
    forced: Option<DisplayState>,
    default_mode: DisplayState,
    user_mode: DisplayState,
    /// Message set through the API, shown when the server sends none.
    message: String<MESSAGE_LEN>,
    toggle: ToggleOrder,
    last_cycle_ms: Option<u64>,
    renderer: Renderer,
}

impl DisplayEngine {
    /// Engine in the boot splash, user mode taken from the configured default.
    pub fn new(
        now_ms: u64,
        cfg: &Config,
        seed: u64,
    ) -> Self {
        let default_mode = DisplayState::from_default_mode(cfg.default_mode);
        let mut toggle = ToggleOrder::new();
        toggle.rebuild(cfg, false, default_mode);
        Self {
            boot_ms: now_ms,
            current: DisplayState::Boot,
            forced: None,
            default_mode,
            user_mode: default_mode,
            message: String::new(),
            toggle,
            last_cycle_ms: None,
            renderer: Renderer::new(seed),
        }
    }

    // =========================================================================
    // State Selection
    // =========================================================================

    /// Pure precedence walk. The first matching rule wins.
    pub fn evaluate(
        &self,
        inputs: &EngineInputs<'_>,
    ) -> DisplayState {
        let cfg = inputs.config;

        if inputs.now_ms.saturating_sub(self.boot_ms) < BOOT_SPLASH_MS {
            return DisplayState::Boot;
        }
        if cfg.has_wifi() && !inputs.wifi_connected {
            return DisplayState::NoWifi;
        }
        if !cfg.has_server() && !cfg.has_wifi() {
            return DisplayState::NoConfig;
        }
        if cfg.notify_enabled && inputs.notification_active {
            return DisplayState::Notify;
        }
        match inputs.freshness {
            Freshness::NoData => return DisplayState::NoData,
            Freshness::HardStale => return DisplayState::Stale,
            Freshness::Fresh | Freshness::SoftStale => {}
        }
        if let Some(forced) = self.forced {
            return forced;
        }

        let reading = inputs.reading;
        if reading.valid {
            // Unknown indices from the server are ignored.
            if let Some(state) = reading.force_mode.and_then(DisplayState::from_index) {
                return state;
            }
            if !reading.message.is_empty() {
                return DisplayState::Message;
            }
        }
        if !self.message.is_empty() {
            return DisplayState::Message;
        }
        self.user_mode
    }

    /// Run auto-cycle, then select the state for this frame.
    pub fn step(
        &mut self,
        inputs: &EngineInputs<'_>,
    ) -> DisplayState {
        let cfg = inputs.config;
        if cfg.auto_cycle_enabled && self.toggle.len() > 1 {
            let last = *self.last_cycle_ms.get_or_insert(inputs.now_ms);
            if inputs.now_ms.saturating_sub(last) >= cfg.auto_cycle_ms() {
                self.last_cycle_ms = Some(inputs.now_ms);
                self.user_mode = self.toggle.next();
                info!("engine: auto-cycle to {}", self.user_mode.name());
            }
        }

        let next = self.evaluate(inputs);
        if next != self.current {
            info!("engine: state {} -> {}", self.current.name(), next.name());
            self.current = next;
        }
        next
    }

    /// Draw the current state. Returns the brightness to apply to the panel.
    pub fn render<D>(
        &mut self,
        display: &mut D,
        ctx: &RenderContext<'_>,
    ) -> u8
    where
        D: DrawTarget<Color = Rgb888>,
    {
        self.renderer.render(display, self.current, ctx)
    }

    /// Text for the MESSAGE screen: the server's message, else the API one.
    pub fn message_text<'a>(
        &'a self,
        reading: &'a GlucoseReading,
    ) -> &'a str {
        if reading.valid && !reading.message.is_empty() { &reading.message } else { &self.message }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn rebuild_toggle_order(
        &mut self,
        cfg: &Config,
        sysmon_available: bool,
    ) {
        self.toggle.rebuild(cfg, sysmon_available, self.user_mode);
    }

    /// Next screen in the cycle. Restarts the auto-cycle period.
    pub fn advance(
        &mut self,
        now_ms: u64,
    ) -> DisplayState {
        self.user_mode = self.toggle.next();
        self.last_cycle_ms = Some(now_ms);
        info!("engine: toggled to {}", self.user_mode.name());
        self.user_mode
    }

    /// Previous screen in the cycle. Restarts the auto-cycle period.
    pub fn retreat(
        &mut self,
        now_ms: u64,
    ) -> DisplayState {
        self.user_mode = self.toggle.prev();
        self.last_cycle_ms = Some(now_ms);
        info!("engine: toggled back to {}", self.user_mode.name());
        self.user_mode
    }

    /// Jump to `mode` and make it the home screen. Restarts the auto-cycle
    /// period like any other navigation.
    pub fn set_default_mode(
        &mut self,
        mode: DisplayState,
        now_ms: u64,
    ) {
        self.default_mode = mode;
        self.user_mode = mode;
        self.toggle.select(mode);
        self.last_cycle_ms = Some(now_ms);
        debug!("engine: default mode {}", mode.name());
    }

    // =========================================================================
    // Overrides
    // =========================================================================

    pub fn force_state(
        &mut self,
        state: DisplayState,
    ) {
        self.forced = Some(state);
        info!("engine: forced {}", state.name());
    }

    pub fn clear_forced_state(&mut self) {
        if self.forced.take().is_some() {
            info!("engine: override cleared");
        }
    }

    /// Set the API message. An empty string clears it.
    pub fn set_message(
        &mut self,
        text: &str,
    ) {
        assign(&mut self.message, text);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[inline]
    pub const fn state(&self) -> DisplayState { self.current }

    #[inline]
    pub const fn user_mode(&self) -> DisplayState { self.user_mode }

    #[inline]
    pub const fn default_mode(&self) -> DisplayState { self.default_mode }

    #[inline]
    pub const fn forced_state(&self) -> Option<DisplayState> { self.forced }

    #[inline]
    pub const fn toggle_order(&self) -> &ToggleOrder { &self.toggle }
}

// =============================================================================
// Unit Tests
// =============================================================================
