//! Device facade.
//!
//! [`Device`] owns every component and runs them from one cooperative tick.
//! Hardware lives behind the collaborator traits bundled in [`Peripherals`];
//! the host calls [`Device::tick`] in a loop and pushes [`Device::frame`] to
//! the panel.
//!
//! API operations only touch in-memory state. Their side effects on hardware
//! (persisting config, rejoining WiFi, beeping) are queued and applied at the
//! start of the next tick, so a request handler never blocks.

use alloc::string::String as AllocString;
use alloc::vec::Vec as AllocVec;

use heapless::String;
use log::{debug, warn};

use crate::alerts::AlertMonitor;
use crate::brightness::{effective_brightness, next_brightness_step};
use crate::button::{Button, ButtonEvent, ButtonLevels, Buttons, Press};
use crate::buzzer::{Beep, Buzzer, TIMER_BEEP, ToneOutput, URGENT_BEEP};
use crate::clock::{TimeSource, WallClock};
use crate::config::{Config, ConfigChanges, ConfigError, ConfigManager, ConfigPatch, ConfigStore};
use crate::countdown;
use crate::diagnostics::Diagnostics;
use crate::display::{DisplayEngine, DisplayState, EngineInputs, Frame, RenderContext, StopwatchView, TimerView};
use crate::event;
use crate::freshness::{Freshness, FreshnessInput, classify};
use crate::log_buffer::{EventLog, LogLevel};
use crate::notify::NotifyQueue;
use crate::reading::{GlucoseReading, HistoryEntry, MESSAGE_LEN, WeatherReading};
use crate::scheduler::{Interval, Scheduler};
use crate::sensors::{SENSOR_SAMPLE_MS, SensorSample, Sensors};
use crate::source::{GlucoseClient, Transport, WeatherClient};
use crate::sysmon::Sysmon;
use crate::text::bounded;
use crate::thresholds::{RENDER_INTERVAL_MS, TOGGLE_REBUILD_MS};
use crate::timer::{Pomodoro, Stopwatch, TimerPlan};
use crate::wifi::{WifiManager, WifiRadio};

// =============================================================================
// Host Interface
// =============================================================================

/// Hardware collaborators lent to the device for one tick.
pub struct Peripherals<'a, T, R, O, S, C> {
    pub transport: &'a mut T,
    pub radio: &'a mut R,
    pub tone: &'a mut O,
    pub store: &'a mut S,
    pub clock: &'a mut C,
}

/// Raw inputs sampled by the host this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TickInputs {
    pub buttons: ButtonLevels,
    pub sensors: SensorSample,
}

/// Periodic work driven by the scheduler.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Task {
    GlucosePoll,
    WeatherPoll,
    SensorSample,
    ToggleRebuild,
    Render,
}

const TASKS: usize = 5;

fn timer_plan(cfg: &Config) -> TimerPlan {
    TimerPlan {
        work_min: cfg.timer_work_min,
        break_min: cfg.timer_break_min,
        long_break_min: cfg.timer_long_break_min,
        sessions: cfg.timer_sessions,
    }
}

// =============================================================================
// Device
// =============================================================================

pub struct Device {
    boot_ms: u64,
    started: bool,
    config: ConfigManager,
    config_dirty: bool,
    wifi_dirty: bool,
    glucose: GlucoseClient,
    weather: WeatherClient,
    wifi: WifiManager,
    schedule: Scheduler<Task, TASKS>,
    timer: Pomodoro,
    stopwatch: Stopwatch,
    notify: NotifyQueue,
    sysmon: Sysmon,
    alerts: AlertMonitor,
    buzzer: Buzzer,
    pending_beep: Option<Beep>,
    silence_pending: bool,
    buttons: Buttons,
    sensors: Sensors,
    events: EventLog,
    engine: DisplayEngine,
    frame: Frame,
    clock: Option<WallClock>,
    brightness: u8,
}

impl Device {
    /// Device booting at `now_ms` with an already loaded configuration.
    /// `seed` feeds the weather animation.
    pub fn new(
        now_ms: u64,
        config: ConfigManager,
        seed: u64,
    ) -> Self {
        let cfg = config.get();
        let mut schedule = Scheduler::new();
        let tasks = [
            (Task::GlucosePoll, Interval::new(cfg.poll_interval_ms())),
            (Task::WeatherPoll, Interval::new(cfg.weather_poll_ms())),
            (Task::SensorSample, Interval::new(SENSOR_SAMPLE_MS)),
            (Task::ToggleRebuild, Interval::starting_at(TOGGLE_REBUILD_MS, now_ms)),
            (Task::Render, Interval::new(RENDER_INTERVAL_MS)),
        ];
        for (task, interval) in tasks {
            schedule.add(task, interval).ok();
        }

        let engine = DisplayEngine::new(now_ms, cfg, seed);
        let brightness = cfg.brightness;
        let mut events = EventLog::new();
        event!(events, now_ms, Info, "boot: config {:?}", config.origin());

        Self {
            boot_ms: now_ms,
            started: false,
            config,
            config_dirty: false,
            wifi_dirty: false,
            glucose: GlucoseClient::new(),
            weather: WeatherClient::new(),
            wifi: WifiManager::new(),
            schedule,
            timer: Pomodoro::new(),
            stopwatch: Stopwatch::new(),
            notify: NotifyQueue::new(),
            sysmon: Sysmon::new(),
            alerts: AlertMonitor::new(),
            buzzer: Buzzer::new(),
            pending_beep: None,
            silence_pending: false,
            buttons: Buttons::new(),
            sensors: Sensors::new(),
            events,
            engine,
            frame: Frame::new(),
            clock: None,
            brightness,
        }
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// One pass of the main loop. Never blocks except inside a single
    /// transport request.
    pub fn tick<T, R, O, S, C>(
        &mut self,
        now_ms: u64,
        inputs: TickInputs,
        io: &mut Peripherals<'_, T, R, O, S, C>,
    ) where
        T: Transport,
        R: WifiRadio,
        O: ToneOutput,
        S: ConfigStore,
        C: TimeSource,
    {
        self.clock = io.clock.now();
        self.apply_pending(now_ms, io.radio, io.store);

        self.tick_connectivity(now_ms, io.radio);

        let glucose_ready = self.glucose_ready();
        let weather_ready = self.weather_ready();
        let due = self.schedule.due(now_ms, |task| match task {
            Task::GlucosePoll => glucose_ready,
            Task::WeatherPoll => weather_ready,
            Task::SensorSample | Task::ToggleRebuild | Task::Render => true,
        });

        if due.contains(&Task::GlucosePoll) {
            self.poll_glucose(now_ms, io.transport);
        }
        if due.contains(&Task::WeatherPoll) {
            self.poll_weather(now_ms, io.transport);
        }
        self.tick_aux(now_ms, io.tone);
        self.buzzer.tick(now_ms, io.tone);

        for event in self.buttons.update(inputs.buttons, now_ms) {
            self.handle_button(event, now_ms, io.tone);
        }

        if due.contains(&Task::SensorSample) {
            self.sensors.sample(inputs.sensors);
        }

        if due.contains(&Task::ToggleRebuild) {
            self.engine.rebuild_toggle_order(self.config.get(), self.sysmon.has_data(now_ms));
        }
        if due.contains(&Task::Render) {
            self.render(now_ms);
        }
    }

    /// Glucose polling needs a link and somewhere to poll.
    fn glucose_ready(&self) -> bool { self.wifi.is_connected() && self.config.get().has_server() }

    fn weather_ready(&self) -> bool {
        let cfg = self.config.get();
        cfg.weather_enabled && !cfg.weather_api_key.is_empty() && self.wifi.is_connected()
    }

    fn apply_pending<R: WifiRadio, S: ConfigStore>(
        &mut self,
        now_ms: u64,
        radio: &mut R,
        store: &mut S,
    ) {
        let cfg = self.config.get();
        if !self.started {
            self.wifi.start(now_ms, cfg, radio);
            self.started = true;
            self.wifi_dirty = false;
        } else if self.wifi_dirty {
            self.wifi.reconnect(now_ms, cfg, radio);
            self.wifi_dirty = false;
        }

        if self.config_dirty {
            self.config_dirty = false;
            match self.config.save(store) {
                Ok(()) => event!(self.events, now_ms, Info, "config: saved"),
                Err(err) => event!(self.events, now_ms, Error, "config: save failed: {err}"),
            }
        }
    }

    fn tick_connectivity<R: WifiRadio>(
        &mut self,
        now_ms: u64,
        radio: &mut R,
    ) {
        let before = self.wifi.status();
        self.wifi.tick(now_ms, self.config.get(), radio);
        let after = self.wifi.status();
        if before != after {
            self.events.record(LogLevel::Info, now_ms, format_args!("wifi: {}", after.name()));
        }
    }

    fn poll_glucose<T: Transport>(
        &mut self,
        now_ms: u64,
        transport: &mut T,
    ) {
        match self.glucose.fetch(now_ms, self.config.get(), transport) {
            Ok(()) => {
                let reading = self.glucose.reading();
                let (value, trend) = (reading.value, reading.trend);
                self.events.record(LogLevel::Info, now_ms, format_args!("glucose: {} {}", value, trend.name()));
            }
            Err(err) => self.events.record(LogLevel::Warn, now_ms, format_args!("glucose: {err}")),
        }
    }

    fn poll_weather<T: Transport>(
        &mut self,
        now_ms: u64,
        transport: &mut T,
    ) {
        if let Err(err) = self.weather.fetch(now_ms, self.config.get(), transport) {
            self.events.record(LogLevel::Warn, now_ms, format_args!("weather: {err}"));
        }
    }

    fn tick_aux<O: ToneOutput>(
        &mut self,
        now_ms: u64,
        tone: &mut O,
    ) {
        if core::mem::take(&mut self.silence_pending) {
            self.buzzer.stop(tone);
        }
        if let Some(beep) = self.pending_beep.take() {
            self.buzzer.beep(beep, now_ms, tone);
        }

        let cfg = self.config.get();
        if let Some(done) = self.timer.tick(now_ms, &timer_plan(cfg)) {
            event!(self.events, now_ms, Info, "timer: {} -> {}", done.finished.name(), done.next.name());
            if cfg.timer_buzzer {
                self.buzzer.beep(TIMER_BEEP, now_ms, tone);
            }
        }

        self.notify.tick(now_ms);

        if let Some(beep) = self.alerts.check(now_ms, cfg, self.glucose.reading()) {
            event!(self.events, now_ms, Warn, "alert: glucose {}", self.glucose.reading().value);
            self.buzzer.beep(beep, now_ms, tone);
        }
    }

    fn handle_button<O: ToneOutput>(
        &mut self,
        event: ButtonEvent,
        now_ms: u64,
        tone: &mut O,
    ) {
        if self.buzzer.is_active() {
            self.buzzer.stop(tone);
            debug!("button: buzzer silenced");
        }

        let view = self.engine.user_mode();
        match (event.button, event.press) {
            (Button::Left, Press::Short) => {
                self.engine.advance(now_ms);
            }
            (Button::Left, Press::Long) => self.go_home(now_ms),
            (Button::Middle, Press::Short) => {
                let level = next_brightness_step(self.config.get().brightness);
                self.config.set_manual_brightness(level);
                self.config_dirty = true;
                event!(self.events, now_ms, Info, "button: brightness {level}");
            }
            (Button::Middle, Press::Long) => {
                self.snooze_alerts(now_ms);
                self.buzzer.stop(tone);
            }
            (Button::Right, Press::Short) => match view {
                DisplayState::Timer => self.timer.toggle(now_ms, &timer_plan(self.config.get())),
                DisplayState::Stopwatch => self.stopwatch.toggle(now_ms),
                _ => {
                    self.engine.retreat(now_ms);
                }
            },
            (Button::Right, Press::Long) => match view {
                DisplayState::Timer => self.timer.reset(),
                DisplayState::Stopwatch => self.stopwatch.reset(),
                _ => self.go_home(now_ms),
            },
        }
    }

    /// Drop every override and return to the glucose screen.
    fn go_home(
        &mut self,
        now_ms: u64,
    ) {
        self.engine.clear_forced_state();
        self.engine.set_default_mode(DisplayState::Glucose, now_ms);
        event!(self.events, now_ms, Info, "button: overrides cleared");
    }

    fn freshness(
        &self,
        now_ms: u64,
    ) -> Freshness {
        let cfg = self.config.get();
        classify(&FreshnessInput {
            age_ms: self.glucose.time_since_last_success(now_ms),
            consecutive_failures: self.glucose.failure_count(),
            ever_received: self.glucose.has_ever_received(),
            server_configured: cfg.has_server(),
            since_boot_ms: now_ms.saturating_sub(self.boot_ms),
            stale_timeout_ms: cfg.stale_timeout_ms(),
        })
    }

    /// Select the state for this frame and draw it.
    fn render(
        &mut self,
        now_ms: u64,
    ) {
        let freshness = self.freshness(now_ms);
        let cfg = self.config.get();
        let before = self.engine.state();
        let state = self.engine.step(&EngineInputs {
            now_ms,
            config: cfg,
            wifi_connected: self.wifi.is_connected(),
            freshness,
            notification_active: self.notify.has_active(),
            reading: self.glucose.reading(),
        });
        if state != before {
            self.events.record(LogLevel::Info, now_ms, format_args!("state: {}", state.name()));
        }

        let plan = timer_plan(cfg);
        let message: String<MESSAGE_LEN> = bounded(self.engine.message_text(self.glucose.reading()));
        let weather = self.weather.reading();
        let ctx = RenderContext {
            now_ms,
            config: cfg,
            clock: self.clock.as_ref(),
            brightness: effective_brightness(cfg, self.clock.as_ref(), self.sensors.auto_brightness()),
            glucose: self.glucose.reading(),
            delta: self.glucose.delta(),
            soft_stale: freshness == Freshness::SoftStale,
            weather: if self.weather.has_data() { Some(weather) } else { None },
            timer: TimerView {
                state: self.timer.state(),
                in_break: self.timer.in_break(),
                remaining_secs: self.timer.remaining_secs(now_ms, &plan),
            },
            stopwatch: StopwatchView {
                state: self.stopwatch.state(),
                elapsed_secs: self.stopwatch.elapsed_secs(now_ms),
            },
            sysmon: if self.sysmon.has_data(now_ms) { Some(&self.sysmon) } else { None },
            countdown_secs: countdown::remaining_secs(cfg.countdown_target, self.clock.as_ref()),
            notification: self.notify.current(),
            message: &message,
        };

        self.brightness = self.engine.render(&mut self.frame, &ctx);
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Current display state.
    #[inline]
    pub const fn state(&self) -> DisplayState { self.engine.state() }

    #[inline]
    pub const fn state_name(&self) -> &'static str { self.engine.state().name() }

    /// Live configuration record (secrets unmasked).
    #[inline]
    pub const fn config(&self) -> &Config { self.config.get() }

    /// Apply a patch. Persisting and WiFi reconnection follow on the next tick.
    pub fn update_config(
        &mut self,
        now_ms: u64,
        patch: &ConfigPatch,
    ) -> ConfigChanges {
        let changes = self.config.update(patch);
        let cfg = self.config.get();

        self.schedule.set_period(Task::GlucosePoll, cfg.poll_interval_ms());
        self.schedule.set_period(Task::WeatherPoll, cfg.weather_poll_ms());
        if changes.default_mode {
            self.engine.set_default_mode(DisplayState::from_default_mode(cfg.default_mode), now_ms);
        }
        if changes.share {
            self.glucose.invalidate_session();
        }
        self.engine.rebuild_toggle_order(cfg, self.sysmon.has_data(now_ms));

        self.wifi_dirty |= changes.wifi;
        self.config_dirty = true;
        event!(self.events, now_ms, Info, "config: updated");
        changes
    }

    /// Parse a JSON body and apply it.
    pub fn update_config_json(
        &mut self,
        now_ms: u64,
        body: &str,
    ) -> Result<ConfigChanges, ConfigError> {
        let patch = ConfigPatch::from_json(body).inspect_err(|err| warn!("config: rejected patch: {err}"))?;
        Ok(self.update_config(now_ms, &patch))
    }

    /// Restore factory defaults and persist them on the next tick.
    pub fn factory_reset(
        &mut self,
        now_ms: u64,
    ) {
        self.config.reset();
        self.wifi_dirty = true;
        self.config_dirty = true;
        let cfg = self.config.get();
        self.engine.set_default_mode(DisplayState::from_default_mode(cfg.default_mode), now_ms);
        self.engine.rebuild_toggle_order(cfg, self.sysmon.has_data(now_ms));
        self.glucose.invalidate_session();
        event!(self.events, now_ms, Warn, "config: factory reset");
    }

    pub fn force_display_state(
        &mut self,
        state: DisplayState,
    ) {
        self.engine.force_state(state);
    }

    pub fn clear_forced_state(&mut self) { self.engine.clear_forced_state(); }

    /// Show `text` on the MESSAGE screen until cleared with an empty string.
    pub fn set_message(
        &mut self,
        text: &str,
    ) {
        self.engine.set_message(text);
    }

    /// Queue a notification. A zero duration uses the configured default.
    pub fn push_notification(
        &mut self,
        now_ms: u64,
        text: &str,
        duration_secs: u32,
        urgent: bool,
    ) {
        let cfg = self.config.get();
        let duration = if duration_secs == 0 { cfg.notify_default_duration } else { duration_secs };
        self.notify.push(text, duration, urgent, now_ms);
        if urgent && cfg.notify_allow_buzzer {
            self.pending_beep = Some(URGENT_BEEP);
        }
    }

    pub fn dismiss_notifications(&mut self) { self.notify.dismiss(); }

    pub fn push_sysmon_metric(
        &mut self,
        now_ms: u64,
        label: &str,
        value: i32,
        max: i32,
    ) {
        self.sysmon.push(label, value, max, now_ms);
    }

    pub fn advance_display_mode(
        &mut self,
        now_ms: u64,
    ) -> DisplayState {
        self.engine.advance(now_ms)
    }

    pub fn retreat_display_mode(
        &mut self,
        now_ms: u64,
    ) -> DisplayState {
        self.engine.retreat(now_ms)
    }

    /// Snooze alerts and cut any burst in progress.
    pub fn snooze_alerts(
        &mut self,
        now_ms: u64,
    ) {
        self.alerts.snooze(now_ms, self.config.get());
        self.silence_pending = true;
        self.events.record(LogLevel::Info, now_ms, format_args!("alerts: snoozed"));
    }

    /// Inject a weather reading without a network fetch.
    pub fn set_mock_weather(
        &mut self,
        now_ms: u64,
        temp: f32,
        description: &str,
        condition_id: i32,
    ) {
        self.weather.set_mock(temp, description, condition_id, now_ms);
    }

    #[inline]
    pub const fn glucose_reading(&self) -> &GlucoseReading { self.glucose.reading() }

    #[inline]
    pub const fn weather_reading(&self) -> &WeatherReading { self.weather.reading() }

    #[inline]
    pub const fn failure_count(&self) -> u32 { self.glucose.failure_count() }

    /// Age of the last valid reading.
    pub fn time_since_last_success(
        &self,
        now_ms: u64,
    ) -> Option<u64> {
        self.glucose.time_since_last_success(now_ms)
    }

    /// Up to `max` most recent history entries, oldest first.
    pub fn history(
        &self,
        max: usize,
    ) -> AllocVec<HistoryEntry> {
        self.glucose.history().recent(max).copied().collect()
    }

    pub fn history_json(
        &self,
        max: usize,
    ) -> AllocString {
        serde_json::to_string(&self.history(max)).unwrap_or_default()
    }

    /// Serializable snapshot of the whole device.
    pub fn diagnostics(
        &self,
        now_ms: u64,
    ) -> Diagnostics<'_> {
        let reading = self.glucose.reading();
        let weather = self.weather.reading();
        Diagnostics {
            state: self.engine.state().name(),
            user_mode: self.engine.user_mode().name(),
            forced_state: self.engine.forced_state().map(DisplayState::name),
            failure_count: self.glucose.failure_count(),
            last_response_code: self.glucose.last_response_code(),
            last_response_body: self.glucose.last_response_body(),
            ever_received: self.glucose.has_ever_received(),
            data_age_ms: self.glucose.time_since_last_success(now_ms),
            glucose: reading.value,
            trend: reading.trend,
            delta: self.glucose.delta(),
            weather_temp: weather.valid.then_some(weather.temp),
            weather_description: weather.description.as_str(),
            wifi: self.wifi.status().name(),
            brightness: self.brightness,
            ldr_average: self.sensors.ldr_average(),
            battery_volts: self.sensors.battery_volts(),
            battery_percent: self.sensors.battery_percent(),
            alerts_snoozed: self.alerts.is_snoozed(now_ms),
            uptime_ms: now_ms.saturating_sub(self.boot_ms),
            events: self.events.iter().collect(),
        }
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Last rendered frame.
    #[inline]
    pub const fn frame(&self) -> &Frame { &self.frame }

    /// Brightness the last frame should be shown at.
    #[inline]
    pub const fn brightness(&self) -> u8 { self.brightness }

    #[inline]
    pub const fn events(&self) -> &EventLog { &self.events }

    #[inline]
    pub const fn wifi(&self) -> &WifiManager { &self.wifi }

    #[inline]
    pub const fn buzzer_active(&self) -> bool { self.buzzer.is_active() }
}

// =============================================================================
// Unit Tests
// =============================================================================
