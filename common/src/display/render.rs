//! Per-state frame rendering.
//!
//! Every state has a defined picture for missing or invalid inputs, so
//! rendering never fails and never leaves the panel blank by accident.

use core::fmt::Write;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use heapless::String;

use super::glyphs::{GLYPH_ADVANCE, centered_x, draw_bar, draw_centered, draw_text, draw_trend, text_width};
use super::weather_fx::WeatherFx;
use super::{DisplayState, MATRIX_WIDTH};
use crate::brightness::dimmed;
use crate::clock::WallClock;
use crate::colors::{BLACK, CYAN, GRAY, GREEN, ORANGE, RED, TEAL, WHITE, YELLOW, from_packed};
use crate::config::{Config, DateFormat, SysmonStyle};
use crate::countdown::CountdownView;
use crate::notify::Notification;
use crate::reading::{GlucoseReading, WeatherReading};
use crate::sysmon::Sysmon;
use crate::theme::themed_color;
use crate::thresholds::{DATE_ALTERNATE_MS, DELTA_FLASH_MS, FAULT_ALTERNATE_MS, PAUSE_BLINK_MS, SCROLL_STEP_MS};
use crate::timer::{StopwatchState, TimerState};

/// mg/dL per mmol/L.
const MGDL_PER_MMOL: f32 = 18.0182;

/// Longest text shown centered; anything longer scrolls.
const MAX_STATIC_CHARS: usize = 5;

/// Boot splash text.
const SPLASH: &str = "TC001";

type Label = String<16>;

fn label(args: core::fmt::Arguments<'_>) -> Label {
    let mut out = Label::new();
    out.write_fmt(args).ok();
    out
}

// =============================================================================
// Render Inputs
// =============================================================================

/// Snapshot of the pomodoro timer.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TimerView {
    pub state: TimerState,
    /// A break is running or paused.
    pub in_break: bool,
    pub remaining_secs: u64,
}

/// Snapshot of the stopwatch.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct StopwatchView {
    pub state: StopwatchState,
    pub elapsed_secs: u64,
}

/// Everything a frame may show, borrowed from the components for one render.
pub struct RenderContext<'a> {
    pub now_ms: u64,
    pub config: &'a Config,
    pub clock: Option<&'a WallClock>,
    /// Brightness from the night/auto/manual policy.
    pub brightness: u8,
    pub glucose: &'a GlucoseReading,
    pub delta: i32,
    pub soft_stale: bool,
    /// `None` until a valid weather reading exists.
    pub weather: Option<&'a WeatherReading>,
    pub timer: TimerView,
    pub stopwatch: StopwatchView,
    /// `None` while the feed is stale.
    pub sysmon: Option<&'a Sysmon>,
    pub countdown_secs: i64,
    pub notification: Option<&'a Notification>,
    /// Message text for the MESSAGE state.
    pub message: &'a str,
}

impl RenderContext<'_> {
    fn glucose_color(&self) -> Rgb888 {
        themed_color(self.glucose.value, &self.config.thresholds, &self.config.theme)
    }

    fn glucose_text(&self) -> Label {
        if self.config.use_mmol {
            label(format_args!("{:.1}", self.glucose.value as f32 / MGDL_PER_MMOL))
        } else {
            label(format_args!("{}", self.glucose.value))
        }
    }

    fn delta_text(&self) -> Label {
        if self.config.use_mmol {
            label(format_args!("{:+.1}", self.delta as f32 / MGDL_PER_MMOL))
        } else {
            label(format_args!("{:+}", self.delta))
        }
    }
}

// =============================================================================
// Delta Flash
// =============================================================================

/// Remembers the last value shown so a change can flash its delta.
struct DeltaFlash {
    last_seen: i32,
    started_ms: Option<u64>,
}

impl DeltaFlash {
    const fn new() -> Self {
        Self {
            last_seen: 0,
            started_ms: None,
        }
    }

    /// Returns true while the delta should replace the number.
    fn update(
        &mut self,
        value: i32,
        enabled: bool,
        now_ms: u64,
    ) -> bool {
        if value != self.last_seen {
            if enabled && self.last_seen > 0 {
                self.started_ms = Some(now_ms);
            }
            self.last_seen = value;
        }
        match self.started_ms {
            Some(at) if now_ms.saturating_sub(at) < DELTA_FLASH_MS => true,
            _ => {
                self.started_ms = None;
                false
            }
        }
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Draws one state per frame. Holds the little animation state that spans frames.
pub struct Renderer {
    delta_flash: DeltaFlash,
    weather_fx: WeatherFx,
}

impl Renderer {
    pub fn new(seed: u64) -> Self {
        Self {
            delta_flash: DeltaFlash::new(),
            weather_fx: WeatherFx::new(seed),
        }
    }

    /// Draw `state` and return the brightness the panel should use for it.
    pub fn render<D>(
        &mut self,
        display: &mut D,
        state: DisplayState,
        ctx: &RenderContext<'_>,
    ) -> u8
    where
        D: DrawTarget<Color = Rgb888>,
    {
        display.clear(BLACK).ok();
        match state {
            DisplayState::Boot => draw_text(display, SPLASH, 1, 0, TEAL),
            DisplayState::Glucose => return self.draw_glucose(display, ctx),
            DisplayState::Time => draw_time(display, ctx),
            DisplayState::Weather => self.draw_weather(display, ctx),
            DisplayState::Timer => draw_timer(display, ctx),
            DisplayState::Stopwatch => draw_stopwatch(display, ctx),
            DisplayState::Sysmon => draw_sysmon(display, ctx),
            DisplayState::Countdown => draw_countdown(display, ctx),
            DisplayState::Trend => draw_trend_view(display, ctx),
            DisplayState::Message => draw_scrolling(display, ctx.message, ctx.now_ms, WHITE),
            DisplayState::Notify => match ctx.notification {
                Some(n) => draw_scrolling(display, &n.text, ctx.now_ms, if n.urgent { RED } else { WHITE }),
                None => draw_text(display, "---", 7, 0, GRAY),
            },
            DisplayState::Stale => draw_centered(display, "STALE", YELLOW),
            DisplayState::NoData => draw_fault(display, "DATA", ctx.now_ms),
            DisplayState::NoWifi => draw_fault(display, "WIFI", ctx.now_ms),
            DisplayState::NoConfig => draw_text(display, "SETUP", 1, 0, WHITE),
        }
        ctx.brightness
    }

    fn draw_glucose<D>(
        &mut self,
        display: &mut D,
        ctx: &RenderContext<'_>,
    ) -> u8
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let reading = ctx.glucose;
        if !reading.valid {
            draw_text(display, "---", 7, 0, GRAY);
            return ctx.brightness;
        }

        let color = ctx.glucose_color();
        let brightness = if ctx.soft_stale { dimmed(ctx.brightness) } else { ctx.brightness };

        if self.delta_flash.update(reading.value, ctx.config.show_delta, ctx.now_ms) {
            draw_centered(display, &ctx.delta_text(), color);
            return brightness;
        }

        // Number and arrow are centered together; the arrow gets one 6px cell.
        let text = ctx.glucose_text();
        let x = (MATRIX_WIDTH as i32 - (text_width(&text) + GLYPH_ADVANCE)) / 2;
        draw_text(display, &text, x, 0, color);
        draw_trend(display, reading.trend, x + text_width(&text) + 1, 0, color);

        if ctx.soft_stale {
            draw_text(display, "!", MATRIX_WIDTH as i32 - 4, 0, YELLOW);
        }
        brightness
    }

    fn draw_weather<D>(
        &mut self,
        display: &mut D,
        ctx: &RenderContext<'_>,
    ) where
        D: DrawTarget<Color = Rgb888>,
    {
        let Some(wx) = ctx.weather else {
            draw_text(display, "WX...", 4, 0, TEAL);
            return;
        };
        self.weather_fx.update(ctx.now_ms, wx.condition);
        self.weather_fx.draw(display, ctx.now_ms);

        let unit = if ctx.config.weather_use_f { 'F' } else { 'C' };
        let temp = micromath::F32(wx.temp).round().0 as i32;
        let text = label(format_args!("{temp}*{unit}"));
        // Dark text stays readable on a thunder flash.
        let color = if self.weather_fx.is_flashing(ctx.now_ms) { BLACK } else { from_packed(ctx.config.weather_color) };
        draw_centered(display, &text, color);
    }
}

// =============================================================================
// Stateless Screens
// =============================================================================

fn draw_time<D>(
    display: &mut D,
    ctx: &RenderContext<'_>,
) where
    D: DrawTarget<Color = Rgb888>,
{
    let Some(clock) = ctx.clock else {
        draw_text(display, "--:--", 4, 0, GRAY);
        return;
    };
    let cfg = ctx.config;
    let color = from_packed(cfg.clock_color);

    if cfg.date_on_time_screen && (ctx.now_ms / DATE_ALTERNATE_MS) % 2 == 1 {
        let text = match cfg.date_format {
            DateFormat::MonthDay => label(format_args!("{}/{}", clock.month, clock.day)),
            DateFormat::MonthNameDay => label(format_args!("{}{}", clock.month_abbrev(), clock.day)),
            DateFormat::DayMonth => label(format_args!("{}/{}", clock.day, clock.month)),
        };
        draw_centered(display, &text, color);
        return;
    }

    let separator = if clock.second % 2 == 0 { ':' } else { ' ' };
    let text = label(format_args!("{}{separator}{:02}", clock.display_hour(cfg.use_24h), clock.minute));
    draw_centered(display, &text, color);
}

/// Blink phase for paused counters.
const fn blink_off(now_ms: u64) -> bool { (now_ms / PAUSE_BLINK_MS) % 2 == 0 }

fn draw_timer<D>(
    display: &mut D,
    ctx: &RenderContext<'_>,
) where
    D: DrawTarget<Color = Rgb888>,
{
    let timer = ctx.timer;
    if timer.state == TimerState::Done {
        draw_text(display, "DONE!", 1, 0, GREEN);
        return;
    }
    if timer.state == TimerState::Paused && blink_off(ctx.now_ms) {
        return;
    }
    let (mm, ss) = (timer.remaining_secs / 60, timer.remaining_secs % 60);
    if timer.in_break {
        draw_centered(display, &label(format_args!("B{mm}:{ss:02}")), TEAL);
    } else {
        draw_centered(display, &label(format_args!("{mm}:{ss:02}")), ORANGE);
    }
}

fn draw_stopwatch<D>(
    display: &mut D,
    ctx: &RenderContext<'_>,
) where
    D: DrawTarget<Color = Rgb888>,
{
    let sw = ctx.stopwatch;
    if sw.state == StopwatchState::Paused && blink_off(ctx.now_ms) {
        return;
    }
    let mm = (sw.elapsed_secs / 60).min(99);
    let ss = sw.elapsed_secs % 60;
    draw_centered(display, &label(format_args!("{mm:02}:{ss:02}")), GREEN);
}

fn draw_sysmon<D>(
    display: &mut D,
    ctx: &RenderContext<'_>,
) where
    D: DrawTarget<Color = Rgb888>,
{
    let Some(sysmon) = ctx.sysmon else {
        draw_text(display, "SYS..", 1, 0, GRAY);
        return;
    };
    let cfg = ctx.config;
    let pct = sysmon.percent();
    let color = if pct >= i32::from(cfg.sysmon_crit_pct) {
        RED
    } else if pct >= i32::from(cfg.sysmon_warn_pct) {
        YELLOW
    } else {
        GREEN
    };

    match cfg.sysmon_display_mode {
        SysmonStyle::Bar => {
            draw_bar(display, sysmon.value(), sysmon.max(), color);
            draw_text(display, sysmon.label(), 1, 0, color);
        }
        SysmonStyle::Text => {
            draw_centered(display, &label(format_args!("{}{}", sysmon.label(), sysmon.value())), color);
        }
    }
}

fn draw_countdown<D>(
    display: &mut D,
    ctx: &RenderContext<'_>,
) where
    D: DrawTarget<Color = Rgb888>,
{
    match CountdownView::from_remaining(ctx.countdown_secs) {
        CountdownView::Elapsed => draw_text(display, "NOW!", 4, 0, GREEN),
        CountdownView::HoursMinutes { hours, minutes } => {
            draw_centered(display, &label(format_args!("{hours}:{minutes:02}")), ORANGE);
        }
        CountdownView::Days(days) => draw_centered(display, &label(format_args!("{days} D")), CYAN),
    }
}

/// Arrow followed by the signed delta.
fn draw_trend_view<D>(
    display: &mut D,
    ctx: &RenderContext<'_>,
) where
    D: DrawTarget<Color = Rgb888>,
{
    if !ctx.glucose.valid {
        draw_text(display, "---", 7, 0, GRAY);
        return;
    }
    let color = ctx.glucose_color();
    let text = ctx.delta_text();
    let x = (MATRIX_WIDTH as i32 - (GLYPH_ADVANCE + 1 + text_width(&text))) / 2;
    draw_trend(display, ctx.glucose.trend, x, 0, color);
    draw_text(display, &text, x + GLYPH_ADVANCE + 1, 0, color);
}

/// Short text is centered; longer text scrolls right to left and wraps.
fn draw_scrolling<D>(
    display: &mut D,
    text: &str,
    now_ms: u64,
    color: Rgb888,
) where
    D: DrawTarget<Color = Rgb888>,
{
    if text.is_empty() {
        draw_text(display, "---", 7, 0, GRAY);
        return;
    }
    if text.chars().count() <= MAX_STATIC_CHARS {
        draw_text(display, text, centered_x(text), 0, color);
        return;
    }
    let span = (text_width(text) + MATRIX_WIDTH as i32) as u64;
    let offset = ((now_ms / SCROLL_STEP_MS) % span) as i32;
    draw_text(display, text, MATRIX_WIDTH as i32 - offset, 0, color);
}

/// "NO" alternating with a second word.
fn draw_fault<D>(
    display: &mut D,
    word: &str,
    now_ms: u64,
) where
    D: DrawTarget<Color = Rgb888>,
{
    if (now_ms / FAULT_ALTERNATE_MS) % 2 == 0 {
        draw_text(display, "NO", 10, 0, RED);
    } else {
        draw_text(display, word, 4, 0, RED);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Frame;
    use crate::reading::{Trend, WeatherCondition};
    use crate::text::bounded;

    struct Fixture {
        config: Config,
        glucose: GlucoseReading,
        clock: Option<WallClock>,
        weather: Option<WeatherReading>,
        sysmon: Sysmon,
        sysmon_live: bool,
        notification: Option<Notification>,
        timer: TimerView,
        stopwatch: StopwatchView,
        countdown_secs: i64,
        delta: i32,
        soft_stale: bool,
        message: &'static str,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                config: Config::default(),
                glucose: GlucoseReading::new(120, Trend::Flat, 0),
                clock: None,
                weather: None,
                sysmon: Sysmon::new(),
                sysmon_live: false,
                notification: None,
                timer: TimerView::default(),
                stopwatch: StopwatchView::default(),
                countdown_secs: 0,
                delta: 0,
                soft_stale: false,
                message: "",
            }
        }

        fn ctx(
            &self,
            now_ms: u64,
        ) -> RenderContext<'_> {
            RenderContext {
                now_ms,
                config: &self.config,
                clock: self.clock.as_ref(),
                brightness: 90,
                glucose: &self.glucose,
                delta: self.delta,
                soft_stale: self.soft_stale,
                weather: self.weather.as_ref(),
                timer: self.timer,
                stopwatch: self.stopwatch,
                sysmon: self.sysmon_live.then_some(&self.sysmon),
                countdown_secs: self.countdown_secs,
                notification: self.notification.as_ref(),
                message: self.message,
            }
        }

        fn render(
            &self,
            state: DisplayState,
            now_ms: u64,
        ) -> (Frame, u8) {
            let mut renderer = Renderer::new(1);
            let mut frame = Frame::new();
            let brightness = renderer.render(&mut frame, state, &self.ctx(now_ms));
            (frame, brightness)
        }
    }

    fn clock(
        hour: u8,
        minute: u8,
        second: u8,
    ) -> WallClock {
        WallClock {
            hour,
            minute,
            second,
            day: 5,
            month: 3,
            year: 2026,
            unix: 0,
        }
    }

    #[test]
    fn test_every_state_renders_something() {
        let fx = Fixture::new();
        for state in DisplayState::ALL {
            // Message and notify fall back to a placeholder when empty.
            let (frame, _) = fx.render(state, 2_500);
            assert!(frame.lit_count() > 0, "{} rendered blank", state.name());
        }
    }

    #[test]
    fn test_glucose_uses_theme_color_and_arrow() {
        let fx = Fixture::new();
        let (frame, brightness) = fx.render(DisplayState::Glucose, 0);
        let in_range = from_packed(fx.config.theme.in_range);
        assert!(frame.contains_color(in_range));
        assert_eq!(brightness, 90);
        // "120" + arrow cell = 24px wide, centered at x=4; flat arrow shaft at x=23..27 row 3.
        assert!((23..28).all(|x| frame.pixel(x, 3) == in_range));
    }

    #[test]
    fn test_urgent_low_is_red_band() {
        let mut fx = Fixture::new();
        fx.glucose = GlucoseReading::new(45, Trend::Falling, 0);
        let (frame, _) = fx.render(DisplayState::Glucose, 0);
        assert!(frame.contains_color(from_packed(fx.config.theme.urgent_low)));
    }

    #[test]
    fn test_invalid_glucose_shows_dashes() {
        let mut fx = Fixture::new();
        fx.glucose = GlucoseReading::default();
        let (frame, _) = fx.render(DisplayState::Glucose, 0);
        assert!(frame.contains_color(GRAY));
        assert_eq!(frame.lit_columns().map(|(first, _)| first >= 7), Some(true));
    }

    #[test]
    fn test_soft_stale_dims_and_marks() {
        let mut fx = Fixture::new();
        fx.soft_stale = true;
        let (frame, brightness) = fx.render(DisplayState::Glucose, 0);
        assert_eq!(brightness, 30);
        assert!(frame.contains_color(YELLOW));
        // Number is still shown.
        assert!(frame.contains_color(from_packed(fx.config.theme.in_range)));
    }

    #[test]
    fn test_delta_flash_after_change() {
        let mut fx = Fixture::new();
        fx.config.show_delta = true;
        let mut renderer = Renderer::new(1);
        let mut frame = Frame::new();
        renderer.render(&mut frame, DisplayState::Glucose, &fx.ctx(0));
        let number = frame.clone();

        fx.glucose = GlucoseReading::new(130, Trend::Flat, 0);
        fx.delta = 10;
        renderer.render(&mut frame, DisplayState::Glucose, &fx.ctx(1_000));
        let flashing = frame.clone();
        assert_ne!(flashing, number);
        // "+10" centered, no arrow: nothing right of column 25.
        assert!(flashing.lit_columns().unwrap().1 < 25);

        renderer.render(&mut frame, DisplayState::Glucose, &fx.ctx(4_000));
        assert!(frame.lit_columns().unwrap().1 >= 25);
    }

    #[test]
    fn test_no_delta_flash_when_disabled() {
        let mut fx = Fixture::new();
        let mut renderer = Renderer::new(1);
        let mut frame = Frame::new();
        renderer.render(&mut frame, DisplayState::Glucose, &fx.ctx(0));
        fx.glucose = GlucoseReading::new(130, Trend::Flat, 0);
        renderer.render(&mut frame, DisplayState::Glucose, &fx.ctx(1_000));
        assert!(frame.lit_columns().unwrap().1 >= 25);
    }

    #[test]
    fn test_mmol_text() {
        let mut fx = Fixture::new();
        fx.config.use_mmol = true;
        fx.glucose = GlucoseReading::new(180, Trend::Flat, 0);
        let ctx = fx.ctx(0);
        assert_eq!(ctx.glucose_text().as_str(), "10.0");
        assert_eq!(ctx.delta_text().as_str(), "+0.0");
    }

    #[test]
    fn test_time_without_clock() {
        let fx = Fixture::new();
        let (frame, _) = fx.render(DisplayState::Time, 0);
        assert!(frame.contains_color(GRAY));
    }

    #[test]
    fn test_time_colon_blinks() {
        let mut fx = Fixture::new();
        fx.config.date_on_time_screen = false;
        fx.clock = Some(clock(9, 5, 0));
        let (with_colon, _) = fx.render(DisplayState::Time, 0);
        fx.clock = Some(clock(9, 5, 1));
        let (without_colon, _) = fx.render(DisplayState::Time, 0);
        assert!(with_colon.lit_count() > without_colon.lit_count());
        assert!(with_colon.contains_color(from_packed(fx.config.clock_color)));
    }

    #[test]
    fn test_time_alternates_with_date() {
        let mut fx = Fixture::new();
        fx.clock = Some(clock(9, 5, 0));
        let (time, _) = fx.render(DisplayState::Time, 0);
        let (date, _) = fx.render(DisplayState::Time, 5_000);
        assert_ne!(time, date);
        fx.config.date_on_time_screen = false;
        let (no_date, _) = fx.render(DisplayState::Time, 5_000);
        assert_eq!(time, no_date);
    }

    #[test]
    fn test_weather_placeholder_and_reading() {
        let mut fx = Fixture::new();
        let (frame, _) = fx.render(DisplayState::Weather, 0);
        assert!(frame.contains_color(TEAL));

        fx.weather = Some(WeatherReading {
            temp: 71.6,
            description: bounded("Clear"),
            condition: WeatherCondition::Clear,
            valid: true,
            ..WeatherReading::default()
        });
        let (frame, _) = fx.render(DisplayState::Weather, 0);
        assert!(frame.contains_color(from_packed(fx.config.weather_color)));
        // "72*F" is 24px wide, centered at x=4.
        assert!(frame.lit_columns().unwrap().0 >= 4);
    }

    #[test]
    fn test_timer_views() {
        let mut fx = Fixture::new();
        fx.timer = TimerView {
            state: TimerState::Running,
            in_break: false,
            remaining_secs: 25 * 60,
        };
        let (frame, _) = fx.render(DisplayState::Timer, 0);
        assert!(frame.contains_color(ORANGE));

        fx.timer.in_break = true;
        fx.timer.state = TimerState::Break;
        let (frame, _) = fx.render(DisplayState::Timer, 0);
        assert!(frame.contains_color(TEAL));

        fx.timer.state = TimerState::Done;
        let (frame, _) = fx.render(DisplayState::Timer, 0);
        assert!(frame.contains_color(GREEN));
    }

    #[test]
    fn test_paused_counters_blink() {
        let mut fx = Fixture::new();
        fx.timer.state = TimerState::Paused;
        fx.timer.remaining_secs = 600;
        assert_eq!(fx.render(DisplayState::Timer, 0).0.lit_count(), 0);
        assert!(fx.render(DisplayState::Timer, 500).0.lit_count() > 0);

        fx.stopwatch = StopwatchView {
            state: StopwatchState::Paused,
            elapsed_secs: 75,
        };
        assert_eq!(fx.render(DisplayState::Stopwatch, 1_000).0.lit_count(), 0);
        assert!(fx.render(DisplayState::Stopwatch, 1_500).0.lit_count() > 0);
    }

    #[test]
    fn test_sysmon_colors_and_bar() {
        let mut fx = Fixture::new();
        let (frame, _) = fx.render(DisplayState::Sysmon, 0);
        assert!(frame.contains_color(GRAY));

        fx.sysmon_live = true;
        fx.sysmon.push("CPU", 90, 100, 0);
        let (frame, _) = fx.render(DisplayState::Sysmon, 0);
        assert!(frame.contains_color(RED));

        fx.sysmon.push("CPU", 60, 100, 0);
        fx.config.sysmon_display_mode = SysmonStyle::Bar;
        let (frame, _) = fx.render(DisplayState::Sysmon, 0);
        assert!(frame.contains_color(YELLOW));
        assert_eq!(frame.pixel(0, 7), YELLOW);
        assert_eq!(frame.pixel(31, 7), crate::colors::DIM);
    }

    #[test]
    fn test_countdown_views() {
        let mut fx = Fixture::new();
        assert!(fx.render(DisplayState::Countdown, 0).0.contains_color(GREEN));
        fx.countdown_secs = 3 * 3600;
        assert!(fx.render(DisplayState::Countdown, 0).0.contains_color(ORANGE));
        fx.countdown_secs = 3 * 86_400;
        assert!(fx.render(DisplayState::Countdown, 0).0.contains_color(CYAN));
    }

    #[test]
    fn test_long_message_scrolls() {
        let mut fx = Fixture::new();
        fx.message = "HELLO WORLD";
        let (start, _) = fx.render(DisplayState::Message, 0);
        // Offset 0: text starts just off the right edge.
        assert_eq!(start.lit_count(), 0);
        let (later, _) = fx.render(DisplayState::Message, 1_000);
        let (first, _) = later.lit_columns().unwrap();
        assert!((22..24).contains(&first));
        // Wraps after text width + panel width steps.
        let span_ms = (11 * 6 + 32) * 100;
        assert_eq!(fx.render(DisplayState::Message, span_ms).0, start);
    }

    #[test]
    fn test_short_notification_is_centered_and_urgent_red() {
        let mut fx = Fixture::new();
        fx.notification = Some(Notification {
            text: bounded("HI"),
            expires_ms: 10_000,
            urgent: true,
            active: true,
        });
        let (frame, _) = fx.render(DisplayState::Notify, 0);
        assert!(frame.contains_color(RED));
        let (first, last) = frame.lit_columns().unwrap();
        assert!(first >= 10 && last < 22);
    }

    #[test]
    fn test_fault_screens_alternate() {
        let fx = Fixture::new();
        let (no, _) = fx.render(DisplayState::NoWifi, 0);
        let (word, _) = fx.render(DisplayState::NoWifi, 2_000);
        assert_ne!(no, word);
        assert!(no.lit_columns().unwrap().0 >= 10);
        assert!(no.contains_color(RED));
    }

    #[test]
    fn test_stale_word_fits_the_panel() {
        let fx = Fixture::new();
        let (frame, _) = fx.render(DisplayState::Stale, 0);
        assert!(frame.contains_color(YELLOW));
        // Five 6px cells centered on 32 columns: the last E column is x=29.
        assert_eq!(frame.lit_columns(), Some((1, 29)));
    }

    #[test]
    fn test_trend_view() {
        let mut fx = Fixture::new();
        fx.glucose = GlucoseReading::new(200, Trend::Rising, 0);
        fx.delta = 12;
        let (frame, _) = fx.render(DisplayState::Trend, 0);
        assert!(frame.contains_color(from_packed(fx.config.theme.high)));
    }
}
