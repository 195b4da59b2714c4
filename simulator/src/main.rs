//! SugarClock simulator for desktop.
//!
//! Runs the full device tick against fake collaborators and shows the 32x8
//! matrix in an `embedded-graphics-simulator` window.
//!
//! Buttons: Left/A = left, Down/S = middle, Right/D = right (hold for a long
//! press). Other keys:
//!
//! - N / U: push a normal / urgent notification, X: dismiss notifications
//! - M: queue a server message, E: toggle an API message
//! - F: force the next display state, C: clear the forced state
//! - W: toggle WiFi, O: cycle server outage modes
//! - T: cycle weather conditions, Y: toggle the system monitor feed
//! - L / K: brighter / darker room
//! - Z: snooze alerts, G: dump diagnostics, H: dump history
//! - R: factory reset, Escape: quit

// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]

mod feed;
mod host;
mod timing;

use std::thread;
use std::time::Instant;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::sdl2::Keycode;
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window};
use log::info;
use sugarclock_common::button::ButtonLevels;
use sugarclock_common::display::{MATRIX_HEIGHT, MATRIX_WIDTH};
use sugarclock_common::sensors::SensorSample;
use sugarclock_common::{ConfigManager, ConfigPatch, Device, DisplayState, Peripherals, TickInputs};

use crate::feed::{DemoFeed, WEATHER_PRESETS};
use crate::host::{ConsoleTone, LocalClock, MemoryStore, SimRadio};
use crate::timing::{PIXEL_SCALE, PIXEL_SPACING, SYSMON_PERIOD, TICK_TIME};

/// Raw battery reading of a healthy cell (about 3.9V behind the divider).
const BATTERY_RAW: u16 = 2_420;

/// Settings a fresh simulator starts with, so it goes online immediately.
fn demo_patch() -> ConfigPatch {
    ConfigPatch {
        wifi_ssid: Some("SimNet".into()),
        server_url: Some("http://sim.local/glucose".into()),
        weather_enabled: Some(true),
        weather_api_key: Some("demo".into()),
        alert_enabled: Some(true),
        countdown_enabled: Some(true),
        countdown_name: Some("LAUNCH".into()),
        countdown_target: Some(jiff::Timestamp::now().as_second() + 3 * 86_400 / 2),
        ..ConfigPatch::default()
    }
}

/// Map a key to one of the three buttons.
fn set_button(
    levels: &mut ButtonLevels,
    keycode: Keycode,
    down: bool,
) {
    match keycode {
        Keycode::Left | Keycode::A => levels.left = down,
        Keycode::Down | Keycode::S => levels.middle = down,
        Keycode::Right | Keycode::D => levels.right = down,
        _ => {}
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut display: SimulatorDisplay<Rgb888> = SimulatorDisplay::new(Size::new(MATRIX_WIDTH, MATRIX_HEIGHT));
    let output_settings = OutputSettingsBuilder::new().scale(PIXEL_SCALE).pixel_spacing(PIXEL_SPACING).build();
    let mut window = Window::new("SugarClock Sim", &output_settings);

    display.clear(Rgb888::BLACK).ok();
    window.update(&display);

    // Collaborators
    let mut store = MemoryStore::default();
    let mut feed = DemoFeed::new();
    let mut radio = SimRadio::new();
    let mut tone = ConsoleTone::new();
    let mut clock = LocalClock;

    let mut config = ConfigManager::load(&mut store);
    config.update(&demo_patch());
    config.save(&mut store).ok();

    let start = Instant::now();
    let seed = jiff::Timestamp::now().as_millisecond() as u64;
    let mut device = Device::new(0, config, seed);

    // Host state
    let mut buttons = ButtonLevels::default();
    let mut light: u16 = 2_000;
    let mut sysmon_feed = false;
    let mut last_sysmon = Instant::now();
    let mut api_message = false;
    let mut forced_index = 0usize;

    loop {
        let tick_start = Instant::now();
        let now_ms = start.elapsed().as_millis() as u64;

        for ev in window.events() {
            match ev {
                SimulatorEvent::Quit => return,
                SimulatorEvent::KeyUp { keycode, .. } => set_button(&mut buttons, keycode, false),
                SimulatorEvent::KeyDown { keycode, repeat, .. } => {
                    set_button(&mut buttons, keycode, true);
                    if repeat {
                        continue;
                    }
                    match keycode {
                        Keycode::Escape => return,
                        Keycode::N => device.push_notification(now_ms, "HELLO FROM THE SIM", 10, false),
                        Keycode::U => device.push_notification(now_ms, "CALL HOME", 10, true),
                        Keycode::X => device.dismiss_notifications(),
                        Keycode::M => feed.pending_message = Some("EAT A SNACK".to_owned()),
                        Keycode::E => {
                            api_message = !api_message;
                            device.set_message(if api_message { "DRINK WATER" } else { "" });
                        }
                        Keycode::F => {
                            // Skip BOOT
                            forced_index = forced_index % (DisplayState::ALL.len() - 1) + 1;
                            let state = DisplayState::ALL[forced_index];
                            device.force_display_state(state);
                        }
                        Keycode::C => device.clear_forced_state(),
                        Keycode::W => {
                            radio.enabled = !radio.enabled;
                            info!("sim: wifi {}", if radio.enabled { "on" } else { "off" });
                        }
                        Keycode::O => {
                            feed.outage = feed.outage.next();
                            info!("sim: server outage {:?}", feed.outage);
                        }
                        Keycode::T => {
                            feed.weather_preset = (feed.weather_preset + 1) % WEATHER_PRESETS.len();
                            let (id, main, temp) = WEATHER_PRESETS[feed.weather_preset];
                            device.set_mock_weather(now_ms, temp, main, id);
                        }
                        Keycode::Y => {
                            sysmon_feed = !sysmon_feed;
                            info!("sim: sysmon feed {}", if sysmon_feed { "on" } else { "off" });
                        }
                        Keycode::L => light = light.saturating_add(400).min(4095),
                        Keycode::K => light = light.saturating_sub(400),
                        Keycode::Z => device.snooze_alerts(now_ms),
                        Keycode::G => {
                            info!("sim: {}", device.diagnostics(now_ms).to_json());
                            for entry in device.events().iter() {
                                info!("sim: [{}] {:>8} {}", entry.level.prefix(), entry.timestamp_ms, entry.message);
                            }
                        }
                        Keycode::H => info!("sim: history {}", device.history_json(12)),
                        Keycode::R => device.factory_reset(now_ms),
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        if sysmon_feed && last_sysmon.elapsed() >= SYSMON_PERIOD {
            last_sysmon = Instant::now();
            let load = 20 + (now_ms / 700 % 75) as i32;
            device.push_sysmon_metric(now_ms, "CPU", load, 100);
        }

        let inputs = TickInputs {
            buttons,
            sensors: SensorSample {
                ldr_raw: light,
                battery_raw: BATTERY_RAW,
            },
        };
        let mut io = Peripherals {
            transport: &mut feed,
            radio: &mut radio,
            tone: &mut tone,
            store: &mut store,
            clock: &mut clock,
        };
        device.tick(now_ms, inputs, &mut io);

        device.frame().blit(&mut display, device.brightness());
        window.update(&display);

        // Frame timing
        let elapsed = tick_start.elapsed();
        if let Some(rest) = TICK_TIME.checked_sub(elapsed) {
            thread::sleep(rest);
        }
    }
}
