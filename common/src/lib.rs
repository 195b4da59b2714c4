//! Display and state engine for the SugarClock CGM matrix clock.
//!
//! This crate holds everything that does not touch hardware, shared by the
//! desktop simulator and the device firmware:
//!
//! - [`device`]: the facade that owns every component and runs the tick
//! - [`display`]: state selection, navigation and 32x8 rendering
//! - [`freshness`]: data health classification (fresh, stale, no data)
//! - [`source`]: glucose and weather client state machines
//! - [`config`]: persisted configuration record and patches
//! - [`timer`], [`notify`], [`sysmon`], [`countdown`]: auxiliary screens
//! - [`alerts`], [`buzzer`]: out-of-range alerting and tone sequencing
//! - [`button`], [`sensors`], [`brightness`]: input and panel policy
//! - [`scheduler`]: cooperative periodic gates
//! - [`log_buffer`]: on-device event log for diagnostics
//!
//! Hardware is reached only through collaborator traits ([`source::Transport`],
//! [`wifi::WifiRadio`], [`buzzer::ToneOutput`], [`config::ConfigStore`],
//! [`clock::TimeSource`]).
//!
//! # no_std Compatibility
//!
//! The crate is `no_std` with `alloc`. Unit tests run on the host.

#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

extern crate alloc;

pub mod alerts;
pub mod brightness;
pub mod button;
pub mod buzzer;
pub mod clock;
pub mod colors;
pub mod config;
pub mod countdown;
pub mod device;
pub mod diagnostics;
pub mod display;
pub mod freshness;
pub mod log_buffer;
pub mod notify;
pub mod reading;
pub mod scheduler;
pub mod sensors;
pub mod source;
pub mod sysmon;
pub mod text;
pub mod theme;
pub mod thresholds;
pub mod timer;
pub mod wifi;

// Re-export commonly used items
pub use config::{Config, ConfigManager, ConfigPatch};
pub use device::{Device, Peripherals, TickInputs};
pub use display::{DisplayState, Frame};
