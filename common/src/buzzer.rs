//! Non-blocking beep sequencer.
//!
//! `beep(count, freq, duration)` starts the first tone right away; every
//! later transition (tone off, gap, next tone) happens inside
//! [`Buzzer::tick`] by comparing timestamps. Nothing here ever sleeps.

use log::debug;

/// Silence between consecutive beeps of one burst.
pub const BEEP_GAP_MS: u64 = 150;

/// PWM tone collaborator.
pub trait ToneOutput {
    /// Start a square wave at `freq_hz`.
    fn tone(
        &mut self,
        freq_hz: u32,
    );

    /// Stop any output.
    fn silence(&mut self);
}

/// A burst request: `count` beeps of `duration_ms` at `freq_hz`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Beep {
    pub count: u8,
    pub freq_hz: u32,
    pub duration_ms: u64,
}

impl Beep {
    pub const fn new(
        count: u8,
        freq_hz: u32,
        duration_ms: u64,
    ) -> Self {
        Self {
            count,
            freq_hz,
            duration_ms,
        }
    }
}

/// Single out-of-range alert.
pub const ALERT_BEEP: Beep = Beep::new(1, 2000, 200);

/// Urgent notification.
pub const URGENT_BEEP: Beep = Beep::new(2, 2500, 150);

/// Pomodoro phase change.
pub const TIMER_BEEP: Beep = Beep::new(3, 2000, 200);

/// Sequencer state.
pub struct Buzzer {
    remaining: u8,
    freq_hz: u32,
    duration_ms: u64,
    phase_start_ms: u64,
    on: bool,
}

impl Buzzer {
    pub const fn new() -> Self {
        Self {
            remaining: 0,
            freq_hz: 2000,
            duration_ms: 200,
            phase_start_ms: 0,
            on: false,
        }
    }

    /// Start a burst, replacing whatever was playing. The first tone starts now.
    pub fn beep<O: ToneOutput>(
        &mut self,
        beep: Beep,
        now_ms: u64,
        out: &mut O,
    ) {
        if beep.count == 0 {
            return;
        }
        debug!("buzzer: {}x {}Hz {}ms", beep.count, beep.freq_hz, beep.duration_ms);
        self.remaining = beep.count;
        self.freq_hz = beep.freq_hz;
        self.duration_ms = beep.duration_ms;
        out.tone(self.freq_hz);
        self.on = true;
        self.phase_start_ms = now_ms;
    }

    /// Advance the sequence. Cheap no-op when idle.
    pub fn tick<O: ToneOutput>(
        &mut self,
        now_ms: u64,
        out: &mut O,
    ) {
        if self.remaining == 0 {
            return;
        }
        let elapsed = now_ms.saturating_sub(self.phase_start_ms);
        if self.on {
            if elapsed >= self.duration_ms {
                out.silence();
                self.on = false;
                self.remaining -= 1;
                self.phase_start_ms = now_ms;
            }
        } else if elapsed >= BEEP_GAP_MS {
            out.tone(self.freq_hz);
            self.on = true;
            self.phase_start_ms = now_ms;
        }
    }

    /// Silence immediately and drop any pending beeps.
    pub fn stop<O: ToneOutput>(
        &mut self,
        out: &mut O,
    ) {
        out.silence();
        self.on = false;
        self.remaining = 0;
    }

    /// A tone is sounding or more are pending.
    #[inline]
    pub const fn is_active(&self) -> bool { self.remaining > 0 || self.on }
}

impl Default for Buzzer {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Unit Tests
// =============================================================================
