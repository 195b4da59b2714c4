//! Pomodoro timer and stopwatch.
//!
//! Both engines keep start timestamps and accumulated time instead of
//! counting ticks, so the remaining/elapsed values stay exact however often
//! they are polled.

use log::info;

// =============================================================================
// Pomodoro
// =============================================================================

/// Pomodoro phase.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TimerState {
    #[default]
    Idle,
    /// Work period.
    Running,
    Paused,
    Break,
    LongBreak,
    Done,
}

impl TimerState {
    pub const fn is_counting(self) -> bool { matches!(self, Self::Running | Self::Break | Self::LongBreak) }

    /// A short or long break is in progress (or paused).
    pub const fn is_break(self) -> bool { matches!(self, Self::Break | Self::LongBreak) }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Break => "break",
            Self::LongBreak => "long_break",
            Self::Done => "done",
        }
    }
}

/// Period lengths and session count, taken from the configuration.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TimerPlan {
    pub work_min: u32,
    pub break_min: u32,
    pub long_break_min: u32,
    pub sessions: u32,
}

impl TimerPlan {
    const fn work_ms(&self) -> u64 { self.work_min as u64 * 60_000 }

    const fn break_ms(&self) -> u64 { self.break_min as u64 * 60_000 }

    const fn long_break_ms(&self) -> u64 { self.long_break_min as u64 * 60_000 }
}

/// A phase ended on its own. The caller decides whether to beep.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PhaseComplete {
    pub finished: TimerState,
    pub next: TimerState,
}

pub struct Pomodoro {
    state: TimerState,
    /// Phase to resume into while paused.
    paused_phase: TimerState,
    phase_start_ms: u64,
    duration_ms: u64,
    paused_remaining_ms: u64,
    session: u32,
}

impl Pomodoro {
    pub const fn new() -> Self {
        Self {
            state: TimerState::Idle,
            paused_phase: TimerState::Running,
            phase_start_ms: 0,
            duration_ms: 0,
            paused_remaining_ms: 0,
            session: 1,
        }
    }

    fn enter(
        &mut self,
        state: TimerState,
        duration_ms: u64,
        now_ms: u64,
    ) {
        self.state = state;
        self.duration_ms = duration_ms;
        self.phase_start_ms = now_ms;
    }

    /// Advance phases whose time is up.
    pub fn tick(
        &mut self,
        now_ms: u64,
        plan: &TimerPlan,
    ) -> Option<PhaseComplete> {
        if !self.state.is_counting() || now_ms.saturating_sub(self.phase_start_ms) < self.duration_ms {
            return None;
        }
        let finished = self.state;
        match finished {
            TimerState::Running if self.session >= plan.sessions => {
                self.enter(TimerState::LongBreak, plan.long_break_ms(), now_ms);
                info!("timer: long break started");
            }
            TimerState::Running => {
                self.enter(TimerState::Break, plan.break_ms(), now_ms);
                info!("timer: break started ({}/{} done)", self.session, plan.sessions);
            }
            TimerState::Break => {
                self.session += 1;
                self.enter(TimerState::Running, plan.work_ms(), now_ms);
                info!("timer: work session {} started", self.session);
            }
            _ => {
                self.state = TimerState::Done;
                self.session = 1;
                info!("timer: all sessions done");
            }
        }
        Some(PhaseComplete {
            finished,
            next: self.state,
        })
    }

    /// Start from Idle/Done, pause a counting phase, or resume a paused one.
    pub fn toggle(
        &mut self,
        now_ms: u64,
        plan: &TimerPlan,
    ) {
        match self.state {
            TimerState::Idle | TimerState::Done => {
                self.session = 1;
                self.enter(TimerState::Running, plan.work_ms(), now_ms);
                info!("timer: started");
            }
            TimerState::Running | TimerState::Break | TimerState::LongBreak => {
                let elapsed = now_ms.saturating_sub(self.phase_start_ms);
                self.paused_remaining_ms = self.duration_ms.saturating_sub(elapsed);
                self.paused_phase = self.state;
                self.state = TimerState::Paused;
                info!("timer: paused");
            }
            TimerState::Paused => {
                self.enter(self.paused_phase, self.paused_remaining_ms, now_ms);
                info!("timer: resumed");
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.session = 1;
        self.paused_remaining_ms = 0;
        info!("timer: reset");
    }

    /// Whole seconds left in the current phase.
    pub const fn remaining_secs(
        &self,
        now_ms: u64,
        plan: &TimerPlan,
    ) -> u64 {
        match self.state {
            TimerState::Idle => plan.work_min as u64 * 60,
            TimerState::Done => 0,
            TimerState::Paused => self.paused_remaining_ms / 1000,
            _ => self.duration_ms.saturating_sub(now_ms.saturating_sub(self.phase_start_ms)) / 1000,
        }
    }

    #[inline]
    pub const fn state(&self) -> TimerState { self.state }

    /// True while a break (running or paused) is in progress.
    pub const fn in_break(&self) -> bool {
        match self.state {
            TimerState::Paused => self.paused_phase.is_break(),
            state => state.is_break(),
        }
    }

    #[inline]
    pub const fn session(&self) -> u32 { self.session }
}

impl Default for Pomodoro {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Stopwatch
// =============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum StopwatchState {
    #[default]
    Idle,
    Running,
    Paused,
}

pub struct Stopwatch {
    state: StopwatchState,
    start_ms: u64,
    accumulated_ms: u64,
}

impl Stopwatch {
    pub const fn new() -> Self {
        Self {
            state: StopwatchState::Idle,
            start_ms: 0,
            accumulated_ms: 0,
        }
    }

    pub fn toggle(
        &mut self,
        now_ms: u64,
    ) {
        match self.state {
            StopwatchState::Idle => {
                self.accumulated_ms = 0;
                self.start_ms = now_ms;
                self.state = StopwatchState::Running;
                info!("stopwatch: started");
            }
            StopwatchState::Running => {
                self.accumulated_ms += now_ms.saturating_sub(self.start_ms);
                self.state = StopwatchState::Paused;
                info!("stopwatch: paused");
            }
            StopwatchState::Paused => {
                self.start_ms = now_ms;
                self.state = StopwatchState::Running;
                info!("stopwatch: resumed");
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
        info!("stopwatch: reset");
    }

    pub const fn elapsed_secs(
        &self,
        now_ms: u64,
    ) -> u64 {
        match self.state {
            StopwatchState::Idle => 0,
            StopwatchState::Running => (self.accumulated_ms + now_ms.saturating_sub(self.start_ms)) / 1000,
            StopwatchState::Paused => self.accumulated_ms / 1000,
        }
    }

    #[inline]
    pub const fn state(&self) -> StopwatchState { self.state }
}

impl Default for Stopwatch {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Unit Tests
// =============================================================================
