//! Button debounce and press classification.
//!
//! Each button runs a small time-based state machine: a raw level change
//! restarts a 50ms debounce window, a stable press that is held for a
//! second fires one long press, and a release that did not fire a long
//! press becomes a short press.

use heapless::Vec;
use log::debug;

/// Debounce window.
pub const DEBOUNCE_MS: u64 = 50;

/// Hold time that turns a press into a long press.
pub const LONG_PRESS_MS: u64 = 1000;

/// Physical button.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Button {
    Left,
    Middle,
    Right,
}

impl Button {
    pub const ALL: [Self; 3] = [Self::Left, Self::Middle, Self::Right];
}

/// Kind of press.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Press {
    Short,
    Long,
}

/// One classified press.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ButtonEvent {
    pub button: Button,
    pub press: Press,
}

/// Raw levels sampled this tick (true = held down).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ButtonLevels {
    pub left: bool,
    pub middle: bool,
    pub right: bool,
}

impl ButtonLevels {
    const fn get(
        &self,
        button: Button,
    ) -> bool {
        match button {
            Button::Left => self.left,
            Button::Middle => self.middle,
            Button::Right => self.right,
        }
    }
}

/// Debounce state of one button.
pub struct ButtonState {
    last_raw: bool,
    pressed: bool,
    last_change_ms: u64,
    press_start_ms: u64,
    long_fired: bool,
}

impl ButtonState {
    pub const fn new() -> Self {
        Self {
            last_raw: false,
            pressed: false,
            last_change_ms: 0,
            press_start_ms: 0,
            long_fired: false,
        }
    }

    /// Feed one raw sample; returns a press once it is classified.
    pub fn update(
        &mut self,
        is_down: bool,
        now_ms: u64,
    ) -> Option<Press> {
        if is_down != self.last_raw {
            self.last_change_ms = now_ms;
        }
        self.last_raw = is_down;

        // Still bouncing
        if now_ms.saturating_sub(self.last_change_ms) < DEBOUNCE_MS {
            return None;
        }

        if is_down && !self.pressed {
            self.pressed = true;
            self.press_start_ms = now_ms;
            self.long_fired = false;
        }

        if is_down && !self.long_fired && now_ms.saturating_sub(self.press_start_ms) >= LONG_PRESS_MS {
            self.long_fired = true;
            return Some(Press::Long);
        }

        if !is_down && self.pressed {
            self.pressed = false;
            if !self.long_fired {
                return Some(Press::Short);
            }
        }

        None
    }
}

impl Default for ButtonState {
    fn default() -> Self { Self::new() }
}

/// The three front-panel buttons.
pub struct Buttons {
    states: [ButtonState; 3],
}

impl Buttons {
    pub const fn new() -> Self { Self { states: [ButtonState::new(), ButtonState::new(), ButtonState::new()] } }

    /// Sample all buttons, returning this tick's events in button order.
    pub fn update(
        &mut self,
        levels: ButtonLevels,
        now_ms: u64,
    ) -> Vec<ButtonEvent, 3> {
        let mut events = Vec::new();
        for (state, button) in self.states.iter_mut().zip(Button::ALL) {
            if let Some(press) = state.update(levels.get(button), now_ms) {
                debug!("button: {button:?} {press:?}");
                events
                    .push(ButtonEvent {
                        button,
                        press,
                    })
                    .ok();
            }
        }
        events
    }
}

impl Default for Buttons {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Hold the button from `from` to `to` (exclusive), sampling every 10ms.
    fn hold(
        state: &mut ButtonState,
        from: u64,
        to: u64,
    ) -> std::vec::Vec<Press> {
        (from..to).step_by(10).filter_map(|t| state.update(true, t)).collect()
    }

    fn release(
        state: &mut ButtonState,
        from: u64,
        to: u64,
    ) -> std::vec::Vec<Press> {
        (from..to).step_by(10).filter_map(|t| state.update(false, t)).collect()
    }

    #[test]
    fn test_short_press_on_release() {
        let mut b = ButtonState::new();
        assert!(hold(&mut b, 0, 200).is_empty());
        assert_eq!(release(&mut b, 200, 400), [Press::Short]);
    }

    #[test]
    fn test_long_press_fires_once_while_held() {
        let mut b = ButtonState::new();
        assert_eq!(hold(&mut b, 0, 3000), [Press::Long]);
        assert!(release(&mut b, 3000, 3200).is_empty());
    }

    #[test]
    fn test_bounce_is_ignored() {
        let mut b = ButtonState::new();
        // 30ms glitch never settles
        assert!(hold(&mut b, 0, 30).is_empty());
        assert!(release(&mut b, 30, 500).is_empty());
    }

    #[test]
    fn test_buttons_report_which() {
        let mut buttons = Buttons::new();
        let down = ButtonLevels {
            middle: true,
            ..ButtonLevels::default()
        };
        for t in (0..200).step_by(10) {
            assert!(buttons.update(down, t).is_empty());
        }
        let mut events = std::vec::Vec::new();
        for t in (200..400).step_by(10) {
            events.extend(buttons.update(ButtonLevels::default(), t));
        }
        assert_eq!(events, [ButtonEvent {
            button: Button::Middle,
            press: Press::Short
        }]);
    }
}
