//! Countdown to a configured unix timestamp.

use crate::clock::WallClock;

/// Seconds per day.
pub const DAY_SECS: i64 = 86_400;

/// Seconds left until `target`. Zero when no target is set or the time is unknown;
/// negative once the target has passed.
pub fn remaining_secs(
    target_unix: u64,
    now: Option<&WallClock>,
) -> i64 {
    match now {
        Some(clock) if target_unix > 0 => target_unix as i64 - clock.unix,
        _ => 0,
    }
}

/// What the countdown screen shows.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CountdownView {
    /// Target reached (or nothing to count).
    Elapsed,
    /// Under a day: hours and minutes.
    HoursMinutes { hours: i64, minutes: i64 },
    /// Whole days left.
    Days(i64),
}

impl CountdownView {
    pub const fn from_remaining(secs: i64) -> Self {
        if secs <= 0 {
            Self::Elapsed
        } else if secs < DAY_SECS {
            Self::HoursMinutes {
                hours: secs / 3600,
                minutes: (secs % 3600) / 60,
            }
        } else {
            Self::Days(secs / DAY_SECS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(unix: i64) -> WallClock {
        WallClock {
            unix,
            ..WallClock::default()
        }
    }

    #[test]
    fn test_remaining() {
        assert_eq!(remaining_secs(1_000, Some(&clock(400))), 600);
        assert_eq!(remaining_secs(1_000, Some(&clock(1_600))), -600);
        assert_eq!(remaining_secs(1_000, None), 0);
        assert_eq!(remaining_secs(0, Some(&clock(400))), 0);
    }

    #[test]
    fn test_views() {
        assert_eq!(CountdownView::from_remaining(0), CountdownView::Elapsed);
        assert_eq!(CountdownView::from_remaining(-5), CountdownView::Elapsed);
        assert_eq!(CountdownView::from_remaining(3 * 3600 + 7 * 60 + 30), CountdownView::HoursMinutes {
            hours: 3,
            minutes: 7
        });
        assert_eq!(CountdownView::from_remaining(DAY_SECS - 1), CountdownView::HoursMinutes {
            hours: 23,
            minutes: 59
        });
        assert_eq!(CountdownView::from_remaining(3 * DAY_SECS + 5), CountdownView::Days(3));
    }
}
