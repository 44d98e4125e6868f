// Copyright (c) 2026 The vlc-beacon developers
//
// Permission is hereby granted, free of charge, to any person obtaining a
// copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
// THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
// DEALINGS IN THE SOFTWARE.

//! Drift-corrected symbol clock.
//!
//! [`DriftCorrectedClock`] keeps an absolute deadline on a monotonic microsecond
//! timeline. Each emitted symbol moves the deadline forward by exactly one
//! interval, rather than resetting it to the current time, so any latency in a
//! single tick is caught up on the next one instead of accumulating.
//!
//! Time is read through the [`TimeSource`] trait. [`MonotonicClock`] reads
//! `CLOCK_MONOTONIC`; tests supply their own source to step time manually.

use std::fmt;

use libc::{self, timespec, CLOCK_MONOTONIC};

use crate::frequency;

/// A monotonic microsecond time source.
pub trait TimeSource {
    /// Returns the current time in microseconds. Must never go backwards.
    fn now_us(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

/// Reads the kernel's `CLOCK_MONOTONIC` clock.
#[derive(Debug, Default, Copy, Clone)]
pub struct MonotonicClock;

impl MonotonicClock {
    /// Constructs a new `MonotonicClock`.
    pub fn new() -> MonotonicClock {
        MonotonicClock
    }
}

impl TimeSource for MonotonicClock {
    #[inline(always)]
    fn now_us(&self) -> u64 {
        let mut ts = timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };

        unsafe {
            libc::clock_gettime(CLOCK_MONOTONIC, &mut ts);
        }

        (ts.tv_sec as u64 * 1_000_000) + (ts.tv_nsec as u64 / 1_000)
    }
}

/// Tracks when the next symbol is due.
///
/// `deadline` marks the start of the current interval. A symbol is due once a
/// full interval has elapsed since `deadline`.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct DriftCorrectedClock {
    interval: u64,
    deadline: u64,
}

impl DriftCorrectedClock {
    /// Constructs a new `DriftCorrectedClock` running at `hz`, with its phase
    /// reference set to `now`.
    pub fn new(hz: u32, now: u64) -> DriftCorrectedClock {
        DriftCorrectedClock {
            interval: Self::interval_for(hz),
            deadline: now,
        }
    }

    /// Returns the interval for `hz` in microseconds (`1_000_000 / hz`).
    #[inline]
    pub fn interval_for(hz: u32) -> u64 {
        frequency::interval_for(hz)
    }

    /// Returns `true` if at least one interval has elapsed since the deadline.
    #[inline]
    pub fn due(&self, now: u64) -> bool {
        now.saturating_sub(self.deadline) >= self.interval
    }

    /// Moves the deadline forward by exactly one interval.
    #[inline]
    pub fn advance(&mut self) {
        self.deadline = self.deadline.saturating_add(self.interval);
    }

    /// Redefines the phase reference as `now`, discarding any accumulated lag.
    ///
    /// Only called when the pattern or frequency changes.
    #[inline]
    pub fn resync(&mut self, now: u64) {
        self.deadline = now;
    }

    /// Changes the interval. The deadline is left alone; callers follow up with
    /// [`resync`](DriftCorrectedClock::resync).
    #[inline]
    pub fn set_interval(&mut self, interval: u64) {
        self.interval = interval.max(1);
    }

    /// Returns the current interval in microseconds.
    #[inline]
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Returns the current deadline in microseconds.
    #[inline]
    pub fn deadline(&self) -> u64 {
        self.deadline
    }

    /// Returns the time left until the next symbol is due, or 0 if it's
    /// already due.
    #[inline]
    pub fn remaining(&self, now: u64) -> u64 {
        self.deadline
            .saturating_add(self.interval)
            .saturating_sub(now)
    }
}

impl fmt::Debug for DriftCorrectedClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriftCorrectedClock")
            .field("interval", &format_args!("{} µs", self.interval))
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_after_one_interval() {
        let clock = DriftCorrectedClock::new(2, 1_000);

        assert_eq!(clock.interval(), 500_000);
        assert!(!clock.due(1_000));
        assert!(!clock.due(500_999));
        assert!(clock.due(501_000));
        assert_eq!(clock.remaining(1_000), 500_000);
        assert_eq!(clock.remaining(600_000), 0);
    }

    #[test]
    fn advance_ignores_observed_gaps() {
        let mut clock = DriftCorrectedClock::new(1000, 0);
        let gaps = [1_003, 997, 1_250, 1_001, 1_900];
        let mut now = 0;

        for gap in gaps.iter() {
            now += gap;
            if clock.due(now) {
                clock.advance();
            }
        }

        // Every observed tick was late or early, but the deadline only ever moves
        // in whole intervals.
        assert_eq!(clock.deadline() % 1_000, 0);
        assert_eq!(clock.deadline(), 5_000);
    }

    #[test]
    fn lag_is_caught_up() {
        let mut clock = DriftCorrectedClock::new(1000, 0);

        // Tick arrives 2.5 intervals late: two symbols are due back to back.
        let now = 2_500;
        let mut emitted = 0;
        while clock.due(now) {
            clock.advance();
            emitted += 1;
        }

        assert_eq!(emitted, 2);
        assert_eq!(clock.deadline(), 2_000);
    }

    #[test]
    fn resync_redefines_phase() {
        let mut clock = DriftCorrectedClock::new(10, 0);
        clock.advance();
        clock.resync(123_456);

        assert_eq!(clock.deadline(), 123_456);
        assert!(!clock.due(123_456 + 99_999));
        assert!(clock.due(123_456 + 100_000));
    }

    #[test]
    fn time_before_deadline_is_not_due() {
        let clock = DriftCorrectedClock::new(1, 10_000_000);

        assert!(!clock.due(0));
    }

    #[test]
    fn saturates_at_end_of_timeline() {
        let mut clock = DriftCorrectedClock::new(1000, u64::MAX - 10);

        assert_eq!(clock.remaining(u64::MAX - 10), 10);
        assert!(!clock.due(u64::MAX));

        clock.advance();
        assert_eq!(clock.deadline(), u64::MAX);
        assert_eq!(clock.remaining(u64::MAX), 0);
    }

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now_us();
        let b = clock.now_us();

        assert!(b >= a);
    }
}
