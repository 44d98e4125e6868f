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

//! Runtime configuration and the shared timing state.
//!
//! A [`Controller`] owns the complete timing state: the [`Pattern`], the cursor,
//! the active [`Frequency`] and the clock deadline. All of it sits behind a
//! single lock, and every method takes `&self`, so one `Controller` can be
//! shared by reference between the polling loop and whatever handles
//! configuration requests, without either side ever observing a half-applied
//! change.
//!
//! ## Timing
//!
//! [`Controller::poll`] should be called on every pass of the caller's polling
//! loop, at a cadence well above the active frequency. When the frequency
//! exceeds [`Config::fast_poll_threshold_hz`], each pass ticks the sequencer
//! [`Config::fast_poll_passes`] times, so a symbol that became due while the
//! previous pass was running is caught up immediately.
//!
//! ## Reconfiguration
//!
//! [`Controller::set_sequence`] and [`Controller::set_frequency`] validate their
//! input first. On success, they swap in the new state, reset the cursor to the
//! first symbol and resynchronize the clock, so the next symbol is emitted
//! exactly one interval after the change. On failure, nothing is modified.
//!
//! ## Examples
//!
//! ```
//! use vlc_beacon::controller::Controller;
//! use vlc_beacon::output::{Level, OutputDriver};
//!
//! struct Led;
//!
//! impl OutputDriver for Led {
//!     fn write(&mut self, _level: Level) {}
//! }
//!
//! # fn main() -> vlc_beacon::controller::Result<()> {
//! let controller = Controller::new(0)?;
//! controller.set_sequence("110010", 0)?;
//! controller.set_frequency(1000, 0)?;
//!
//! let mut led = Led;
//! assert_eq!(controller.poll(1_000, &mut led), 1);
//! assert_eq!(controller.status().cursor, 1);
//! # Ok(())
//! # }
//! ```

use std::error;
use std::fmt;
use std::result;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::frequency::{self, Frequency};
use crate::output::{Level, OutputDriver};
use crate::pattern::{self, Pattern, Symbol};
use crate::sequencer::PatternSequencer;

/// Pattern loaded at startup.
pub const DEFAULT_PATTERN: &str = "1010";

/// Errors returned when a configuration change is rejected.
///
/// The controller's state is left untouched whenever one of these is returned.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Error {
    /// Invalid pattern.
    Pattern(pattern::Error),
    /// Frequency out of range.
    Frequency(frequency::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::Pattern(ref err) => write!(f, "Invalid pattern: {}", err),
            Error::Frequency(ref err) => write!(f, "{}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Pattern(ref err) => Some(err),
            Error::Frequency(ref err) => Some(err),
        }
    }
}

impl From<pattern::Error> for Error {
    fn from(err: pattern::Error) -> Error {
        Error::Pattern(err)
    }
}

impl From<frequency::Error> for Error {
    fn from(err: frequency::Error) -> Error {
        Error::Frequency(err)
    }
}

/// Result type returned from methods that can have `controller::Error`s.
pub type Result<T> = result::Result<T, Error>;

/// Startup settings for a [`Controller`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Pattern loaded at startup. Defaults to [`DEFAULT_PATTERN`].
    pub pattern: String,
    /// Frequency active at startup. Defaults to [`Frequency::Default`].
    pub frequency: Frequency,
    /// Rate above which [`Controller::poll`] ticks more than once per pass.
    /// Defaults to 1000 Hz.
    pub fast_poll_threshold_hz: u32,
    /// Ticks per pass above the threshold. Defaults to 2. A value of 0 is
    /// treated as 1.
    pub fast_poll_passes: u8,
}

impl Config {
    /// Sets the startup pattern.
    pub fn with_pattern<S: Into<String>>(mut self, pattern: S) -> Config {
        self.pattern = pattern.into();
        self
    }

    /// Sets the startup frequency.
    pub fn with_frequency(mut self, frequency: Frequency) -> Config {
        self.frequency = frequency;
        self
    }

    /// Sets the fast polling threshold and the number of ticks per pass above it.
    pub fn with_fast_poll(mut self, threshold_hz: u32, passes: u8) -> Config {
        self.fast_poll_threshold_hz = threshold_hz;
        self.fast_poll_passes = passes;
        self
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            pattern: DEFAULT_PATTERN.to_owned(),
            frequency: Frequency::Default,
            fast_poll_threshold_hz: 1000,
            fast_poll_passes: 2,
        }
    }
}

/// A consistent view of the controller's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Pattern being played.
    pub pattern: Pattern,
    /// Index of the next symbol to emit.
    pub cursor: usize,
    /// Symbol at `cursor`.
    pub current_symbol: Symbol,
    /// Rate in effect, in Hz. Reports the default rate when no custom
    /// frequency is set.
    pub frequency_hz: u32,
    /// `true` if a custom frequency is active.
    pub custom_frequency: bool,
    /// Interval between symbols, in microseconds.
    pub interval_us: u64,
    /// Number of `0` symbols (LED on) in the pattern.
    pub zeros: usize,
    /// Number of `1` symbols (LED off) in the pattern.
    pub ones: usize,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pattern {} ({} bits, {} on, {} off), cursor {} ({}), {} Hz{}",
            self.pattern,
            self.pattern.len(),
            self.zeros,
            self.ones,
            self.cursor,
            self.current_symbol,
            self.frequency_hz,
            if self.custom_frequency { "" } else { " (default)" }
        )
    }
}

/// Configuration intake messages.
///
/// Each request maps onto exactly one [`Controller`] operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Replace the pattern with a string of `0`/`1` symbols.
    SetSequence(String),
    /// Select a frequency in Hz. `0` reverts to the default rate.
    SetFrequency(i64),
    /// Take a status snapshot.
    Status,
}

/// Replies to [`Request`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The change was applied.
    Ok,
    /// The change was rejected. Contains the validation error message.
    Rejected(String),
    /// Status snapshot.
    Status(Status),
}

#[derive(Debug)]
struct Inner {
    sequencer: PatternSequencer,
    frequency: Frequency,
}

/// Owns the pattern, cursor, frequency and clock, and serializes every access
/// to them.
#[derive(Debug)]
pub struct Controller {
    inner: Mutex<Inner>,
    fast_poll_threshold_hz: u32,
    fast_poll_passes: u8,
}

impl Controller {
    /// Constructs a new `Controller` with the default [`Config`], using `now`
    /// as the initial phase reference.
    pub fn new(now: u64) -> Result<Controller> {
        Controller::with_config(Config::default(), now)
    }

    /// Constructs a new `Controller` using the specified settings.
    ///
    /// Returns an error if `config.pattern` isn't a valid pattern.
    pub fn with_config(config: Config, now: u64) -> Result<Controller> {
        let pattern: Pattern = config.pattern.parse()?;

        log::info!(
            "Pattern controller initialized: pattern {}, {}",
            pattern,
            config.frequency
        );

        Ok(Controller {
            inner: Mutex::new(Inner {
                sequencer: PatternSequencer::new(pattern, config.frequency.hz(), now),
                frequency: config.frequency,
            }),
            fast_poll_threshold_hz: config.fast_poll_threshold_hz,
            fast_poll_passes: config.fast_poll_passes.max(1),
        })
    }

    // A driver that panics inside `tick` leaves the symbol it was writing
    // unconsumed: cursor and clock only advance after the write returns, so the
    // state group is still consistent and the lock can be reclaimed.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Emits the next symbol to `driver` if it's due.
    ///
    /// Returns the emitted symbol, or `None` if nothing was due.
    pub fn tick<D: OutputDriver + ?Sized>(&self, now: u64, driver: &mut D) -> Option<Symbol> {
        self.lock().sequencer.tick(now, driver)
    }

    /// Runs one pass of the polling loop.
    ///
    /// Ticks once, or [`Config::fast_poll_passes`] times when the active
    /// frequency is above [`Config::fast_poll_threshold_hz`]. Returns the number
    /// of symbols emitted.
    pub fn poll<D: OutputDriver + ?Sized>(&self, now: u64, driver: &mut D) -> usize {
        let mut inner = self.lock();

        let passes = if inner.frequency.hz() > self.fast_poll_threshold_hz {
            self.fast_poll_passes
        } else {
            1
        };

        let mut emitted = 0;
        for _ in 0..passes {
            if inner.sequencer.tick(now, &mut *driver).is_some() {
                emitted += 1;
            }
        }

        emitted
    }

    /// Replaces the pattern with `candidate`, a string of `0` and `1` symbols.
    ///
    /// On success, playback restarts from the first symbol one interval after
    /// `now`. Returns `Err(`[`Error::Pattern`]`)` if `candidate` is empty or
    /// contains any other character, in which case nothing changes.
    pub fn set_sequence(&self, candidate: &str, now: u64) -> Result<()> {
        let pattern: Pattern = match candidate.parse() {
            Ok(pattern) => pattern,
            Err(e) => {
                log::warn!("Rejected pattern {:?}: {}", candidate, e);
                return Err(e.into());
            }
        };

        self.set_pattern(pattern, now);

        Ok(())
    }

    /// Replaces the pattern with an already validated `pattern`.
    ///
    /// Playback restarts from the first symbol one interval after `now`.
    pub fn set_pattern(&self, pattern: Pattern, now: u64) {
        let mut inner = self.lock();
        let previous = inner.sequencer.pattern().clone();
        inner.sequencer.set_pattern(pattern, now);

        log::info!(
            "Pattern update: {} -> {}",
            previous,
            inner.sequencer.pattern()
        );
    }

    /// Selects the symbol rate.
    ///
    /// `0` reverts to the default rate, `1..=100000` selects a custom rate. On
    /// success, playback restarts from the first symbol one interval (at the new
    /// rate) after `now`. Returns `Err(`[`Error::Frequency`]`)` for any other
    /// value, in which case nothing changes.
    pub fn set_frequency(&self, hz: i64, now: u64) -> Result<()> {
        let frequency = match Frequency::from_hz(hz) {
            Ok(frequency) => frequency,
            Err(e) => {
                log::warn!("Rejected frequency {}: {}", hz, e);
                return Err(e.into());
            }
        };

        let mut inner = self.lock();
        inner.frequency = frequency;
        inner.sequencer.set_hz(frequency.hz(), now);

        log::info!(
            "Frequency set to {} ({} µs per bit)",
            frequency,
            frequency.interval_us()
        );

        Ok(())
    }

    /// Resynchronizes the clock to `now` without moving the cursor.
    pub fn resync_timing(&self, now: u64) {
        self.lock().sequencer.resync(now);

        log::debug!("Timing synchronization reset");
    }

    /// Returns the active frequency.
    pub fn frequency(&self) -> Frequency {
        self.lock().frequency
    }

    /// Returns the time left until the next symbol is due, in microseconds.
    pub fn remaining(&self, now: u64) -> u64 {
        self.lock().sequencer.clock().remaining(now)
    }

    /// Returns the clock's current deadline, in microseconds.
    pub fn deadline(&self) -> u64 {
        self.lock().sequencer.clock().deadline()
    }

    /// Takes a snapshot of the controller's state.
    pub fn status(&self) -> Status {
        let inner = self.lock();
        let pattern = inner.sequencer.pattern().clone();
        let cursor = inner.sequencer.cursor();

        Status {
            current_symbol: pattern.symbol_at(cursor).unwrap_or(Symbol::Zero),
            zeros: pattern.count(Symbol::Zero),
            ones: pattern.count(Symbol::One),
            pattern,
            cursor,
            frequency_hz: inner.frequency.hz(),
            custom_frequency: inner.frequency.is_custom(),
            interval_us: inner.sequencer.clock().interval(),
        }
    }

    /// Sets `driver` to the idle level ([`Level::Off`]), ahead of the first
    /// symbol.
    pub fn park<D: OutputDriver + ?Sized>(&self, driver: &mut D) {
        driver.write(Level::Off);
    }

    /// Handles a single intake message.
    pub fn handle(&self, request: Request, now: u64) -> Response {
        let result = match request {
            Request::SetSequence(ref candidate) => self.set_sequence(candidate, now),
            Request::SetFrequency(hz) => self.set_frequency(hz, now),
            Request::Status => return Response::Status(self.status()),
        };

        match result {
            Ok(()) => Response::Ok,
            Err(e) => Response::Rejected(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<Level>);

    impl OutputDriver for Recorder {
        fn write(&mut self, level: Level) {
            self.0.push(level);
        }
    }

    #[test]
    fn starts_with_defaults() {
        let controller = Controller::new(0).unwrap();
        let status = controller.status();

        assert_eq!(status.pattern.to_string(), DEFAULT_PATTERN);
        assert_eq!(status.cursor, 0);
        assert_eq!(status.current_symbol, Symbol::One);
        assert_eq!(status.frequency_hz, frequency::DEFAULT_HZ);
        assert!(!status.custom_frequency);
        assert_eq!(status.interval_us, 500_000);
        assert_eq!((status.zeros, status.ones), (2, 2));
    }

    #[test]
    fn rejects_invalid_startup_pattern() {
        let config = Config::default().with_pattern("10x");

        assert_eq!(
            Controller::with_config(config, 0).unwrap_err(),
            Error::Pattern(pattern::Error::InvalidSymbol {
                position: 2,
                found: 'x'
            })
        );
    }

    #[test]
    fn rejections_leave_state_untouched() {
        let controller = Controller::new(0).unwrap();
        let mut out = Recorder::default();
        controller.tick(500_000, &mut out);
        let before = controller.status();
        let deadline = controller.deadline();

        assert!(matches!(
            controller.set_sequence("", 600_000),
            Err(Error::Pattern(pattern::Error::Empty))
        ));
        assert!(controller.set_sequence("012", 600_000).is_err());
        assert_eq!(
            controller.set_frequency(100_001, 600_000),
            Err(Error::Frequency(frequency::Error::OutOfRange(100_001)))
        );
        assert!(controller.set_frequency(-1, 600_000).is_err());

        assert_eq!(controller.status(), before);
        assert_eq!(controller.deadline(), deadline);
    }

    #[test]
    fn frequency_zero_reverts_to_default() {
        let controller = Controller::new(0).unwrap();

        controller.set_frequency(250, 0).unwrap();
        assert_eq!(controller.frequency().hz(), 250);
        assert!(controller.frequency().is_custom());

        controller.set_frequency(0, 0).unwrap();
        assert_eq!(controller.frequency(), Frequency::Default);
        assert_eq!(controller.status().interval_us, 500_000);
    }

    #[test]
    fn fast_poll_catches_up() {
        let controller = Controller::new(0).unwrap();
        let mut out = Recorder::default();
        controller.set_sequence("01", 0).unwrap();

        // At 2 kHz (500 µs), a pass arriving 1 ms late owes two symbols.
        controller.set_frequency(2000, 0).unwrap();
        assert_eq!(controller.poll(1_000, &mut out), 2);
        assert_eq!(out.0, vec![Level::On, Level::Off]);

        // Below the threshold, only one symbol per pass.
        controller.set_frequency(1000, 1_000).unwrap();
        assert_eq!(controller.poll(3_000, &mut out), 1);
        assert_eq!(controller.poll(3_000, &mut out), 1);
        assert_eq!(controller.poll(3_000, &mut out), 0);
    }

    #[test]
    fn fast_poll_is_configurable() {
        let config = Config::default().with_fast_poll(100, 4);
        let controller = Controller::with_config(config, 0).unwrap();
        let mut out = Recorder::default();

        controller.set_frequency(1000, 0).unwrap();
        assert_eq!(controller.poll(10_000, &mut out), 4);
    }

    #[test]
    fn resync_timing_keeps_cursor() {
        let controller = Controller::new(0).unwrap();
        let mut out = Recorder::default();
        controller.tick(500_000, &mut out);

        controller.resync_timing(700_000);
        assert_eq!(controller.status().cursor, 1);
        assert_eq!(controller.deadline(), 700_000);
        assert_eq!(controller.remaining(700_000), 500_000);
    }

    #[test]
    fn handles_requests() {
        let controller = Controller::new(0).unwrap();

        assert_eq!(
            controller.handle(Request::SetSequence("0011".to_owned()), 0),
            Response::Ok
        );
        assert_eq!(
            controller.handle(Request::SetFrequency(100_001), 0),
            Response::Rejected("Invalid frequency! Range: 1-100000 Hz or 0 for default".to_owned())
        );
        assert_eq!(
            controller.handle(Request::SetSequence("01a".to_owned()), 0),
            Response::Rejected(
                "Invalid pattern: Invalid symbol 'a' at position 2 (only 0 and 1 allowed)"
                    .to_owned()
            )
        );

        match controller.handle(Request::Status, 0) {
            Response::Status(status) => assert_eq!(status.pattern.to_string(), "0011"),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn parks_output_off() {
        let controller = Controller::new(0).unwrap();
        let mut out = Recorder::default();

        controller.park(&mut out);
        assert_eq!(out.0, vec![Level::Off]);
    }
}
