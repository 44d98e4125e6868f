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

//! Pattern playback.

use crate::clock::DriftCorrectedClock;
use crate::output::{Level, OutputDriver};
use crate::pattern::{Pattern, Symbol};

// Emit a debug line after this many symbols, to keep logging off the hot path.
const DEBUG_EVERY: u64 = 1000;

/// Steps through a [`Pattern`] in sync with a [`DriftCorrectedClock`].
///
/// `PatternSequencer` holds no lock of its own. [`Controller`] wraps it together
/// with the active frequency, so ticks and reconfigurations never interleave.
///
/// [`Controller`]: crate::controller::Controller
#[derive(Debug, Clone)]
pub struct PatternSequencer {
    pattern: Pattern,
    cursor: usize,
    hz: u32,
    clock: DriftCorrectedClock,
    emitted: u64,
}

impl PatternSequencer {
    /// Constructs a new `PatternSequencer` that starts playing `pattern` at `hz`,
    /// one interval after `now`.
    pub fn new(pattern: Pattern, hz: u32, now: u64) -> PatternSequencer {
        PatternSequencer {
            pattern,
            cursor: 0,
            hz,
            clock: DriftCorrectedClock::new(hz, now),
            emitted: 0,
        }
    }

    /// Emits the next symbol to `driver` if it's due.
    ///
    /// Returns the emitted symbol, or `None` if nothing was due. Calls that
    /// aren't due have no side effects, so `tick` can be called on every pass
    /// of a polling loop.
    pub fn tick<D: OutputDriver + ?Sized>(&mut self, now: u64, driver: &mut D) -> Option<Symbol> {
        if !self.clock.due(now) {
            return None;
        }

        // An empty pattern can't be constructed, but an out-of-range cursor is
        // still treated as a no-op rather than a panic.
        let symbol = self.pattern.symbol_at(self.cursor)?;

        driver.write(Level::from(symbol));

        self.cursor = (self.cursor + 1) % self.pattern.len();
        self.clock.advance();
        self.emitted = self.emitted.wrapping_add(1);

        if self.emitted % DEBUG_EVERY == 0 {
            log::debug!(
                "Pattern bit: {}, freq: {} Hz, interval: {} µs, emitted: {}",
                symbol,
                self.hz,
                self.clock.interval(),
                self.emitted
            );
        }

        Some(symbol)
    }

    /// Replaces the pattern and restarts playback from its first symbol.
    pub fn set_pattern(&mut self, pattern: Pattern, now: u64) {
        self.pattern = pattern;
        self.restart(now);
    }

    /// Changes the symbol rate and restarts playback from the first symbol.
    pub fn set_hz(&mut self, hz: u32, now: u64) {
        self.hz = hz;
        self.clock.set_interval(DriftCorrectedClock::interval_for(hz));
        self.restart(now);
    }

    /// Moves the cursor back to the first symbol and resynchronizes the clock.
    pub fn restart(&mut self, now: u64) {
        self.cursor = 0;
        self.clock.resync(now);
    }

    /// Resynchronizes the clock without moving the cursor.
    pub fn resync(&mut self, now: u64) {
        self.clock.resync(now);
    }

    /// Returns the pattern being played.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Returns the index of the next symbol to emit.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the next symbol to emit.
    pub fn current_symbol(&self) -> Option<Symbol> {
        self.pattern.symbol_at(self.cursor)
    }

    /// Returns the symbol rate in Hz.
    pub fn hz(&self) -> u32 {
        self.hz
    }

    /// Returns the sequencer's clock.
    pub fn clock(&self) -> &DriftCorrectedClock {
        &self.clock
    }

    /// Returns the number of symbols emitted since construction.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}
