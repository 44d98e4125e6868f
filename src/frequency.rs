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

//! Output rate selection.

use std::error;
use std::fmt;
use std::num::NonZeroU32;
use std::result;

/// Symbol rate used when no custom frequency is configured.
pub const DEFAULT_HZ: u32 = 2;
/// Highest accepted custom frequency.
pub const MAX_HZ: u32 = 100_000;

const MICROS_PER_SEC: u64 = 1_000_000;

/// Errors that can occur when selecting a frequency.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Error {
    /// Frequency outside `0..=100000` Hz.
    OutOfRange(i64),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::OutOfRange(_) => write!(
                f,
                "Invalid frequency! Range: 1-{} Hz or 0 for default",
                MAX_HZ
            ),
        }
    }
}

impl error::Error for Error {}

/// Result type returned from methods that can have `frequency::Error`s.
pub type Result<T> = result::Result<T, Error>;

/// Active rate mode.
///
/// `Default` runs at [`DEFAULT_HZ`]. `Custom` holds an explicit rate within
/// `1..=`[`MAX_HZ`].
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Frequency {
    Default,
    Custom(NonZeroU32),
}

impl Frequency {
    /// Converts a requested rate into a `Frequency`.
    ///
    /// `0` selects [`Frequency::Default`], `1..=100000` selects [`Frequency::Custom`].
    /// Any other value, including negative ones, returns `Err(`[`Error::OutOfRange`]`)`.
    pub fn from_hz(hz: i64) -> Result<Frequency> {
        if hz == 0 {
            return Ok(Frequency::Default);
        }

        if hz < 1 || hz > MAX_HZ as i64 {
            return Err(Error::OutOfRange(hz));
        }

        NonZeroU32::new(hz as u32)
            .map(Frequency::Custom)
            .ok_or(Error::OutOfRange(hz))
    }

    /// Returns the rate in Hz that's currently in effect.
    pub fn hz(&self) -> u32 {
        match *self {
            Frequency::Default => DEFAULT_HZ,
            Frequency::Custom(hz) => hz.get(),
        }
    }

    /// Returns `true` if a custom rate is active.
    pub fn is_custom(&self) -> bool {
        matches!(self, Frequency::Custom(_))
    }

    /// Returns the symbol interval in microseconds.
    #[inline]
    pub fn interval_us(&self) -> u64 {
        interval_for(self.hz())
    }
}

impl Default for Frequency {
    fn default() -> Frequency {
        Frequency::Default
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Frequency::Default => write!(f, "{} Hz (default)", DEFAULT_HZ),
            Frequency::Custom(hz) => write!(f, "{} Hz", hz),
        }
    }
}

/// Returns the interval between symbols for `hz`, in microseconds.
///
/// Uses integer division, so rates that don't evenly divide one second are
/// rounded down. `hz` must be at least 1; a rate of 0 is treated as 1 Hz.
#[inline]
pub fn interval_for(hz: u32) -> u64 {
    MICROS_PER_SEC / u64::from(hz.max(1))
}
