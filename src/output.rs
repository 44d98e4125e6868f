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

//! Output sink abstraction.
//!
//! The sequencer never touches pins directly. Every emitted symbol is handed to
//! an [`OutputDriver`] as a logical [`Level`], and the driver maps it onto
//! whatever hardware it controls.
//!
//! Symbols map to levels inverted, because the LED sink is wired active-low:
//! `0` turns the LED on, `1` turns it off.
//!
//! Drivers provided by this crate:
//!
//! * [`SysfsOutput`] drives a Linux GPIO pin through `/sys/class/gpio`.
//! * `hal::ActiveLow` adapts any `embedded-hal` output pin (requires the
//!   `embedded-hal` or `embedded-hal-0` feature).
//!
//! [`SysfsOutput`]: sysfs::SysfsOutput

use std::fmt;
use std::ops::Not;

use crate::pattern::Symbol;

pub mod sysfs;

/// Logical output levels.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Level {
    /// LED lit.
    On,
    /// LED dark.
    Off,
}

impl From<Symbol> for Level {
    fn from(symbol: Symbol) -> Level {
        match symbol {
            Symbol::Zero => Level::On,
            Symbol::One => Level::Off,
        }
    }
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::On => Level::Off,
            Level::Off => Level::On,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Level::On => write!(f, "On"),
            Level::Off => write!(f, "Off"),
        }
    }
}

/// Receives the logical level for each emitted symbol.
///
/// `write` is called from the timing path, so implementations must return
/// quickly and must not block. Failures are the driver's own business: log them
/// and carry on.
pub trait OutputDriver {
    /// Sets the output to `level`.
    fn write(&mut self, level: Level);
}

impl<D: OutputDriver + ?Sized> OutputDriver for &mut D {
    #[inline]
    fn write(&mut self, level: Level) {
        (**self).write(level)
    }
}

impl<D: OutputDriver + ?Sized> OutputDriver for Box<D> {
    #[inline]
    fn write(&mut self, level: Level) {
        (**self).write(level)
    }
}
