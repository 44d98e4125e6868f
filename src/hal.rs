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

//! `embedded-hal` output adapters.
//!
//! Wraps any `embedded-hal` output pin as an [`OutputDriver`]. The LED sink is
//! wired active-low, so [`Level::On`] drives the pin low and [`Level::Off`]
//! drives it high.
//!
//! Pin errors are logged and otherwise ignored, since the timing path has no
//! way to act on them.
//!
//! This module is only included when either the `embedded-hal` or
//! `embedded-hal-0` feature flag is enabled.

use crate::output::{Level, OutputDriver};

/// Drives an `embedded-hal` v1 [`OutputPin`] as an active-low LED sink.
///
/// [`OutputPin`]: embedded_hal::digital::OutputPin
#[cfg(feature = "embedded-hal")]
#[derive(Debug)]
pub struct ActiveLow<P> {
    pin: P,
}

#[cfg(feature = "embedded-hal")]
impl<P> ActiveLow<P>
where
    P: embedded_hal::digital::OutputPin,
{
    /// Wraps `pin`.
    pub fn new(pin: P) -> ActiveLow<P> {
        ActiveLow { pin }
    }

    /// Returns the wrapped pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

/// `OutputDriver` implementation for `embedded-hal` v1.0.0 output pins.
#[cfg(feature = "embedded-hal")]
impl<P> OutputDriver for ActiveLow<P>
where
    P: embedded_hal::digital::OutputPin,
{
    fn write(&mut self, level: Level) {
        let result = match level {
            Level::On => self.pin.set_low(),
            Level::Off => self.pin.set_high(),
        };

        if let Err(e) = result {
            log::warn!("Failed to set output {}: {:?}", level, e);
        }
    }
}

/// Drives an `embedded-hal` v0.2 [`OutputPin`] as an active-low LED sink.
///
/// [`OutputPin`]: embedded_hal_0::digital::v2::OutputPin
#[cfg(feature = "embedded-hal-0")]
#[derive(Debug)]
pub struct LegacyActiveLow<P> {
    pin: P,
}

#[cfg(feature = "embedded-hal-0")]
impl<P> LegacyActiveLow<P>
where
    P: embedded_hal_0::digital::v2::OutputPin,
{
    /// Wraps `pin`.
    pub fn new(pin: P) -> LegacyActiveLow<P> {
        LegacyActiveLow { pin }
    }

    /// Returns the wrapped pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

/// `OutputDriver` implementation for `embedded-hal` v0.2.7 output pins.
#[cfg(feature = "embedded-hal-0")]
impl<P> OutputDriver for LegacyActiveLow<P>
where
    P: embedded_hal_0::digital::v2::OutputPin,
{
    fn write(&mut self, level: Level) {
        let result = match level {
            Level::On => self.pin.set_low(),
            Level::Off => self.pin.set_high(),
        };

        if result.is_err() {
            log::warn!("Failed to set output {}", level);
        }
    }
}
