//! VLC Beacon plays a repeating binary pattern on a single digital output, for
//! use as a visible-light-communication (VLC) signal source.
//!
//! The core is a drift-corrected, non-blocking scheduler. A caller-owned polling
//! loop repeatedly calls [`Controller::poll`], which emits the next symbol once
//! its deadline has passed. Deadlines advance by exactly one interval per symbol,
//! so scheduling jitter never accumulates. The pattern and frequency can be
//! changed at any time from another thread; each change restarts the pattern
//! from its first symbol with a fresh phase reference.
//!
//! Output hardware is reached through the [`OutputDriver`] trait. The crate
//! ships a Linux sysfs GPIO driver, `embedded-hal` adapters (behind the
//! `embedded-hal` and `embedded-hal-0` feature flags), and a [`Runner`] that
//! runs the polling loop on a dedicated thread.
//!
//! [`Controller::poll`]: controller::Controller::poll
//! [`OutputDriver`]: output::OutputDriver
//! [`Runner`]: runner::Runner

#[macro_use]
mod macros;

pub mod clock;
pub mod controller;
pub mod frequency;
#[cfg(any(feature = "embedded-hal", feature = "embedded-hal-0"))]
pub mod hal;
pub mod output;
pub mod pattern;
pub mod runner;
pub mod sequencer;
