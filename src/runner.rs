// Copyright (c) 2026 The vlc-beacon developers
// Copyright (c) 2017-2019 Rene van der Meer
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

//! Background polling thread.
//!
//! [`Runner`] moves an [`OutputDriver`] onto a dedicated thread that keeps
//! calling [`Controller::poll`] until it's stopped. The [`Controller`] stays
//! shared through an `Arc`, so configuration changes can be applied from any
//! other thread while the pattern is playing.
//!
//! The thread tries to switch itself to real-time round-robin scheduling at the
//! highest priority, which silently fails when not running as root. Between
//! symbols it sleeps when enough time is left, and busy-waits for the remainder
//! to compensate for sleeps that overshoot. Sleeps are capped at 1 ms, so a
//! reconfiguration delays the next symbol by at most that amount.

use std::error;
use std::fmt;
use std::hint;
use std::ptr;
use std::result;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use libc::{
    self, c_long, sched_param, time_t, timespec, CLOCK_MONOTONIC, PR_SET_TIMERSLACK, SCHED_RR,
};

use crate::clock::{MonotonicClock, TimeSource};
use crate::controller::Controller;
use crate::output::OutputDriver;

// Only sleep if we have enough time remaining (µs)
const SLEEP_THRESHOLD: u64 = 250;
// Reserve some time for busy waiting (µs)
const BUSYWAIT_MAX: u64 = 200;
// Upper bound for a single sleep (µs)
const SLEEP_MAX: u64 = 1_000;

/// Errors that can occur when stopping a [`Runner`].
#[derive(Debug)]
pub enum Error {
    /// The polling thread panicked.
    ThreadPanic,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::ThreadPanic => write!(f, "Thread panicked"),
        }
    }
}

impl error::Error for Error {}

/// Result type returned from methods that can have `runner::Error`s.
pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum Msg {
    Stop,
}

/// Plays the controller's pattern on a dedicated thread.
///
/// The thread is stopped and joined when `Runner` goes out of scope.
#[derive(Debug)]
pub struct Runner {
    controller: Arc<Controller>,
    poll_thread: Option<thread::JoinHandle<()>>,
    sender: Sender<Msg>,
}

impl Runner {
    /// Spawns a polling thread that drives `driver`, timed by `CLOCK_MONOTONIC`.
    pub fn spawn<D>(controller: Arc<Controller>, driver: D) -> Runner
    where
        D: OutputDriver + Send + 'static,
    {
        Runner::spawn_with_time_source(controller, driver, MonotonicClock::new())
    }

    /// Spawns a polling thread that drives `driver`, timed by `time`.
    ///
    /// The time source must be on the same timeline as the `now` values passed
    /// to the controller by other threads.
    pub fn spawn_with_time_source<D, T>(
        controller: Arc<Controller>,
        mut driver: D,
        time: T,
    ) -> Runner
    where
        D: OutputDriver + Send + 'static,
        T: TimeSource + Send + 'static,
    {
        let (sender, receiver): (Sender<Msg>, Receiver<Msg>) = mpsc::channel();
        let thread_controller = controller.clone();

        let poll_thread = thread::spawn(move || {
            set_realtime_priority();

            let controller = thread_controller;
            controller.park(&mut driver);

            log::trace!("Polling thread started");

            loop {
                controller.poll(time.now_us(), &mut driver);

                match receiver.try_recv() {
                    Ok(Msg::Stop) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }

                // Sleep if we have enough time remaining, while reserving some time
                // for busy waiting to compensate for sleep taking longer than needed.
                let remaining = controller.remaining(time.now_us());
                if remaining >= SLEEP_THRESHOLD {
                    sleep_us((remaining - BUSYWAIT_MAX).min(SLEEP_MAX));
                } else {
                    hint::spin_loop();
                }
            }

            log::trace!("Polling thread stopped");
        });

        Runner {
            controller,
            poll_thread: Some(poll_thread),
            sender,
        }
    }

    /// Returns the controller driven by this runner.
    pub fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }

    /// Returns `true` until [`stop`](Runner::stop) has been called.
    pub fn is_running(&self) -> bool {
        self.poll_thread.is_some()
    }

    /// Stops the polling thread and waits for it to exit.
    ///
    /// The output is left at the level of the last emitted symbol.
    pub fn stop(&mut self) -> Result<()> {
        let _ = self.sender.send(Msg::Stop);
        if let Some(poll_thread) = self.poll_thread.take() {
            if poll_thread.join().is_err() {
                return Err(Error::ThreadPanic);
            }
        }

        Ok(())
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        // Don't wait for the polling thread to exit if the main thread is panicking,
        // because we could potentially block indefinitely while unwinding if the
        // polling thread doesn't respond to the Stop message for some reason.
        if !thread::panicking() {
            let _ = self.stop();
        }
    }
}

// Set the scheduling policy to real-time round robin at the highest priority, and
// reduce the timer slack to 1 ns. Both fail without the required privileges, in which
// case we keep running with the defaults.
fn set_realtime_priority() {
    #[cfg(target_env = "gnu")]
    let params = sched_param {
        sched_priority: unsafe { libc::sched_get_priority_max(SCHED_RR) },
    };

    #[cfg(target_env = "musl")]
    let params = sched_param {
        sched_priority: unsafe { libc::sched_get_priority_max(SCHED_RR) },
        sched_ss_low_priority: 0,
        sched_ss_repl_period: timespec {
            tv_sec: 0,
            tv_nsec: 0,
        },
        sched_ss_init_budget: timespec {
            tv_sec: 0,
            tv_nsec: 0,
        },
        sched_ss_max_repl: 0,
    };

    if let Err(e) = parse_retval!(unsafe { libc::sched_setscheduler(0, SCHED_RR, &params) }) {
        log::trace!("Real-time scheduling unavailable: {}", e);
    }

    if let Err(e) = parse_retval!(unsafe { libc::prctl(PR_SET_TIMERSLACK, 1) }) {
        log::trace!("Unable to set timer slack: {}", e);
    }
}

#[inline(always)]
fn sleep_us(us: u64) {
    let ts = timespec {
        tv_sec: (us / 1_000_000) as time_t,
        tv_nsec: ((us % 1_000_000) * 1_000) as c_long,
    };

    unsafe {
        libc::clock_nanosleep(CLOCK_MONOTONIC, 0, &ts, ptr::null_mut());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use crate::output::Level;

    #[derive(Clone, Default)]
    struct SharedRecorder(Arc<Mutex<Vec<Level>>>);

    impl OutputDriver for SharedRecorder {
        fn write(&mut self, level: Level) {
            self.0.lock().unwrap().push(level);
        }
    }

    #[test]
    fn plays_pattern_until_stopped() {
        let clock = MonotonicClock::new();
        let controller = Arc::new(Controller::new(clock.now_us()).unwrap());
        controller.set_sequence("01", clock.now_us()).unwrap();
        controller.set_frequency(1000, clock.now_us()).unwrap();

        let recorder = SharedRecorder::default();
        let mut runner = Runner::spawn(controller.clone(), recorder.clone());
        assert!(runner.is_running());

        thread::sleep(Duration::from_millis(50));
        runner.stop().unwrap();
        assert!(!runner.is_running());

        let levels = recorder.0.lock().unwrap().clone();

        // Parked off, then alternating on/off starting with the first symbol.
        assert_eq!(levels[0], Level::Off);
        assert!(levels.len() > 10);
        for (i, level) in levels[1..].iter().enumerate() {
            let expected = if i % 2 == 0 { Level::On } else { Level::Off };
            assert_eq!(*level, expected);
        }

        // Nothing is emitted after stop() returns.
        let count = levels.len();
        thread::sleep(Duration::from_millis(10));
        assert_eq!(recorder.0.lock().unwrap().len(), count);
    }

    // Fails on the first lit symbol.
    struct FaultyLed;

    impl OutputDriver for FaultyLed {
        fn write(&mut self, level: Level) {
            if level == Level::On {
                panic!("LED driver fault");
            }
        }
    }

    struct FixedTime(u64);

    impl TimeSource for FixedTime {
        fn now_us(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn reports_thread_panic_and_keeps_controller_usable() {
        let controller = Arc::new(Controller::new(0).unwrap());
        controller.set_sequence("01", 0).unwrap();
        controller.set_frequency(1000, 0).unwrap();

        let mut runner =
            Runner::spawn_with_time_source(controller.clone(), FaultyLed, FixedTime(1_000));

        // The first symbol is due on the first pass, so the thread panics while
        // holding the controller's lock, before it ever looks for Stop.
        assert!(matches!(runner.stop(), Err(Error::ThreadPanic)));
        assert!(!runner.is_running());

        // The panicked write consumed nothing.
        let status = controller.status();
        assert_eq!(status.cursor, 0);
        assert_eq!(status.current_symbol, crate::pattern::Symbol::Zero);

        controller.set_sequence("11", 5_000).unwrap();
        let status = controller.status();
        assert_eq!(status.pattern.to_string(), "11");
        assert_eq!(status.cursor, 0);
        assert_eq!(status.frequency_hz, 1000);

        let recorder = SharedRecorder::default();
        let mut out = recorder.clone();
        assert_eq!(
            controller.tick(6_000, &mut out),
            Some(crate::pattern::Symbol::One)
        );
        assert_eq!(*recorder.0.lock().unwrap(), vec![Level::Off]);
    }

    #[test]
    fn stops_on_drop() {
        let controller = Arc::new(Controller::new(MonotonicClock::new().now_us()).unwrap());
        let recorder = SharedRecorder::default();

        {
            let runner = Runner::spawn(controller.clone(), recorder.clone());
            assert_eq!(Arc::strong_count(runner.controller()), 3);
        }

        assert_eq!(Arc::strong_count(&controller), 1);
    }
}
