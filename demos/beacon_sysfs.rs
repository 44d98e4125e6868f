// beacon_sysfs.rs - Plays a binary pattern on an LED through the sysfs GPIO
// interface, while handling any incoming SIGINT (Ctrl-C) and SIGTERM signals so
// the pin can be released before the application exits.
//
// Usage: beacon_sysfs [PATTERN] [FREQUENCY_HZ]
//
// The LED is expected to be wired active-low: a 0 in the pattern turns it on.
// Remember to add a resistor of an appropriate value in series, to prevent
// exceeding the maximum current rating of the GPIO pin and the LED.

use std::env;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// The simple-signal crate is used to handle incoming signals.
use simple_signal::{self, Signal};

use vlc_beacon::clock::{MonotonicClock, TimeSource};
use vlc_beacon::controller::Controller;
use vlc_beacon::output::sysfs::SysfsOutput;
use vlc_beacon::runner::Runner;

// sysfs uses the kernel's GPIO numbering.
const GPIO_LED: u8 = 23;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1);
    let clock = MonotonicClock::new();
    let controller = Arc::new(Controller::new(clock.now_us())?);

    if let Some(pattern) = args.next() {
        controller.set_sequence(&pattern, clock.now_us())?;
    }

    if let Some(hz) = args.next() {
        controller.set_frequency(hz.parse()?, clock.now_us())?;
    }

    let running = Arc::new(AtomicBool::new(true));

    // When a SIGINT (Ctrl-C) or SIGTERM signal is caught, atomically set running to false.
    simple_signal::set_handler(&[Signal::Int, Signal::Term], {
        let running = running.clone();
        move |_| {
            running.store(false, Ordering::SeqCst);
        }
    });

    let mut runner = Runner::spawn(controller.clone(), SysfsOutput::new(GPIO_LED)?);

    // Print a status line every second until running is set to false.
    while running.load(Ordering::SeqCst) {
        println!("{}", controller.status());
        thread::sleep(Duration::from_secs(1));
    }

    runner.stop()?;

    Ok(())

    // When the runner goes out of scope, the output is dropped and the GPIO pin
    // is unexported.
}
