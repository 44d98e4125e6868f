// beacon_console.rs - Plays a binary pattern on the terminal instead of a pin,
// and accepts configuration requests on stdin.
//
// Commands:
//   p <bits>   replace the pattern, e.g. "p 110010"
//   f <hz>     set the frequency, 0 reverts to the default rate
//   s          print a status snapshot
//   q          quit

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use vlc_beacon::clock::{MonotonicClock, TimeSource};
use vlc_beacon::controller::{Controller, Request, Response};
use vlc_beacon::output::{Level, OutputDriver};
use vlc_beacon::runner::Runner;

// Draws the LED state as a block character.
struct Console;

impl OutputDriver for Console {
    fn write(&mut self, level: Level) {
        let mut stdout = io::stdout();
        let _ = match level {
            Level::On => stdout.write_all("█".as_bytes()),
            Level::Off => stdout.write_all(b"."),
        };
        let _ = stdout.flush();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let clock = MonotonicClock::new();
    let controller = Arc::new(Controller::new(clock.now_us())?);
    let mut runner = Runner::spawn(controller.clone(), Console);

    for line in io::stdin().lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();

        let request = match (parts.next(), parts.next()) {
            (Some("p"), Some(bits)) => Request::SetSequence(bits.to_owned()),
            (Some("f"), Some(hz)) => match hz.parse() {
                Ok(hz) => Request::SetFrequency(hz),
                Err(_) => {
                    println!("\nMissing frequency parameter");
                    continue;
                }
            },
            (Some("s"), None) => Request::Status,
            (Some("q"), None) => break,
            _ => {
                println!("\nUnknown command");
                continue;
            }
        };

        match controller.handle(request, clock.now_us()) {
            Response::Ok => println!("\nOK"),
            Response::Rejected(reason) => println!("\nError: {}", reason),
            Response::Status(status) => println!("\n{}", status),
        }
    }

    runner.stop()?;

    Ok(())
}
