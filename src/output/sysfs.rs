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

//! Linux sysfs GPIO output driver.

use std::ffi::CString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::linux::fs::MetadataExt;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use super::{Level, OutputDriver};

const SYSFS_GPIO: &str = "/sys/class/gpio";

// Find group ID for specified group name
fn group_name_to_gid(name: &str) -> Option<u32> {
    if let Ok(name_cstr) = CString::new(name) {
        unsafe {
            let group_ptr = libc::getgrnam(name_cstr.as_ptr());

            if !group_ptr.is_null() {
                return Some((*group_ptr).gr_gid);
            }
        }
    }

    None
}

fn export(root: &Path, pin: u8) -> io::Result<()> {
    let pin_dir = root.join(format!("gpio{}", pin));

    // Only export if the pin isn't already exported
    if !pin_dir.exists() {
        File::create(root.join("export"))?.write_fmt(format_args!("{}", pin))?;
    }

    // The exported pin starts off owned by root:root, until udev moves it over to
    // the gpio group. Wait for max. 1s for the group to change.
    let gid_gpio = group_name_to_gid("gpio").unwrap_or(0);

    let mut counter = 0;
    while counter < 20 {
        let meta = fs::metadata(&pin_dir)?;
        if meta.st_gid() == gid_gpio {
            break;
        }

        thread::sleep(Duration::from_millis(50));
        counter += 1;
    }

    Ok(())
}

fn unexport(root: &Path, pin: u8) -> io::Result<()> {
    // Only unexport if the pin is actually exported
    if root.join(format!("gpio{}", pin)).exists() {
        File::create(root.join("unexport"))?.write_fmt(format_args!("{}", pin))?;
    }

    Ok(())
}

// Writing "high" switches the pin to output mode and sets it high in one step,
// so the pin never glitches low on the way.
fn set_output_high(root: &Path, pin: u8) -> io::Result<()> {
    File::create(root.join(format!("gpio{}/direction", pin)))?.write_all(b"high")?;

    Ok(())
}

fn open_value(root: &Path, pin: u8) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .open(root.join(format!("gpio{}/value", pin)))
}

/// Drives a single GPIO pin through the sysfs interface.
///
/// The pin is configured as an output with its level set high, which keeps an
/// active-low LED dark until the first symbol is emitted. [`Level::On`] drives
/// the pin low, [`Level::Off`] drives it high.
///
/// By default, the pin is unexported when `SysfsOutput` goes out of scope. Use
/// [`set_unexport_on_drop(false)`](SysfsOutput::set_unexport_on_drop) to leave it
/// exported.
#[derive(Debug)]
pub struct SysfsOutput {
    root: PathBuf,
    pin: u8,
    value: File,
    unexport_on_drop: bool,
}

impl SysfsOutput {
    /// Exports `pin` from `/sys/class/gpio` and configures it as an output.
    pub fn new(pin: u8) -> io::Result<SysfsOutput> {
        SysfsOutput::with_root(SYSFS_GPIO, pin)
    }

    /// Same as [`new`](SysfsOutput::new), but uses `root` instead of `/sys/class/gpio`.
    pub fn with_root<P: AsRef<Path>>(root: P, pin: u8) -> io::Result<SysfsOutput> {
        let root = root.as_ref().to_path_buf();

        export(&root, pin)?;
        set_output_high(&root, pin)?;
        let value = open_value(&root, pin)?;

        log::info!("GPIO {} exported as output ({})", pin, root.display());

        Ok(SysfsOutput {
            root,
            pin,
            value,
            unexport_on_drop: true,
        })
    }

    /// Returns the GPIO pin number.
    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Returns the value of `unexport_on_drop`.
    pub fn unexport_on_drop(&self) -> bool {
        self.unexport_on_drop
    }

    /// When enabled, unexports the pin when `SysfsOutput` goes out of scope.
    ///
    /// By default, `unexport_on_drop` is set to `true`.
    pub fn set_unexport_on_drop(&mut self, unexport_on_drop: bool) {
        self.unexport_on_drop = unexport_on_drop;
    }
}

impl OutputDriver for SysfsOutput {
    fn write(&mut self, level: Level) {
        let b_value: &[u8] = match level {
            Level::On => b"0",
            Level::Off => b"1",
        };

        if let Err(e) = self.value.write_at(b_value, 0) {
            log::warn!("GPIO {}: failed to write {}: {}", self.pin, level, e);
        }
    }
}

impl Drop for SysfsOutput {
    fn drop(&mut self) {
        if self.unexport_on_drop {
            if let Err(e) = unexport(&self.root, self.pin) {
                log::warn!("GPIO {}: failed to unexport: {}", self.pin, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::process;

    fn fake_sysfs(name: &str, pin: u8) -> PathBuf {
        let root = std::env::temp_dir().join(format!("vlc-beacon-{}-{}", name, process::id()));
        let pin_dir = root.join(format!("gpio{}", pin));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&pin_dir).unwrap();
        File::create(pin_dir.join("value")).unwrap();

        root
    }

    #[test]
    fn writes_active_low_values() {
        let root = fake_sysfs("write", 17);
        let mut output = SysfsOutput::with_root(&root, 17).unwrap();
        output.set_unexport_on_drop(false);

        assert_eq!(
            fs::read_to_string(root.join("gpio17/direction")).unwrap(),
            "high"
        );

        output.write(Level::On);
        assert_eq!(fs::read_to_string(root.join("gpio17/value")).unwrap(), "0");

        output.write(Level::Off);
        assert_eq!(fs::read_to_string(root.join("gpio17/value")).unwrap(), "1");

        drop(output);
        assert!(!root.join("unexport").exists());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn unexports_on_drop() {
        let root = fake_sysfs("drop", 4);
        let output = SysfsOutput::with_root(&root, 4).unwrap();

        assert!(output.unexport_on_drop());
        assert_eq!(output.pin(), 4);
        drop(output);

        assert_eq!(fs::read_to_string(root.join("unexport")).unwrap(), "4");

        let _ = fs::remove_dir_all(&root);
    }
}
