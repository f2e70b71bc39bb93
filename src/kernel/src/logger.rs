//! `log` backend that writes to COM1.
//!
//! Records go straight to the serial port, never to the console, so logging
//! from inside the console lock is safe.

use log::{LevelFilter, Log, Metadata, Record};

use crate::serial_println;

/// Most verbose level that is emitted.
const MAX_LEVEL: LevelFilter = LevelFilter::Info;

struct KernelLogger;

static LOGGER: KernelLogger = KernelLogger;

impl Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= MAX_LEVEL
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            serial_println!("[{}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Installs the serial logger. Later calls do nothing.
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(MAX_LEVEL);
    }
}
