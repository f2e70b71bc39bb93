//! Serial port driver for x86_64.
//!
//! COM1 (0x3F8) carries the console mirror and the kernel log.

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicBool, Ordering};
use spin::Mutex;
use uart_16550::SerialPort;

/// COM1 I/O port address.
const COM1_PORT: u16 = 0x3F8;

/// Global serial port instance, lazily initialized.
pub static SERIAL: spin::Once<Mutex<SerialPort>> = spin::Once::new();

/// Set once a fatal diagnostic starts; from then on nobody takes `SERIAL`.
static FATAL: AtomicBool = AtomicBool::new(false);

/// Initializes the global serial port.
///
/// This function is idempotent - calling it multiple times has no effect
/// after the first successful initialization.
pub fn init() {
    get_serial();
}

fn get_serial() -> &'static Mutex<SerialPort> {
    SERIAL.call_once(|| {
        // SAFETY: COM1_PORT (0x3F8) is a well-known x86 serial port address.
        // We're running in kernel mode with full I/O port access.
        let mut serial = unsafe { SerialPort::new(COM1_PORT) };
        serial.init();
        Mutex::new(serial)
    })
}

/// Prints to the serial port without a newline.
#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => {
        $crate::arch::x86_64::serial::_print(format_args!($($arg)*))
    };
}

/// Prints to the serial port with a newline.
#[macro_export]
macro_rules! serial_println {
    () => ($crate::serial_print!("\n"));
    ($($arg:tt)*) => ($crate::serial_print!("{}\n", format_args!($($arg)*)))
}

/// Internal print function used by macros.
///
/// Interrupts are masked while the port is held, so an interrupt handler that
/// logs cannot deadlock against the code it interrupted.
#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    x86_64::instructions::interrupts::without_interrupts(|| {
        if FATAL.load(Ordering::Acquire) {
            let _ = unlocked_port().write_fmt(args);
            return;
        }
        let _ = get_serial().lock().write_fmt(args);
    });
}

/// A handle on COM1 that bypasses `SERIAL`.
fn unlocked_port() -> SerialPort {
    // SAFETY: only used once `FATAL` is set. The port was initialized by
    // `init`, and every other context halts at its next console output.
    unsafe { SerialPort::new(COM1_PORT) }
}

/// The console's serial mirror on COM1.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComPort;

impl ComPort {
    /// Creates the mirror. The port itself is set up by [`init`].
    pub const fn new() -> Self {
        Self
    }
}

impl cons_hal::Serial for ComPort {
    /// Sends bytes untranslated, so a backspace only moves the remote
    /// cursor just like it does on the grid.
    fn write_byte(&mut self, byte: u8) {
        if FATAL.load(Ordering::Acquire) {
            unlocked_port().send_raw(byte);
            return;
        }
        get_serial().lock().send_raw(byte);
    }

    /// The failing context may be the one holding `SERIAL` (a panic while
    /// logging), so the diagnostic goes straight to the UART registers.
    fn enter_fatal(&mut self) {
        FATAL.store(true, Ordering::Release);
    }
}
