//! x86_64 architecture support.
//!
//! Wires the console to real hardware: the VGA text buffer and CRT cursor
//! registers, COM1, the local CPU, the PS/2 keyboard and the 8259 PICs.

pub mod cpu;
pub mod interrupts;
pub mod keyboard;
pub mod pic;
pub mod serial;
pub mod vga;

use core::fmt;

use conquer_once::spin::OnceCell;

use crate::console::Console;

pub use cpu::{HaltWait, X86Cpu};
pub use serial::ComPort;
pub use vga::VgaGrid;

/// The console type the kernel runs with.
pub type KernelConsole = Console<VgaGrid, ComPort, X86Cpu>;

static CONSOLE: OnceCell<KernelConsole> = OnceCell::uninit();

/// Creates the kernel console and blanks the screen.
///
/// Idempotent - later calls leave the existing console alone.
pub fn init_console() {
    let mut created = false;
    CONSOLE.init_once(|| {
        created = true;
        Console::new(VgaGrid::new(), ComPort::new(), X86Cpu)
    });
    if created {
        if let Some(console) = CONSOLE.get() {
            console.clear();
        }
    }
}

/// Returns the kernel console, if it has been created.
pub fn console() -> Option<&'static KernelConsole> {
    CONSOLE.get()
}

/// Prints to the console without a newline.
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::arch::x86_64::_print(format_args!($($arg)*))
    };
}

/// Prints to the console with a newline.
#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", format_args!($($arg)*)))
}

/// Internal print function used by macros.
///
/// Falls back to the serial port before the console exists.
#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    match console() {
        Some(console) => console.print(args),
        None => serial::_print(args),
    }
}

/// Halts the CPU until the next interrupt.
#[inline]
pub fn hlt() {
    x86_64::instructions::hlt();
}

/// Halts the CPU in an infinite loop.
///
/// Used after unrecoverable errors.
pub fn halt_loop() -> ! {
    loop {
        hlt();
    }
}
