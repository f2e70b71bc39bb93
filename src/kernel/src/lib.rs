//! Console subsystem of a small teaching kernel.
//!
//! A text-mode terminal driver: interrupt-driven input lands in an editable
//! line buffer, edits are rendered to a character grid with a hardware cursor,
//! and committed lines are handed to blocking readers.
//!
//! # Architecture
//!
//! The kernel is structured into the following modules:
//! - `console`: line editor, display device, dispatcher and read/write endpoint
//! - `sync`: interrupt-masking spin lock, condition variable, panic governor
//! - `arch`: bare-metal backends (VGA, serial, interrupts, keyboard)
//! - `logger`: `log` facade backend writing to the serial port
//!
//! # Safety
//!
//! This is a `#![no_std]` kernel. All unsafe code is documented with safety
//! invariants explaining why the usage is correct.

#![no_std]
#![cfg_attr(target_os = "none", feature(abi_x86_interrupt))]
#![warn(missing_docs)]

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
extern crate alloc;

#[cfg(test)]
extern crate std;

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub mod allocator;
pub mod arch;
pub mod console;
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub mod logger;
pub mod sync;

pub use console::Console;

/// Initializes core kernel subsystems.
///
/// Called early in the boot process, before interrupts are enabled.
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub fn init() {
    arch::x86_64::serial::init();
    logger::init();
    allocator::init_heap();
    arch::x86_64::keyboard::init();
    arch::x86_64::init_console();
    arch::x86_64::interrupts::init_idt();
}
