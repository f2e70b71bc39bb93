//! Console Hardware Abstraction Layer (HAL) traits.
//!
//! This crate defines traits that abstract away platform-specific hardware
//! details, so the console's editing and display logic can run against real
//! hardware or the in-memory models in [`mock`].

#![no_std]

#[cfg(feature = "mock")]
extern crate std;

#[cfg(feature = "mock")]
pub mod mock;

/// Trait for a serial port or similar byte sink.
pub trait Serial {
    /// Writes a single byte to the serial port.
    fn write_byte(&mut self, byte: u8);

    /// Switches to an output path that takes no locks, for the rest of the
    /// session. Called before a fatal diagnostic, when the context that
    /// failed may still hold the port's lock.
    fn enter_fatal(&mut self) {}
}

/// Trait for a memory-mapped character grid with a hardware cursor register.
///
/// Positions are linear cell offsets: `row * width + col`.
pub trait TextGrid {
    /// Number of columns.
    fn width(&self) -> usize;
    /// Number of rows.
    fn height(&self) -> usize;
    /// Reads the character stored at `pos`.
    fn read_cell(&self, pos: usize) -> u8;
    /// Writes a character to `pos`.
    fn write_cell(&mut self, pos: usize, byte: u8);
    /// Reads the hardware cursor register.
    fn cursor(&self) -> usize;
    /// Writes the hardware cursor register.
    fn set_cursor(&mut self, pos: usize);

    /// Moves every row up by one. The bottom row keeps its old contents.
    fn shift_up(&mut self) {
        let width = self.width();
        for pos in width..width * self.height() {
            let byte = self.read_cell(pos);
            self.write_cell(pos - width, byte);
        }
    }
}

/// Trait for the CPU executing the current context.
pub trait Cpu {
    /// Identifier of this CPU, used in fatal diagnostics.
    fn id(&self) -> u32;
    /// Returns whether interrupts are enabled on this CPU.
    fn interrupts_enabled(&self) -> bool;
    /// Disables interrupts on this CPU.
    fn disable_interrupts(&self);
    /// Enables interrupts on this CPU.
    fn enable_interrupts(&self);
    /// Fills `pcs` with the caller's return addresses, zero past the end of
    /// the frame chain.
    fn caller_pcs(&self, pcs: &mut [usize]);
    /// Stops this CPU forever.
    fn halt(&self) -> !;
}

/// Trait for the execution context of a blocking call.
pub trait WaitContext {
    /// Returns whether this context has been marked for termination.
    fn killed(&self) -> bool;
    /// Suspends this context until something may have changed.
    ///
    /// Spurious returns are allowed; callers re-check their condition.
    fn sleep(&self);
}
