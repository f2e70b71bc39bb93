//! Fatal-error state and diagnostics.
//!
//! Once a fatal condition is reported the console is `Halted` for the rest of
//! the session: every output entry point stops its CPU instead of proceeding.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

/// Number of return addresses printed in a fatal diagnostic.
pub const BACKTRACE_DEPTH: usize = 10;

/// Session state with respect to fatal errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PanicState {
    /// Normal operation.
    Running = 0,
    /// A fatal error was reported. Terminal.
    Halted = 1,
}

/// Holds the one-way `Running -> Halted` transition.
pub struct Governor {
    state: AtomicU8,
}

impl Governor {
    /// Create a governor in the `Running` state.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(PanicState::Running as u8),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> PanicState {
        match self.state.load(Ordering::Acquire) {
            0 => PanicState::Running,
            _ => PanicState::Halted,
        }
    }

    /// Returns whether a fatal error has been reported.
    pub fn is_halted(&self) -> bool {
        self.state() == PanicState::Halted
    }

    /// Enter the `Halted` state. There is no way back.
    pub fn halt(&self) {
        self.state.store(PanicState::Halted as u8, Ordering::Release);
    }
}

impl Default for Governor {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes a fatal diagnostic: a header line naming the reporting CPU, then one
/// return address per line.
pub fn write_diagnostic<W: fmt::Write>(
    out: &mut W,
    cpu: u32,
    message: fmt::Arguments<'_>,
    pcs: &[usize],
) -> fmt::Result {
    writeln!(out, "cpu {}: panic: {}", cpu, message)?;
    for pc in pcs {
        writeln!(out, "  {:#x}", pc)?;
    }
    Ok(())
}
