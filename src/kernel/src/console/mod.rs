//! The console device.
//!
//! [`Console`] ties the pieces together behind one interrupt-masking lock:
//! the [`InputBuffer`] being edited, the [`Display`] it renders to, a
//! "readable" condition for blocked readers and the panic [`Governor`].
//!
//! - Interrupt context feeds raw input codes through [`Console::interrupt`].
//! - Process context consumes committed lines with [`Console::read`] and
//!   produces output with [`Console::write`] or [`Console::print`].
//!
//! A display error anywhere is fatal: the console prints a diagnostic, marks
//! itself halted and stops the CPU.

pub mod buffer;
mod dispatch;
pub mod display;

use core::fmt::{self, Write};

use cons_common::control::END_OF_INPUT;
use cons_common::{BatchOutcome, DisplayError, ReadError};
use cons_hal::{Cpu, Serial, TextGrid, WaitContext};
use log::debug;

use crate::sync::panic::{write_diagnostic, BACKTRACE_DEPTH};
use crate::sync::{CondVar, Governor, SpinLock, SpinLockGuard};

pub use buffer::{InputBuffer, INPUT_BUF};
pub use display::{Display, DisplayWriter};

/// Everything the console lock protects.
pub struct ConsoleState<G, S> {
    /// The line being edited plus committed, unread input.
    pub input: InputBuffer,
    /// The output device.
    pub display: Display<G, S>,
}

/// Callback run for the process-dump control code.
///
/// It is called after the console lock has been released, so it may print.
pub type DumpHook<G, S, C> = fn(&Console<G, S, C>);

/// A console bound to one grid, one serial mirror and one CPU handle.
pub struct Console<G, S, C> {
    state: SpinLock<ConsoleState<G, S>, C>,
    readable: CondVar,
    governor: Governor,
    dump_hook: spin::Once<DumpHook<G, S, C>>,
}

impl<G: TextGrid, S: Serial, C: Cpu> Console<G, S, C> {
    /// Creates a console with an empty input buffer.
    ///
    /// The grid is used as is; call [`clear`](Self::clear) to blank it.
    pub const fn new(grid: G, serial: S, cpu: C) -> Self {
        Self {
            state: SpinLock::new(
                ConsoleState {
                    input: InputBuffer::new(),
                    display: Display::new(grid, serial),
                },
                cpu,
            ),
            readable: CondVar::new(),
            governor: Governor::new(),
            dump_hook: spin::Once::new(),
        }
    }

    /// Registers the process-dump callback.
    ///
    /// Only the first registration takes effect. Returns whether `hook` was
    /// installed.
    pub fn on_process_dump(&self, hook: DumpHook<G, S, C>) -> bool {
        let mut installed = false;
        self.dump_hook.call_once(|| {
            installed = true;
            hook
        });
        installed
    }

    /// Returns the panic governor.
    pub fn governor(&self) -> &Governor {
        &self.governor
    }

    /// Feeds a batch of raw input codes from the interrupt handler.
    ///
    /// The batch ends when `codes` runs dry. Never blocks. Readers are woken
    /// if a line was committed, and the process-dump hook runs once the lock
    /// has been released.
    pub fn interrupt<I: IntoIterator<Item = u8>>(&self, codes: I) -> BatchOutcome {
        self.halt_if_panicked();

        let mut outcome = BatchOutcome::empty();
        let mut state = self.state.lock();
        for code in codes {
            match dispatch::dispatch(&mut *state, code) {
                Ok(result) => outcome |= result,
                Err(err) => self.display_failure(state, err),
            }
        }
        drop(state);

        if outcome.contains(BatchOutcome::COMMITTED) {
            self.readable.notify_all();
        }
        if outcome.contains(BatchOutcome::PROCESS_DUMP) {
            match self.dump_hook.get() {
                Some(hook) => hook(self),
                None => debug!("console: process dump requested, no hook registered"),
            }
        }
        outcome
    }

    /// Reads committed input into `dst`, blocking until some is available.
    ///
    /// Stops after a newline, when `dst` is full, or at an end-of-input
    /// marker. `Ok(0)` means end of input. Once at least one byte has been
    /// copied the call returns rather than waiting for more.
    ///
    /// Returns [`ReadError::Cancelled`] if `ctx` is killed while waiting; no
    /// input is consumed in that case.
    pub fn read<W: WaitContext>(&self, ctx: &W, dst: &mut [u8]) -> Result<usize, ReadError> {
        let mut copied = 0;
        let mut state = self.state.lock();

        while copied < dst.len() {
            if state.input.end_reached() {
                if copied == 0 {
                    state.input.take_end();
                }
                break;
            }
            let Some(byte) = state.input.pop() else {
                if copied > 0 {
                    break;
                }
                state = self.readable.wait(state, ctx).map_err(|err| {
                    debug!("console: reader cancelled while waiting");
                    ReadError::from(err)
                })?;
                continue;
            };

            if byte == END_OF_INPUT {
                // Leave the marker for the next call so it sees end of input.
                if copied > 0 {
                    state.input.unpop();
                }
                break;
            }
            dst[copied] = byte;
            copied += 1;
            if byte == b'\n' {
                break;
            }
        }
        Ok(copied)
    }

    /// Writes raw bytes at the cursor. Returns the number of bytes written.
    pub fn write(&self, src: &[u8]) -> usize {
        self.halt_if_panicked();

        let mut state = self.state.lock();
        for &byte in src {
            if let Err(err) = state.display.put_char(byte) {
                self.display_failure(state, err);
            }
        }
        src.len()
    }

    /// Writes formatted output at the cursor.
    pub fn print(&self, args: fmt::Arguments<'_>) {
        self.halt_if_panicked();

        let mut state = self.state.lock();
        let mut writer = DisplayWriter::new(&mut state.display);
        // A formatting error without a display error came from a user
        // `Display` impl and only truncates this output.
        let _ = writer.write_fmt(args);
        if let Err(err) = writer.finish() {
            self.display_failure(state, err);
        }
    }

    /// Blanks the display and homes the cursor.
    pub fn clear(&self) {
        self.halt_if_panicked();
        self.state.lock().display.clear();
    }

    /// Runs `f` with the console state locked.
    pub fn inspect<R>(&self, f: impl FnOnce(&ConsoleState<G, S>) -> R) -> R {
        f(&self.state.lock())
    }

    /// Reports a fatal error and stops this CPU.
    ///
    /// Takes the console state even if another context holds the lock; that
    /// context halts at its next output once the governor is `Halted`.
    pub fn fatal(&self, args: fmt::Arguments<'_>) -> ! {
        self.state.cpu().disable_interrupts();
        // SAFETY: nothing returns from here, and every other context stops at
        // its next output entry once the governor is halted below.
        let state = unsafe { self.state.steal() };
        self.fatal_locked(state, args)
    }

    fn fatal_locked(
        &self,
        mut state: SpinLockGuard<'_, ConsoleState<G, S>, C>,
        args: fmt::Arguments<'_>,
    ) -> ! {
        let cpu = self.state.cpu();
        cpu.disable_interrupts();

        let mut pcs = [0usize; BACKTRACE_DEPTH];
        cpu.caller_pcs(&mut pcs);

        state.display.enter_fatal();
        state.display.rescue_cursor();
        let mut out = DisplayWriter::new(&mut state.display);
        // Nothing is left to report a failure to.
        let _ = write_diagnostic(&mut out, cpu.id(), args, &pcs);

        self.governor.halt();
        cpu.halt()
    }

    fn display_failure(
        &self,
        state: SpinLockGuard<'_, ConsoleState<G, S>, C>,
        err: DisplayError,
    ) -> ! {
        self.fatal_locked(state, format_args!("{}", err))
    }

    fn halt_if_panicked(&self) {
        if self.governor.is_halted() {
            let cpu = self.state.cpu();
            cpu.disable_interrupts();
            cpu.halt();
        }
    }
}
