//! The console's fixed control-code table.
//!
//! Input arrives as raw byte codes, either typed characters or control
//! codes produced by the keyboard decoder. The table is not configurable.

use bitflags::bitflags;

/// Returns the control code produced by holding Ctrl and pressing `x`.
pub const fn ctrl(x: u8) -> u8 {
    x - b'@'
}

/// Returns the code produced by holding Shift and pressing `x`.
pub const fn shift(x: u8) -> u8 {
    x + b' '
}

/// Kill the current line (`^U`).
pub const KILL_LINE: u8 = ctrl(b'U');
/// Interrupt, treated as kill line (`^C`).
pub const INTERRUPT: u8 = ctrl(b'C');
/// Backspace (`^H`).
pub const BACKSPACE: u8 = ctrl(b'H');
/// Delete key.
pub const DELETE: u8 = 0x7f;
/// Move the cursor to the start of the line (`{`).
pub const CURSOR_HOME: u8 = shift(b'[');
/// Move the cursor to the end of the line (`}`).
pub const CURSOR_END: u8 = shift(b']');
/// Print the process list (`^P`).
pub const PROCESS_DUMP: u8 = ctrl(b'P');
/// End of input (`^D`).
pub const END_OF_INPUT: u8 = ctrl(b'D');

/// A classified input code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlCode {
    /// Erase the whole current line.
    KillLine,
    /// Erase the character before the cursor.
    Backspace,
    /// Move the cursor to the start of the line.
    CursorHome,
    /// Move the cursor to the end of the line.
    CursorEnd,
    /// Dump the process table once the console lock is released.
    ProcessDump,
    /// Commit the current line and mark end of input.
    EndOfInput,
    /// Commit the current line.
    Newline,
    /// Code that carries no meaning (NUL).
    Ignore,
    /// Printable input to insert at the cursor.
    Char(u8),
}

impl ControlCode {
    /// Classifies a raw input code.
    ///
    /// Carriage return is normalized to newline.
    pub const fn classify(code: u8) -> Self {
        match code {
            KILL_LINE | INTERRUPT => ControlCode::KillLine,
            BACKSPACE | DELETE => ControlCode::Backspace,
            CURSOR_HOME => ControlCode::CursorHome,
            CURSOR_END => ControlCode::CursorEnd,
            PROCESS_DUMP => ControlCode::ProcessDump,
            END_OF_INPUT => ControlCode::EndOfInput,
            b'\r' | b'\n' => ControlCode::Newline,
            0 => ControlCode::Ignore,
            c => ControlCode::Char(c),
        }
    }
}

bitflags! {
    /// What happened while a batch of input codes was dispatched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct BatchOutcome: u8 {
        /// At least one line was committed and readers were woken.
        const COMMITTED    = 1 << 0;
        /// An end-of-input marker was committed.
        const END_OF_INPUT = 1 << 1;
        /// A process dump was requested and ran after the lock was released.
        const PROCESS_DUMP = 1 << 2;
        /// Printable input was dropped because the buffer was full.
        const DROPPED      = 1 << 3;
    }
}
