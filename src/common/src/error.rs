//! Console error types.

use core::fmt;

/// Errors raised by the display device.
///
/// Any of these is fatal: the console escalates it to the panic governor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DisplayError {
    /// The hardware cursor would leave `0..=rows * cols`.
    CursorOutOfRange {
        /// The rejected linear position.
        pos: isize,
    },
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::CursorOutOfRange { pos } => {
                write!(f, "cursor position {} under/overflow", pos)
            }
        }
    }
}

/// Errors returned to a console reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReadError {
    /// The reader was killed while waiting for input.
    Cancelled,
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Cancelled => write!(f, "read cancelled"),
        }
    }
}

/// Reasons a condition wait ends without being notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WaitError {
    /// The waiting context was marked for termination.
    Killed,
}

impl fmt::Display for WaitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitError::Killed => write!(f, "waiting context killed"),
        }
    }
}

impl From<WaitError> for ReadError {
    fn from(err: WaitError) -> Self {
        match err {
            WaitError::Killed => ReadError::Cancelled,
        }
    }
}
