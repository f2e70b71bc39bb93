//! Types shared between the console driver and its hardware backends.

#![no_std]
#![warn(missing_docs)]

pub mod control;
pub mod error;

pub use control::{BatchOutcome, ControlCode};
pub use error::{DisplayError, ReadError, WaitError};
