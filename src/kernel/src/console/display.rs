//! Display device: a character grid with a hardware cursor, mirrored to a
//! serial sink.
//!
//! Every cursor update is validated against `0..=rows * cols`. The position
//! `rows * cols` itself is accepted and immediately scrolled away, so the
//! register always ends up on a writable cell. Anything else is reported as
//! [`DisplayError::CursorOutOfRange`] and the register is left untouched.

use core::fmt;

use cons_common::control::BACKSPACE;
use cons_common::DisplayError;
use cons_hal::{Serial, TextGrid};

/// Character used to clear cells.
pub const BLANK: u8 = b' ';

/// The console's output device.
pub struct Display<G, S> {
    grid: G,
    serial: S,
}

impl<G: TextGrid, S: Serial> Display<G, S> {
    /// Wraps a grid and the serial sink that mirrors it.
    pub const fn new(grid: G, serial: S) -> Self {
        Self { grid, serial }
    }

    /// Returns the hardware cursor position.
    pub fn cursor(&self) -> usize {
        self.grid.cursor()
    }

    fn limit(&self) -> usize {
        self.grid.width() * self.grid.height()
    }

    /// Writes one character at the cursor.
    ///
    /// `\n` moves to the start of the next row and backspace moves back one
    /// cell without erasing it. Every byte is mirrored to the serial sink.
    pub fn put_char(&mut self, ch: u8) -> Result<(), DisplayError> {
        self.serial.write_byte(ch);

        let width = self.grid.width() as isize;
        let mut pos = self.grid.cursor() as isize;
        match ch {
            b'\n' => pos += width - pos % width,
            BACKSPACE => {
                if pos > 0 {
                    pos -= 1;
                }
            }
            _ => {
                if pos as usize >= self.limit() {
                    return Err(DisplayError::CursorOutOfRange { pos });
                }
                self.grid.write_cell(pos as usize, ch);
                pos += 1;
            }
        }
        self.settle(pos)
    }

    /// Moves the cursor by `delta` cells without writing.
    ///
    /// The serial mirror follows with backspaces for negative deltas and a
    /// re-emission of the skipped cells for positive ones.
    pub fn move_cursor_by(&mut self, delta: isize) -> Result<(), DisplayError> {
        if delta == 0 {
            return Ok(());
        }
        let from = self.grid.cursor() as isize;
        let to = from + delta;
        if delta < 0 {
            for _ in 0..delta.unsigned_abs() {
                self.serial.write_byte(BACKSPACE);
            }
        } else {
            let end = to.min(self.limit() as isize);
            for pos in from..end {
                let byte = self.grid.read_cell(pos as usize);
                self.serial.write_byte(byte);
            }
        }
        self.settle(to)
    }

    /// Scrolls the grid up one row and moves the cursor up with it.
    pub fn scroll(&mut self) {
        self.shift_rows();
        let pos = self.grid.cursor().saturating_sub(self.grid.width());
        self.grid.set_cursor(pos);
    }

    /// Blanks the whole grid and homes the cursor.
    pub fn clear(&mut self) {
        for pos in 0..self.limit() {
            self.grid.write_cell(pos, BLANK);
        }
        self.grid.set_cursor(0);
    }

    /// Switches the serial mirror to its lock-free fatal path.
    pub fn enter_fatal(&mut self) {
        self.serial.enter_fatal();
    }

    /// Moves a cursor that lies outside the grid to the start of the bottom
    /// row. Used before printing a fatal diagnostic.
    pub fn rescue_cursor(&mut self) {
        let limit = self.limit();
        if self.grid.cursor() >= limit {
            self.grid.set_cursor(limit - self.grid.width());
        }
    }

    fn shift_rows(&mut self) {
        let width = self.grid.width();
        let bottom = self.limit() - width;
        self.grid.shift_up();
        for pos in bottom..bottom + width {
            self.grid.write_cell(pos, BLANK);
        }
    }

    /// Validates `pos`, scrolls if it fell off the bottom row, and writes the
    /// cursor register.
    fn settle(&mut self, pos: isize) -> Result<(), DisplayError> {
        if pos < 0 || pos as usize > self.limit() {
            return Err(DisplayError::CursorOutOfRange { pos });
        }
        let width = self.grid.width();
        let mut pos = pos as usize;
        while pos / width >= self.grid.height() {
            self.shift_rows();
            pos -= width;
        }
        self.grid.set_cursor(pos);
        Ok(())
    }
}

/// `fmt::Write` adapter that remembers the first display error.
pub struct DisplayWriter<'a, G, S> {
    display: &'a mut Display<G, S>,
    error: Option<DisplayError>,
}

impl<'a, G: TextGrid, S: Serial> DisplayWriter<'a, G, S> {
    /// Starts writing formatted text at the cursor.
    pub fn new(display: &'a mut Display<G, S>) -> Self {
        Self {
            display,
            error: None,
        }
    }

    /// Returns the display error that stopped output, if any.
    pub fn finish(self) -> Result<(), DisplayError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<G: TextGrid, S: Serial> fmt::Write for DisplayWriter<'_, G, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if let Err(err) = self.display.put_char(byte) {
                self.error = Some(err);
                return Err(fmt::Error);
            }
        }
        Ok(())
    }
}
