//! The input editing buffer.
//!
//! A fixed ring of [`INPUT_BUF`] bytes addressed by four logical counters
//! that only ever grow (except for the reader's one-step retraction of an
//! end-of-input marker). Each counter maps into the ring modulo the capacity.
//!
//! ```text
//!   read        write           edit            last
//!    |  committed |  before cursor |  after cursor |
//! ```
//!
//! Invariant: `read <= write <= edit <= last <= read + INPUT_BUF`.
//!
//! Every editing operation keeps the display's hardware cursor in step with
//! `edit` by issuing explicit cursor deltas, and only re-renders the cells
//! that actually shifted.

use cons_common::control::END_OF_INPUT;
use cons_common::DisplayError;
use cons_hal::{Serial, TextGrid};

use super::display::{Display, BLANK};

/// Capacity of the input buffer in bytes.
pub const INPUT_BUF: usize = 128;

/// Line editor state plus the not-yet-read committed input.
pub struct InputBuffer {
    buf: [u8; INPUT_BUF],
    /// Next byte handed to a reader.
    read: usize,
    /// End of the committed region.
    write: usize,
    /// Cursor position in the current line.
    edit: usize,
    /// End of the current line.
    last: usize,
    /// Commit index of an end-of-input marker that found the ring full.
    deferred_end: Option<usize>,
}

impl InputBuffer {
    /// Creates an empty buffer.
    pub const fn new() -> Self {
        Self {
            buf: [0; INPUT_BUF],
            read: 0,
            write: 0,
            edit: 0,
            last: 0,
            deferred_end: None,
        }
    }

    const fn slot(index: usize) -> usize {
        index % INPUT_BUF
    }

    /// Read index.
    pub fn read_idx(&self) -> usize {
        self.read
    }

    /// Write index.
    pub fn write_idx(&self) -> usize {
        self.write
    }

    /// Edit index.
    pub fn edit_idx(&self) -> usize {
        self.edit
    }

    /// Last index.
    pub fn last_idx(&self) -> usize {
        self.last
    }

    /// Characters typed before the cursor in the current line.
    pub fn size(&self) -> usize {
        self.edit - self.write
    }

    /// Returns whether no more bytes fit until a reader drains some.
    pub fn is_full(&self) -> bool {
        self.last - self.read == INPUT_BUF
    }

    /// Returns whether committed bytes are waiting for a reader.
    pub fn has_committed(&self) -> bool {
        self.read != self.write
    }

    /// Returns the bytes of the current, uncommitted line.
    pub fn current_line(&self) -> impl Iterator<Item = u8> + '_ {
        (self.write..self.last).map(move |i| self.buf[Self::slot(i)])
    }

    /// Returns whether the ordering and capacity invariant holds.
    pub fn invariant_holds(&self) -> bool {
        self.read <= self.write
            && self.write <= self.edit
            && self.edit <= self.last
            && self.last - self.read <= INPUT_BUF
            && self
                .deferred_end
                .map_or(true, |at| self.read <= at && at <= self.write)
    }

    fn after_cursor(&self) -> isize {
        (self.last - self.edit) as isize
    }

    fn render<G: TextGrid, S: Serial>(
        &self,
        from: usize,
        to: usize,
        display: &mut Display<G, S>,
    ) -> Result<(), DisplayError> {
        for i in from..to {
            display.put_char(self.buf[Self::slot(i)])?;
        }
        Ok(())
    }

    /// Inserts `ch` at the cursor and leaves the cursor just after it.
    ///
    /// Returns `Ok(false)` without touching anything when the buffer is full.
    pub fn insert_at_cursor<G: TextGrid, S: Serial>(
        &mut self,
        ch: u8,
        display: &mut Display<G, S>,
    ) -> Result<bool, DisplayError> {
        if self.is_full() {
            return Ok(false);
        }

        // Shift from the tail so no byte is overwritten before it is copied.
        let mut i = self.last;
        while i != self.edit {
            self.buf[Self::slot(i)] = self.buf[Self::slot(i - 1)];
            i -= 1;
        }
        self.buf[Self::slot(self.edit)] = ch;
        self.last += 1;

        self.render(self.edit, self.last, display)?;
        self.edit += 1;
        display.move_cursor_by(-self.after_cursor())?;
        debug_assert!(self.invariant_holds());
        Ok(true)
    }

    /// Erases the character before the cursor.
    ///
    /// Returns `Ok(false)` when the cursor is already at the start of the line.
    pub fn erase_before_cursor<G: TextGrid, S: Serial>(
        &mut self,
        display: &mut Display<G, S>,
    ) -> Result<bool, DisplayError> {
        if self.edit == self.write {
            return Ok(false);
        }

        self.edit -= 1;
        display.move_cursor_by(-1)?;
        for i in self.edit..self.last - 1 {
            self.buf[Self::slot(i)] = self.buf[Self::slot(i + 1)];
        }
        self.last -= 1;

        self.render(self.edit, self.last, display)?;
        display.put_char(BLANK)?;
        display.move_cursor_by(-(self.after_cursor() + 1))?;
        debug_assert!(self.invariant_holds());
        Ok(true)
    }

    /// Erases the whole current line.
    pub fn kill_line<G: TextGrid, S: Serial>(
        &mut self,
        display: &mut Display<G, S>,
    ) -> Result<(), DisplayError> {
        self.move_cursor_end(display)?;
        while self.edit != self.write {
            self.erase_before_cursor(display)?;
        }
        Ok(())
    }

    /// Moves the cursor to the start of the current line.
    pub fn move_cursor_home<G: TextGrid, S: Serial>(
        &mut self,
        display: &mut Display<G, S>,
    ) -> Result<(), DisplayError> {
        let delta = (self.edit - self.write) as isize;
        self.edit = self.write;
        display.move_cursor_by(-delta)
    }

    /// Moves the cursor to the end of the current line.
    pub fn move_cursor_end<G: TextGrid, S: Serial>(
        &mut self,
        display: &mut Display<G, S>,
    ) -> Result<(), DisplayError> {
        let delta = self.after_cursor();
        self.edit = self.last;
        display.move_cursor_by(delta)
    }

    /// Terminates the current line with a newline and hands it to readers.
    ///
    /// Returns `Ok(false)` if the buffer was full: the line is still committed
    /// but carries no terminator.
    pub fn commit_line<G: TextGrid, S: Serial>(
        &mut self,
        display: &mut Display<G, S>,
    ) -> Result<bool, DisplayError> {
        self.move_cursor_end(display)?;
        let stored = self.terminate(b'\n');
        display.put_char(b'\n')?;
        Ok(stored)
    }

    /// Commits the current line followed by an end-of-input marker.
    ///
    /// Nothing is rendered. A marker that does not fit in the ring is kept
    /// aside at the commit point and reported by
    /// [`end_reached`](Self::end_reached) instead. Returns `Ok(false)` only if
    /// another deferred marker is still unread, in which case this one is
    /// dropped.
    pub fn end_of_input<G: TextGrid, S: Serial>(
        &mut self,
        display: &mut Display<G, S>,
    ) -> Result<bool, DisplayError> {
        self.move_cursor_end(display)?;
        if self.terminate(END_OF_INPUT) {
            return Ok(true);
        }
        if self.deferred_end.is_some() {
            return Ok(false);
        }
        self.deferred_end = Some(self.write);
        Ok(true)
    }

    fn terminate(&mut self, byte: u8) -> bool {
        let stored = !self.is_full();
        if stored {
            self.buf[Self::slot(self.last)] = byte;
            self.last += 1;
        }
        self.write = self.last;
        self.edit = self.last;
        debug_assert!(self.invariant_holds());
        stored
    }

    /// Returns whether the reader has arrived at a deferred end-of-input
    /// marker. [`pop`](Self::pop) returns nothing past it until it is taken.
    pub fn end_reached(&self) -> bool {
        self.deferred_end == Some(self.read)
    }

    /// Consumes the deferred end-of-input marker the reader has arrived at.
    pub fn take_end(&mut self) -> bool {
        let reached = self.end_reached();
        if reached {
            self.deferred_end = None;
        }
        reached
    }

    /// Takes the next committed byte.
    pub fn pop(&mut self) -> Option<u8> {
        if self.end_reached() {
            return None;
        }
        if !self.has_committed() {
            return None;
        }
        let byte = self.buf[Self::slot(self.read)];
        self.read += 1;
        Some(byte)
    }

    /// Puts back the byte returned by the last [`pop`](Self::pop).
    pub fn unpop(&mut self) {
        debug_assert!(self.read > 0);
        self.read -= 1;
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}
