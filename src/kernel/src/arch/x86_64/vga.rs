//! VGA text mode grid for x86_64.
//!
//! Character cells live in the text buffer at 0xB8000; the hardware cursor is
//! programmed through the CRT controller's index/data port pair.

use core::ptr;

use cons_hal::TextGrid;
use x86_64::instructions::port::Port;

/// VGA text buffer memory-mapped I/O address.
const VGA_BUFFER_ADDR: usize = 0xB8000;

/// Number of rows in VGA text mode.
const BUFFER_HEIGHT: usize = 25;

/// Number of columns in VGA text mode.
const BUFFER_WIDTH: usize = 80;

/// CRT controller index register.
const CRTC_INDEX: u16 = 0x3D4;

/// CRT controller data register.
const CRTC_DATA: u16 = 0x3D5;

/// CRTC registers holding the cursor position.
const CURSOR_HIGH: u8 = 14;
const CURSOR_LOW: u8 = 15;

/// Light gray on black.
const ATTRIBUTE: u8 = 0x07;

/// A single character cell in the VGA buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
struct ScreenChar {
    ascii_character: u8,
    attribute: u8,
}

/// The VGA text buffer and its hardware cursor.
pub struct VgaGrid {
    /// SAFETY: valid for the lifetime of the kernel. The VGA buffer at 0xB8000
    /// is always mapped on x86 hardware and in QEMU.
    buffer: *mut ScreenChar,
}

// SAFETY: VgaGrid only touches the buffer through volatile operations, and
// the console lock serializes every access.
unsafe impl Send for VgaGrid {}

impl VgaGrid {
    /// Creates a handle to the text buffer.
    pub const fn new() -> Self {
        Self {
            buffer: VGA_BUFFER_ADDR as *mut ScreenChar,
        }
    }

    fn crtc_read(register: u8) -> u8 {
        let mut index = Port::<u8>::new(CRTC_INDEX);
        let mut data = Port::<u8>::new(CRTC_DATA);
        // SAFETY: the CRTC ports exist on every VGA-compatible adapter and
        // the console lock keeps the index/data sequence atomic.
        unsafe {
            index.write(register);
            data.read()
        }
    }

    fn crtc_write(register: u8, value: u8) {
        let mut index = Port::<u8>::new(CRTC_INDEX);
        let mut data = Port::<u8>::new(CRTC_DATA);
        // SAFETY: as in `crtc_read`.
        unsafe {
            index.write(register);
            data.write(value);
        }
    }
}

impl Default for VgaGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl TextGrid for VgaGrid {
    fn width(&self) -> usize {
        BUFFER_WIDTH
    }

    fn height(&self) -> usize {
        BUFFER_HEIGHT
    }

    fn read_cell(&self, pos: usize) -> u8 {
        debug_assert!(pos < BUFFER_WIDTH * BUFFER_HEIGHT, "cell out of bounds");
        // SAFETY: pos is within the 80x25 buffer; volatile because the buffer
        // is memory-mapped I/O.
        unsafe { ptr::read_volatile(self.buffer.add(pos)).ascii_character }
    }

    fn write_cell(&mut self, pos: usize, byte: u8) {
        debug_assert!(pos < BUFFER_WIDTH * BUFFER_HEIGHT, "cell out of bounds");
        let cell = ScreenChar {
            ascii_character: byte,
            attribute: ATTRIBUTE,
        };
        // SAFETY: as in `read_cell`.
        unsafe { ptr::write_volatile(self.buffer.add(pos), cell) };
    }

    fn cursor(&self) -> usize {
        let high = usize::from(Self::crtc_read(CURSOR_HIGH));
        let low = usize::from(Self::crtc_read(CURSOR_LOW));
        high << 8 | low
    }

    fn set_cursor(&mut self, pos: usize) {
        Self::crtc_write(CURSOR_HIGH, (pos >> 8) as u8);
        Self::crtc_write(CURSOR_LOW, pos as u8);
    }

    fn shift_up(&mut self) {
        for pos in BUFFER_WIDTH..BUFFER_WIDTH * BUFFER_HEIGHT {
            // SAFETY: pos and pos - BUFFER_WIDTH are both inside the buffer.
            unsafe {
                let cell = ptr::read_volatile(self.buffer.add(pos));
                ptr::write_volatile(self.buffer.add(pos - BUFFER_WIDTH), cell);
            }
        }
    }
}
