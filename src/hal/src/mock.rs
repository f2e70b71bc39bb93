//! In-memory hardware models for host tests.
//!
//! Every model is a cheap handle around shared state: keep a clone in the
//! test and hand the other one to the console, then inspect what the console
//! did through the clone.

use core::cell::Cell;
use std::string::String;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::vec;
use std::vec::Vec;

use crate::{Cpu, Serial, TextGrid, WaitContext};

struct GridState {
    width: usize,
    height: usize,
    cells: Vec<u8>,
    cursor: usize,
    cursor_writes: usize,
}

/// A character grid held in memory.
#[derive(Clone)]
pub struct MemoryGrid {
    state: Arc<Mutex<GridState>>,
}

impl MemoryGrid {
    /// Creates a blank grid of `width` columns and `height` rows.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(GridState {
                width,
                height,
                cells: vec![b' '; width * height],
                cursor: 0,
                cursor_writes: 0,
            })),
        }
    }

    /// Creates a grid with VGA text-mode geometry (80x25).
    pub fn vga() -> Self {
        Self::new(80, 25)
    }

    fn lock(&self) -> MutexGuard<'_, GridState> {
        self.state.lock().expect("grid state poisoned")
    }

    /// Returns row `row` with trailing blanks removed.
    pub fn row(&self, row: usize) -> String {
        let state = self.lock();
        let start = row * state.width;
        let line = &state.cells[start..start + state.width];
        String::from_utf8_lossy(line).trim_end().into()
    }

    /// Returns the non-blank rows joined by newlines.
    pub fn text(&self) -> String {
        let height = self.lock().height;
        let rows: Vec<String> = (0..height).map(|r| self.row(r)).collect();
        let used = rows.iter().rposition(|r| !r.is_empty()).map_or(0, |i| i + 1);
        rows[..used].join("\n")
    }

    /// Returns the current cursor position.
    pub fn cursor_pos(&self) -> usize {
        self.lock().cursor
    }

    /// Returns how many times the cursor register has been written.
    pub fn cursor_writes(&self) -> usize {
        self.lock().cursor_writes
    }

    /// Places the cursor without counting it as a register write.
    pub fn place_cursor(&self, pos: usize) {
        self.lock().cursor = pos;
    }
}

impl TextGrid for MemoryGrid {
    fn width(&self) -> usize {
        self.lock().width
    }

    fn height(&self) -> usize {
        self.lock().height
    }

    fn read_cell(&self, pos: usize) -> u8 {
        self.lock().cells[pos]
    }

    fn write_cell(&mut self, pos: usize, byte: u8) {
        self.lock().cells[pos] = byte;
    }

    fn cursor(&self) -> usize {
        self.lock().cursor
    }

    fn set_cursor(&mut self, pos: usize) {
        let mut state = self.lock();
        state.cursor = pos;
        state.cursor_writes += 1;
    }
}

/// A serial sink that records every byte.
#[derive(Clone, Default)]
pub struct MemorySerial {
    bytes: Arc<Mutex<Vec<u8>>>,
    /// Number of bytes recorded when `enter_fatal` was called.
    fatal_at: Arc<Mutex<Option<usize>>>,
}

impl MemorySerial {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything written so far.
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.lock().expect("serial log poisoned").clone()
    }

    /// Returns everything written so far, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into()
    }

    /// Returns how many bytes had been written when the sink entered fatal
    /// mode, or `None` if it never did.
    pub fn fatal_at(&self) -> Option<usize> {
        *self.fatal_at.lock().expect("serial log poisoned")
    }
}

impl Serial for MemorySerial {
    fn write_byte(&mut self, byte: u8) {
        self.bytes.lock().expect("serial log poisoned").push(byte);
    }

    fn enter_fatal(&mut self) {
        let len = self.bytes.lock().expect("serial log poisoned").len();
        self.fatal_at
            .lock()
            .expect("serial log poisoned")
            .get_or_insert(len);
    }
}

std::thread_local! {
    static INTERRUPTS_ENABLED: Cell<bool> = const { Cell::new(true) };
}

/// A CPU model where every host thread acts as its own CPU.
///
/// `halt` panics with `"cpu <id> halted"` so tests can observe it.
#[derive(Debug, Clone, Copy)]
pub struct MockCpu {
    id: u32,
}

impl MockCpu {
    /// Creates a CPU with the given identifier.
    pub const fn new(id: u32) -> Self {
        Self { id }
    }
}

impl Default for MockCpu {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Cpu for MockCpu {
    fn id(&self) -> u32 {
        self.id
    }

    fn interrupts_enabled(&self) -> bool {
        INTERRUPTS_ENABLED.with(Cell::get)
    }

    fn disable_interrupts(&self) {
        INTERRUPTS_ENABLED.with(|flag| flag.set(false));
    }

    fn enable_interrupts(&self) {
        INTERRUPTS_ENABLED.with(|flag| flag.set(true));
    }

    fn caller_pcs(&self, pcs: &mut [usize]) {
        for (i, pc) in pcs.iter_mut().enumerate() {
            *pc = 0x8010_0000 + i * 0x10;
        }
    }

    fn halt(&self) -> ! {
        panic!("cpu {} halted", self.id);
    }
}

/// A process model whose `sleep` yields the host thread.
#[derive(Debug, Clone, Default)]
pub struct MockProcess {
    killed: Arc<AtomicBool>,
}

impl MockProcess {
    /// Creates a live process.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the process for termination.
    pub fn kill(&self) {
        self.killed.store(true, Ordering::SeqCst);
    }
}

impl WaitContext for MockProcess {
    fn killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }

    fn sleep(&self) {
        std::thread::yield_now();
    }
}
