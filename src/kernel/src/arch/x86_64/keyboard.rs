//! PS/2 keyboard input.
//!
//! The interrupt handler queues raw scancodes; [`codes`] drains the queue
//! through the decoder and yields console input codes until it runs dry.

use cons_common::control::{CURSOR_END, CURSOR_HOME, DELETE};
use conquer_once::spin::OnceCell;
use crossbeam_queue::ArrayQueue;
use log::warn;
use pc_keyboard::{layouts, DecodedKey, HandleControl, KeyCode, Keyboard, ScancodeSet1};
use spin::Mutex;

/// Scancodes that can be pending before input is dropped.
const SCANCODE_QUEUE_LEN: usize = 100;

static SCANCODES: OnceCell<ArrayQueue<u8>> = OnceCell::uninit();

/// Ctrl+letter decodes to the matching control code.
static KEYBOARD: Mutex<Keyboard<layouts::Us104Key, ScancodeSet1>> = Mutex::new(Keyboard::new(
    ScancodeSet1::new(),
    layouts::Us104Key,
    HandleControl::MapLettersToUnicode,
));

/// Allocates the scancode queue. Needs the heap.
pub fn init() {
    SCANCODES.init_once(|| ArrayQueue::new(SCANCODE_QUEUE_LEN));
}

/// Called by the keyboard interrupt handler to queue a scancode.
pub fn add_scancode(scancode: u8) {
    match SCANCODES.get() {
        Some(queue) => {
            if queue.push(scancode).is_err() {
                warn!("keyboard: scancode queue full, dropping input");
            }
        }
        None => warn!("keyboard: scancode queue not initialized"),
    }
}

/// Returns the next console input code, or `None` once no complete key
/// press is pending.
pub fn next_code() -> Option<u8> {
    let queue = SCANCODES.get()?;
    let mut keyboard = KEYBOARD.lock();
    while let Some(scancode) = queue.pop() {
        let Ok(Some(event)) = keyboard.add_byte(scancode) else {
            continue;
        };
        if let Some(code) = keyboard.process_keyevent(event).and_then(translate) {
            return Some(code);
        }
    }
    None
}

/// Pending input codes, in arrival order.
pub fn codes() -> impl Iterator<Item = u8> {
    core::iter::from_fn(next_code)
}

fn translate(key: DecodedKey) -> Option<u8> {
    match key {
        DecodedKey::Unicode(ch) if ch.is_ascii() => Some(ch as u8),
        DecodedKey::RawKey(KeyCode::Home) => Some(CURSOR_HOME),
        DecodedKey::RawKey(KeyCode::End) => Some(CURSOR_END),
        DecodedKey::RawKey(KeyCode::Delete) => Some(DELETE),
        _ => None,
    }
}
