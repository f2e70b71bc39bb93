//! Support for the primary and secondary 8259 Programmable Interrupt Controllers (PICs).

use pic8259::ChainedPics;
use spin::Mutex;

/// The offset of the first PIC (master).
///
/// IRQs 0..7 are mapped to interrupts 32..39.
pub const PIC_1_OFFSET: u8 = 32;

/// The offset of the second PIC (slave).
///
/// IRQs 8..15 are mapped to interrupts 40..47.
pub const PIC_2_OFFSET: u8 = PIC_1_OFFSET + 8;

/// The global instance of the chained PICs.
///
/// SAFETY: the offsets above do not overlap the CPU exception vectors.
pub static PICS: Mutex<ChainedPics> =
    Mutex::new(unsafe { ChainedPics::new(PIC_1_OFFSET, PIC_2_OFFSET) });

/// Hardware interrupts the console kernel handles.
#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub enum InterruptIndex {
    /// IRQ 0, programmable interval timer.
    Timer = PIC_1_OFFSET,
    /// IRQ 1, PS/2 keyboard.
    Keyboard,
}

impl InterruptIndex {
    /// Returns the vector number.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns the IDT slot.
    pub fn as_usize(self) -> usize {
        usize::from(self as u8)
    }
}

/// Remaps and unmasks both controllers.
pub fn init() {
    // SAFETY: called once during boot, before interrupts are enabled.
    unsafe { PICS.lock().initialize() };
}

/// Acknowledges `irq` so the controller delivers the next one.
pub fn end_of_interrupt(irq: InterruptIndex) {
    // SAFETY: only called at the end of the handler for `irq`.
    unsafe { PICS.lock().notify_end_of_interrupt(irq.as_u8()) };
}
