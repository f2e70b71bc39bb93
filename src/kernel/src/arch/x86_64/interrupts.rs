//! Interrupt Descriptor Table (IDT) and handlers for x86_64.
//!
//! The keyboard handler is the console's input source: it queues the
//! scancode and feeds every decoded code to the console as one batch.

use crate::arch::x86_64::pic::{self, InterruptIndex};
use crate::arch::x86_64::{console, keyboard};
use lazy_static::lazy_static;
use log::{info, trace};
use x86_64::instructions::port::Port;
use x86_64::structures::idt::{InterruptDescriptorTable, InterruptStackFrame, PageFaultErrorCode};

/// PS/2 controller data port.
const KEYBOARD_DATA_PORT: u16 = 0x60;

lazy_static! {
    /// The Interrupt Descriptor Table (IDT).
    static ref IDT: InterruptDescriptorTable = {
        let mut idt = InterruptDescriptorTable::new();
        idt.breakpoint.set_handler_fn(breakpoint_handler);
        idt.double_fault.set_handler_fn(double_fault_handler);
        idt.page_fault.set_handler_fn(page_fault_handler);
        idt.general_protection_fault.set_handler_fn(general_protection_fault_handler);
        idt.divide_error.set_handler_fn(divide_error_handler);

        // Hardware interrupts
        idt[InterruptIndex::Timer.as_usize()]
            .set_handler_fn(timer_interrupt_handler);
        idt[InterruptIndex::Keyboard.as_usize()]
            .set_handler_fn(keyboard_interrupt_handler);

        idt
    };
}

/// Initializes the IDT and the PICs, then enables hardware interrupts.
pub fn init_idt() {
    IDT.load();
    pic::init();
    x86_64::instructions::interrupts::enable();
}

extern "x86-interrupt" fn timer_interrupt_handler(_stack_frame: InterruptStackFrame) {
    pic::end_of_interrupt(InterruptIndex::Timer);
}

extern "x86-interrupt" fn keyboard_interrupt_handler(_stack_frame: InterruptStackFrame) {
    let mut port = Port::<u8>::new(KEYBOARD_DATA_PORT);
    // SAFETY: reading the PS/2 data port acknowledges the byte that raised
    // this interrupt and has no other side effects.
    let scancode = unsafe { port.read() };
    keyboard::add_scancode(scancode);

    if let Some(console) = console() {
        let outcome = console.interrupt(keyboard::codes());
        trace!("keyboard: batch outcome {:?}", outcome);
    }

    pic::end_of_interrupt(InterruptIndex::Keyboard);
}

extern "x86-interrupt" fn breakpoint_handler(stack_frame: InterruptStackFrame) {
    info!("EXCEPTION: BREAKPOINT at {:#x}", stack_frame.instruction_pointer.as_u64());
}

extern "x86-interrupt" fn double_fault_handler(
    stack_frame: InterruptStackFrame,
    _error_code: u64,
) -> ! {
    panic!(
        "double fault at {:#x}",
        stack_frame.instruction_pointer.as_u64()
    );
}

extern "x86-interrupt" fn page_fault_handler(
    stack_frame: InterruptStackFrame,
    error_code: PageFaultErrorCode,
) {
    use x86_64::registers::control::Cr2;

    panic!(
        "page fault at {:#x}, address {:?}, error {:?}",
        stack_frame.instruction_pointer.as_u64(),
        Cr2::read(),
        error_code
    );
}

extern "x86-interrupt" fn general_protection_fault_handler(
    stack_frame: InterruptStackFrame,
    error_code: u64,
) {
    panic!(
        "general protection fault at {:#x}, error {:#x}",
        stack_frame.instruction_pointer.as_u64(),
        error_code
    );
}

extern "x86-interrupt" fn divide_error_handler(stack_frame: InterruptStackFrame) {
    panic!(
        "divide error at {:#x}",
        stack_frame.instruction_pointer.as_u64()
    );
}
